//! Petriflow Config
//!
//! This crate contains the serializable workflow net definitions for
//! Petriflow. These types represent a workflow before it is resolved into the
//! in-memory net and given identities.
//!
//! Definitions can be loaded from:
//! - JSON files (via the CLI with `petriflow import workflow.json`)
//! - pipeline exports (as JSON blobs)

mod enums;
mod workflow;

pub use enums::{Direction, GuardKind, PlaceRole, TriggerKind, UnknownVariant};
pub use workflow::{ArcDef, GuardDef, PlaceDef, TransitionDef, TriggerDef, WorkflowDef};
