//! Petriflow Net
//!
//! This crate provides the in-memory representation of a workflow net.
//! A workflow is a bipartite directed graph of places (waiting states) and
//! transitions (actions), connected by directed arcs.
//!
//! The [`Workflow`] is an arena: it exclusively owns its places, transitions
//! and arcs, and every element carries a lookup-only back reference to the
//! workflow that owns it. Mutators on the arena enforce the structural
//! invariants of the net:
//! - at most one start place and at most one end place
//! - every arc connects a place and a transition of the same workflow
//!
//! The [`Graph`] is an ephemeral directed view built from a workflow and used
//! to answer reachability queries.

mod element;
mod error;
mod graph;
mod ids;
mod instance;
mod workflow;

pub use element::{Arc, Element, Guard, Place, Transition, Trigger};
pub use error::NetError;
pub use graph::{Graph, Vertex};
pub use ids::{ArcId, GuardId, InstanceId, PlaceId, TransitionId, TriggerId, WorkflowId};
pub use instance::Instance;
pub use petriflow_config::{Direction, GuardKind, PlaceRole, TriggerKind};
pub use workflow::{VerificationStatus, Workflow};
