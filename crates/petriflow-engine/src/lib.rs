//! Petriflow Engine
//!
//! This crate provides the operations that act on stored workflow nets:
//! - Resolving a [`WorkflowDef`](petriflow_config::WorkflowDef) into a
//!   workflow arena
//! - Verifying soundness and persisting the outcome
//! - Forking a workflow into an independent copy in one transaction
//! - Building and saving instances, optionally only for verified workflows
//!
//! The [`Engine`] bundles these behind a store and reports each completed
//! operation as a [`WorkflowEvent`].
//!
//! # Usage
//!
//! ```ignore
//! use petriflow_engine::{Engine, EngineConfig, resolve};
//! use petriflow_store::SqliteStore;
//!
//! let store = SqliteStore::connect("sqlite://petriflow.db").await?;
//! store.migrate().await?;
//! let engine = Engine::new(store, EngineConfig { strict_mode: true });
//!
//! let mut workflow = resolve(&def)?;
//! engine.import(&workflow).await?;
//!
//! let mut violations = Violations::new();
//! engine.verify_and_persist(&mut workflow, &mut violations).await?;
//! let copy = engine.fork(&workflow).await?;
//! ```

mod engine;
mod error;
mod events;
mod fork;
mod instance;
mod resolve;

pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, ResolveError};
pub use events::{ChannelNotifier, NoopNotifier, Notifier, WorkflowEvent};
pub use fork::{Forked, fork};
pub use instance::{FORBIDDEN_ATTRIBUTES, InstanceFactory, InstanceHook, NoopHook};
pub use resolve::resolve;
