//! Petriflow Store
//!
//! This crate provides the storage traits and implementations for workflow
//! nets and their instances. Data is persisted to a database (SQLite).
//!
//! The [`Store`] trait defines operations for:
//! - Loading a workflow with all of its elements
//! - Recording and clearing verification outcomes
//! - Creating and listing instances
//! - Deleting a workflow together with everything it owns
//!
//! Graph writes go through a [`Transaction`]. Nothing written through a
//! transaction is visible until [`Transaction::commit`] succeeds; dropping an
//! uncommitted transaction rolls every write back.

mod sqlite;
mod types;

pub use sqlite::{SqliteStore, SqliteTransaction};
pub use types::WorkflowRecord;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use petriflow_net::{Arc, Guard, Instance, Place, Transition, Trigger, Workflow, WorkflowId};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A stored record could not be turned back into a net element.
  #[error("corrupt record: {0}")]
  Corrupt(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Schema migrations failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Storage trait for workflow nets and instances.
#[async_trait]
pub trait Store: Send + Sync {
  type Transaction: Transaction;

  /// Start a transaction for graph writes.
  async fn begin(&self) -> Result<Self::Transaction, Error>;

  /// Load a workflow with its places, transitions, triggers, arcs and guards,
  /// each in creation order.
  async fn load_workflow(&self, workflow_id: WorkflowId) -> Result<Workflow, Error>;

  /// List workflow records, oldest first.
  async fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, Error>;

  /// Overwrite the stored verification flag and timestamp.
  async fn update_verification(
    &self,
    workflow_id: WorkflowId,
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error>;

  /// Delete a workflow and every element and instance it owns.
  async fn delete_workflow(&self, workflow_id: WorkflowId) -> Result<(), Error>;

  /// Persist a new instance.
  async fn insert_instance(&self, instance: &Instance) -> Result<(), Error>;

  /// List instances for a workflow, oldest first.
  async fn list_instances(&self, workflow_id: WorkflowId) -> Result<Vec<Instance>, Error>;
}

/// A unit of graph writes that becomes visible all at once.
#[async_trait]
pub trait Transaction: Send {
  /// Insert the workflow record only, not its elements.
  async fn insert_workflow(&mut self, workflow: &Workflow) -> Result<(), Error>;

  /// Insert the transition record only, not its trigger.
  async fn insert_transition(&mut self, transition: &Transition) -> Result<(), Error>;

  async fn insert_trigger(&mut self, trigger: &Trigger) -> Result<(), Error>;

  async fn insert_place(&mut self, place: &Place) -> Result<(), Error>;

  /// Insert the arc record only, not its guards.
  async fn insert_arc(&mut self, arc: &Arc) -> Result<(), Error>;

  async fn insert_guard(&mut self, guard: &Guard) -> Result<(), Error>;

  async fn update_verification(
    &mut self,
    workflow_id: WorkflowId,
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error>;

  /// Make every write of this transaction visible.
  async fn commit(self) -> Result<(), Error>;

  /// Insert a whole workflow arena: the record, then transitions with their
  /// triggers, places, and arcs with their guards.
  async fn insert_net(&mut self, workflow: &Workflow) -> Result<(), Error> {
    self.insert_workflow(workflow).await?;
    for transition in workflow.transitions() {
      self.insert_transition(transition).await?;
      if let Some(trigger) = &transition.trigger {
        self.insert_trigger(trigger).await?;
      }
    }
    for place in workflow.places() {
      self.insert_place(place).await?;
    }
    for arc in workflow.arcs() {
      self.insert_arc(arc).await?;
      for guard in &arc.guards {
        self.insert_guard(guard).await?;
      }
    }
    Ok(())
  }
}
