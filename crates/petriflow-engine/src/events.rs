//! Workflow events and notifiers for observability.
//!
//! Events are emitted after an engine operation has taken effect, so
//! consumers can audit changes, refresh views, kick off instances, etc.

use petriflow_net::{InstanceId, WorkflowId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
  /// A verification outcome was persisted.
  Verified {
    workflow_id: WorkflowId,
    sound: bool,
    violations: usize,
  },

  /// A verified workflow was marked unverified again.
  VerificationReset { workflow_id: WorkflowId },

  /// A workflow was cloned.
  Forked {
    source_id: WorkflowId,
    workflow_id: WorkflowId,
    sound: bool,
  },

  /// An instance was persisted.
  InstanceCreated {
    workflow_id: WorkflowId,
    instance_id: InstanceId,
  },

  /// A workflow and everything it owns were deleted.
  Deleted { workflow_id: WorkflowId },
}

/// Trait for receiving workflow events.
///
/// The engine calls `notify` once per event; implementations decide what to
/// do with them (persist, broadcast, log, ignore, etc.).
pub trait Notifier: Send + Sync {
  fn notify(&self, event: WorkflowEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _event: WorkflowEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a store operation. Events are
  // emitted once per operation, not per element.
  sender: mpsc::UnboundedSender<WorkflowEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
    Self { sender }
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, event: WorkflowEvent) {
    // The receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
