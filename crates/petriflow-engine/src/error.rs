//! Error types for engine operations.

use petriflow_net::{ArcId, NetError, WorkflowId};
use thiserror::Error;

/// Errors that can occur while turning a definition into a workflow.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Two elements of the same kind share a key.
  #[error("duplicate {kind} key: {key}")]
  DuplicateKey { kind: &'static str, key: String },

  /// An arc names a place key that is not defined.
  #[error("arc references unknown place '{key}'")]
  UnknownPlace { key: String },

  /// An arc names a transition key that is not defined.
  #[error("arc references unknown transition '{key}'")]
  UnknownTransition { key: String },

  /// The definition breaks a structural rule of the net.
  #[error(transparent)]
  Net(#[from] NetError),
}

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
  /// Strict mode refuses to build instances of workflows that did not pass
  /// verification.
  #[error("workflow {workflow_id} is not verified")]
  UnverifiedWorkflow { workflow_id: WorkflowId },

  /// An arc of the source workflow points at an element that was not copied.
  #[error("arc {arc_id} references {element}, which is not part of the source workflow")]
  DanglingReference { arc_id: ArcId, element: String },

  /// The in-memory arena rejected an element.
  #[error(transparent)]
  Net(#[from] NetError),

  /// The store failed; any open transaction has been rolled back.
  #[error("store error: {0}")]
  Store(#[from] petriflow_store::Error),
}
