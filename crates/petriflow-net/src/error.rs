use thiserror::Error;

use crate::ids::{ArcId, PlaceId, TransitionId, WorkflowId};

#[derive(Debug, Error)]
pub enum NetError {
  #[error("workflow already has a start place: {existing}")]
  DuplicateStartPlace { existing: PlaceId },

  #[error("workflow already has an end place: {existing}")]
  DuplicateEndPlace { existing: PlaceId },

  #[error("place not found in workflow: {0}")]
  UnknownPlace(PlaceId),

  #[error("transition not found in workflow: {0}")]
  UnknownTransition(TransitionId),

  #[error("arc not found in workflow: {0}")]
  UnknownArc(ArcId),

  #[error("element {element} belongs to workflow {actual}, expected {expected}")]
  ForeignElement {
    element: String,
    expected: WorkflowId,
    actual: WorkflowId,
  },

  #[error("duplicate element id: {0}")]
  DuplicateId(String),
}
