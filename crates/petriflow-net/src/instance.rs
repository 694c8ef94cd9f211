use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{InstanceId, WorkflowId};

/// An execution context bound to one workflow.
///
/// How an instance moves through the net is not modelled here; only its
/// identity, owner and caller-supplied attributes are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
  pub id: InstanceId,
  pub workflow_id: WorkflowId,
  #[serde(default)]
  pub attributes: serde_json::Map<String, serde_json::Value>,
  pub created_at: DateTime<Utc>,
}

impl Instance {
  /// Create an unsaved instance with no attributes.
  pub fn new(workflow_id: WorkflowId) -> Self {
    Self {
      id: InstanceId::new(),
      workflow_id,
      attributes: serde_json::Map::new(),
      created_at: Utc::now(),
    }
  }
}
