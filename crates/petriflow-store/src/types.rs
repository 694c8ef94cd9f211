use std::str::FromStr;

use chrono::{DateTime, Utc};
use petriflow_net::{
  Arc, Guard, Instance, Place, Transition, Trigger, VerificationStatus, Workflow, WorkflowId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::Error;

/// A workflow record without its elements, as listed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
  pub workflow_id: WorkflowId,
  pub name: String,
  pub pipeline_id: Option<String>,
  pub verified: bool,
  pub verified_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl WorkflowRecord {
  pub fn status(&self) -> VerificationStatus {
    VerificationStatus::from_fields(self.verified, self.verified_at)
  }
}

fn parse<T>(field: &str, value: &str) -> Result<T, Error>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  value
    .parse()
    .map_err(|e| Error::Corrupt(format!("{field} '{value}': {e}")))
}

#[derive(Debug, FromRow)]
pub(crate) struct WorkflowRow {
  pub workflow_id: String,
  pub name: String,
  pub pipeline_id: Option<String>,
  pub verified: bool,
  pub verified_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl WorkflowRow {
  pub fn into_record(self) -> Result<WorkflowRecord, Error> {
    Ok(WorkflowRecord {
      workflow_id: parse("workflow_id", &self.workflow_id)?,
      name: self.name,
      pipeline_id: self.pipeline_id,
      verified: self.verified,
      verified_at: self.verified_at,
      created_at: self.created_at,
    })
  }

  /// Build an empty workflow arena from the record.
  pub fn into_workflow(self) -> Result<Workflow, Error> {
    let record = self.into_record()?;
    let mut workflow = Workflow::with_id(record.workflow_id, record.name);
    workflow.pipeline_id = record.pipeline_id;
    workflow.verified = record.verified;
    workflow.verified_at = record.verified_at;
    workflow.created_at = record.created_at;
    Ok(workflow)
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct PlaceRow {
  pub place_id: String,
  pub workflow_id: String,
  pub name: String,
  pub role: String,
}

impl TryFrom<PlaceRow> for Place {
  type Error = Error;

  fn try_from(row: PlaceRow) -> Result<Self, Self::Error> {
    Ok(Place {
      id: parse("place_id", &row.place_id)?,
      workflow_id: parse("workflow_id", &row.workflow_id)?,
      name: row.name,
      role: parse("role", &row.role)?,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct TransitionRow {
  pub transition_id: String,
  pub workflow_id: String,
  pub name: String,
}

impl TryFrom<TransitionRow> for Transition {
  type Error = Error;

  fn try_from(row: TransitionRow) -> Result<Self, Self::Error> {
    Ok(Transition {
      id: parse("transition_id", &row.transition_id)?,
      workflow_id: parse("workflow_id", &row.workflow_id)?,
      name: row.name,
      trigger: None,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct TriggerRow {
  pub trigger_id: String,
  pub workflow_id: String,
  pub transition_id: String,
  pub kind: String,
  pub config: Json<serde_json::Value>,
}

impl TryFrom<TriggerRow> for Trigger {
  type Error = Error;

  fn try_from(row: TriggerRow) -> Result<Self, Self::Error> {
    Ok(Trigger {
      id: parse("trigger_id", &row.trigger_id)?,
      workflow_id: parse("workflow_id", &row.workflow_id)?,
      transition_id: parse("transition_id", &row.transition_id)?,
      kind: parse("kind", &row.kind)?,
      config: row.config.0,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct ArcRow {
  pub arc_id: String,
  pub workflow_id: String,
  pub place_id: String,
  pub transition_id: String,
  pub direction: String,
}

impl TryFrom<ArcRow> for Arc {
  type Error = Error;

  fn try_from(row: ArcRow) -> Result<Self, Self::Error> {
    Ok(Arc {
      id: parse("arc_id", &row.arc_id)?,
      workflow_id: parse("workflow_id", &row.workflow_id)?,
      place_id: parse("place_id", &row.place_id)?,
      transition_id: parse("transition_id", &row.transition_id)?,
      direction: parse("direction", &row.direction)?,
      guards: Vec::new(),
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct GuardRow {
  pub guard_id: String,
  pub workflow_id: String,
  pub arc_id: String,
  pub kind: String,
  pub config: Json<serde_json::Value>,
}

impl TryFrom<GuardRow> for Guard {
  type Error = Error;

  fn try_from(row: GuardRow) -> Result<Self, Self::Error> {
    Ok(Guard {
      id: parse("guard_id", &row.guard_id)?,
      workflow_id: parse("workflow_id", &row.workflow_id)?,
      arc_id: parse("arc_id", &row.arc_id)?,
      kind: parse("kind", &row.kind)?,
      config: row.config.0,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct InstanceRow {
  pub instance_id: String,
  pub workflow_id: String,
  pub attributes: Json<serde_json::Map<String, serde_json::Value>>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<InstanceRow> for Instance {
  type Error = Error;

  fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
    Ok(Instance {
      id: parse("instance_id", &row.instance_id)?,
      workflow_id: parse("workflow_id", &row.workflow_id)?,
      attributes: row.attributes.0,
      created_at: row.created_at,
    })
  }
}
