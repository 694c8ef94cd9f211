use serde::{Deserialize, Serialize};

use crate::enums::{Direction, GuardKind, PlaceRole, TriggerKind};

/// A workflow net as written by hand or exported by a pipeline.
///
/// Elements refer to each other by `key`, which only has to be unique within
/// its element kind. Keys are replaced by generated identities when the
/// definition is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pipeline_id: Option<String>,
  #[serde(default)]
  pub places: Vec<PlaceDef>,
  #[serde(default)]
  pub transitions: Vec<TransitionDef>,
  #[serde(default)]
  pub arcs: Vec<ArcDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDef {
  pub key: String,
  #[serde(default)]
  pub role: PlaceRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDef {
  pub key: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub trigger: Option<TriggerDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
  pub kind: TriggerKind,
  /// Trigger-specific settings, carried through untouched.
  #[serde(default)]
  pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcDef {
  /// Key of the place end of the arc.
  pub place: String,
  /// Key of the transition end of the arc.
  pub transition: String,
  pub direction: Direction,
  #[serde(default)]
  pub guards: Vec<GuardDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardDef {
  pub kind: GuardKind,
  #[serde(default)]
  pub config: serde_json::Value,
}
