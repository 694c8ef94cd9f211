use std::fmt;

use petriflow_config::{Direction, GuardKind, PlaceRole, TriggerKind};
use serde::{Deserialize, Serialize};

use crate::ids::{ArcId, GuardId, PlaceId, TransitionId, TriggerId, WorkflowId};

/// Capability shared by every element of a workflow net.
///
/// Elements are identifiable and owned by exactly one workflow. The owner
/// reference is for lookup only; ownership lives in the [`Workflow`] arena.
///
/// [`Workflow`]: crate::Workflow
pub trait Element {
  type Id: Copy + Eq + fmt::Display;

  fn id(&self) -> Self::Id;

  fn workflow_id(&self) -> WorkflowId;
}

/// A waiting state of the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
  pub id: PlaceId,
  pub workflow_id: WorkflowId,
  pub name: String,
  #[serde(default)]
  pub role: PlaceRole,
}

impl Place {
  pub fn new(workflow_id: WorkflowId, name: impl Into<String>, role: PlaceRole) -> Self {
    Self {
      id: PlaceId::new(),
      workflow_id,
      name: name.into(),
      role,
    }
  }

  pub fn is_start(&self) -> bool {
    self.role == PlaceRole::Start
  }

  pub fn is_end(&self) -> bool {
    self.role == PlaceRole::End
  }

  /// Copy this place into another workflow under a fresh identity.
  ///
  /// The role is carried over, so a duplicated net keeps its own start and
  /// end designation.
  pub fn duplicate_into(&self, workflow_id: WorkflowId) -> Self {
    Self {
      id: PlaceId::new(),
      workflow_id,
      name: self.name.clone(),
      role: self.role,
    }
  }
}

/// An action of the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
  pub id: TransitionId,
  pub workflow_id: WorkflowId,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub trigger: Option<Trigger>,
}

impl Transition {
  pub fn new(workflow_id: WorkflowId, name: impl Into<String>) -> Self {
    Self {
      id: TransitionId::new(),
      workflow_id,
      name: name.into(),
      trigger: None,
    }
  }

  /// Copy this transition into another workflow under a fresh identity.
  ///
  /// The trigger is not copied; it is owned separately and must be
  /// duplicated against the new transition.
  pub fn duplicate_into(&self, workflow_id: WorkflowId) -> Self {
    Self {
      id: TransitionId::new(),
      workflow_id,
      name: self.name.clone(),
      trigger: None,
    }
  }
}

/// Descriptor of what causes a transition to fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
  pub id: TriggerId,
  pub workflow_id: WorkflowId,
  pub transition_id: TransitionId,
  pub kind: TriggerKind,
  #[serde(default)]
  pub config: serde_json::Value,
}

impl Trigger {
  pub fn new(
    workflow_id: WorkflowId,
    transition_id: TransitionId,
    kind: TriggerKind,
    config: serde_json::Value,
  ) -> Self {
    Self {
      id: TriggerId::new(),
      workflow_id,
      transition_id,
      kind,
      config,
    }
  }

  pub fn duplicate_into(&self, workflow_id: WorkflowId, transition_id: TransitionId) -> Self {
    Self::new(workflow_id, transition_id, self.kind, self.config.clone())
  }
}

/// A directed edge between one place and one transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
  pub id: ArcId,
  pub workflow_id: WorkflowId,
  pub place_id: PlaceId,
  pub transition_id: TransitionId,
  pub direction: Direction,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub guards: Vec<Guard>,
}

impl Arc {
  pub fn new(
    workflow_id: WorkflowId,
    place_id: PlaceId,
    transition_id: TransitionId,
    direction: Direction,
  ) -> Self {
    Self {
      id: ArcId::new(),
      workflow_id,
      place_id,
      transition_id,
      direction,
      guards: Vec::new(),
    }
  }

  /// Whether the arc runs from its place into its transition.
  pub fn is_in(&self) -> bool {
    self.direction == Direction::In
  }

  /// Copy this arc into another workflow, pointing at the given endpoints.
  ///
  /// Guards are not copied; they must be duplicated against the new arc.
  pub fn duplicate_into(
    &self,
    workflow_id: WorkflowId,
    place_id: PlaceId,
    transition_id: TransitionId,
  ) -> Self {
    Self::new(workflow_id, place_id, transition_id, self.direction)
  }
}

/// Predicate descriptor attached to an arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guard {
  pub id: GuardId,
  pub workflow_id: WorkflowId,
  pub arc_id: ArcId,
  pub kind: GuardKind,
  #[serde(default)]
  pub config: serde_json::Value,
}

impl Guard {
  pub fn new(
    workflow_id: WorkflowId,
    arc_id: ArcId,
    kind: GuardKind,
    config: serde_json::Value,
  ) -> Self {
    Self {
      id: GuardId::new(),
      workflow_id,
      arc_id,
      kind,
      config,
    }
  }

  pub fn duplicate_into(&self, workflow_id: WorkflowId, arc_id: ArcId) -> Self {
    Self::new(workflow_id, arc_id, self.kind, self.config.clone())
  }
}

macro_rules! impl_element {
  ($ty:ty, $id:ty) => {
    impl Element for $ty {
      type Id = $id;

      fn id(&self) -> Self::Id {
        self.id
      }

      fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
      }
    }
  };
}

impl_element!(Place, PlaceId);
impl_element!(Transition, TransitionId);
impl_element!(Trigger, TriggerId);
impl_element!(Arc, ArcId);
impl_element!(Guard, GuardId);
