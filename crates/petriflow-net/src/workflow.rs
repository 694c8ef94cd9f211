use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use petriflow_config::{Direction, GuardKind, PlaceRole, TriggerKind};

use crate::element::{Arc, Element, Guard, Place, Transition, Trigger};
use crate::error::NetError;
use crate::graph::Graph;
use crate::ids::{ArcId, GuardId, PlaceId, TransitionId, TriggerId, WorkflowId};

/// Verification state derived from the stored flag and timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
  /// Never verified, or verification was reset.
  Unverified,
  /// The last verification run passed.
  Verified,
  /// The last verification run found violations.
  Invalid,
}

impl VerificationStatus {
  /// Derive the status from a stored flag and timestamp.
  pub fn from_fields(verified: bool, verified_at: Option<DateTime<Utc>>) -> Self {
    match (verified_at, verified) {
      (None, _) => Self::Unverified,
      (Some(_), true) => Self::Verified,
      (Some(_), false) => Self::Invalid,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Unverified => "unverified",
      Self::Verified => "verified",
      Self::Invalid => "invalid",
    }
  }
}

impl fmt::Display for VerificationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A workflow net.
///
/// The workflow owns its places, transitions and arcs. Elements are kept in
/// insertion order, which is the order every query enumerates them in.
///
/// Deserializing rebuilds the arena through the `insert_*` mutators, so a
/// serialized workflow that breaks a structural rule is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowData")]
pub struct Workflow {
  pub id: WorkflowId,
  pub name: String,
  /// Pipeline that generated this workflow, if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pipeline_id: Option<String>,
  pub verified: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub verified_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  places: Vec<Place>,
  transitions: Vec<Transition>,
  arcs: Vec<Arc>,
}

/// Unchecked serialized form of a [`Workflow`].
#[derive(Deserialize)]
struct WorkflowData {
  id: WorkflowId,
  name: String,
  #[serde(default)]
  pipeline_id: Option<String>,
  #[serde(default)]
  verified: bool,
  #[serde(default)]
  verified_at: Option<DateTime<Utc>>,
  created_at: DateTime<Utc>,
  #[serde(default)]
  places: Vec<Place>,
  #[serde(default)]
  transitions: Vec<Transition>,
  #[serde(default)]
  arcs: Vec<Arc>,
}

impl TryFrom<WorkflowData> for Workflow {
  type Error = NetError;

  fn try_from(data: WorkflowData) -> Result<Self, Self::Error> {
    let mut workflow = Workflow::with_id(data.id, data.name);
    workflow.pipeline_id = data.pipeline_id;
    workflow.verified = data.verified;
    workflow.verified_at = data.verified_at;
    workflow.created_at = data.created_at;

    for place in data.places {
      workflow.insert_place(place)?;
    }
    for transition in data.transitions {
      workflow.insert_transition(transition)?;
    }
    for arc in data.arcs {
      workflow.insert_arc(arc)?;
    }
    Ok(workflow)
  }
}

impl Workflow {
  /// Create an empty, unverified workflow.
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_id(WorkflowId::new(), name)
  }

  /// Create an empty, unverified workflow with a known identity.
  pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
    Self {
      id,
      name: name.into(),
      pipeline_id: None,
      verified: false,
      verified_at: None,
      created_at: Utc::now(),
      places: Vec::new(),
      transitions: Vec::new(),
      arcs: Vec::new(),
    }
  }

  /// Shallow copy of the workflow record under a fresh identity.
  ///
  /// Scalar attributes are copied. The element collections and the
  /// verification state are not.
  pub fn duplicate(&self) -> Self {
    Self {
      id: WorkflowId::new(),
      name: self.name.clone(),
      pipeline_id: self.pipeline_id.clone(),
      verified: false,
      verified_at: None,
      created_at: Utc::now(),
      places: Vec::new(),
      transitions: Vec::new(),
      arcs: Vec::new(),
    }
  }

  pub fn status(&self) -> VerificationStatus {
    VerificationStatus::from_fields(self.verified, self.verified_at)
  }

  /// Store the outcome of a verification run.
  pub fn record_verification(&mut self, verified: bool, at: DateTime<Utc>) {
    self.verified = verified;
    self.verified_at = Some(at);
  }

  /// Forget any verification outcome.
  pub fn clear_verification(&mut self) {
    self.verified = false;
    self.verified_at = None;
  }

  pub fn places(&self) -> &[Place] {
    &self.places
  }

  pub fn transitions(&self) -> &[Transition] {
    &self.transitions
  }

  pub fn arcs(&self) -> &[Arc] {
    &self.arcs
  }

  pub fn place(&self, id: PlaceId) -> Option<&Place> {
    self.places.iter().find(|p| p.id == id)
  }

  pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
    self.transitions.iter().find(|t| t.id == id)
  }

  pub fn arc(&self, id: ArcId) -> Option<&Arc> {
    self.arcs.iter().find(|a| a.id == id)
  }

  pub fn start_place(&self) -> Option<&Place> {
    self.places.iter().find(|p| p.is_start())
  }

  pub fn end_place(&self) -> Option<&Place> {
    self.places.iter().find(|p| p.is_end())
  }

  /// All triggers, in transition order.
  pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
    self.transitions.iter().filter_map(|t| t.trigger.as_ref())
  }

  /// All guards, in arc order.
  pub fn guards(&self) -> impl Iterator<Item = &Guard> {
    self.arcs.iter().flat_map(|a| a.guards.iter())
  }

  /// Build the directed graph view used for reachability queries.
  pub fn graph(&self) -> Graph {
    Graph::new(self)
  }

  /// Create a place and add it to the workflow.
  pub fn add_place(
    &mut self,
    name: impl Into<String>,
    role: PlaceRole,
  ) -> Result<PlaceId, NetError> {
    let place = Place::new(self.id, name, role);
    let id = place.id;
    self.insert_place(place)?;
    Ok(id)
  }

  /// Add an existing place record to the workflow.
  pub fn insert_place(&mut self, place: Place) -> Result<(), NetError> {
    self.ensure_owned(&place)?;
    if self.place(place.id).is_some() {
      return Err(NetError::DuplicateId(place.id.to_string()));
    }
    match place.role {
      PlaceRole::Start => {
        if let Some(existing) = self.start_place() {
          return Err(NetError::DuplicateStartPlace {
            existing: existing.id,
          });
        }
      }
      PlaceRole::End => {
        if let Some(existing) = self.end_place() {
          return Err(NetError::DuplicateEndPlace {
            existing: existing.id,
          });
        }
      }
      PlaceRole::Plain => {}
    }
    self.places.push(place);
    Ok(())
  }

  /// Create a transition without a trigger and add it to the workflow.
  pub fn add_transition(&mut self, name: impl Into<String>) -> TransitionId {
    let transition = Transition::new(self.id, name);
    let id = transition.id;
    self.transitions.push(transition);
    id
  }

  /// Add an existing transition record, including its trigger if any.
  pub fn insert_transition(&mut self, transition: Transition) -> Result<(), NetError> {
    self.ensure_owned(&transition)?;
    if self.transition(transition.id).is_some() {
      return Err(NetError::DuplicateId(transition.id.to_string()));
    }
    if let Some(trigger) = &transition.trigger {
      self.ensure_owned(trigger)?;
      if trigger.transition_id != transition.id {
        return Err(NetError::UnknownTransition(trigger.transition_id));
      }
      if self.triggers().any(|t| t.id == trigger.id) {
        return Err(NetError::DuplicateId(trigger.id.to_string()));
      }
    }
    self.transitions.push(transition);
    Ok(())
  }

  /// Attach a new trigger to a transition, replacing any previous one.
  pub fn set_trigger(
    &mut self,
    transition_id: TransitionId,
    kind: TriggerKind,
    config: serde_json::Value,
  ) -> Result<TriggerId, NetError> {
    let trigger = Trigger::new(self.id, transition_id, kind, config);
    let id = trigger.id;
    self.insert_trigger(trigger)?;
    Ok(id)
  }

  /// Attach an existing trigger record to its transition.
  pub fn insert_trigger(&mut self, trigger: Trigger) -> Result<(), NetError> {
    self.ensure_owned(&trigger)?;
    if self.triggers().any(|t| t.id == trigger.id) {
      return Err(NetError::DuplicateId(trigger.id.to_string()));
    }
    let transition = self
      .transitions
      .iter_mut()
      .find(|t| t.id == trigger.transition_id)
      .ok_or(NetError::UnknownTransition(trigger.transition_id))?;
    transition.trigger = Some(trigger);
    Ok(())
  }

  /// Create an arc between a place and a transition of this workflow.
  pub fn add_arc(
    &mut self,
    place_id: PlaceId,
    transition_id: TransitionId,
    direction: Direction,
  ) -> Result<ArcId, NetError> {
    let arc = Arc::new(self.id, place_id, transition_id, direction);
    let id = arc.id;
    self.insert_arc(arc)?;
    Ok(id)
  }

  /// Add an existing arc record, including its guards.
  ///
  /// Both endpoints must already be part of this workflow.
  pub fn insert_arc(&mut self, arc: Arc) -> Result<(), NetError> {
    self.ensure_owned(&arc)?;
    if self.arc(arc.id).is_some() {
      return Err(NetError::DuplicateId(arc.id.to_string()));
    }
    if self.place(arc.place_id).is_none() {
      return Err(NetError::UnknownPlace(arc.place_id));
    }
    if self.transition(arc.transition_id).is_none() {
      return Err(NetError::UnknownTransition(arc.transition_id));
    }
    for guard in &arc.guards {
      self.ensure_owned(guard)?;
      if guard.arc_id != arc.id {
        return Err(NetError::UnknownArc(guard.arc_id));
      }
    }
    self.arcs.push(arc);
    Ok(())
  }

  /// Create a guard on an arc of this workflow.
  pub fn add_guard(
    &mut self,
    arc_id: ArcId,
    kind: GuardKind,
    config: serde_json::Value,
  ) -> Result<GuardId, NetError> {
    let guard = Guard::new(self.id, arc_id, kind, config);
    let id = guard.id;
    self.insert_guard(guard)?;
    Ok(id)
  }

  /// Attach an existing guard record to its arc.
  pub fn insert_guard(&mut self, guard: Guard) -> Result<(), NetError> {
    self.ensure_owned(&guard)?;
    if self.guards().any(|g| g.id == guard.id) {
      return Err(NetError::DuplicateId(guard.id.to_string()));
    }
    let arc = self
      .arcs
      .iter_mut()
      .find(|a| a.id == guard.arc_id)
      .ok_or(NetError::UnknownArc(guard.arc_id))?;
    arc.guards.push(guard);
    Ok(())
  }

  fn ensure_owned<E: Element>(&self, element: &E) -> Result<(), NetError> {
    if element.workflow_id() != self.id {
      return Err(NetError::ForeignElement {
        element: element.id().to_string(),
        expected: self.id,
        actual: element.workflow_id(),
      });
    }
    Ok(())
  }
}
