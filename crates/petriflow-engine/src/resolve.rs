//! Turning workflow definitions into workflow arenas.

use std::collections::HashMap;

use petriflow_config::WorkflowDef;
use petriflow_net::{PlaceId, TransitionId, Workflow};

use crate::error::ResolveError;

/// Build a workflow from its definition, assigning fresh identities to every
/// element.
///
/// Elements are added in definition order. A missing start or end place is
/// not an error here; verification reports it.
pub fn resolve(def: &WorkflowDef) -> Result<Workflow, ResolveError> {
  let mut workflow = Workflow::new(def.name.clone());
  workflow.pipeline_id = def.pipeline_id.clone();

  let mut places: HashMap<&str, PlaceId> = HashMap::new();
  for place in &def.places {
    if places.contains_key(place.key.as_str()) {
      return Err(ResolveError::DuplicateKey {
        kind: "place",
        key: place.key.clone(),
      });
    }
    let id = workflow.add_place(place.key.clone(), place.role)?;
    places.insert(&place.key, id);
  }

  let mut transitions: HashMap<&str, TransitionId> = HashMap::new();
  for transition in &def.transitions {
    if transitions.contains_key(transition.key.as_str()) {
      return Err(ResolveError::DuplicateKey {
        kind: "transition",
        key: transition.key.clone(),
      });
    }
    let id = workflow.add_transition(transition.key.clone());
    if let Some(trigger) = &transition.trigger {
      workflow.set_trigger(id, trigger.kind, trigger.config.clone())?;
    }
    transitions.insert(&transition.key, id);
  }

  for arc in &def.arcs {
    let place_id = *places
      .get(arc.place.as_str())
      .ok_or_else(|| ResolveError::UnknownPlace {
        key: arc.place.clone(),
      })?;
    let transition_id =
      *transitions
        .get(arc.transition.as_str())
        .ok_or_else(|| ResolveError::UnknownTransition {
          key: arc.transition.clone(),
        })?;

    let arc_id = workflow.add_arc(place_id, transition_id, arc.direction)?;
    for guard in &arc.guards {
      workflow.add_guard(arc_id, guard.kind, guard.config.clone())?;
    }
  }

  Ok(workflow)
}

#[cfg(test)]
mod tests {
  use petriflow_net::{Direction, GuardKind, NetError, PlaceRole, TriggerKind};
  use serde_json::json;

  use super::*;

  fn def(value: serde_json::Value) -> WorkflowDef {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_resolve_builds_arena_in_definition_order() {
    let workflow = resolve(&def(json!({
      "name": "approval",
      "pipeline_id": "import-1",
      "places": [
        { "key": "start", "role": "start" },
        { "key": "review" },
        { "key": "done", "role": "end" }
      ],
      "transitions": [
        { "key": "submit", "trigger": { "kind": "manual", "config": { "form": "x" } } },
        { "key": "approve" }
      ],
      "arcs": [
        { "place": "start", "transition": "submit", "direction": "in" },
        { "place": "review", "transition": "submit", "direction": "out" },
        { "place": "review", "transition": "approve", "direction": "in",
          "guards": [{ "kind": "role", "config": { "role": "manager" } }] },
        { "place": "done", "transition": "approve", "direction": "out" }
      ]
    })))
    .unwrap();

    assert_eq!(workflow.name, "approval");
    assert_eq!(workflow.pipeline_id.as_deref(), Some("import-1"));
    let names: Vec<_> = workflow.places().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["start", "review", "done"]);
    assert_eq!(workflow.start_place().unwrap().name, "start");
    assert_eq!(workflow.end_place().unwrap().name, "done");

    let submit = &workflow.transitions()[0];
    assert_eq!(submit.trigger.as_ref().unwrap().kind, TriggerKind::Manual);
    assert!(workflow.transitions()[1].trigger.is_none());

    assert_eq!(workflow.arcs().len(), 4);
    assert_eq!(workflow.arcs()[1].direction, Direction::Out);
    assert_eq!(workflow.arcs()[2].guards[0].kind, GuardKind::Role);
    assert_eq!(workflow.arcs()[2].guards[0].config, json!({ "role": "manager" }));
  }

  #[test]
  fn test_resolve_allows_missing_endpoints() {
    let workflow = resolve(&def(json!({
      "name": "partial",
      "places": [{ "key": "a" }],
      "transitions": [{ "key": "t" }]
    })))
    .unwrap();

    assert!(workflow.start_place().is_none());
    assert!(workflow.end_place().is_none());
  }

  #[test]
  fn test_resolve_rejects_duplicate_place_key() {
    let result = resolve(&def(json!({
      "name": "dup",
      "places": [{ "key": "a" }, { "key": "a" }]
    })));

    assert!(matches!(
      result,
      Err(ResolveError::DuplicateKey { kind: "place", .. })
    ));
  }

  #[test]
  fn test_resolve_rejects_duplicate_transition_key() {
    let result = resolve(&def(json!({
      "name": "dup",
      "transitions": [{ "key": "t" }, { "key": "t" }]
    })));

    assert!(matches!(
      result,
      Err(ResolveError::DuplicateKey {
        kind: "transition",
        ..
      })
    ));
  }

  #[test]
  fn test_resolve_rejects_unknown_arc_endpoints() {
    let unknown_place = resolve(&def(json!({
      "name": "bad",
      "transitions": [{ "key": "t" }],
      "arcs": [{ "place": "nowhere", "transition": "t", "direction": "in" }]
    })));
    assert!(matches!(
      unknown_place,
      Err(ResolveError::UnknownPlace { key }) if key == "nowhere"
    ));

    let unknown_transition = resolve(&def(json!({
      "name": "bad",
      "places": [{ "key": "p" }],
      "arcs": [{ "place": "p", "transition": "nothing", "direction": "out" }]
    })));
    assert!(matches!(
      unknown_transition,
      Err(ResolveError::UnknownTransition { key }) if key == "nothing"
    ));
  }

  #[test]
  fn test_resolve_rejects_second_start_place() {
    let result = resolve(&def(json!({
      "name": "two starts",
      "places": [
        { "key": "a", "role": "start" },
        { "key": "b", "role": "start" }
      ]
    })));

    assert!(matches!(
      result,
      Err(ResolveError::Net(NetError::DuplicateStartPlace { .. }))
    ));
  }

  #[test]
  fn test_plain_role_is_default() {
    let workflow = resolve(&def(json!({
      "name": "plain",
      "places": [{ "key": "a" }]
    })))
    .unwrap();

    assert_eq!(workflow.places()[0].role, PlaceRole::Plain);
  }
}
