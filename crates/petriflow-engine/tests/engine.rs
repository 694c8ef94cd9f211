//! Integration tests for petriflow-engine against an in-memory SQLite store.

use std::collections::HashSet;

use petriflow_engine::{
  ChannelNotifier, Engine, EngineConfig, EngineError, WorkflowEvent, resolve,
};
use petriflow_config::WorkflowDef;
use petriflow_net::{Direction, GuardKind, PlaceRole, TriggerKind, VerificationStatus, Workflow};
use petriflow_store::SqliteStore;
use petriflow_verifier::{Reason, Violations};
use serde_json::{Map, json};
use tokio::sync::mpsc;

async fn store() -> SqliteStore {
  let store = SqliteStore::in_memory().await.expect("open store");
  store.migrate().await.expect("migrate");
  store
}

async fn engine(strict_mode: bool) -> Engine<SqliteStore> {
  Engine::new(store().await, EngineConfig { strict_mode })
}

async fn count(engine: &Engine<SqliteStore>, table: &str) -> i64 {
  sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
    .fetch_one(engine.store().pool())
    .await
    .unwrap()
}

/// start -> submit -> review -> approve -> done, with a trigger and a guard.
fn sound_workflow() -> Workflow {
  let mut wf = Workflow::new("approval");
  let start = wf.add_place("start", PlaceRole::Start).unwrap();
  let review = wf.add_place("review", PlaceRole::Plain).unwrap();
  let done = wf.add_place("done", PlaceRole::End).unwrap();
  let submit = wf.add_transition("submit");
  let approve = wf.add_transition("approve");
  wf.set_trigger(submit, TriggerKind::Manual, json!({ "form": "request" }))
    .unwrap();
  wf.add_arc(start, submit, Direction::In).unwrap();
  wf.add_arc(review, submit, Direction::Out).unwrap();
  let guarded = wf.add_arc(review, approve, Direction::In).unwrap();
  wf.add_arc(done, approve, Direction::Out).unwrap();
  wf.add_guard(guarded, GuardKind::Role, json!({ "role": "manager" }))
    .unwrap();
  wf
}

#[tokio::test]
async fn test_verify_and_persist_records_outcome() {
  let engine = engine(false).await;
  let mut wf = sound_workflow();
  engine.import(&wf).await.unwrap();

  let mut violations = Violations::new();
  let sound = engine
    .verify_and_persist(&mut wf, &mut violations)
    .await
    .unwrap();

  assert!(sound);
  assert!(violations.is_empty());
  assert_eq!(wf.status(), VerificationStatus::Verified);
  let stored = engine.load(wf.id).await.unwrap();
  assert_eq!(stored.status(), VerificationStatus::Verified);
  assert_eq!(stored.verified_at, wf.verified_at);
}

#[tokio::test]
async fn test_verify_and_persist_records_invalid_outcome() {
  let engine = engine(false).await;
  let mut wf = sound_workflow();
  let orphan = wf.add_place("orphan", PlaceRole::Plain).unwrap();
  engine.import(&wf).await.unwrap();

  let mut violations = Violations::new();
  let sound = engine
    .verify_and_persist(&mut wf, &mut violations)
    .await
    .unwrap();

  assert!(!sound);
  assert!(violations.contains(orphan, Reason::Unreachable));
  assert!(violations.contains(orphan, Reason::Impassable));
  let stored = engine.load(wf.id).await.unwrap();
  assert_eq!(stored.status(), VerificationStatus::Invalid);
}

#[tokio::test]
async fn test_verify_and_persist_keeps_ledger_when_store_fails() {
  let engine = engine(false).await;
  let mut wf = Workflow::new("never saved");

  let mut violations = Violations::new();
  let result = engine.verify_and_persist(&mut wf, &mut violations).await;

  assert!(matches!(result, Err(EngineError::Store(_))));
  assert!(violations.contains(wf.id, Reason::NoStartPlace));
  assert!(violations.contains(wf.id, Reason::NoEndPlace));
  assert_eq!(wf.status(), VerificationStatus::Unverified);
}

#[tokio::test]
async fn test_reset_verification_is_noop_when_unverified() {
  let engine = engine(false).await;
  let mut wf = sound_workflow();
  engine.import(&wf).await.unwrap();
  let (tx, mut rx) = mpsc::unbounded_channel();
  let engine = engine.with_notifier(ChannelNotifier::new(tx));

  engine.reset_verification(&mut wf).await.unwrap();

  assert_eq!(wf.status(), VerificationStatus::Unverified);
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_reset_verification_clears_verified_workflow() {
  let engine = engine(false).await;
  let mut wf = sound_workflow();
  engine.import(&wf).await.unwrap();
  let mut violations = Violations::new();
  engine
    .verify_and_persist(&mut wf, &mut violations)
    .await
    .unwrap();

  engine.reset_verification(&mut wf).await.unwrap();

  assert!(!wf.verified);
  assert!(wf.verified_at.is_none());
  let stored = engine.load(wf.id).await.unwrap();
  assert_eq!(stored.status(), VerificationStatus::Unverified);
}

#[tokio::test]
async fn test_fork_copies_topology_into_new_workflow() {
  let engine = engine(false).await;
  let mut source = sound_workflow();
  engine.import(&source).await.unwrap();
  let mut violations = Violations::new();
  engine
    .verify_and_persist(&mut source, &mut violations)
    .await
    .unwrap();

  let forked = engine.fork(&source).await.unwrap();
  let copy = engine.load(forked.workflow.id).await.unwrap();

  assert_ne!(copy.id, source.id);
  assert_eq!(copy.name, source.name);
  assert_eq!(copy.places().len(), source.places().len());
  assert_eq!(copy.transitions().len(), source.transitions().len());
  assert_eq!(copy.arcs().len(), source.arcs().len());
  assert_eq!(copy.triggers().count(), 1);
  assert_eq!(copy.guards().count(), 1);
  assert_eq!(copy.start_place().unwrap().name, "start");
  assert_eq!(copy.end_place().unwrap().name, "done");

  let places: HashSet<_> = copy.places().iter().map(|p| p.id).collect();
  let transitions: HashSet<_> = copy.transitions().iter().map(|t| t.id).collect();
  for arc in copy.arcs() {
    assert_eq!(arc.workflow_id, copy.id);
    assert!(places.contains(&arc.place_id));
    assert!(transitions.contains(&arc.transition_id));
  }
  for (original, copied) in source.arcs().iter().zip(copy.arcs()) {
    assert_ne!(original.id, copied.id);
    assert_eq!(original.direction, copied.direction);
  }

  assert!(forked.violations.is_empty());
  assert_eq!(copy.status(), VerificationStatus::Verified);
  assert!(copy.verified_at >= source.verified_at);

  // The source is untouched.
  let reloaded = engine.load(source.id).await.unwrap();
  assert_eq!(reloaded.places(), source.places());
  assert_eq!(reloaded.arcs(), source.arcs());
  assert_eq!(reloaded.status(), VerificationStatus::Verified);
}

#[tokio::test]
async fn test_fork_recomputes_verification_for_unsound_source() {
  let engine = engine(false).await;
  let mut source = sound_workflow();
  source.add_place("orphan", PlaceRole::Plain).unwrap();
  engine.import(&source).await.unwrap();

  let forked = engine.fork(&source).await.unwrap();

  assert!(!forked.workflow.verified);
  assert_eq!(forked.workflow.status(), VerificationStatus::Invalid);
  let orphan = forked.workflow.places()[3].id;
  assert!(forked.violations.contains(orphan, Reason::Unreachable));
  let stored = engine.load(forked.workflow.id).await.unwrap();
  assert_eq!(stored.status(), VerificationStatus::Invalid);
}

#[tokio::test]
async fn test_fork_with_customization_renames_copy() {
  let engine = engine(false).await;
  let source = sound_workflow();
  engine.import(&source).await.unwrap();

  let forked = engine
    .fork_with(&source, |wf| wf.name = "approval v2".to_string())
    .await
    .unwrap();

  let copy = engine.load(forked.workflow.id).await.unwrap();
  assert_eq!(copy.name, "approval v2");
  assert_eq!(engine.load(source.id).await.unwrap().name, "approval");
}

#[tokio::test]
async fn test_fork_failure_leaves_no_rows() {
  let engine = engine(false).await;
  let source = sound_workflow();
  engine.import(&source).await.unwrap();

  // Fail the copy after its transitions and places are written.
  sqlx::query(
    r#"
    CREATE TRIGGER fail_arc_copy BEFORE INSERT ON arcs
    BEGIN
      SELECT RAISE(ABORT, 'injected failure');
    END;
    "#,
  )
  .execute(engine.store().pool())
  .await
  .unwrap();

  let result = engine.fork(&source).await;

  assert!(matches!(result, Err(EngineError::Store(_))));
  assert_eq!(count(&engine, "workflows").await, 1);
  assert_eq!(count(&engine, "transitions").await, 2);
  assert_eq!(count(&engine, "triggers").await, 1);
  assert_eq!(count(&engine, "places").await, 3);
  assert_eq!(count(&engine, "arcs").await, 4);
  assert_eq!(engine.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_strict_mode_refuses_unverified_instances() {
  let engine = engine(true).await;
  let wf = sound_workflow();
  engine.import(&wf).await.unwrap();

  let result = engine.build_instance(&wf, Map::new());

  assert!(matches!(
    result,
    Err(EngineError::UnverifiedWorkflow { workflow_id }) if workflow_id == wf.id
  ));
  assert!(engine.instances(wf.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_strict_mode_allows_verified_instances() {
  let engine = engine(true).await;
  let mut wf = sound_workflow();
  engine.import(&wf).await.unwrap();
  let mut violations = Violations::new();
  engine
    .verify_and_persist(&mut wf, &mut violations)
    .await
    .unwrap();

  let instance = engine.build_instance(&wf, Map::new()).unwrap();
  engine.create_instance(&instance).await.unwrap();

  let stored = engine.instances(wf.id).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].id, instance.id);
}

#[tokio::test]
async fn test_non_strict_mode_builds_unverified_instances() {
  let engine = engine(false).await;
  let wf = sound_workflow();
  engine.import(&wf).await.unwrap();

  let mut attributes = Map::new();
  attributes.insert("verified".to_string(), json!(true));
  attributes.insert("requester".to_string(), json!("ada"));
  let instance = engine.build_instance(&wf, attributes).unwrap();

  assert!(engine.save_instance(&instance).await);
  let stored = engine.instances(wf.id).await.unwrap();
  assert_eq!(stored[0].attributes.len(), 1);
  assert_eq!(stored[0].attributes["requester"], json!("ada"));
}

#[tokio::test]
async fn test_save_instance_reports_failure() {
  let engine = engine(false).await;
  let wf = sound_workflow();

  // Never imported, so the owning workflow row is missing.
  let instance = engine.build_instance(&wf, Map::new()).unwrap();

  assert!(!engine.save_instance(&instance).await);
  assert!(matches!(
    engine.create_instance(&instance).await,
    Err(EngineError::Store(_))
  ));
}

#[tokio::test]
async fn test_delete_removes_workflow_and_instances() {
  let engine = engine(false).await;
  let wf = sound_workflow();
  engine.import(&wf).await.unwrap();
  let instance = engine.build_instance(&wf, Map::new()).unwrap();
  engine.create_instance(&instance).await.unwrap();

  engine.delete(wf.id).await.unwrap();

  assert!(engine.list().await.unwrap().is_empty());
  assert_eq!(count(&engine, "instances").await, 0);
  assert_eq!(count(&engine, "arcs").await, 0);
}

#[tokio::test]
async fn test_events_follow_operations() {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let engine = engine(false).await.with_notifier(ChannelNotifier::new(tx));
  let mut wf = sound_workflow();
  engine.import(&wf).await.unwrap();

  let mut violations = Violations::new();
  engine
    .verify_and_persist(&mut wf, &mut violations)
    .await
    .unwrap();
  let forked = engine.fork(&wf).await.unwrap();
  engine.reset_verification(&mut wf).await.unwrap();
  let instance = engine.build_instance(&wf, Map::new()).unwrap();
  engine.create_instance(&instance).await.unwrap();
  engine.delete(forked.workflow.id).await.unwrap();

  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }

  assert_eq!(
    events,
    vec![
      WorkflowEvent::Verified {
        workflow_id: wf.id,
        sound: true,
        violations: 0,
      },
      WorkflowEvent::Forked {
        source_id: wf.id,
        workflow_id: forked.workflow.id,
        sound: true,
      },
      WorkflowEvent::VerificationReset { workflow_id: wf.id },
      WorkflowEvent::InstanceCreated {
        workflow_id: wf.id,
        instance_id: instance.id,
      },
      WorkflowEvent::Deleted {
        workflow_id: forked.workflow.id,
      },
    ]
  );
}

#[tokio::test]
async fn test_imported_definition_matches_dead_end_scenario() {
  let engine = engine(false).await;
  let def: WorkflowDef = serde_json::from_value(json!({
    "name": "dead end",
    "places": [
      { "key": "S", "role": "start" },
      { "key": "A" },
      { "key": "E", "role": "end" }
    ],
    "transitions": [{ "key": "T" }],
    "arcs": [
      { "place": "S", "transition": "T", "direction": "in" },
      { "place": "A", "transition": "T", "direction": "out" }
    ]
  }))
  .unwrap();
  let mut wf = resolve(&def).unwrap();
  engine.import(&wf).await.unwrap();

  let mut violations = Violations::new();
  let sound = engine
    .verify_and_persist(&mut wf, &mut violations)
    .await
    .unwrap();

  let a = wf.places()[1].id;
  assert!(!sound);
  assert!(violations.contains(a, Reason::Impassable));
  assert!(!violations.contains(a, Reason::Unreachable));
}
