//! Transactional deep copy of a workflow net.

use std::collections::HashMap;

use chrono::Utc;
use petriflow_net::{PlaceId, TransitionId, Workflow};
use petriflow_store::{Store, Transaction};
use petriflow_verifier::{Violations, verify};
use tracing::{debug, info, instrument};

use crate::error::EngineError;

/// The outcome of a fork: the new workflow as committed, and the ledger of
/// the verification run performed on it.
#[derive(Debug, Clone)]
pub struct Forked {
  pub workflow: Workflow,
  pub violations: Violations,
}

/// Clone `source` into a new, independent workflow.
///
/// `customize` runs on the duplicated workflow record before anything is
/// written, so callers can rename or retag the copy. Every element gets a
/// fresh identity; arcs and guards are rewired through the old-to-new id
/// maps built while copying transitions and places.
///
/// All writes share one store transaction. If any step fails the transaction
/// is dropped uncommitted and none of the new rows, including the workflow
/// record, become visible.
#[instrument(skip_all, fields(source_id = %source.id))]
pub async fn fork<S, F>(store: &S, source: &Workflow, customize: F) -> Result<Forked, EngineError>
where
  S: Store,
  F: FnOnce(&mut Workflow) + Send,
{
  let mut workflow = source.duplicate();
  customize(&mut workflow);
  let workflow_id = workflow.id;

  let mut tx = store.begin().await?;
  tx.insert_workflow(&workflow).await?;

  let mut transition_ids: HashMap<TransitionId, TransitionId> = HashMap::new();
  for transition in source.transitions() {
    let copy = transition.duplicate_into(workflow_id);
    tx.insert_transition(&copy).await?;
    transition_ids.insert(transition.id, copy.id);
    let copy_id = copy.id;
    workflow.insert_transition(copy)?;

    if let Some(trigger) = &transition.trigger {
      let trigger = trigger.duplicate_into(workflow_id, copy_id);
      tx.insert_trigger(&trigger).await?;
      workflow.insert_trigger(trigger)?;
    }
  }

  let mut place_ids: HashMap<PlaceId, PlaceId> = HashMap::new();
  for place in source.places() {
    let copy = place.duplicate_into(workflow_id);
    tx.insert_place(&copy).await?;
    place_ids.insert(place.id, copy.id);
    workflow.insert_place(copy)?;
  }

  debug!(
    transitions = transition_ids.len(),
    places = place_ids.len(),
    "copied vertices"
  );

  for arc in source.arcs() {
    let place_id = *place_ids
      .get(&arc.place_id)
      .ok_or_else(|| EngineError::DanglingReference {
        arc_id: arc.id,
        element: format!("place {}", arc.place_id),
      })?;
    let transition_id =
      *transition_ids
        .get(&arc.transition_id)
        .ok_or_else(|| EngineError::DanglingReference {
          arc_id: arc.id,
          element: format!("transition {}", arc.transition_id),
        })?;

    let copy = arc.duplicate_into(workflow_id, place_id, transition_id);
    tx.insert_arc(&copy).await?;
    let copy_id = copy.id;
    workflow.insert_arc(copy)?;

    for guard in &arc.guards {
      let guard = guard.duplicate_into(workflow_id, copy_id);
      tx.insert_guard(&guard).await?;
      workflow.insert_guard(guard)?;
    }
  }

  let mut violations = Violations::new();
  let sound = verify(&workflow, &mut violations);
  let now = Utc::now();
  workflow.record_verification(sound, now);
  tx.update_verification(workflow_id, sound, Some(now))
    .await?;

  tx.commit().await?;

  info!(workflow_id = %workflow_id, sound, "forked workflow");
  Ok(Forked {
    workflow,
    violations,
  })
}
