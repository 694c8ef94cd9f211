use petriflow_net::{Vertex, Workflow};
use tracing::{debug, info, instrument};

use crate::violation::{Reason, Violations};

/// Check that every place and transition of `workflow` lies on a path from
/// the start place to the end place.
///
/// The ledger is cleared first and then receives, in order:
/// 1. missing start / end place (the check stops here if either is missing)
/// 2. the end place, if the start place cannot reach it
/// 3. each place other than start and end, tagged `unreachable` and/or
///    `impassable`
/// 4. each transition, with the same two checks
///
/// Returns true iff the ledger is empty afterwards.
#[instrument(skip_all, fields(workflow_id = %workflow.id))]
pub fn verify(workflow: &Workflow, violations: &mut Violations) -> bool {
  violations.clear();

  let start = workflow.start_place();
  let end = workflow.end_place();
  if start.is_none() {
    violations.add(workflow.id, Reason::NoStartPlace);
  }
  if end.is_none() {
    violations.add(workflow.id, Reason::NoEndPlace);
  }
  let (Some(start), Some(end)) = (start, end) else {
    info!(violations = violations.len(), "workflow is missing an endpoint");
    return false;
  };

  let graph = workflow.graph();
  let start_vertex = Vertex::Place(start.id);
  let end_vertex = Vertex::Place(end.id);

  if !graph.has_path(start_vertex, end_vertex) {
    violations.add(end.id, Reason::Unreachable);
  }

  // One forward and one backward closure answer every per-vertex query.
  let from_start = graph.descendants(start_vertex);
  let to_end = graph.ancestors(end_vertex);
  debug!(
    vertices = graph.len(),
    reachable = from_start.len(),
    passable = to_end.len(),
    "built reachability graph"
  );

  let places = workflow
    .places()
    .iter()
    .filter(|p| p.id != start.id && p.id != end.id)
    .map(|p| Vertex::Place(p.id));
  let transitions = workflow
    .transitions()
    .iter()
    .map(|t| Vertex::Transition(t.id));

  for vertex in places.chain(transitions) {
    if !from_start.contains(&vertex) {
      violations.add(vertex, Reason::Unreachable);
    }
    if !to_end.contains(&vertex) {
      violations.add(vertex, Reason::Impassable);
    }
  }

  let sound = violations.is_empty();
  info!(sound, violations = violations.len(), "workflow verified");
  sound
}
