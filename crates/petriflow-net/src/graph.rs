use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petriflow_config::Direction;

use crate::ids::{PlaceId, TransitionId};
use crate::workflow::Workflow;

/// A vertex of the reachability graph, tagged by element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertex {
  Place(PlaceId),
  Transition(TransitionId),
}

impl fmt::Display for Vertex {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Place(id) => write!(f, "place {}", id),
      Self::Transition(id) => write!(f, "transition {}", id),
    }
  }
}

impl From<PlaceId> for Vertex {
  fn from(id: PlaceId) -> Self {
    Self::Place(id)
  }
}

impl From<TransitionId> for Vertex {
  fn from(id: TransitionId) -> Self {
    Self::Transition(id)
  }
}

/// Directed graph view of a workflow for reachability queries.
///
/// The graph is a snapshot: it does not follow later edits to the workflow
/// it was built from.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: vertex -> list of downstream vertices.
  adjacency: HashMap<Vertex, Vec<Vertex>>,
  /// Reverse adjacency: vertex -> list of upstream vertices.
  reverse_adjacency: HashMap<Vertex, Vec<Vertex>>,
}

impl Graph {
  /// Build a graph from the places, transitions and arcs of a workflow.
  ///
  /// An `in` arc yields an edge place -> transition, an `out` arc yields an
  /// edge transition -> place.
  pub fn new(workflow: &Workflow) -> Self {
    let mut adjacency: HashMap<Vertex, Vec<Vertex>> = HashMap::new();
    let mut reverse_adjacency: HashMap<Vertex, Vec<Vertex>> = HashMap::new();

    // Initialize all vertices
    let vertices = workflow
      .places()
      .iter()
      .map(|p| Vertex::Place(p.id))
      .chain(workflow.transitions().iter().map(|t| Vertex::Transition(t.id)));
    for vertex in vertices {
      adjacency.entry(vertex).or_default();
      reverse_adjacency.entry(vertex).or_default();
    }

    for arc in workflow.arcs() {
      let place = Vertex::Place(arc.place_id);
      let transition = Vertex::Transition(arc.transition_id);
      let (from, to) = match arc.direction {
        Direction::In => (place, transition),
        Direction::Out => (transition, place),
      };
      // Only places and transitions of the workflow become vertices.
      if !adjacency.contains_key(&from) || !adjacency.contains_key(&to) {
        continue;
      }
      if let Some(downstream) = adjacency.get_mut(&from) {
        downstream.push(to);
      }
      if let Some(upstream) = reverse_adjacency.get_mut(&to) {
        upstream.push(from);
      }
    }

    Self {
      adjacency,
      reverse_adjacency,
    }
  }

  /// Number of vertices in the graph.
  pub fn len(&self) -> usize {
    self.adjacency.len()
  }

  pub fn is_empty(&self) -> bool {
    self.adjacency.is_empty()
  }

  pub fn contains(&self, vertex: Vertex) -> bool {
    self.adjacency.contains_key(&vertex)
  }

  /// Get downstream vertices for a given vertex.
  pub fn downstream(&self, vertex: Vertex) -> &[Vertex] {
    self
      .adjacency
      .get(&vertex)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream vertices for a given vertex.
  pub fn upstream(&self, vertex: Vertex) -> &[Vertex] {
    self
      .reverse_adjacency
      .get(&vertex)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check whether a directed path of zero or more edges leads from `from`
  /// to `to`. Every vertex reaches itself.
  pub fn has_path(&self, from: Vertex, to: Vertex) -> bool {
    if from == to {
      return true;
    }

    let mut visited = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(vertex) = queue.pop_front() {
      for &next in self.downstream(vertex) {
        if next == to {
          return true;
        }
        if visited.insert(next) {
          queue.push_back(next);
        }
      }
    }
    false
  }

  /// All vertices reachable from `vertex`, including itself.
  pub fn descendants(&self, vertex: Vertex) -> HashSet<Vertex> {
    closure(vertex, &self.adjacency)
  }

  /// All vertices that can reach `vertex`, including itself.
  pub fn ancestors(&self, vertex: Vertex) -> HashSet<Vertex> {
    closure(vertex, &self.reverse_adjacency)
  }
}

/// Breadth-first closure over one direction of the graph.
fn closure(start: Vertex, edges: &HashMap<Vertex, Vec<Vertex>>) -> HashSet<Vertex> {
  let mut visited = HashSet::from([start]);
  let mut queue = VecDeque::from([start]);

  while let Some(vertex) = queue.pop_front() {
    if let Some(nexts) = edges.get(&vertex) {
      for &next in nexts {
        if visited.insert(next) {
          queue.push_back(next);
        }
      }
    }
  }

  visited
}
