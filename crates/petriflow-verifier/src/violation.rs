use std::fmt;

use petriflow_net::{PlaceId, TransitionId, Vertex, WorkflowId};
use serde::{Deserialize, Serialize};

/// Why a subject failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
  NoStartPlace,
  NoEndPlace,
  /// Not reachable from the start place.
  Unreachable,
  /// Cannot reach the end place.
  Impassable,
}

impl Reason {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NoStartPlace => "no_start_place",
      Self::NoEndPlace => "no_end_place",
      Self::Unreachable => "unreachable",
      Self::Impassable => "impassable",
    }
  }
}

impl fmt::Display for Reason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The element a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
  Workflow(WorkflowId),
  Place(PlaceId),
  Transition(TransitionId),
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Workflow(id) => write!(f, "workflow {}", id),
      Self::Place(id) => write!(f, "place {}", id),
      Self::Transition(id) => write!(f, "transition {}", id),
    }
  }
}

impl From<Vertex> for Subject {
  fn from(vertex: Vertex) -> Self {
    match vertex {
      Vertex::Place(id) => Self::Place(id),
      Vertex::Transition(id) => Self::Transition(id),
    }
  }
}

impl From<WorkflowId> for Subject {
  fn from(id: WorkflowId) -> Self {
    Self::Workflow(id)
  }
}

impl From<PlaceId> for Subject {
  fn from(id: PlaceId) -> Self {
    Self::Place(id)
  }
}

impl From<TransitionId> for Subject {
  fn from(id: TransitionId) -> Self {
    Self::Transition(id)
  }
}

/// A single verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
  pub subject: Subject,
  pub reason: Reason,
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.subject, self.reason)
  }
}

/// Ordered ledger of violations from one verification run.
///
/// Entries keep insertion order and are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations {
  entries: Vec<Violation>,
}

impl Violations {
  pub fn new() -> Self {
    Self::default()
  }

  /// Discard all entries.
  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// Append a violation.
  pub fn add(&mut self, subject: impl Into<Subject>, reason: Reason) {
    self.entries.push(Violation {
      subject: subject.into(),
      reason,
    });
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
    self.entries.iter()
  }

  pub fn as_slice(&self) -> &[Violation] {
    &self.entries
  }

  pub fn contains(&self, subject: impl Into<Subject>, reason: Reason) -> bool {
    let subject = subject.into();
    self
      .entries
      .iter()
      .any(|v| v.subject == subject && v.reason == reason)
  }
}

impl<'a> IntoIterator for &'a Violations {
  type Item = &'a Violation;
  type IntoIter = std::slice::Iter<'a, Violation>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}

impl fmt::Display for Violations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, violation) in self.entries.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{}", violation)?;
    }
    Ok(())
  }
}
