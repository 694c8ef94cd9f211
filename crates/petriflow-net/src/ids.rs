use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(Uuid);

    impl $name {
      /// Generate a fresh random identity.
      pub fn new() -> Self {
        Self(Uuid::new_v4())
      }

      pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
      }

      pub fn as_uuid(&self) -> &Uuid {
        &self.0
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }

    impl FromStr for $name {
      type Err = uuid::Error;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
      }
    }
  };
}

define_id!(
  /// Identity of a workflow.
  WorkflowId
);
define_id!(
  /// Identity of a place within a workflow.
  PlaceId
);
define_id!(
  /// Identity of a transition within a workflow.
  TransitionId
);
define_id!(
  /// Identity of an arc within a workflow.
  ArcId
);
define_id!(TriggerId);
define_id!(GuardId);
define_id!(
  /// Identity of an execution instance.
  InstanceId
);
