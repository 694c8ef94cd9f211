use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string did not name any variant of an enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value}")]
pub struct UnknownVariant {
  pub field: &'static str,
  pub value: String,
}

/// Role of a place in the net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceRole {
  Start,
  End,
  #[default]
  Plain,
}

/// Direction of an arc relative to its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  /// Place -> transition.
  In,
  /// Transition -> place.
  Out,
}

/// What causes a transition to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
  Manual,
  Automatic,
  Timer,
  Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
  Expression,
  Role,
  Custom,
}

macro_rules! string_enum {
  ($ty:ident, $field:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
    impl $ty {
      pub fn as_str(&self) -> &'static str {
        match self {
          $(Self::$variant => $name,)+
        }
      }
    }

    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }

    impl FromStr for $ty {
      type Err = UnknownVariant;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
          $($name => Ok(Self::$variant),)+
          other => Err(UnknownVariant {
            field: $field,
            value: other.to_string(),
          }),
        }
      }
    }
  };
}

string_enum!(PlaceRole, "place role", { Start => "start", End => "end", Plain => "plain" });
string_enum!(Direction, "arc direction", { In => "in", Out => "out" });
string_enum!(TriggerKind, "trigger kind", {
  Manual => "manual",
  Automatic => "automatic",
  Timer => "timer",
  Message => "message",
});
string_enum!(GuardKind, "guard kind", {
  Expression => "expression",
  Role => "role",
  Custom => "custom",
});
