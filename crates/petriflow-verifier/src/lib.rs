//! Petriflow Verifier
//!
//! Structural soundness check for workflow nets. A workflow is sound here
//! when it has a start and an end place and every place and transition lies
//! on some directed path from the start place to the end place.
//!
//! This is plain directed-graph reachability. It does not model token flow,
//! join semantics, liveness or boundedness.
//!
//! Failures are not errors: they are recorded as [`Violation`]s in a
//! caller-owned [`Violations`] ledger.

mod verifier;
mod violation;

pub use verifier::verify;
pub use violation::{Reason, Subject, Violation, Violations};
