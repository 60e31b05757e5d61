//! Error handling for the core, see `SPEC_FULL.md` §10.1.
//!
//! Modeled on the teacher's own `SolverError`/`MaybeInconsistent`
//! (`shnarazk-splr/src/types/mod.rs`): a hand-written enum with a `Display`
//! impl, not a `thiserror` derive — that *is* the teacher's idiom here, and
//! there is exactly one kind of failure this core can surface on its own
//! (the formula collapsing to UNSAT), so a derive macro would buy nothing.

use crate::types::{Lit, Var};
use std::fmt;

/// The only way the core itself discovers that a formula is unsatisfiable:
/// two propagations at the root level (decision level 0) contradict each
/// other. `spec.md` §7 calls this "UNSAT discovered"; once it happens `ok`
/// becomes `false` and the caller must not mutate the engine further.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolverError {
    /// A literal was forced true and false at decision level 0.
    RootLevelConflict { lit: Lit, var: Var },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::RootLevelConflict { lit, var } => {
                write!(f, "root-level conflict on {var} via literal {lit}")
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Return type for operations that can only fail by proving UNSAT.
pub type MaybeInconsistent = Result<(), SolverError>;
