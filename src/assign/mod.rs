//! Reasons and per-variable bookkeeping (`spec.md` §3.1, §3.2).

use crate::{
    cdb::ClauseOffset,
    types::{EliminatedBy, Lit},
};

/// Depth of the current speculative branch.
pub type DecisionLevel = u32;

/// Why a literal was enqueued (`spec.md` §3.2, the "PropBy" tagged union).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropBy {
    /// Decision or assumption: nothing implied it.
    None,
    /// Distinguished marker for the first literal of a probe
    /// (`spec.md` §4.4.5): not a real reason, just a tag so the prober can
    /// recognise "this is where the current branch started" without a
    /// separate side table.
    ProbeRoot,
    /// Implied by a binary clause `(~p, other)`, where `p` is the literal
    /// whose assignment triggered this one.
    Binary {
        other: Lit,
        learnt: bool,
        /// Set only inside the prober (§4.5's `propagateFull`): this reason
        /// stands in for a hyper-binary clause that hasn't been
        /// materialized yet.
        hyperbin: bool,
        /// Set alongside `hyperbin` when the corresponding clause has not
        /// even been *scheduled* for materialization yet (as opposed to
        /// queued in `needToAddBinClause`).
        hyperbin_not_added: bool,
    },
    /// Implied by a ternary clause `(~p, other1, other2)`.
    Ternary { other1: Lit, other2: Lit },
    /// Implied by a long clause at `offset`.
    Long(ClauseOffset),
}

impl PropBy {
    #[inline]
    pub fn is_none(self) -> bool {
        matches!(self, PropBy::None)
    }

    /// A plain (non-hyperbin) binary reason, the common case produced by
    /// ordinary `propagate()`.
    #[inline]
    pub fn binary(other: Lit, learnt: bool) -> PropBy {
        PropBy::Binary {
            other,
            learnt,
            hyperbin: false,
            hyperbin_not_added: false,
        }
    }
}

/// Per-variable data (`spec.md` §3.1).
#[derive(Clone, Copy, Debug)]
pub struct VarData {
    pub level: DecisionLevel,
    pub reason: PropBy,
    pub elim: EliminatedBy,
    /// Saved polarity, consulted by a decision heuristic external to this
    /// core; this crate only stores and round-trips it.
    pub polarity: bool,
}

impl Default for VarData {
    fn default() -> VarData {
        VarData {
            level: 0,
            reason: PropBy::None,
            elim: EliminatedBy::None,
            polarity: false,
        }
    }
}
