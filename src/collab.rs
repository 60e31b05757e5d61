//! Named interfaces for the external collaborators of `spec.md` §6.2. None
//! of these are implemented here — subsumption, variable elimination,
//! component handling, and the CDCL driver itself all live outside this
//! core — but the core's prober needs *something* to hand its findings to,
//! so the seams are named traits rather than bare tuples/callbacks, the way
//! the teacher separates `VarReplacer`/`Eliminator` from `Solver` itself.

use crate::{
    prober::{xor::TwoLongXor, BinXorCandidate},
    types::Var,
};

/// Accepts xor clauses and 2-XOR equivalences discovered by the prober
/// (`spec.md` §4.5.2 Phase C) and may fold a variable into another,
/// replacing every occurrence.
pub trait VarReplacer {
    /// Record `lits` as an xor clause (`isEqualFalse` per the solver's
    /// convention), tagged with a caller-defined `group` id for bookkeeping.
    fn add_xor_clause_int(&mut self, lits: &[Var], is_equal_false: bool, group: u32);

    /// Variables newly available for replacement since the last call.
    fn get_new_to_replace_vars(&self) -> Vec<Var>;
}

impl dyn VarReplacer {
    /// Convenience used by callers wiring up a prober's findings: forward
    /// every discovered equivalence as a 2-long xor.
    pub fn absorb_equivalences(&mut self, candidates: &[BinXorCandidate]) {
        for c in candidates {
            self.add_xor_clause_int(&[c.a, c.b], !c.inverted, 0);
        }
    }

    pub fn absorb_two_long_xors(&mut self, xors: &[TwoLongXor]) {
        for x in xors {
            self.add_xor_clause_int(&[x.v0, x.v1], !x.inverted, 0);
        }
    }
}

/// Subsumption / self-subsuming-resolution engines report which variables
/// they have eliminated, so the core can treat those as out of play.
pub trait Subsumer {
    fn get_var_elimed(&self, v: Var) -> bool;
}

/// A xor-aware subsumer, distinct from [`Subsumer`] per `spec.md` §6.2 since
/// the two run independent elimination passes in the original design.
pub trait XorSubsumer {
    fn get_var_elimed(&self, v: Var) -> bool;
}

/// Component-splitting (connected-component) handler: reports the
/// satisfying value it found for a variable in a part that was solved
/// independently and detached from the main formula.
pub trait PartHandler {
    fn get_saved_state(&self, v: Var) -> Option<bool>;
}

/// Removes satisfied clauses and shrinks watchers; invoked by a driver
/// between probing rounds, not by the core itself.
pub trait ClauseCleaner {
    fn clean_clauses(&mut self);
}

/// Bulk detach/reattach of every long clause's watchers, used by `search()`
/// step 6 when the decision heap shrank enough to justify a full rebuild
/// (`spec.md` §4.5.1).
pub trait Reattacher {
    fn detach_all(&mut self);
    fn reattach_all(&mut self);
}

/// The CDCL search driver itself: owns the decision heuristic and restart
/// policy, and is the one caller of `propagate()` outside the prober.
pub trait CdclDriver {
    fn order_heap_snapshot(&self) -> Vec<Var>;
}
