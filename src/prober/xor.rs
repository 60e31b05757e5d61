//! 2-long xor canonicalization and shortened-xor discovery (`spec.md`
//! §4.5.3, §4.5.4).

use crate::types::{Lit, Var};
use std::collections::BTreeSet;

/// A long xor clause as the prober sees it: a list of variables plus the
/// overall parity (`rhs == true` means the xor of all listed variables must
/// equal `true`, the solver's "xor-equal-false" convention negated).
#[derive(Clone, Debug)]
pub struct XorClause {
    pub vars: Vec<Var>,
    pub rhs: bool,
}

/// A 2-long xor in canonical form: `v0 < v1`, `v0 ⊕ v1 = ¬inverted`
/// (`spec.md` §4.5.3). `PartialEq`/`Hash` are derived directly on the
/// canonical fields, which is what "equality respects canonical form" means
/// in practice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TwoLongXor {
    pub v0: Var,
    pub v1: Var,
    pub inverted: bool,
}

impl TwoLongXor {
    /// Build the canonical form from two variables and the clause's parity,
    /// folding in the sign of any already-assigned literal among the
    /// xor's original (unreduced) literals via `extra_flip`.
    pub fn new(a: Var, b: Var, inverted: bool) -> TwoLongXor {
        if a.index() <= b.index() {
            TwoLongXor { v0: a, v1: b, inverted }
        } else {
            TwoLongXor { v0: b, v1: a, inverted }
        }
    }

    /// Fold one more known-true/false literal's parity into `inverted`,
    /// used when a xor shrinks from N variables down to 2 because the rest
    /// got assigned (`spec.md` §4.5.4).
    pub fn flip(self, by: bool) -> TwoLongXor {
        TwoLongXor {
            inverted: self.inverted ^ by,
            ..self
        }
    }
}

/// Tracks each long xor clause's surviving (unassigned) variables
/// (`spec.md` §4.5.4): as probe assignments retire variables, each xor
/// mentioning that variable shrinks; when exactly two variables remain, it
/// becomes a [`TwoLongXor`] candidate.
pub struct XorTracker {
    /// `occur[v]` lists indices into `clauses` mentioning `v`.
    occur: Vec<Vec<usize>>,
    /// Unassigned variables remaining per xor; shrinks on `assign`, grows
    /// back on `unassign`.
    remaining: Vec<Vec<Var>>,
    /// Accumulated parity flip for each xor from variables folded out of
    /// `remaining` so far.
    flip: Vec<bool>,
    touched: BTreeSet<usize>,
}

impl XorTracker {
    pub fn new(n_vars: usize, clauses: Vec<XorClause>) -> XorTracker {
        let mut occur = vec![Vec::new(); n_vars];
        let mut remaining = Vec::with_capacity(clauses.len());
        let mut flip = Vec::with_capacity(clauses.len());
        for (idx, c) in clauses.iter().enumerate() {
            for &v in &c.vars {
                occur[v.index()].push(idx);
            }
            remaining.push(c.vars.clone());
            flip.push(!c.rhs);
        }
        XorTracker {
            occur,
            remaining,
            flip,
            touched: BTreeSet::new(),
        }
    }

    /// Record that `lit` was just assigned on the current probe branch;
    /// shrink every xor mentioning `lit.var()`. Returns the set of xors
    /// that just became 2-long.
    pub fn assign(&mut self, lit: Lit) -> Vec<TwoLongXor> {
        let mut newly_two = Vec::new();
        for &idx in &self.occur[lit.var().index()].clone() {
            let list = &mut self.remaining[idx];
            if let Some(pos) = list.iter().position(|&v| v == lit.var()) {
                list.swap_remove(pos);
                self.flip[idx] ^= !lit.is_negated();
                self.touched.insert(idx);
                if list.len() == 2 {
                    newly_two.push(TwoLongXor::new(list[0], list[1], self.flip[idx]));
                }
            }
        }
        newly_two
    }

    /// Undo `assign`, restoring `lit.var()` to the xors' remaining sets for
    /// a cancelled probe branch.
    pub fn unassign(&mut self, lit: Lit) {
        for &idx in &self.occur[lit.var().index()].clone() {
            let list = &mut self.remaining[idx];
            if !list.contains(&lit.var()) {
                list.push(lit.var());
                self.flip[idx] ^= !lit.is_negated();
            }
        }
    }

    pub fn clear_touched(&mut self) {
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_sorts_variables() {
        let a = Var::new(5);
        let b = Var::new(1);
        let x = TwoLongXor::new(a, b, true);
        assert_eq!(x.v0, b);
        assert_eq!(x.v1, a);
    }

    #[test]
    fn flip_toggles_inverted() {
        let x = TwoLongXor::new(Var::new(0), Var::new(1), false);
        assert!(x.flip(true).inverted);
        assert!(!x.flip(false).inverted);
    }

    /// `v0 ⊕ v1 ⊕ v2 = true`, then `v2` is assigned true on the probe
    /// branch: the surviving 2-long xor must be `v0 ⊕ v1 = false`, i.e.
    /// `inverted == true`.
    #[test]
    fn assign_folds_truth_value_not_literal_sign() {
        let v0 = Var::new(0);
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        let mut tracker = XorTracker::new(3, vec![XorClause { vars: vec![v0, v1, v2], rhs: true }]);

        let shrunk = tracker.assign(Lit::new(v2, false));
        assert_eq!(shrunk.len(), 1);
        assert_eq!(shrunk[0], TwoLongXor::new(v0, v1, true));

        tracker.unassign(Lit::new(v2, false));
        let shrunk_again = tracker.assign(Lit::new(v2, true));
        assert_eq!(shrunk_again[0], TwoLongXor::new(v0, v1, false));
    }
}
