//! Hyper-binary resolution and useless-binary removal (`spec.md` §4.5.5,
//! §4.5.6), grounded on `FailedLitSearcher::hyperBinResAll` /
//! `hyperBinResolution` / `addMyImpliesSetAsBins`.

use crate::{
    assign::PropBy,
    propagate::PropEngine,
    types::Lit,
};
use std::collections::BTreeSet;

/// Per-variable bookkeeping for the binary-only implication DAG built while
/// re-propagating a probe literal (`spec.md` §3.6 `binPropData`).
#[derive(Clone, Copy, Debug)]
pub struct BinPropData {
    /// Depth in the binary-only DAG rooted at the probe literal; `0` for
    /// the root itself.
    pub depth: u32,
    /// The literal one step closer to the root along the path this literal
    /// was actually derived on.
    pub ancestor: Lit,
    pub ancestor_is_learnt: bool,
    /// Whether *any* edge on the path from the root down to this literal is
    /// learnt (`learntLeadHere` in `FailedLitSearcher.cpp`).
    pub path_has_learnt: bool,
    pub has_children: bool,
}

impl Default for BinPropData {
    fn default() -> BinPropData {
        BinPropData {
            depth: 0,
            ancestor: Lit::from(1),
            ancestor_is_learnt: false,
            path_has_learnt: false,
            has_children: false,
        }
    }
}

/// A binary clause marked redundant, queued for removal from the watch
/// index (`spec.md` §4.5.6). `lit1`/`lit2` are the clause's two literals in
/// the same (non-negated) form `PropEngine::attach_bin_clause` takes them,
/// so removal looks them up the same way attachment pushed them: at keys
/// `!lit1` and `!lit2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UselessBin {
    pub lit1: Lit,
    pub lit2: Lit,
    pub learnt: bool,
}

/// A hyper-binary clause `(¬anchor, implied)` scheduled for materialization
/// (`spec.md` §4.5.5 step 3, "needToAddBinClause"): `anchor` is either a
/// node deeper in the binary-only DAG whose own implied set already covers
/// `implied`, or — when no such node exists — the probe root itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingHyperBin {
    pub anchor_neg: Lit,
    pub implied: Lit,
}

/// Re-propagate `root` binary-only (non-learnt and learnt both count, since
/// this builds the DAG against which hyper-bin anchors are chosen), filling
/// `bin_prop_data` for every newly-reached variable and returning the trail
/// segment in derivation order together with any binary clauses found
/// redundant along the way (`spec.md` §4.5.5 step 1, §4.5.6).
///
/// The redundant-edge detection itself happens *inside*
/// `PropEngine::propagate_bin`, live, the moment a second binary watcher
/// re-derives an already-true literal (`FailedLitSearcher.cpp`'s own
/// `propagateBin`/`removeWhich` do the same at the point of re-derivation,
/// not as a separate pass afterwards) — this function just drains what that
/// call found and converts it to the watch-index-removal vocabulary.
pub fn binary_only_repropagate(
    engine: &mut PropEngine,
    root: Lit,
    bin_prop_data: &mut Vec<Option<BinPropData>>,
) -> (Vec<Lit>, Vec<UselessBin>) {
    let start = engine.trail.len();
    let confl = engine.propagate_bin();
    debug_assert!(confl.is_none(), "probe root must not conflict on its own binary closure");

    let useless = engine
        .drain_superseded_binaries()
        .into_iter()
        .map(|(lit1, lit2, learnt)| UselessBin { lit1, lit2, learnt })
        .collect();

    let mut depth_of = vec![0u32; engine.num_vars()];
    depth_of[root.var().index()] = 0;
    bin_prop_data[root.var().index()] = Some(BinPropData::default());

    for &x in &engine.trail[start..] {
        let vd = engine.var_data[x.var().index()];
        if let PropBy::Binary { other, learnt, .. } = vd.reason {
            let ancestor_depth = depth_of[other.var().index()];
            let ancestor_path_has_learnt = bin_prop_data[other.var().index()].map_or(false, |a| a.path_has_learnt);
            let path_has_learnt = learnt || ancestor_path_has_learnt;
            depth_of[x.var().index()] = ancestor_depth + 1;
            bin_prop_data[x.var().index()] = Some(BinPropData {
                depth: ancestor_depth + 1,
                ancestor: other,
                ancestor_is_learnt: learnt,
                path_has_learnt,
                has_children: false,
            });
            if let Some(parent) = bin_prop_data[other.var().index()].as_mut() {
                parent.has_children = true;
            }
        }
    }

    let mut segment: Vec<Lit> = engine.trail[start..].to_vec();
    segment.sort_by_key(|&l| (bin_prop_data[l.var().index()].unwrap().depth, depth_of[l.var().index()]));
    (segment, useless)
}

/// Binary-propagate `anchor` in isolation (from the already-cancelled
/// level-0 state) to compute everything it alone would imply, intersected
/// with `target`. Used by anchor selection's `myImpliesSet` (`spec.md`
/// §4.5.5 step 2).
pub fn implies_within(engine: &mut PropEngine, anchor: Lit, target: &BTreeSet<Lit>) -> BTreeSet<Lit> {
    debug_assert_eq!(engine.decision_level(), 0);
    engine.new_decision_level();
    let before = engine.trail.len();
    let mut result = BTreeSet::new();
    if engine.value(anchor).is_undef() {
        engine.enqueue(anchor, PropBy::None);
        let confl = engine.propagate_bin();
        if confl.is_none() {
            for &x in &engine.trail[before..] {
                if target.contains(&x) {
                    result.insert(x);
                }
            }
        }
    }
    engine.cancel_until_light(0);
    result
}

/// Anchor selection (`spec.md` §4.5.5 step 3): greedily pick the candidate
/// with the largest remaining `myImpliesSet`, emit one `(¬candidate, t)`
/// hyper-bin clause per literal `t` it covers, and clear covered literals
/// from every other candidate's set, until `unpropagated_bin` is empty or no
/// candidate covers anything left. Anything still uncovered after that falls
/// back to a direct `(¬root, t)` clause — sound by construction, since
/// `unpropagated_bin` only ever holds literals full propagation from `root`
/// already derived (`spec.md` §8 testable property 6).
pub fn choose_anchors(
    root: Lit,
    mut candidates: Vec<(Lit, BTreeSet<Lit>)>,
    unpropagated_bin: &mut BTreeSet<Lit>,
) -> Vec<PendingHyperBin> {
    let mut emitted = Vec::new();
    loop {
        candidates.iter_mut().for_each(|(_, set)| set.retain(|l| unpropagated_bin.contains(l)));
        candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.code().cmp(&b.0.code())));
        let Some((anchor, covered)) = candidates.first().cloned() else {
            break;
        };
        if covered.is_empty() {
            break;
        }
        log::trace!("hyper-bin anchor {anchor} covers {} of the missing implications", covered.len());
        for &t in &covered {
            emitted.push(PendingHyperBin { anchor_neg: !anchor, implied: t });
            unpropagated_bin.remove(&t);
        }
    }
    for &t in unpropagated_bin.iter() {
        emitted.push(PendingHyperBin { anchor_neg: !root, implied: t });
    }
    unpropagated_bin.clear();
    emitted
}
