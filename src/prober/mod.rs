//! The failed-literal / hyper-binary-resolution prober (`spec.md` §4.5,
//! component C5), grounded on CryptoMiniSat's `FailedLitSearcher::search`
//! and `tryBoth`.

mod hyperbin;
pub mod xor;

use crate::{
    assign::PropBy,
    config::ProbeConfig,
    propagate::PropEngine,
    types::{Lbool, Lit, Var},
};
use hyperbin::{binary_only_repropagate, choose_anchors, implies_within, BinPropData, PendingHyperBin, UselessBin};
use std::collections::{BTreeMap, BTreeSet};
use xor::{TwoLongXor, XorTracker};

/// A 2-XOR equivalence discovered during `tryBoth` Phase B, queued for the
/// external var-replacer collaborator (`spec.md` §4.5.2 Phase C, §6.2).
#[derive(Clone, Copy, Debug)]
pub struct BinXorCandidate {
    pub a: Var,
    pub b: Var,
    /// `a ⊕ b = ¬inverted`, per §4.5.3's convention.
    pub inverted: bool,
}

/// Component C5. Owns every piece of scratch state listed in `spec.md` §3.6;
/// the propagation engine itself is borrowed per call, matching the
/// teacher's pattern of a `Solver`-owning subsystem that is handed the
/// engine rather than owning one itself.
pub struct Prober {
    pub config: ProbeConfig,
    /// Was this variable implied on the current probe branch?
    propagated: Vec<bool>,
    /// The truth value observed for it, when `propagated[v]` is set.
    prop_value: Vec<Lbool>,
    propagated_vars: Vec<Var>,
    un_propagated_bin: BTreeSet<Lit>,
    bin_prop_data: Vec<Option<BinPropData>>,
    pub useless_bin: Vec<UselessBin>,
    pub need_to_add_bin_clause: Vec<PendingHyperBin>,
    trans_otf_cache: BTreeMap<Lit, Vec<Lit>>,
    last_time_stopped: usize,
    pub num_failed: u64,
    multiplier: f64,
    xors: Option<XorTracker>,
    /// 2-XOR equivalences discovered by Phase B, queued for the external
    /// var-replacer (`spec.md` §4.5.2 Phase C, §6.2).
    pub equivalences: Vec<BinXorCandidate>,
    /// Surviving 2-long xor candidates seen by both branches, likewise
    /// destined for the var-replacer.
    pub two_long_xors: Vec<TwoLongXor>,
}

impl Prober {
    pub fn new(config: ProbeConfig) -> Prober {
        Prober {
            config,
            propagated: Vec::new(),
            prop_value: Vec::new(),
            propagated_vars: Vec::new(),
            un_propagated_bin: BTreeSet::new(),
            bin_prop_data: Vec::new(),
            useless_bin: Vec::new(),
            need_to_add_bin_clause: Vec::new(),
            trans_otf_cache: BTreeMap::new(),
            last_time_stopped: 0,
            num_failed: 0,
            multiplier: 1.0,
            xors: None,
            equivalences: Vec::new(),
            two_long_xors: Vec::new(),
        }
    }

    /// Install the xor clauses live at the start of this call
    /// (`spec.md` §4.5.4). Optional: a formula with no long xors never
    /// needs this.
    pub fn set_xor_clauses(&mut self, n_vars: usize, clauses: Vec<xor::XorClause>) {
        self.xors = Some(XorTracker::new(n_vars, clauses));
    }

    fn ensure_capacity(&mut self, n_vars: usize) {
        if self.propagated.len() < n_vars {
            self.propagated.resize(n_vars, false);
            self.prop_value.resize(n_vars, Lbool::Undef);
            self.bin_prop_data.resize(n_vars, None);
        }
    }

    /// `search()` (`spec.md` §4.5.1). Returns `false` only if the formula
    /// was proven UNSAT during probing.
    pub fn search(&mut self, engine: &mut PropEngine) -> bool {
        let n = engine.num_vars();
        self.ensure_capacity(n);
        if n == 0 {
            return true;
        }
        log::info!(
            "probe search: nVars={n} multiplier={:.2} numFailed={}",
            self.multiplier,
            self.num_failed
        );

        if self.config.use_cache {
            self.run_cache_pass(engine);
            if !engine.ok {
                return false;
            }
        }

        let num_props = (self.config.base_num_props as f64 * self.multiplier * self.config.config_scale) as u64;
        let num_props_different = 2 * num_props;

        let mut units_derived_last_round = 0u64;
        let snapshot_trail_len = engine.trail.len();

        // Ordering 1: sequential, wrapping once from lastTimeStopped.
        let start = self.last_time_stopped % n;
        let sequential: Vec<Var> = (0..n).map(|i| Var::new((start + i) % n)).collect();
        units_derived_last_round += self.visit_candidates(engine, &sequential, num_props);
        self.last_time_stopped = (start + n) % n;
        if !engine.ok {
            return false;
        }

        // Ordering 2: polarity imbalance, descending by pos^2+neg^2-(pos-neg)^2.
        let by_polarity = self.order_by_polarity_imbalance(engine);
        units_derived_last_round += self.visit_candidates(engine, &by_polarity, num_props_different);
        if !engine.ok {
            return false;
        }

        // Ordering 3: decision-heuristic order. This core has no decision
        // heap of its own (§6.2: that lives in the CDCL driver), so absent
        // an externally supplied order we fall back to the natural index
        // order, which is a no-op pass when the first two orderings already
        // covered everything.
        let by_heuristic: Vec<Var> = (0..n).map(Var::new).collect();
        units_derived_last_round += self.visit_candidates(engine, &by_heuristic, num_props_different);
        if !engine.ok {
            return false;
        }

        let unassigned = (0..n).filter(|&i| engine.value_var(Var::new(i)).is_undef()).count().max(1);
        if units_derived_last_round as f64 > self.config.unit_yield_threshold * unassigned as f64 {
            self.multiplier = (self.multiplier * self.config.multiplier_growth).min(self.config.multiplier_cap);
        } else {
            self.multiplier = 1.0;
        }

        log::info!(
            "probe search done: {} units derived, numFailed={}, {} hyper-bin clauses pending, {} useless bins",
            engine.trail.len().saturating_sub(snapshot_trail_len),
            self.num_failed,
            self.need_to_add_bin_clause.len(),
            self.useless_bin.len()
        );
        true
    }

    /// Step 1 of §4.5.1: for every literal with a current transitive-closure
    /// cache entry, enqueue its cached implications directly at level 0.
    fn run_cache_pass(&mut self, engine: &mut PropEngine) {
        for (&lit, closure) in self.trans_otf_cache.clone().iter() {
            if !engine.value(lit).is_true() {
                continue;
            }
            for &x in closure {
                if engine.value(x).is_undef() {
                    engine.enqueue(x, PropBy::None);
                }
            }
        }
        if engine.decision_level() == 0 {
            let confl = engine.propagate();
            if !confl.is_none() {
                engine.ok = false;
            }
        }
    }

    fn order_by_polarity_imbalance(&self, engine: &PropEngine) -> Vec<Var> {
        let n = engine.num_vars();
        let mut scored: Vec<(i64, Var)> = (0..n)
            .filter(|&i| engine.value_var(Var::new(i)).is_undef() && !engine.var_data[i].elim.is_eliminated())
            .map(|i| {
                let v = Var::new(i);
                let pos = engine.get_bin_watch_size(true, Lit::new(v, false)) as i64;
                let neg = engine.get_bin_watch_size(true, Lit::new(v, true)) as i64;
                let score = pos * pos + neg * neg - (pos - neg) * (pos - neg);
                (score, v)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.index().cmp(&b.1.index())));
        scored.into_iter().map(|(_, v)| v).collect()
    }

    fn visit_candidates(&mut self, engine: &mut PropEngine, candidates: &[Var], budget: u64) -> u64 {
        let orig_bogo = engine.stats.bogo_props;
        let mut units = 0u64;
        for &v in candidates {
            if engine.stats.bogo_props.saturating_sub(orig_bogo) > budget {
                break;
            }
            if engine.value_var(v).is_undef() && !engine.var_data[v.index()].elim.is_eliminated() {
                let before = engine.trail.len();
                let ok = self.try_both(engine, Lit::new(v, false), Lit::new(v, true));
                if !ok {
                    engine.ok = false;
                    return units;
                }
                if engine.trail.len() > before {
                    units += (engine.trail.len() - before) as u64;
                }
            }
        }
        units
    }

    /// `tryBoth(l1, l2)` (`spec.md` §4.5.2). Returns `false` only if the
    /// formula was proven UNSAT.
    pub fn try_both(&mut self, engine: &mut PropEngine, l1: Lit, l2: Lit) -> bool {
        debug_assert_eq!(engine.decision_level(), 0);
        self.ensure_capacity(engine.num_vars());
        if !engine.value(l1).is_undef() {
            // Already decided at level 0: nothing left to probe. Also the
            // mechanism behind Testable Property 5 (`tryBoth` idempotence).
            return true;
        }
        if engine.var_data[l1.var().index()].elim.is_eliminated() {
            return true;
        }

        // -- Phase A: probe l1 --
        engine.new_decision_level();
        engine.enqueue(l1, PropBy::ProbeRoot);
        let confl_a = engine.propagate();
        if !confl_a.is_none() {
            engine.cancel_until_light(0);
            self.num_failed += 1;
            log::debug!("failed literal {l1}: forcing {}", !l1);
            if engine.enqueue_root(!l1, PropBy::None).is_err() {
                return false;
            }
            let confl = engine.propagate();
            if !confl.is_none() {
                return false;
            }
            return true;
        }

        let phase_a_segment: Vec<Lit> = engine.trail[engine.trail_lim[engine.trail_lim.len() - 1]..].to_vec();
        for &x in &phase_a_segment {
            self.propagated[x.var().index()] = true;
            self.prop_value[x.var().index()] = engine.value_var(x.var());
            self.propagated_vars.push(x.var());
        }
        for &x in &phase_a_segment[1..] {
            // skip index 0: that's l1 itself, the assumption, not something
            // implied that still needs a binary-reasoning explanation.
            self.un_propagated_bin.insert(x);
        }
        let phase_a_xors = self.shrink_xors(&phase_a_segment);
        if let Some(closure) = self.trans_otf_cache.get_mut(&!l1) {
            for &x in &phase_a_segment {
                if !closure.contains(&x) {
                    closure.push(x);
                }
            }
        } else {
            self.trans_otf_cache.insert(!l1, phase_a_segment.clone());
        }

        engine.cancel_until_light(0);
        self.expand_xors(&phase_a_segment);
        self.run_hyper_bin_resolution(engine, l1);
        self.materialize_pending_bins(engine);

        // -- Phase B: probe l2 --
        engine.new_decision_level();
        engine.enqueue(l2, PropBy::ProbeRoot);
        let confl_b = engine.propagate();
        let mut both_same: Vec<Lit> = Vec::new();
        let mut bin_xor_to_add: Vec<BinXorCandidate> = Vec::new();

        if !confl_b.is_none() {
            engine.cancel_until_light(0);
            self.num_failed += 1;
            self.clear_probe_scratch();
            if engine.enqueue_root(!l2, PropBy::None).is_err() {
                return false;
            }
            let confl = engine.propagate();
            if !confl.is_none() {
                return false;
            }
            return true;
        }

        let phase_b_segment: Vec<Lit> = engine.trail[engine.trail_lim[engine.trail_lim.len() - 1]..].to_vec();
        for &x in &phase_b_segment[1..] {
            // skip index 0: l2 itself, same reasoning as phase_a_segment above.
            self.un_propagated_bin.insert(x);
        }
        for &x in &phase_b_segment {
            let v = x.var();
            if self.propagated[v.index()] {
                let b_value = engine.value_var(v);
                if self.prop_value[v.index()] == b_value {
                    both_same.push(Lit::new(v, b_value == Lbool::False));
                } else if v != l1.var() {
                    let inverted = self.prop_value[v.index()] == Lbool::True;
                    bin_xor_to_add.push(BinXorCandidate { a: l1.var(), b: v, inverted });
                }
            }
        }
        let phase_b_xors = self.shrink_xors(&phase_b_segment);
        let survivors: Vec<TwoLongXor> = phase_b_xors.into_iter().filter(|x| phase_a_xors.contains(x)).collect();

        engine.cancel_until_light(0);
        self.expand_xors(&phase_b_segment);
        self.run_hyper_bin_resolution(engine, l2);
        self.materialize_pending_bins(engine);

        // -- Phase C: apply --
        if !both_same.is_empty() {
            log::debug!("same-sign literals for {}/{}: {:?}", l1, l2, both_same);
        }
        for lit in both_same {
            if engine.value(lit).is_undef() {
                if engine.enqueue_root(lit, PropBy::None).is_err() {
                    return false;
                }
            } else if engine.value(lit).is_false() {
                engine.ok = false;
                return false;
            }
        }
        let confl = engine.propagate();
        if !confl.is_none() {
            engine.ok = false;
            return false;
        }
        self.equivalences.extend(bin_xor_to_add.drain(..));
        self.two_long_xors.extend(survivors);

        self.clear_probe_scratch();
        true
    }

    fn clear_probe_scratch(&mut self) {
        for v in self.propagated_vars.drain(..) {
            self.propagated[v.index()] = false;
        }
        self.un_propagated_bin.clear();
        for entry in self.bin_prop_data.iter_mut() {
            *entry = None;
        }
    }

    fn shrink_xors(&mut self, segment: &[Lit]) -> Vec<TwoLongXor> {
        let Some(xors) = self.xors.as_mut() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for &l in segment {
            found.extend(xors.assign(l));
        }
        found
    }

    fn expand_xors(&mut self, segment: &[Lit]) {
        let Some(xors) = self.xors.as_mut() else {
            return;
        };
        for &l in segment.iter().rev() {
            xors.unassign(l);
        }
        xors.clear_touched();
    }

    /// `spec.md` §4.5.5: re-propagate `root` binary-only, build
    /// `binPropData`, pick anchors for every literal in `un_propagated_bin`
    /// not reachable by a single binary path, and queue hyper-bin clauses.
    ///
    /// Called once per phase of `tryBoth` with a different `root` each time;
    /// `bin_prop_data` is only reset in `clear_probe_scratch` at the very
    /// end, not between phases. This is
    /// safe: every entry this call reads was either just written for `root`
    /// itself (right above) or for some earlier-in-trail-order var from
    /// *this* call's own `segment` (an ancestor is always assigned, hence
    /// revisited, before its descendant in the same re-propagation). Leftover
    /// entries from the other phase belong to vars outside this call's
    /// `segment` and are never looked up.
    fn run_hyper_bin_resolution(&mut self, engine: &mut PropEngine, root: Lit) {
        if !self.config.do_hyper_bin_res && !self.config.do_remove_useless_bins {
            self.un_propagated_bin.clear();
            return;
        }
        debug_assert_eq!(engine.decision_level(), 0);
        engine.new_decision_level();
        engine.enqueue(root, PropBy::ProbeRoot);
        let (segment, useless) = binary_only_repropagate(engine, root, &mut self.bin_prop_data);
        if self.config.do_remove_useless_bins {
            self.useless_bin.extend(useless);
        }
        for x in &segment {
            self.un_propagated_bin.remove(x);
        }
        engine.cancel_until_light(0);

        if !self.config.do_hyper_bin_res || self.un_propagated_bin.is_empty() {
            self.un_propagated_bin.clear();
            return;
        }

        let target: BTreeSet<Lit> = self.un_propagated_bin.clone();
        let mut candidates: Vec<(Lit, BTreeSet<Lit>)> = Vec::new();
        for &x in &segment {
            let has_children = self.bin_prop_data[x.var().index()].map(|d| d.has_children).unwrap_or(false);
            if !has_children {
                continue;
            }
            let my_implies = implies_within(engine, x, &target);
            if !my_implies.is_empty() {
                candidates.push((x, my_implies));
            }
        }
        // `implies_within`'s own binary closures can turn up further
        // duplicate-path redundancies (`PropEngine::propagate_bin`'s
        // reconciliation fires there too); fold those in alongside the
        // ones `binary_only_repropagate` already found above. Always drained
        // regardless of the config flag so the engine-side queue can't grow
        // unbounded across probes.
        let more_useless = engine
            .drain_superseded_binaries()
            .into_iter()
            .map(|(lit1, lit2, learnt)| UselessBin { lit1, lit2, learnt });
        if self.config.do_remove_useless_bins {
            self.useless_bin.extend(more_useless);
        }
        let mut remaining = self.un_propagated_bin.clone();
        let emitted = choose_anchors(root, candidates, &mut remaining);
        self.need_to_add_bin_clause.extend(emitted);
        self.un_propagated_bin.clear();
    }

    fn materialize_pending_bins(&mut self, engine: &mut PropEngine) {
        for pend in self.need_to_add_bin_clause.drain(..) {
            if !engine.watches.find_bin(!pend.anchor_neg, pend.implied, false) {
                engine.attach_bin_clause(pend.anchor_neg, pend.implied, false);
            }
        }
        for ub in self.useless_bin.drain(..) {
            if engine.watches.find_bin(!ub.lit1, ub.lit2, ub.learnt) {
                engine.watches.remove_bin(!ub.lit1, ub.lit2, ub.learnt);
                engine.watches.remove_bin(!ub.lit2, ub.lit1, ub.learnt);
            }
        }
    }

    /// `tryMultiLevelAll` (`spec.md` §4.5.7): generalizes `tryBoth` from 2
    /// to `2^candidates.len()` sign combinations under a single decision
    /// level. Gated behind the `multi_level_probing` feature and the
    /// matching config flag since it is disabled by default upstream too.
    #[cfg(feature = "multi_level_probing")]
    pub fn try_multi_level(&mut self, engine: &mut PropEngine, candidates: &[Var]) -> bool {
        debug_assert_eq!(engine.decision_level(), 0);
        if candidates.len() > self.config.multi_level_threshold || candidates.is_empty() {
            return true;
        }
        let k = candidates.len();
        let mut implied_everywhere: Option<BTreeSet<Lit>> = None;

        for combo in 0..(1u32 << k) {
            engine.new_decision_level();
            for (i, &v) in candidates.iter().enumerate() {
                let negated = (combo >> i) & 1 == 1;
                let lit = Lit::new(v, negated);
                if engine.value(lit).is_undef() {
                    engine.enqueue(lit, PropBy::ProbeRoot);
                }
            }
            let confl = engine.propagate();
            if confl.is_none() {
                let segment: BTreeSet<Lit> = engine.trail[engine.trail_lim[engine.trail_lim.len() - 1]..]
                    .iter()
                    .copied()
                    .collect();
                implied_everywhere = Some(match implied_everywhere.take() {
                    Some(prev) => prev.intersection(&segment).copied().collect(),
                    None => segment,
                });
            } else {
                implied_everywhere = None;
            }
            engine.cancel_until_light(0);
        }

        if let Some(set) = implied_everywhere {
            for lit in set {
                if engine.value(lit).is_undef() && engine.enqueue_root(lit, PropBy::None).is_err() {
                    return false;
                }
            }
            let confl = engine.propagate();
            if !confl.is_none() {
                engine.ok = false;
                return false;
            }
        }
        true
    }
}
