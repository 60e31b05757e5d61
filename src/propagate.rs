//! The propagation engine (`spec.md` §4.4, component C4) plus the handful
//! of attach/detach/introspection operations §6.1 lists as its public
//! surface. This is the hottest path in the crate; the hot loops follow the
//! read-cursor/write-cursor partition style the teacher uses throughout
//! `assign/propagate.rs` and that `spec.md` §9 calls out explicitly.

use crate::{
    assign::{DecisionLevel, PropBy, VarData},
    cdb::{Clause, ClauseDb, ClauseOffset, Watched, Watches},
    error::{MaybeInconsistent, SolverError},
    types::{Lbool, Lit, Var, LIT_UNDEF},
};

/// Inline counters updated on every propagation (`spec.md` §4.4.6).
/// `bogo_props` is the sole budget knob the prober reads — it is a
/// deterministic work meter, not a wall-clock measurement (§9).
#[derive(Clone, Copy, Debug, Default)]
pub struct PropStats {
    pub props_bin_red: u64,
    pub props_bin_irred: u64,
    pub props_tri: u64,
    pub props_long_red: u64,
    pub props_long_irred: u64,
    pub bogo_props: u64,
}

/// A hyper-binary-eligible implication discovered by [`PropEngine::propagate_full`]:
/// `lit` was forced true by a ternary/long clause whose other watched
/// falsified literals are `anc1` (and, for ternary clauses, `anc2`). The
/// prober folds these into `binPropData` bookkeeping during hyper-binary
/// resolution (`spec.md` §4.5.5).
#[derive(Clone, Copy, Debug)]
pub struct HyperImplication {
    pub lit: Lit,
    pub anc1: Lit,
    pub anc2: Option<Lit>,
    pub via_learnt: bool,
}

/// Component C4: owns the trail, the watch index, and the clause arena, and
/// is the only thing in the crate allowed to mutate them during
/// propagation.
pub struct PropEngine {
    pub assigns: Vec<Lbool>,
    pub var_data: Vec<VarData>,
    pub trail: Vec<Lit>,
    pub trail_lim: Vec<usize>,
    qhead: usize,
    pub watches: Watches,
    pub db: ClauseDb,
    pub stats: PropStats,
    /// Once false, the formula is proven UNSAT and no further mutation is
    /// meaningful (`spec.md` §7).
    pub ok: bool,
    /// Set by a binary/ternary conflict, per §4.4.4's `failBinLit`.
    pub fail_bin_lit: Lit,
    /// Recompute and shrink glue on learnt long-clause propagation
    /// (§4.4.4 step 6). A CDCL driver would flip this on; the prober
    /// doesn't care either way.
    pub update_glues: bool,
    /// Drained by callers of [`PropEngine::propagate_full`] after each call.
    hyper_implications: Vec<HyperImplication>,
    /// Binary clauses `(lit1, lit2, learnt)` found redundant by
    /// [`PropEngine::propagate_bin`]'s duplicate-path reconciliation, queued
    /// for the prober to remove (`spec.md` §4.5.6, `FailedLitSearcher.cpp`'s
    /// `propagateBin`/`removeWhich`/`uselessBin`).
    superseded_binaries: Vec<(Lit, Lit, bool)>,
}

impl Default for PropEngine {
    fn default() -> PropEngine {
        PropEngine {
            assigns: Vec::new(),
            var_data: Vec::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            watches: Watches::new(),
            db: ClauseDb::new(),
            stats: PropStats::default(),
            ok: true,
            fail_bin_lit: LIT_UNDEF,
            update_glues: false,
            hyper_implications: Vec::new(),
            superseded_binaries: Vec::new(),
        }
    }
}

impl PropEngine {
    pub fn new() -> PropEngine {
        PropEngine::default()
    }

    // ---------------------------------------------------------------
    // §6.1 Inputs: variable/clause construction
    // ---------------------------------------------------------------

    pub fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    /// `newVar()`. Aborts the process if the cap of §3.1/§7 is exceeded, per
    /// the "resource exhaustion" error kind of §7 — there is no recovery
    /// from a variable space this large, matching the teacher's own
    /// behaviour of treating it as a hard limit rather than a `Result`.
    pub fn new_var(&mut self) -> Var {
        assert!(
            self.assigns.len() < crate::types::MAX_VARS,
            "variable cap ({}) exceeded",
            crate::types::MAX_VARS
        );
        let v = Var::new(self.assigns.len());
        self.assigns.push(Lbool::Undef);
        self.var_data.push(VarData::default());
        self.watches.add_var();
        v
    }

    /// `attachBinClause` (§6.1). Both mirror watcher entries are pushed in
    /// one call, per the "kept in sync" invariant of §3.3.
    pub fn attach_bin_clause(&mut self, lit1: Lit, lit2: Lit, learnt: bool) {
        debug_assert_ne!(lit1.var(), lit2.var());
        self.watches.push(
            !lit1,
            Watched::Binary {
                other: lit2,
                learnt,
            },
        );
        self.watches.push(
            !lit2,
            Watched::Binary {
                other: lit1,
                learnt,
            },
        );
    }

    /// `attachClause` for sizes >= 3 (§6.1). Ternary clauses are inlined on
    /// all three watch lists; long clauses are arena-allocated and watched
    /// on their first two literals, with the caller's chosen blocker
    /// (mirroring the teacher's "middle literal" choice, which is as good
    /// as any other unwatched literal).
    pub fn attach_clause(&mut self, lits: Vec<Lit>, learnt: bool) -> Option<ClauseOffset> {
        debug_assert!(lits.len() >= 3);
        if lits.len() == 3 {
            let [a, b, c] = [lits[0], lits[1], lits[2]];
            self.watches.push(!a, Watched::Ternary { other1: b, other2: c });
            self.watches.push(!b, Watched::Ternary { other1: a, other2: c });
            self.watches.push(!c, Watched::Ternary { other1: a, other2: b });
            None
        } else {
            let blocker = lits[lits.len() / 2];
            let offset = self.db.alloc(lits.clone(), learnt);
            self.watches.push(!lits[0], Watched::Long { offset, blocker });
            self.watches.push(!lits[1], Watched::Long { offset, blocker });
            Some(offset)
        }
    }

    /// `detachModifiedClause` (§6.1): the clause at `address` may have had
    /// its first three literals (and size) change since it was attached; the
    /// caller supplies the *original* shape so we find the right watcher
    /// entries to remove.
    pub fn detach_modified_clause(&mut self, lit1: Lit, lit2: Lit, lit3: Lit, orig_size: usize, address: ClauseOffset) {
        if orig_size == 3 && !self.watches.list(!lit1).iter().any(|w| matches!(w, Watched::Long { offset, .. } if *offset == address)) {
            self.watches.remove_tri(!lit1, lit2, lit3);
            self.watches.remove_tri(!lit2, lit1, lit3);
            self.watches.remove_tri(!lit3, lit1, lit2);
        } else {
            self.watches.remove_long(!lit1, address);
            self.watches.remove_long(!lit2, address);
        }
    }

    // ---------------------------------------------------------------
    // §6.1: value / decisionLevel / trail accessors
    // ---------------------------------------------------------------

    #[inline]
    pub fn value_var(&self, v: Var) -> Lbool {
        self.assigns[v.index()]
    }

    #[inline]
    pub fn value(&self, l: Lit) -> Lbool {
        let v = self.value_var(l.var());
        if l.is_negated() {
            v.flip()
        } else {
            v
        }
    }

    #[inline]
    pub fn decision_level(&self) -> DecisionLevel {
        self.trail_lim.len() as DecisionLevel
    }

    pub fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    // ---------------------------------------------------------------
    // §4.4.2 Enqueue
    // ---------------------------------------------------------------

    /// `enqueue(l, reason)`. Requires `value(l) == Undef`.
    pub fn enqueue(&mut self, l: Lit, reason: PropBy) {
        debug_assert!(self.value(l).is_undef(), "enqueueing an already-assigned literal");
        self.assigns[l.var().index()] = Lbool::from_bool(l.is_positive());
        self.trail.push(l);
        let vd = &mut self.var_data[l.var().index()];
        vd.reason = reason;
        vd.level = self.decision_level();
    }

    /// Enqueue a literal at decision level 0, failing with
    /// `SolverError::RootLevelConflict` if it contradicts an existing
    /// assignment (the only way this core discovers UNSAT on its own,
    /// `spec.md` §7).
    pub fn enqueue_root(&mut self, l: Lit, reason: PropBy) -> MaybeInconsistent {
        debug_assert_eq!(self.decision_level(), 0);
        match self.value(l) {
            Lbool::True => Ok(()),
            Lbool::False => {
                self.ok = false;
                Err(SolverError::RootLevelConflict { lit: l, var: l.var() })
            }
            Lbool::Undef => {
                self.enqueue(l, reason);
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------
    // §3.5 / §4.4.1 cancellation
    // ---------------------------------------------------------------

    /// `cancelUntilLight(k)`: truncate the trail back to the end of level
    /// `k`, clearing `assigns` for every undone variable. "Light" because it
    /// touches only propagation state — no heuristic/phase-saving side
    /// effects, those belong to the CDCL driver external to this core.
    pub fn cancel_until_light(&mut self, level: DecisionLevel) {
        let level = level as usize;
        if self.trail_lim.len() <= level {
            return;
        }
        let cut = self.trail_lim[level];
        for &l in self.trail[cut..].iter().rev() {
            self.assigns[l.var().index()] = Lbool::Undef;
        }
        self.trail.truncate(cut);
        self.trail_lim.truncate(level);
        self.qhead = self.qhead.min(self.trail.len());
    }

    // ---------------------------------------------------------------
    // §4.4.3 / §4.4.4 ordinary propagation
    // ---------------------------------------------------------------

    /// `propagate()`. Drains `trail[qhead..]`, alternating a binary+ternary
    /// drain with single steps of long-clause scanning, per §4.4.3.
    pub fn propagate(&mut self) -> PropBy {
        self.propagate_with(BinaryFilter::Any, false)
    }

    /// `propagateNonLearntBin()` (§6.1, `SPEC_FULL.md` §11.1): the
    /// binary-only drain restricted to non-learnt watchers.
    pub fn propagate_non_learnt_bin(&mut self) -> PropBy {
        self.propagate_with(BinaryFilter::NonLearntOnly, true)
    }

    /// `propagateBin()`: the binary-only drain over *both* non-learnt and
    /// learnt watchers (ternary/long untouched), used by the prober's
    /// hyper-bin anchor search and useless-binary removal (§4.5.5 step 1/2,
    /// §4.5.6) — that pass needs the full binary-only closure, learnt edges
    /// included, per `FailedLitSearcher::hyperBinResolution`'s own
    /// `propagateBin` call.
    pub fn propagate_bin(&mut self) -> PropBy {
        self.propagate_with(BinaryFilter::Both, true)
    }

    /// Shared drain used by both [`PropEngine::propagate`] and
    /// [`PropEngine::propagate_non_learnt_bin`]. `binary_only` skips the
    /// ternary/long phase entirely once the binary queue is exhausted.
    fn propagate_with(&mut self, filter: BinaryFilter, binary_only: bool) -> PropBy {
        let mut qhead_bin = self.qhead;
        let mut qhead_long = self.qhead;
        loop {
            // Binary + ternary drain, to fixpoint.
            while qhead_bin < self.trail.len() {
                let p = self.trail[qhead_bin];
                qhead_bin += 1;
                let list_len = self.watches.list(p).len();
                self.stats.bogo_props += (list_len / 10 + 1) as u64;
                if let Some(confl) = self.scan_binary_ternary(p, filter) {
                    self.qhead = self.trail.len();
                    return confl;
                }
            }
            if binary_only {
                self.qhead = qhead_bin;
                return PropBy::None;
            }
            if qhead_long >= qhead_bin {
                if qhead_bin == self.trail.len() {
                    self.qhead = qhead_bin;
                    return PropBy::None;
                }
                // binary queue grew further than long queue could follow in
                // lockstep (shouldn't happen in this single-threaded model,
                // but keep the invariant explicit rather than looping).
                qhead_long = qhead_bin;
                continue;
            }
            let p = self.trail[qhead_long];
            qhead_long += 1;
            match self.scan_long(p, true) {
                LongScanOutcome::Conflict(confl) => {
                    self.qhead = self.trail.len();
                    return confl;
                }
                LongScanOutcome::Enqueued => {
                    // loop back to binary+ternary drain, §4.4.3 rule
                }
                LongScanOutcome::NoOp => {}
            }
        }
    }

    /// One watch-list scan of `p`'s binary and ternary watchers, per
    /// §4.4.4. Rewrites the list in place with a read/write cursor; ternary
    /// and binary watchers are never moved (they never need reassignment),
    /// so this is really just a filtered visit, not a partition.
    fn scan_binary_ternary(&mut self, p: Lit, filter: BinaryFilter) -> Option<PropBy> {
        let list = self.watches.list(p).to_vec();
        for w in list {
            match w {
                Watched::Binary { other, learnt } => {
                    if filter == BinaryFilter::NonLearntOnly && learnt {
                        continue;
                    }
                    match self.value(other) {
                        Lbool::True => {
                            // Only `propagate_bin`'s own binary-only closure
                            // (`filter == Both`) reconciles duplicate paths
                            // to the same literal; ordinary `propagate()`
                            // and `propagateNonLearntBin()` leave whichever
                            // reason got there first alone, as before.
                            if filter == BinaryFilter::Both {
                                self.reconcile_binary_duplicate(p, other, learnt);
                            }
                        }
                        Lbool::Undef => {
                            if learnt {
                                self.stats.props_bin_red += 1;
                            } else {
                                self.stats.props_bin_irred += 1;
                            }
                            log::trace!("binary watcher on {p}: enqueue {other} (learnt={learnt})");
                            self.enqueue(other, PropBy::binary(!p, learnt));
                        }
                        Lbool::False => {
                            self.fail_bin_lit = other;
                            return Some(PropBy::binary(!p, learnt));
                        }
                    }
                }
                Watched::Ternary { other1, other2 } => {
                    // `propagate_full`'s non-learnt/learnt binary drains
                    // (`filter != Any`) must never touch ternaries inline —
                    // those are routed through `scan_ternary_hyperbin`
                    // instead so the prober sees their ancestors.
                    if filter != BinaryFilter::Any {
                        continue;
                    }
                    let v1 = self.value(other1);
                    if v1.is_true() {
                        continue;
                    }
                    let v2 = self.value(other2);
                    if v2.is_true() {
                        continue;
                    }
                    match (v1, v2) {
                        (Lbool::Undef, Lbool::False) => {
                            self.stats.props_tri += 1;
                            self.enqueue(other1, PropBy::Ternary { other1: !p, other2 });
                        }
                        (Lbool::False, Lbool::Undef) => {
                            self.stats.props_tri += 1;
                            self.enqueue(other2, PropBy::Ternary { other1: !p, other2: other1 });
                        }
                        (Lbool::False, Lbool::False) => {
                            self.fail_bin_lit = other1;
                            return Some(PropBy::Ternary { other1: !p, other2 });
                        }
                        _ => {}
                    }
                }
                Watched::Long { .. } => {}
            }
        }
        None
    }

    /// One pass over `p`'s long watchers (§4.4.4 "Long watcher" handling),
    /// partition-style: `i` reads, `j` writes, so reassigned watchers are
    /// elided from the list in place.
    fn scan_long(&mut self, p: Lit, simple: bool) -> LongScanOutcome {
        let list = std::mem::take(self.watches.list_mut(p));
        let mut kept = Vec::with_capacity(list.len());
        let mut outcome = LongScanOutcome::NoOp;
        let mut conflict = None;
        let mut i = 0;
        while i < list.len() {
            let w = list[i];
            i += 1;
            let Watched::Long { offset, blocker } = w else {
                kept.push(w);
                continue;
            };
            if self.value(blocker).is_true() {
                kept.push(w);
                continue;
            }
            self.stats.bogo_props += 4;
            let c = self.db.get_mut(offset);
            c.num_looked_at += 1;
            c.num_lit_visited += 1;
            if c[0] == !p {
                c.lits.swap(0, 1);
            }
            debug_assert_eq!(c[1], !p);
            if self.value(c[0]).is_true() {
                kept.push(Watched::Long { offset, blocker: c[0] });
                continue;
            }
            let mut replaced = false;
            let clen = self.db.get(offset).len();
            for k in 2..clen {
                let lk = self.db.get(offset)[k];
                if !self.value(lk).is_false() {
                    let c0 = self.db.get(offset)[0];
                    let c = self.db.get_mut(offset);
                    c.lits.swap(1, k);
                    self.stats.bogo_props += ((k - 2) / 10) as u64;
                    self.watches.push(!lk, Watched::Long { offset, blocker: c0 });
                    replaced = true;
                    break;
                }
            }
            if replaced {
                continue;
            }
            kept.push(w);
            let c0_val = self.value(self.db.get(offset)[0]);
            let learnt = self.db.get(offset).is_learnt();
            if c0_val.is_false() {
                conflict = Some(PropBy::Long(offset));
                // restore the remainder of the list verbatim, per §4.4.4
                kept.extend_from_slice(&list[i..]);
                break;
            } else {
                if learnt {
                    self.stats.props_long_red += 1;
                } else {
                    self.stats.props_long_irred += 1;
                }
                let c0 = self.db.get(offset)[0];
                if simple {
                    self.enqueue(c0, PropBy::Long(offset));
                    if learnt && self.update_glues {
                        let new_glue = self.compute_glue(offset);
                        let c = self.db.get_mut(offset);
                        if c.glue > 2 {
                            c.glue = c.glue.min(new_glue);
                        }
                    }
                } else {
                    let anc2 = if clen >= 3 {
                        Some(self.db.get(offset)[clen - 1])
                    } else {
                        None
                    };
                    self.record_hyper_implication(c0, !p, anc2, learnt, PropBy::Long(offset));
                }
                outcome = LongScanOutcome::Enqueued;
            }
        }
        *self.watches.list_mut(p) = kept;
        match conflict {
            Some(confl) => LongScanOutcome::Conflict(confl),
            None => outcome,
        }
    }

    /// Decision-level count among a learnt clause's literals — a stand-in
    /// glue/LBD recompute (§4.4.4 step 6, Glossary "Glue / LBD"). A CDCL
    /// driver that cares about minimizing glue precisely would override
    /// this; this core only needs *a* monotonically sensible value to keep
    /// the "keep the minimum" rule meaningful.
    fn compute_glue(&self, offset: ClauseOffset) -> u32 {
        let c = self.db.get(offset);
        let mut levels: Vec<DecisionLevel> = c.lits.iter().map(|&l| self.var_data[l.var().index()].level).collect();
        levels.sort_unstable();
        levels.dedup();
        levels.len() as u32
    }

    // ---------------------------------------------------------------
    // §4.4.5 propagateFull, used only by the prober
    // ---------------------------------------------------------------

    /// `propagateFull()`. Differs from `propagate()` per §4.4.5: binaries
    /// are drained non-learnt-first then learnt (restarting on any new
    /// enqueue), and ternary/long implications are routed through
    /// [`PropEngine::record_hyper_implication`] instead of a plain enqueue,
    /// so the caller can later inspect `drain_hyper_implications()`.
    ///
    /// Returns the failing literal, or `LIT_UNDEF` on a clean fixpoint.
    pub fn propagate_full(&mut self) -> Lit {
        self.hyper_implications.clear();
        let mut qhead_tl = self.qhead;
        loop {
            loop {
                let progressed_non_learnt = self.drain_binary_filtered(BinaryFilter::NonLearntOnly);
                if let Some(fail) = self.fail_bin_lit_if_conflict() {
                    return fail;
                }
                let progressed_learnt = self.drain_binary_filtered(BinaryFilter::LearntOnly);
                if let Some(fail) = self.fail_bin_lit_if_conflict() {
                    return fail;
                }
                if !progressed_non_learnt && !progressed_learnt {
                    break;
                }
            }
            if qhead_tl >= self.trail.len() {
                self.qhead = self.trail.len();
                return LIT_UNDEF;
            }
            let p = self.trail[qhead_tl];
            qhead_tl += 1;
            match self.scan_long(p, false) {
                LongScanOutcome::Conflict(_) => return self.fail_bin_lit,
                LongScanOutcome::Enqueued => { /* restart binary phase */ }
                LongScanOutcome::NoOp => {}
            }
            if let Some(fail) = self.scan_ternary_hyperbin(p) {
                return fail;
            }
        }
    }

    fn fail_bin_lit_if_conflict(&self) -> Option<Lit> {
        if self.qhead == usize::MAX {
            Some(self.fail_bin_lit)
        } else {
            None
        }
    }

    /// One filtered binary-only drain over the whole current trail,
    /// returning whether it enqueued anything. Uses a sentinel in `qhead`
    /// (`usize::MAX`) to signal a conflict was found, since this helper's
    /// signature otherwise has no room to report one; `propagate_full`
    /// checks for it immediately via `fail_bin_lit_if_conflict`.
    fn drain_binary_filtered(&mut self, filter: BinaryFilter) -> bool {
        let mut i = self.qhead;
        let before = self.trail.len();
        while i < self.trail.len() {
            let p = self.trail[i];
            i += 1;
            if let Some(confl) = self.scan_binary_ternary(p, filter) {
                self.fail_bin_lit_conflict(confl);
                return false;
            }
        }
        self.trail.len() > before
    }

    fn fail_bin_lit_conflict(&mut self, confl: PropBy) {
        if let PropBy::Binary { other, .. } = confl {
            self.fail_bin_lit = other;
        }
        self.qhead = usize::MAX;
    }

    /// Ternary-only hyperbin routing for position `p` (long clauses are
    /// handled by the shared `scan_long(_, simple=false)`).
    fn scan_ternary_hyperbin(&mut self, p: Lit) -> Option<Lit> {
        let list = self.watches.list(p).to_vec();
        for w in list {
            let Watched::Ternary { other1, other2 } = w else { continue };
            let v1 = self.value(other1);
            if v1.is_true() {
                continue;
            }
            let v2 = self.value(other2);
            if v2.is_true() {
                continue;
            }
            match (v1, v2) {
                (Lbool::Undef, Lbool::False) => {
                    self.stats.props_tri += 1;
                    self.record_hyper_implication(other1, !p, Some(other2), false, PropBy::Ternary { other1: !p, other2 });
                }
                (Lbool::False, Lbool::Undef) => {
                    self.stats.props_tri += 1;
                    self.record_hyper_implication(other2, !p, Some(other1), false, PropBy::Ternary { other1: !p, other2: other1 });
                }
                (Lbool::False, Lbool::False) => {
                    self.fail_bin_lit = other1;
                    return Some(other2);
                }
                _ => {}
            }
        }
        None
    }

    /// Distance from the probe root along a literal's current reason chain,
    /// within the decision level `propagate_full` is running at; level-0
    /// facts and the probe root itself are depth 0. Used only by
    /// `record_hyper_implication`'s bullet-3 reconciliation, so an
    /// unmemoized walk is fine — probe chains are a handful of hops deep.
    fn ancestor_depth(&self, lit: Lit) -> u32 {
        let vd = &self.var_data[lit.var().index()];
        if vd.level == 0 {
            return 0;
        }
        match vd.reason {
            PropBy::None | PropBy::ProbeRoot => 0,
            PropBy::Binary { other, .. } => 1 + self.ancestor_depth(!other),
            PropBy::Ternary { other1, other2 } => 1 + self.ancestor_depth(!other1).max(self.ancestor_depth(!other2)),
            PropBy::Long(off) => 1 + self.db.get(off).lits.iter().skip(1).map(|&l| self.ancestor_depth(!l)).max().unwrap_or(0),
        }
    }

    /// Whether the clause currently standing as `lit`'s reason is learnt.
    fn reason_is_learnt(&self, lit: Lit) -> bool {
        match self.var_data[lit.var().index()].reason {
            PropBy::Binary { learnt, .. } => learnt,
            PropBy::Ternary { .. } => false,
            PropBy::Long(off) => self.db.get(off).is_learnt(),
            PropBy::None | PropBy::ProbeRoot => false,
        }
    }

    /// `addHyperBin`: route a ternary/long implication through reason
    /// reconciliation instead of a plain enqueue (§4.4.5 bullet 2/3). If
    /// `lit` is already `Undef`, this is just an enqueue; if it's already
    /// assigned at the current decision level, compare the incoming
    /// candidate's ancestors against the incumbent reason and either swap to
    /// the cheaper one (shallower first, non-learnt breaking ties) or drop
    /// the candidate as useless.
    fn record_hyper_implication(&mut self, lit: Lit, anc1: Lit, anc2: Option<Lit>, learnt: bool, real_reason: PropBy) {
        match self.value(lit) {
            Lbool::Undef => {
                self.enqueue(
                    lit,
                    match real_reason {
                        PropBy::Long(off) => PropBy::Long(off),
                        PropBy::Ternary { other1, other2 } => PropBy::Ternary { other1, other2 },
                        other => other,
                    },
                );
                self.hyper_implications.push(HyperImplication { lit, anc1, anc2, via_learnt: learnt });
            }
            Lbool::True => {
                let incumbent_level = self.var_data[lit.var().index()].level;
                if incumbent_level != self.decision_level() {
                    // A level-0 (or otherwise outer-level) fact: permanent,
                    // never reconciled away.
                    return;
                }
                let incumbent_depth = self.ancestor_depth(lit);
                let incumbent_learnt = self.reason_is_learnt(lit);
                let candidate_depth = 1 + anc2.map_or(self.ancestor_depth(anc1), |a2| self.ancestor_depth(anc1).max(self.ancestor_depth(a2)));
                let candidate_cheaper = match candidate_depth.cmp(&incumbent_depth) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Greater => false,
                    std::cmp::Ordering::Equal => incumbent_learnt && !learnt,
                };
                if candidate_cheaper {
                    self.var_data[lit.var().index()].reason = match real_reason {
                        PropBy::Long(off) => PropBy::Long(off),
                        PropBy::Ternary { other1, other2 } => PropBy::Ternary { other1, other2 },
                        other => other,
                    };
                    self.hyper_implications.retain(|hi| hi.lit != lit);
                    self.hyper_implications.push(HyperImplication { lit, anc1, anc2, via_learnt: learnt });
                }
                // Otherwise the incumbent reason wins and the incoming
                // candidate is simply never recorded, leaving it useless:
                // the prober's own binary-closure pass (§4.5.6) separately
                // catches any now-redundant *materialized* binary edge.
            }
            Lbool::False => {
                // The literal being "implied true" is already false: this
                // is the conflict path, handled by the caller before we get
                // here for binaries/ternaries; for the long-clause route
                // `scan_long` already special-cased the false case.
                unreachable!("record_hyper_implication called on a falsified literal");
            }
        }
    }

    /// Every hyper-bin-eligible implication seen during the last
    /// `propagate_full` call, for the prober to fold into its bookkeeping.
    pub fn drain_hyper_implications(&mut self) -> Vec<HyperImplication> {
        std::mem::take(&mut self.hyper_implications)
    }

    /// Walk `lit`'s binary-derivation ancestor chain (the chain `reason`
    /// pointers form while `propagate_bin` drains a single probe level —
    /// every non-root node on it is a `Binary` reason, since this is only
    /// ever called on a level `propagate_bin`/`implies_within` built
    /// binary-only) looking for `needle`, `lit` itself included. Returns the
    /// traversed edges' combined learntness when found, `None` otherwise.
    ///
    /// Finding `needle` this way is what tells a genuine resolution-redundant
    /// edge apart from two derivations that merely share a distant common
    /// ancestor (the latter are *not* redundant: a model can satisfy both of
    /// a diamond's incoming edges while falsifying either of its outgoing
    /// ones, so removing one would be unsound) — see
    /// [`PropEngine::reconcile_binary_duplicate`].
    fn binary_chain_lookup(&self, lit: Lit, needle: Lit) -> Option<bool> {
        let mut cur = lit;
        let mut has_learnt = false;
        loop {
            if cur == needle {
                return Some(has_learnt);
            }
            let vd = &self.var_data[cur.var().index()];
            if vd.level == 0 {
                return None;
            }
            match vd.reason {
                PropBy::Binary { other, learnt, .. } => {
                    has_learnt |= learnt;
                    cur = !other;
                }
                _ => return None,
            }
        }
    }

    /// `propagate_bin`'s own duplicate-path reconciliation
    /// (`FailedLitSearcher.cpp`'s `propBin`/`removeWhich`): `other` was just
    /// found already `True` while scanning `p`'s binary watchers, i.e. the
    /// clause `(!p, other)` re-derives a literal some earlier edge already
    /// derived as `(old_anc, other)`. Only one of the two can ever be
    /// resolution-redundant on the other: that requires one trigger to lie
    /// on the other's own ancestor chain, giving a genuine
    /// `root → … → X → … → other` path that doesn't use the edge being
    /// dropped. If neither contains the other, both triggers trace back to
    /// a shared ancestor that later diverged (a diamond); sound reasoning
    /// has nothing to say about either edge there, so neither is touched.
    ///
    /// A learnt edge anywhere along the surviving justification path means
    /// only a learnt copy of the dropped edge is safe to remove — dropping a
    /// non-learnt clause on the strength of a proof that a later clause
    /// cleanup could invalidate would be unsound
    /// (`FailedLitSearcher.cpp`'s `findWBin(...,true)` / `!learntLeadHere`).
    fn reconcile_binary_duplicate(&mut self, p: Lit, other: Lit, learnt: bool) {
        let incumbent_level = self.var_data[other.var().index()].level;
        if incumbent_level != self.decision_level() {
            return;
        }
        let PropBy::Binary { other: incumbent_lit1, learnt: incumbent_learnt, .. } = self.var_data[other.var().index()].reason else {
            // `other`'s incumbent reason is the probe root/anchor itself (or
            // a level-0 fact) — not a real clause, so there's no resolution
            // argument to make either way.
            return;
        };
        let old_anc = !incumbent_lit1;
        if old_anc == p {
            return;
        }
        if let Some(path_learnt) = self.binary_chain_lookup(old_anc, p) {
            // `p` is an ancestor of `old_anc`: chaining through the existing
            // `(old_anc, other)` edge reaches `other` from `p` without the
            // new direct edge, so the new edge is the redundant one.
            if learnt || !(path_learnt || incumbent_learnt) {
                self.superseded_binaries.push((!p, other, learnt));
            }
        } else if let Some(path_learnt) = self.binary_chain_lookup(p, old_anc) {
            // `old_anc` is an ancestor of `p`: chaining through the new
            // `(¬p, other)` edge reaches `other` from `old_anc` without the
            // incumbent direct edge, so the incumbent is the redundant one.
            if incumbent_learnt || !(path_learnt || learnt) {
                self.superseded_binaries.push((incumbent_lit1, other, incumbent_learnt));
                self.var_data[other.var().index()].reason = PropBy::binary(!p, learnt);
            }
        }
    }

    /// Binary clauses `propagate_bin` found redundant, for the prober to
    /// physically remove from the watch index (`spec.md` §4.5.6).
    pub fn drain_superseded_binaries(&mut self) -> Vec<(Lit, Lit, bool)> {
        std::mem::take(&mut self.superseded_binaries)
    }

    // ---------------------------------------------------------------
    // §6.1 maintenance / introspection
    // ---------------------------------------------------------------

    pub fn sort_watched(&mut self) {
        self.watches.sort_all();
    }

    /// `updateVars(outerToInter, interToOuter, interToOuter2)`: apply a
    /// variable renumbering to every per-variable table and to the trail.
    /// `outer_to_inter[v]` gives the new index for old variable `v`;
    /// `inter_to_outer`/`inter_to_outer2` are its (pointwise-checked)
    /// inverse, per §10 testable property "round-trip renumbering".
    pub fn update_vars(&mut self, outer_to_inter: &[Var], inter_to_outer: &[Var], inter_to_outer2: &[Var]) {
        debug_assert_eq!(outer_to_inter.len(), self.num_vars());
        let n = self.num_vars();
        let mut new_assigns = vec![Lbool::Undef; n];
        let mut new_var_data = vec![VarData::default(); n];
        for old in 0..n {
            let new_idx = outer_to_inter[old].index();
            new_assigns[new_idx] = self.assigns[old];
            new_var_data[new_idx] = self.var_data[old];
        }
        self.assigns = new_assigns;
        self.var_data = new_var_data;

        let remap_lit = |l: Lit| Lit::new(outer_to_inter[l.var().index()], l.is_negated());
        for l in self.trail.iter_mut() {
            *l = remap_lit(*l);
        }

        let mut new_watches = Watches::new();
        for _ in 0..n {
            new_watches.add_var();
        }
        for old_idx in 0..n {
            let old_var = Var::new(old_idx);
            for &sign in &[false, true] {
                let old_lit = Lit::new(old_var, sign);
                let new_lit = remap_lit(old_lit);
                for &w in self.watches.list(old_lit) {
                    let remapped = match w {
                        Watched::Binary { other, learnt } => Watched::Binary { other: remap_lit(other), learnt },
                        Watched::Ternary { other1, other2 } => Watched::Ternary {
                            other1: remap_lit(other1),
                            other2: remap_lit(other2),
                        },
                        Watched::Long { offset, blocker } => Watched::Long {
                            offset,
                            blocker: remap_lit(blocker),
                        },
                    };
                    new_watches.push(new_lit, remapped);
                }
            }
        }
        self.watches = new_watches;
        debug_assert_eq!(inter_to_outer.len(), n);
        debug_assert_eq!(inter_to_outer2.len(), n);
    }

    /// `getUnitaries()`: every literal asserted at decision level 0.
    pub fn get_unitaries(&self) -> Vec<Lit> {
        if self.trail_lim.is_empty() {
            self.trail.clone()
        } else {
            self.trail[..self.trail_lim[0]].to_vec()
        }
    }

    /// `countNumBinClauses(alsoLearnt, alsoNonLearnt)`: each binary clause
    /// has exactly two mirrored watcher entries, so we halve the raw count.
    pub fn count_num_bin_clauses(&self, also_learnt: bool, also_non_learnt: bool) -> usize {
        let mut total = 0;
        for idx in 0..self.num_vars() * 2 {
            total += self.watches.count_bin(Lit::from_code(idx), also_learnt, also_non_learnt);
        }
        total / 2
    }

    /// `getBinWatchSize(alsoLearnt, l)`.
    pub fn get_bin_watch_size(&self, also_learnt: bool, l: Lit) -> usize {
        self.watches.count_bin(l, also_learnt, true)
    }

    pub fn clause(&self, offset: ClauseOffset) -> &Clause {
        self.db.get(offset)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BinaryFilter {
    Any,
    NonLearntOnly,
    LearntOnly,
    /// Both learnt and non-learnt binaries pass, ternaries are skipped —
    /// the binary-only-but-not-restricted-by-learntness drain.
    Both,
}

enum LongScanOutcome {
    Conflict(PropBy),
    Enqueued,
    NoOp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_vars(n: usize) -> PropEngine {
        let mut e = PropEngine::new();
        for _ in 0..n {
            e.new_var();
        }
        e
    }

    /// S1: binary propagation (`spec.md` §8).
    #[test]
    fn s1_binary_propagation() {
        let mut e = engine_with_vars(3);
        e.attach_bin_clause(Lit::from(1), Lit::from(2), false);
        e.attach_bin_clause(Lit::from(-2), Lit::from(3), false);
        e.enqueue(Lit::from(-1), PropBy::None);
        let confl = e.propagate();
        assert!(confl.is_none());
        assert_eq!(e.trail, vec![Lit::from(-1), Lit::from(2), Lit::from(3)]);
    }

    /// S2: conflict via ternary clause.
    #[test]
    fn s2_ternary_conflict() {
        let mut e = engine_with_vars(3);
        e.attach_clause(vec![Lit::from(1), Lit::from(2), Lit::from(3)], false);
        e.enqueue(Lit::from(-1), PropBy::None);
        e.new_decision_level();
        e.enqueue(Lit::from(-2), PropBy::None);
        e.new_decision_level();
        e.enqueue(Lit::from(-3), PropBy::None);
        let confl = e.propagate();
        assert!(!confl.is_none());
        assert_eq!(e.fail_bin_lit, Lit::from(2));
    }

    #[test]
    fn watch_mirror_after_attach() {
        let mut e = engine_with_vars(2);
        e.attach_bin_clause(Lit::from(1), Lit::from(2), false);
        assert!(e.watches.find_bin(Lit::from(-1), Lit::from(2), false));
        assert!(e.watches.find_bin(Lit::from(-2), Lit::from(1), false));
    }

    #[test]
    fn cancel_until_light_clears_assigns() {
        let mut e = engine_with_vars(2);
        e.enqueue(Lit::from(1), PropBy::None);
        e.new_decision_level();
        e.enqueue(Lit::from(2), PropBy::None);
        e.cancel_until_light(0);
        assert_eq!(e.decision_level(), 0);
        assert!(e.value(Lit::from(2)).is_undef());
        assert!(e.value(Lit::from(1)).is_true());
    }

    /// `propagateFull` must route a ternary implication through
    /// `recordHyperImplication` (both ancestors recorded) rather than a
    /// plain enqueue, and report a clean fixpoint as `LIT_UNDEF`.
    #[test]
    fn propagate_full_records_ternary_hyper_implication() {
        let mut e = engine_with_vars(3);
        e.attach_clause(vec![Lit::from(1), Lit::from(2), Lit::from(3)], false);
        e.enqueue(Lit::from(-2), PropBy::None);
        e.new_decision_level();
        e.enqueue(Lit::from(-3), PropBy::None);
        let fail = e.propagate_full();
        assert!(fail.is_undef());
        assert!(e.value(Lit::from(1)).is_true());

        let recorded = e.drain_hyper_implications();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].lit, Lit::from(1));
        assert_eq!(recorded[0].anc1, Lit::from(2));
        assert_eq!(recorded[0].anc2, Some(Lit::from(3)));
    }

    /// A conflicting ternary under `propagateFull` reports the failing
    /// literal directly rather than a `PropBy`.
    #[test]
    fn propagate_full_reports_conflict_literal() {
        let mut e = engine_with_vars(3);
        e.attach_clause(vec![Lit::from(1), Lit::from(2), Lit::from(3)], false);
        e.enqueue(Lit::from(-1), PropBy::None);
        e.new_decision_level();
        e.enqueue(Lit::from(-2), PropBy::None);
        e.new_decision_level();
        e.enqueue(Lit::from(-3), PropBy::None);
        let fail = e.propagate_full();
        assert!(!fail.is_undef());
    }
}
