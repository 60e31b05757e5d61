//! Prober tunables, see `SPEC_FULL.md` §10.3 and `spec.md` §4.5.1/§9.
//!
//! Plain struct of knobs with documented defaults, no builder/derive macros —
//! the teacher's own `config.rs` is exactly this shape (a flat struct of
//! scalar fields, each commented with its purpose and default).

/// Tunables for [`crate::prober::Prober::search`].
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    /// Base propagation budget for the sequential candidate pass
    /// (`numProps` in `spec.md` §4.5.1 step 2), before the multiplier and
    /// `config_scale` are applied.
    pub base_num_props: u64,
    /// Caller-provided "how big is this instance" scale factor folded into
    /// `numProps`; a CDCL driver would set this from clause/var counts.
    pub config_scale: f64,
    /// Growth factor applied to the multiplier when the previous call
    /// derived units on more than `unit_yield_threshold` of the unassigned
    /// variables.
    pub multiplier_growth: f64,
    /// Upper bound on the multiplier.
    pub multiplier_cap: f64,
    /// Fraction of unassigned variables that counts as "a lot of units were
    /// derived last time", triggering multiplier growth.
    pub unit_yield_threshold: f64,
    /// Gate the cache-based propagation pre-pass (§4.5.1 step 1).
    pub use_cache: bool,
    /// Gate hyper-binary resolution (§4.5.5). On by default; turning it off
    /// still leaves failed-literal/same-sign/2-XOR discovery intact.
    pub do_hyper_bin_res: bool,
    /// Gate useless-binary removal (§4.5.6), piggy-backed on the hyper-bin
    /// binary-only re-propagation.
    pub do_remove_useless_bins: bool,
    /// Enable the disabled-by-default tuple probing extension (§4.5.7).
    pub multi_level_probing: bool,
    /// Number of top polarity-imbalance candidates considered for tuple
    /// probing; see `spec.md` §9 "Source ambiguities".
    pub multi_level_threshold: usize,
}

impl Default for ProbeConfig {
    fn default() -> ProbeConfig {
        ProbeConfig {
            base_num_props: 30_000_000,
            config_scale: 1.0,
            multiplier_growth: 1.3,
            multiplier_cap: 2.0,
            unit_yield_threshold: 0.10,
            use_cache: true,
            do_hyper_bin_res: true,
            do_remove_useless_bins: true,
            multi_level_probing: false,
            multi_level_threshold: 30,
        }
    }
}
