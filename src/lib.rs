//! Two-watched-literal unit propagation plus failed-literal and
//! hyper-binary-resolution probing for a CDCL SAT solver.
//!
//! This crate is the hot inner loop of a solver, not a solver: it owns
//! variable/literal representation, clause storage, the watch index, the
//! propagation engine, and the prober that rides on top of it. Decision
//! heuristics, restarts, clause learning, and DIMACS I/O are someone else's
//! job (`collab` names the seams).
//!
//! ```
//! use wlprop::{assign::PropBy, propagate::PropEngine, types::Lit};
//!
//! let mut engine = PropEngine::new();
//! let v1 = engine.new_var();
//! let v2 = engine.new_var();
//! engine.attach_bin_clause(Lit::new(v1, false), Lit::new(v2, false), false);
//! engine.enqueue(Lit::new(v1, true), PropBy::None);
//! assert!(engine.propagate().is_none());
//! assert!(engine.value(Lit::new(v2, false)).is_true());
//! ```

pub mod assign;
pub mod cdb;
pub mod collab;
pub mod config;
pub mod error;
pub mod prober;
pub mod propagate;
pub mod types;

pub use config::ProbeConfig;
pub use error::{MaybeInconsistent, SolverError};
pub use prober::Prober;
pub use propagate::PropEngine;
