//! Small flag sets, in the style of the teacher's `FlagClause`/`FlagVar`
//! (`shnarazk-splr/src/types/flags.rs`): a `bitflags!` struct per owner plus
//! a tiny accessor trait, rather than a handful of loose `bool` fields.

use bitflags::bitflags;

/// API for flag-bag properties, mirroring the teacher's `FlagIF`.
pub trait FlagIF {
    type FlagType;
    fn is(&self, flag: Self::FlagType) -> bool;
    fn set(&mut self, flag: Self::FlagType, b: bool);
    fn turn_on(&mut self, flag: Self::FlagType) {
        self.set(flag, true);
    }
    fn turn_off(&mut self, flag: Self::FlagType) {
        self.set(flag, false);
    }
}

bitflags! {
    /// Flags carried by a long clause (`spec.md` §2 C2, §4.4.4).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ClauseFlags: u8 {
        /// produced by conflict analysis, hence removable by clause deletion.
        const LEARNT = 0b0000_0001;
        /// touched since the last glue recompute; used by the vivifier/reducer,
        /// not by this crate, but kept so offsets stay layout-compatible with
        /// a CDCL driver built on top of this core.
        const USED   = 0b0000_0010;
    }
}

impl FlagIF for ClauseFlags {
    type FlagType = ClauseFlags;
    fn is(&self, flag: ClauseFlags) -> bool {
        self.contains(flag)
    }
    fn set(&mut self, flag: ClauseFlags, b: bool) {
        self.set(flag, b);
    }
}
