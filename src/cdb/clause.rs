//! Long clauses and the arena that owns them (`spec.md` §3.3, §4.2, C2).

use crate::types::{ClauseFlags, Lit};

/// A stable 32-bit offset into [`ClauseDb`]. The *only* way a long clause is
/// referenced from a watch list or a `PropBy` (`spec.md` §4.2: "Arena
/// offsets are the only way long clauses are referenced").
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ClauseOffset(u32);

impl ClauseOffset {
    #[inline]
    fn new(idx: usize) -> ClauseOffset {
        ClauseOffset(idx as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A clause of size >= 4 (ternary and binary clauses never enter the arena,
/// see §3.3). Carries the statistics a CDCL driver built on this core would
/// want (activity, glue) even though this core only reads/writes `glue` on
/// the hot path (§4.4.4 glue-minimisation step) and otherwise leaves them
/// alone.
#[derive(Clone, Debug)]
pub struct Clause {
    pub lits: Vec<Lit>,
    pub flags: ClauseFlags,
    pub activity: f32,
    pub glue: u32,
    pub num_looked_at: u32,
    pub num_lit_visited: u64,
}

impl Clause {
    fn new(lits: Vec<Lit>, learnt: bool) -> Clause {
        debug_assert!(lits.len() >= 4, "ternary and binary clauses don't live in the arena");
        let glue = lits.len() as u32;
        Clause {
            lits,
            flags: if learnt {
                ClauseFlags::LEARNT
            } else {
                ClauseFlags::empty()
            },
            activity: 0.0,
            glue,
            num_looked_at: 0,
            num_lit_visited: 0,
        }
    }

    #[inline]
    pub fn is_learnt(&self) -> bool {
        self.flags.contains(ClauseFlags::LEARNT)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::ops::Index<usize> for Clause {
    type Output = Lit;
    fn index(&self, i: usize) -> &Lit {
        &self.lits[i]
    }
}

impl std::ops::IndexMut<usize> for Clause {
    fn index_mut(&mut self, i: usize) -> &mut Lit {
        &mut self.lits[i]
    }
}

/// A single growable region holding every long clause, addressed by stable
/// offsets (`spec.md` §4.2). Deletion is tombstone-based (`live` flag per
/// slot) so existing offsets stay valid until an explicit [`ClauseDb::compact`].
#[derive(Clone, Debug, Default)]
pub struct ClauseDb {
    slots: Vec<Option<Clause>>,
    num_live: usize,
}

impl ClauseDb {
    pub fn new() -> ClauseDb {
        ClauseDb::default()
    }

    /// Allocate a new long clause, returning its stable offset. `lits[0]`
    /// and `lits[1]` must already be the two literals the caller intends to
    /// watch (the watch index is populated separately by the caller).
    pub fn alloc(&mut self, lits: Vec<Lit>, learnt: bool) -> ClauseOffset {
        let off = ClauseOffset::new(self.slots.len());
        self.slots.push(Some(Clause::new(lits, learnt)));
        self.num_live += 1;
        off
    }

    #[inline]
    pub fn get(&self, off: ClauseOffset) -> &Clause {
        self.slots[off.index()]
            .as_ref()
            .expect("dereferencing a freed clause offset")
    }

    #[inline]
    pub fn get_mut(&mut self, off: ClauseOffset) -> &mut Clause {
        self.slots[off.index()]
            .as_mut()
            .expect("dereferencing a freed clause offset")
    }

    /// Mark a clause's slot free. The offset becomes dangling; callers must
    /// have already detached all its watchers (`detach_clause` on the
    /// propagation engine).
    pub fn free(&mut self, off: ClauseOffset) {
        if self.slots[off.index()].take().is_some() {
            self.num_live -= 1;
        }
    }

    pub fn num_live(&self) -> usize {
        self.num_live
    }

    /// Move every live clause into a fresh, densely packed region, per
    /// `spec.md` §4.2. Returns the old-offset -> new-offset map so the
    /// caller can rewrite the watch index and any `PropBy::Long` reasons in
    /// lockstep, as the invariant in §4.2 requires.
    pub fn compact(&mut self) -> Vec<Option<ClauseOffset>> {
        let mut remap = vec![None; self.slots.len()];
        let mut fresh = Vec::with_capacity(self.num_live);
        for (old_idx, slot) in self.slots.drain(..).enumerate() {
            if let Some(clause) = slot {
                remap[old_idx] = Some(ClauseOffset::new(fresh.len()));
                fresh.push(Some(clause));
            }
        }
        self.slots = fresh;
        remap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Lit;

    fn lits(v: &[i32]) -> Vec<Lit> {
        v.iter().map(|&i| Lit::from(i)).collect()
    }

    #[test]
    fn offsets_are_stable_until_compaction() {
        let mut db = ClauseDb::new();
        let a = db.alloc(lits(&[1, 2, 3, 4]), false);
        let b = db.alloc(lits(&[-1, -2, -3, -4]), true);
        assert_eq!(db.get(a).len(), 4);
        assert!(db.get(b).is_learnt());
        db.free(a);
        assert_eq!(db.num_live(), 1);
        // b's offset is still valid: compaction hasn't happened yet.
        assert!(db.get(b).is_learnt());
    }

    #[test]
    fn compact_remaps_surviving_offsets() {
        let mut db = ClauseDb::new();
        let a = db.alloc(lits(&[1, 2, 3, 4]), false);
        let b = db.alloc(lits(&[5, 6, 7, 8]), false);
        db.free(a);
        let remap = db.compact();
        assert_eq!(remap[a.index()], None);
        let new_b = remap[b.index()].expect("b survives compaction");
        assert_eq!(db.get(new_b).lits, lits(&[5, 6, 7, 8]));
    }
}
