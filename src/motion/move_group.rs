// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Move groups: fixed tables of staged moves, indexed by sequence id.
//!
//! The slot index is the execution order. Moves can arrive in any order; `execute` always walks
//! slot 0 first.

use super::moves::MoveVariant;

/// Groups per node.
pub const MAX_GROUPS: usize = 3;

/// Slots per group.
pub const MAX_MOVES_PER_GROUP: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct MoveGroup<const N: usize> {
    moves: [Option<MoveVariant>; N],
}

impl<const N: usize> MoveGroup<N> {
    pub const fn new() -> Self {
        Self { moves: [None; N] }
    }

    /// Store `m` in the slot named by its `seq_id`, replacing whatever was there. Returns `false`
    /// and leaves the group untouched if the slot does not exist.
    pub fn set_move(&mut self, m: impl Into<MoveVariant>) -> bool {
        let m = m.into();
        match self.moves.get_mut(m.seq_id() as usize) {
            Some(slot) => {
                *slot = Some(m);
                true
            }
            None => false,
        }
    }

    /// Contents of slot `seq_id`. `None` for an empty or nonexistent slot.
    pub fn get_move(&self, seq_id: usize) -> Option<MoveVariant> {
        self.moves.get(seq_id).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.moves = [None; N];
    }

    /// Number of occupied slots.
    pub fn size(&self) -> usize {
        self.moves.iter().filter(|m| m.is_some()).count()
    }

    pub fn empty(&self) -> bool {
        self.moves.iter().all(Option::is_none)
    }

    /// Sum of the occupied slots' durations, in ticks.
    pub fn get_duration(&self) -> u32 {
        self.moves
            .iter()
            .map(|m| m.as_ref().map_or(0, MoveVariant::duration))
            .fold(0u32, u32::saturating_add)
    }

    /// Occupied slots in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &MoveVariant> + '_ {
        self.moves.iter().flatten()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for MoveGroup<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// All move groups of one axis.
pub struct MoveGroupManager<const G: usize = MAX_GROUPS, const N: usize = MAX_MOVES_PER_GROUP> {
    groups: [MoveGroup<N>; G],
}

impl<const G: usize, const N: usize> MoveGroupManager<G, N> {
    pub const fn new() -> Self {
        Self {
            groups: [MoveGroup::new(); G],
        }
    }

    pub fn get(&self, group_id: u8) -> Option<&MoveGroup<N>> {
        self.groups.get(group_id as usize)
    }

    pub fn get_mut(&mut self, group_id: u8) -> Option<&mut MoveGroup<N>> {
        self.groups.get_mut(group_id as usize)
    }

    /// Insert into the group named by the move. `false` if the group or slot does not exist.
    pub fn set_move(&mut self, m: impl Into<MoveVariant>) -> bool {
        let m = m.into();
        self.get_mut(m.group_id()).map_or(false, |g| g.set_move(m))
    }

    pub fn clear_all(&mut self) {
        self.groups.iter_mut().for_each(MoveGroup::clear);
    }
}

impl<const G: usize, const N: usize> Default for MoveGroupManager<G, N> {
    fn default() -> Self {
        Self::new()
    }
}
