//! Tri-state aggregation and compositional flag mutation.
//!
//! Every operation works on the union of the resolved sets it is given and
//! writes only to items in that union. Views applied one after another
//! therefore combine additively.

use serde::Serialize;

use crate::{
    errors::ItemError,
    items::{Flag, ItemId, ItemStore},
    resolve::ResolvedSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriState {
    AllOn,
    AllOff,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagChange {
    pub flag: Flag,
    /// State of the union before the write.
    pub previous: TriState,
    /// Value written to every affected item.
    pub value: bool,
    pub affected: usize,
}

/// Result of an exclusive write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExclusiveChange {
    pub flag: Flag,
    /// Members of the union, all of which now carry the flag.
    pub set: usize,
    /// Items outside the union whose flag was switched off.
    pub cleared: usize,
}

/// Union of the sets, restricted to ids the store still knows.
fn live_union<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    items: &S,
) -> Vec<ItemId> {
    let union: ResolvedSet = sets.iter().flatten().cloned().collect();
    union
        .into_iter()
        .filter(|id| {
            let known = items.get_flag(id, flag).is_some();
            if !known {
                log::warn!("skipping unknown item {id}");
            }
            known
        })
        .collect()
}

/// `AllOff` for an empty union, otherwise by counting items with the flag
/// set.
pub fn aggregate_state<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    items: &S,
) -> TriState {
    let union = live_union(sets, flag, items);
    state_of(&union, flag, items)
}

fn state_of<S: ItemStore + ?Sized>(union: &[ItemId], flag: Flag, items: &S) -> TriState {
    let on = union
        .iter()
        .filter(|id| items.get_flag(id, flag).unwrap_or(false))
        .count();
    if union.is_empty() || on == 0 {
        TriState::AllOff
    } else if on == union.len() {
        TriState::AllOn
    } else {
        TriState::Mixed
    }
}

/// `AllOn` turns the flag off; `AllOff` and `Mixed` both turn it on.
pub fn apply_toggle<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    items: &mut S,
) -> Result<FlagChange, ItemError> {
    let union = live_union(sets, flag, items);
    let previous = state_of(&union, flag, items);
    let value = previous != TriState::AllOn;
    write(&union, flag, value, previous, items)
}

/// Sets the flag on every item, whatever the current state.
pub fn apply_show<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    items: &mut S,
) -> Result<FlagChange, ItemError> {
    apply_value(sets, flag, true, items)
}

/// Clears the flag on every item, whatever the current state.
pub fn apply_hide<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    items: &mut S,
) -> Result<FlagChange, ItemError> {
    apply_value(sets, flag, false, items)
}

fn apply_value<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    value: bool,
    items: &mut S,
) -> Result<FlagChange, ItemError> {
    let union = live_union(sets, flag, items);
    let previous = state_of(&union, flag, items);
    write(&union, flag, value, previous, items)
}

/// Replaces rather than extends: the flag ends up on exactly the live members
/// of the union and off on every other item in the store.
pub fn apply_exclusive<S: ItemStore + ?Sized>(
    sets: &[ResolvedSet],
    flag: Flag,
    items: &mut S,
) -> Result<ExclusiveChange, ItemError> {
    let union = live_union(sets, flag, items);
    let members: ResolvedSet = union.iter().cloned().collect();

    let mut cleared = 0;
    for id in items.item_ids() {
        if !members.contains(&id) && items.get_flag(&id, flag) == Some(true) {
            items.set_flag(&id, flag, false)?;
            cleared += 1;
        }
    }
    for id in &union {
        items.set_flag(id, flag, true)?;
    }

    log::debug!("{flag} set on {} item(s), cleared on {cleared}", union.len());
    Ok(ExclusiveChange {
        flag,
        set: union.len(),
        cleared,
    })
}

fn write<S: ItemStore + ?Sized>(
    union: &[ItemId],
    flag: Flag,
    value: bool,
    previous: TriState,
    items: &mut S,
) -> Result<FlagChange, ItemError> {
    for id in union {
        items.set_flag(id, flag, value)?;
    }
    log::debug!("{flag}={value} on {} item(s), was {previous:?}", union.len());
    Ok(FlagChange {
        flag,
        previous,
        value,
        affected: union.len(),
    })
}
