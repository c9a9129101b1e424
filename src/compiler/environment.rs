use std::collections::HashMap;

use lasso::Spur;

use super::bytecode::Slot;

/// Maps every variable bound during one compilation run to its storage slot.
///
/// Slots are handed out in the order names are first bound, starting at 0,
/// and are never reused or taken back. The table lives as long as the run, so
/// a name bound by one top-level form keeps its slot in every later form.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    slots: HashMap<Spur, Slot>,
}

impl SlotTable {
    pub fn get(&self, name: Spur) -> Option<Slot> {
        self.slots.get(&name).copied()
    }

    /// The slot of `name`, allocating the next free one if it was never bound,
    /// along with whether it was just allocated.
    ///
    /// Rebinding a name returns the slot it already has.
    pub fn bind(&mut self, name: Spur) -> (Slot, bool) {
        let next = Slot(self.slots.len() as u32);
        match self.slots.get(&name) {
            Some(slot) => (*slot, false),
            None => {
                self.slots.insert(name, next);
                (next, true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
