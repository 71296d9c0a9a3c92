// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owner-scoped slot storage.
//!
//! An object that connects to several dispatchers can keep the returned
//! [`Slot`]s in a [`SlotContainer`]. Clearing or dropping the container
//! invalidates every slot it holds, so the object's handlers stop being
//! called when the object goes away.
//!
//! ```
//! use understory_signal::container::SlotContainer;
//! use understory_signal::signal::Signal;
//!
//! let resized: Signal<(u32, u32)> = Signal::new();
//! let closed: Signal<()> = Signal::new();
//!
//! let mut slots = SlotContainer::new();
//! slots.push(resized.connect(|(_w, _h)| {}));
//! slots.push(closed.connect(|()| {}));
//! assert_eq!(resized.live_count() + closed.live_count(), 2);
//!
//! drop(slots);
//! assert_eq!(resized.live_count() + closed.live_count(), 0);
//! ```

use alloc::vec::Vec;

use crate::slot::Slot;

/// A set of slots that are invalidated together.
#[derive(Debug, Default)]
pub struct SlotContainer {
    slots: Vec<Slot>,
}

impl SlotContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Take ownership of `slot`.
    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Number of slots held, valid or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the container holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over the held slots.
    pub fn iter(&self) -> core::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    /// Invalidate and release every held slot.
    pub fn clear(&mut self) {
        for slot in self.slots.drain(..) {
            slot.invalidate();
        }
    }
}

impl Drop for SlotContainer {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Extend<Slot> for SlotContainer {
    fn extend<I: IntoIterator<Item = Slot>>(&mut self, iter: I) {
        self.slots.extend(iter);
    }
}

impl FromIterator<Slot> for SlotContainer {
    fn from_iter<I: IntoIterator<Item = Slot>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SlotContainer {
    type Item = &'a Slot;
    type IntoIter = core::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
