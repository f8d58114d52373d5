use std::sync::{PoisonError, RwLock};

/// A single mutable cell holding zero or one payload.
///
/// Writes unconditionally replace whatever was held before (last writer
/// wins). Readers share the lock, so loads never wait on other loads, and a
/// payload is only ever observed whole.
#[derive(Debug)]
pub struct Slot<T> {
    cell: RwLock<Option<T>>,
}

impl<T: Clone> Slot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            cell: RwLock::new(None),
        }
    }

    /// Replace the held payload.
    pub fn store(&self, payload: T) {
        // A panicking writer cannot leave a half-written Option behind, so a
        // poisoned lock still guards a consistent value.
        let mut cell = self.cell.write().unwrap_or_else(PoisonError::into_inner);
        *cell = Some(payload);
    }

    /// Most recently stored payload, or `None` if nothing was stored yet.
    pub fn load(&self) -> Option<T> {
        self.cell
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}
