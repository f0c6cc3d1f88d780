//! Lazily filled cache slot with explicit invalidation.

/// Holds a lazily built value.
///
/// The slot is either empty or holds the value built for the current
/// credentials. [`invalidate`](Self::invalidate) empties it, so the next
/// [`get_or_try_init`](Self::get_or_try_init) rebuilds.
#[derive(Debug)]
pub struct LazySlot<T> {
    value: Option<T>,
}

impl<T> Default for LazySlot<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Clone> LazySlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the held value, building it with `init` if the slot is empty.
    ///
    /// A failed build leaves the slot empty.
    pub fn get_or_try_init<E>(&mut self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }
        let value = init()?;
        self.value = Some(value.clone());
        Ok(value)
    }

    /// Replaces the held value.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Returns the held value without building.
    pub fn get(&self) -> Option<T> {
        self.value.clone()
    }

    /// Empties the slot.
    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_once() {
        let mut slot = LazySlot::new();
        let mut builds = 0;

        for _ in 0..3 {
            let value: Result<u32, ()> = slot.get_or_try_init(|| {
                builds += 1;
                Ok(7)
            });
            assert_eq!(value, Ok(7));
        }
        assert_eq!(builds, 1);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let mut slot = LazySlot::new();
        slot.get_or_try_init::<()>(|| Ok(1)).unwrap();

        slot.invalidate();
        assert!(slot.get().is_none());

        assert_eq!(slot.get_or_try_init::<()>(|| Ok(2)), Ok(2));
    }

    #[test]
    fn test_set_replaces_value() {
        let mut slot = LazySlot::new();
        slot.set(1);
        slot.set(2);
        assert_eq!(slot.get_or_try_init::<()>(|| Ok(3)), Ok(2));
    }

    #[test]
    fn test_failed_build_leaves_slot_empty() {
        let mut slot: LazySlot<u32> = LazySlot::new();
        assert_eq!(slot.get_or_try_init(|| Err("boom")), Err("boom"));
        assert!(slot.get().is_none());
    }
}
