//! Kernel object pool - the handle table
//!
//! # Purpose
//! Owns every live kernel object and hands out the 32-bit handles guest code
//! uses to refer to them. Capacity is a hard ceiling; `create` reports
//! exhaustion with [`Handle::NONE`] instead of growing.
//!
//! # Allocation
//! A slot index `i` maps to handle `i + HANDLE_BASE`. `create` searches the
//! requested window `[bottom, min(top, capacity))`. When the allocation
//! cursor lies inside the window the search starts at the cursor and the
//! cursor moves forward by one on success; otherwise the window is scanned
//! from its bottom. The cursor never wraps on its own; only `clear` resets it.
//!
//! # Restore
//! Restoring destroys every live object before the snapshot is validated. A
//! snapshot that fails validation therefore leaves the pool empty, not in
//! its previous state.

use hle_savestate::{StateError, StateWrap, Stateful};
use static_assertions::const_assert;

use crate::error::{PoolError, Result};
use crate::factory::{BuiltinFactory, ObjectFactory};
use crate::kind::ObjectKind;
use crate::object::{Handle, KernelObject, TypedObject};

/// Number of slots in the table
pub const CAPACITY: usize = 4096;

/// Offset between a slot index and its handle
pub const HANDLE_BASE: u32 = 0x100;

/// Cursor value after construction and after `clear`
pub const INITIAL_NEXT_SLOT: usize = 16;

/// Lowest slot used by [`KernelObjectPool::insert`]
pub const DEFAULT_RANGE_BOTTOM: usize = 16;

/// Title of the pool's snapshot section
pub const SECTION_TITLE: &str = "KernelObjectPool";

/// Handles guests pass routinely as "no object"; rejected without a warning
const QUIET_BAD_HANDLES: [u32; 2] = [0, 0x8002_0001];

const_assert!(HANDLE_BASE > 0);
const_assert!(INITIAL_NEXT_SLOT < CAPACITY);
const_assert!((CAPACITY as u64) + (HANDLE_BASE as u64) <= u32::MAX as u64);

/// One row of [`KernelObjectPool::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectListing {
    pub handle: Handle,
    pub type_name: &'static str,
    pub name: String,
    pub info: String,
}

/// Fixed-capacity handle table
pub struct KernelObjectPool {
    slots: Vec<Option<Box<dyn KernelObject>>>,
    occupied: Vec<bool>,
    next_slot: usize,
}

impl KernelObjectPool {
    /// Create an empty pool with [`CAPACITY`] slots
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    /// Create an empty pool with `capacity` slots
    ///
    /// Snapshots only restore into a pool of the same capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            occupied: vec![false; capacity],
            next_slot: INITIAL_NEXT_SLOT,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Current allocation cursor
    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    /// Register `object` in the first free slot of `[range_bottom, range_top)`
    ///
    /// # Arguments
    /// * `object` - Unregistered object; its handle is set on success
    /// * `range_bottom` - Lowest slot index to consider
    /// * `range_top` - One past the highest slot index, clamped to capacity
    ///
    /// # Returns
    /// The new handle, or [`Handle::NONE`] when no slot in the range is free.
    /// A failed call leaves the pool and its cursor unchanged.
    pub fn create(
        &mut self,
        mut object: Box<dyn KernelObject>,
        range_bottom: usize,
        range_top: usize,
    ) -> Handle {
        let range_top = range_top.min(self.capacity());
        let cursor_in_range = self.next_slot >= range_bottom && self.next_slot < range_top;
        let start = if cursor_in_range {
            self.next_slot
        } else {
            range_bottom
        };

        let Some(index) = (start..range_top).find(|&i| !self.occupied[i]) else {
            log::error!(
                "Unable to allocate kernel object {} \"{}\", too many objects in slots {}..{}",
                object.type_name(),
                object.name(),
                range_bottom,
                range_top
            );
            return Handle::NONE;
        };

        if cursor_in_range {
            self.next_slot += 1;
        }

        let handle = Self::handle_for(index);
        object.set_handle(handle);
        self.occupied[index] = true;
        self.slots[index] = Some(object);
        handle
    }

    /// Register `object` anywhere above the reserved low slots
    pub fn insert(&mut self, object: Box<dyn KernelObject>) -> Handle {
        let top = self.capacity();
        self.create(object, DEFAULT_RANGE_BOTTOM, top)
    }

    /// Remove and drop the object behind `handle`
    ///
    /// # Errors
    /// `BadHandle` if nothing is registered under `handle`.
    pub fn destroy(&mut self, handle: Handle) -> Result<()> {
        let index = self
            .slot_index(handle)
            .ok_or_else(|| Self::bad_handle(handle, None))?;
        self.occupied[index] = false;
        self.slots[index] = None;
        Ok(())
    }

    /// Remove the object behind `handle` if it is a `T`
    pub fn destroy_as<T: TypedObject>(&mut self, handle: Handle) -> Result<()> {
        self.get_as::<T>(handle)?;
        self.destroy(handle)
    }

    /// Look up any object by handle
    pub fn get(&self, handle: Handle) -> Result<&dyn KernelObject> {
        self.lookup(handle, None)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut dyn KernelObject> {
        self.lookup_mut(handle, None)
    }

    /// Look up an object and check its kind
    ///
    /// # Errors
    /// `BadHandle` if nothing is registered under `handle`, `WrongKind` if
    /// the object is not a `T`.
    pub fn get_as<T: TypedObject>(&self, handle: Handle) -> Result<&T> {
        let object = self.lookup(handle, Some(T::KIND))?;
        let found = object.kind();
        object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| Self::wrong_kind(handle, T::KIND, found))
    }

    pub fn get_as_mut<T: TypedObject>(&mut self, handle: Handle) -> Result<&mut T> {
        let object = self.lookup_mut(handle, Some(T::KIND))?;
        let found = object.kind();
        object
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| Self::wrong_kind(handle, T::KIND, found))
    }

    /// Whether `handle` names a live object
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.slot_index(handle).is_some()
    }

    /// Kind of the object behind `handle`, without logging on failure
    pub fn kind_of(&self, handle: Handle) -> Option<ObjectKind> {
        let index = self.slot_index(handle)?;
        self.slots[index].as_ref().map(|object| object.kind())
    }

    /// Handles of every live object of `kind`, in slot order
    pub fn handles_of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = Handle> + '_ {
        self.iter()
            .filter(move |object| object.kind() == kind)
            .map(|object| object.handle())
    }

    /// Every live object, in slot order
    pub fn iter(&self) -> impl Iterator<Item = &dyn KernelObject> + '_ {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.occupied.iter().filter(|&&occupied| occupied).count()
    }

    /// Drop every object and reset the cursor
    ///
    /// No kind-specific teardown runs.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.occupied.iter_mut().for_each(|flag| *flag = false);
        self.next_slot = INITIAL_NEXT_SLOT;
    }

    /// Log and return one row per live object
    ///
    /// A slot flagged occupied but holding nothing is logged as corrupt and
    /// left out of the result.
    pub fn list(&self) -> Vec<ObjectListing> {
        let mut rows = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if !self.occupied[index] {
                continue;
            }
            let handle = Self::handle_for(index);
            let Some(object) = slot else {
                log::error!("KO {}: bad object", handle);
                continue;
            };
            let row = ObjectListing {
                handle,
                type_name: object.type_name(),
                name: object.name().to_owned(),
                info: object.quick_info(),
            };
            log::debug!("KO {}: {} \"{}\": {}", row.handle, row.type_name, row.name, row.info);
            rows.push(row);
        }
        rows
    }

    /// Save or restore the whole pool
    ///
    /// On restore, every live object is dropped first. Any failure leaves
    /// the pool empty.
    ///
    /// # Errors
    /// `Structure` when the snapshot was taken with a different capacity,
    /// `UnknownObjectKind` when `factory` does not recognise a stored kind,
    /// plus any framing or codec error from the snapshot itself.
    pub fn do_state_with(
        &mut self,
        p: &mut StateWrap<'_>,
        factory: &dyn ObjectFactory,
    ) -> hle_savestate::Result<()> {
        if p.is_reading() {
            self.clear();
        }
        let result = p.section(SECTION_TITLE, 1, 1, |p, _| self.walk_slots(p, factory));
        if result.is_err() && p.is_reading() {
            self.clear();
        }
        result.map(|_| ())
    }

    fn walk_slots(
        &mut self,
        p: &mut StateWrap<'_>,
        factory: &dyn ObjectFactory,
    ) -> hle_savestate::Result<()> {
        let mut capacity = self.capacity() as u32;
        p.value(&mut capacity)?;
        if capacity as usize != self.capacity() {
            log::error!(
                "Unable to load state: different kernel object storage ({} slots, expected {})",
                capacity,
                self.capacity()
            );
            return Err(StateError::Structure(format!(
                "snapshot has {} kernel object slots, expected {}",
                capacity,
                self.capacity()
            )));
        }

        let mut next_slot = self.next_slot as u32;
        p.value(&mut next_slot)?;
        self.next_slot = next_slot as usize;
        p.do_array(&mut self.occupied)?;

        for index in 0..self.capacity() {
            if !self.occupied[index] {
                continue;
            }
            if p.is_reading() {
                let mut raw = 0u32;
                p.value(&mut raw)?;
                let mut object = factory
                    .create_by_kind(raw)
                    .ok_or(StateError::UnknownObjectKind(raw))?;
                object.set_handle(Self::handle_for(index));
                object.do_state(p)?;
                self.slots[index] = Some(object);
            } else {
                let object = self.slots[index].as_mut().ok_or_else(|| {
                    StateError::Structure(format!("slot {} is flagged occupied but empty", index))
                })?;
                let mut raw = object.kind().raw();
                p.value(&mut raw)?;
                object.do_state(p)?;
            }
        }
        Ok(())
    }

    #[inline]
    fn handle_for(index: usize) -> Handle {
        Handle::from_raw(index as u32 + HANDLE_BASE)
    }

    fn slot_index(&self, handle: Handle) -> Option<usize> {
        let index = handle.raw().checked_sub(HANDLE_BASE)? as usize;
        (index < self.capacity() && self.occupied[index]).then_some(index)
    }

    fn lookup(&self, handle: Handle, expected: Option<ObjectKind>) -> Result<&dyn KernelObject> {
        self.slot_index(handle)
            .and_then(|index| self.slots[index].as_deref())
            .ok_or_else(|| Self::bad_handle(handle, expected))
    }

    fn lookup_mut(
        &mut self,
        handle: Handle,
        expected: Option<ObjectKind>,
    ) -> Result<&mut dyn KernelObject> {
        match self.slot_index(handle) {
            Some(index) => match self.slots[index].as_deref_mut() {
                Some(object) => Ok(object),
                None => Err(Self::bad_handle(handle, expected)),
            },
            None => Err(Self::bad_handle(handle, expected)),
        }
    }

    fn bad_handle(handle: Handle, expected: Option<ObjectKind>) -> PoolError {
        if !QUIET_BAD_HANDLES.contains(&handle.raw()) {
            let kind = expected.map_or("object", ObjectKind::name);
            log::warn!("Kernel: Bad {} handle {} ({:#010x})", kind, handle, handle.raw());
        }
        PoolError::BadHandle { handle, expected }
    }

    fn wrong_kind(handle: Handle, expected: ObjectKind, found: ObjectKind) -> PoolError {
        log::warn!(
            "Kernel: Wrong object type for {} ({:#010x}), was {}, should have been {}",
            handle,
            handle.raw(),
            found.name(),
            expected.name()
        );
        PoolError::WrongKind {
            handle,
            expected,
            found,
        }
    }
}

impl Default for KernelObjectPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Stateful for KernelObjectPool {
    fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        self.do_state_with(p, &BuiltinFactory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Mutex, MutexState, Semaphore, SemaphoreState};

    fn sema(name: &str) -> Box<dyn KernelObject> {
        Semaphore::boxed(name, SemaphoreState::default())
    }

    #[test]
    fn test_handles_start_at_base_plus_cursor() {
        let mut pool = KernelObjectPool::new();
        let handle = pool.create(sema("a"), 0, CAPACITY);
        assert_eq!(handle.raw(), HANDLE_BASE + INITIAL_NEXT_SLOT as u32);
        assert_eq!(pool.next_slot(), INITIAL_NEXT_SLOT + 1);
    }

    #[test]
    fn test_cursor_outside_range_scans_from_bottom() {
        let mut pool = KernelObjectPool::new();
        let first = pool.create(sema("a"), 0, 8);
        let second = pool.create(sema("b"), 0, 8);
        assert_eq!(first.raw(), HANDLE_BASE);
        assert_eq!(second.raw(), HANDLE_BASE + 1);
        assert_eq!(pool.next_slot(), INITIAL_NEXT_SLOT);
    }

    #[test]
    fn test_cursor_does_not_wrap() {
        let mut pool = KernelObjectPool::new();
        // Window 16..18 with the cursor at 16: two allocations advance the
        // cursor to the top, after which the window is scanned from bottom.
        let a = pool.create(sema("a"), 16, 18);
        let b = pool.create(sema("b"), 16, 18);
        assert!(!a.is_none() && !b.is_none());
        assert_eq!(pool.next_slot(), 18);
        assert!(pool.create(sema("c"), 16, 18).is_none());
        pool.destroy(a).unwrap();
        assert_eq!(pool.create(sema("d"), 16, 18), a);
    }

    #[test]
    fn test_failed_create_leaves_cursor() {
        let mut pool = KernelObjectPool::with_capacity(20);
        for i in 16..20 {
            assert!(!pool.create(sema("x"), 16, 20).is_none(), "slot {i}");
        }
        pool.destroy(Handle::from_raw(HANDLE_BASE + 16)).unwrap();
        pool.next_slot = 17;
        // Cursor in range but nothing free from it upward.
        assert!(pool.create(sema("y"), 16, 20).is_none());
        assert_eq!(pool.next_slot(), 17);
    }

    #[test]
    fn test_range_top_clamped() {
        let mut pool = KernelObjectPool::with_capacity(32);
        let handle = pool.create(sema("a"), 20, usize::MAX);
        assert_eq!(handle.raw(), HANDLE_BASE + 20);
    }

    #[test]
    fn test_empty_range() {
        let mut pool = KernelObjectPool::new();
        assert!(pool.create(sema("a"), 40, 40).is_none());
        assert!(pool.create(sema("a"), 50, 40).is_none());
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn test_lookup_below_base() {
        let pool = KernelObjectPool::new();
        assert!(!pool.is_valid(Handle::from_raw(5)));
        assert!(!pool.is_valid(Handle::NONE));
        assert!(!pool.is_valid(Handle::from_raw(u32::MAX)));
    }

    #[test]
    fn test_typed_lookup() {
        let mut pool = KernelObjectPool::new();
        let handle = pool.insert(sema("s"));
        assert!(pool.get_as::<Semaphore>(handle).is_ok());
        let err = pool.get_as::<Mutex>(handle).unwrap_err();
        assert_eq!(
            err,
            PoolError::WrongKind {
                handle,
                expected: ObjectKind::Mutex,
                found: ObjectKind::Semaphore,
            }
        );
        assert!(pool.destroy_as::<Mutex>(handle).is_err());
        assert!(pool.is_valid(handle));
        assert!(pool.destroy_as::<Semaphore>(handle).is_ok());
        assert!(!pool.is_valid(handle));
    }

    #[test]
    fn test_get_as_mut_updates_payload() {
        let mut pool = KernelObjectPool::new();
        let handle = pool.insert(Mutex::boxed("m", MutexState::default()));
        pool.get_as_mut::<Mutex>(handle).unwrap().payload_mut().lock_level = 3;
        assert_eq!(pool.get_as::<Mutex>(handle).unwrap().payload().lock_level, 3);
    }

    #[test]
    fn test_list_rows() {
        let mut pool = KernelObjectPool::new();
        let handle = pool.insert(sema("vblank"));
        let rows = pool.list();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].handle, handle);
        assert_eq!(rows[0].type_name, "Semaphore");
        assert_eq!(rows[0].name, "vblank");
    }

    #[test]
    fn test_list_skips_corrupt_slot() {
        let mut pool = KernelObjectPool::new();
        pool.insert(sema("a"));
        pool.occupied[100] = true;
        assert_eq!(pool.list().len(), 1);
    }

    #[test]
    fn test_write_rejects_corrupt_slot() {
        let mut pool = KernelObjectPool::new();
        pool.occupied[100] = true;
        let mut w = StateWrap::writer();
        let err = pool.do_state(&mut w).unwrap_err();
        assert!(matches!(err, StateError::Structure(_)));
    }
}
