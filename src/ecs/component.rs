//! Component Tables
//!
//! Components are plain data attached to entities. This module provides
//! `ComponentTable<T>` - a dense array of one component type keyed by
//! entity [`Identifier`].
//!
//! Live components always occupy slots `0..len`. Removing one moves the
//! last component into the freed slot (swap-remove), so removal is O(1)
//! and iteration never has to skip holes. The price is that a removal
//! reorders the table, and any reference to the moved element is stale.

use std::any::type_name;
use std::collections::HashMap;

use super::error::EcsError;
use super::identifier::Identifier;

/// Dense storage for a single component type.
pub struct ComponentTable<T> {
    /// Tightly packed component data
    data: Vec<T>,
    /// Owner of `data[i]` (slot -> id)
    ids: Vec<Identifier>,
    /// Slot of each owner (id -> slot)
    slots: HashMap<Identifier, usize>,
    /// Maximum number of live components
    capacity: usize,
}

impl<T> ComponentTable<T> {
    /// Create an empty table that holds at most `capacity` components.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            ids: Vec::new(),
            slots: HashMap::new(),
            capacity,
        }
    }

    /// Attach `value` to `id`. An entity holds at most one component per table.
    pub fn add(&mut self, id: Identifier, value: T) -> Result<&mut T, EcsError> {
        if self.slots.contains_key(&id) {
            return Err(EcsError::DuplicateComponent {
                entity: id,
                component: type_name::<T>(),
            });
        }
        if self.data.len() >= self.capacity {
            return Err(EcsError::ComponentCapacityExceeded {
                component: type_name::<T>(),
                capacity: self.capacity,
            });
        }

        let slot = self.data.len();
        self.data.push(value);
        self.ids.push(id);
        self.slots.insert(id, slot);
        Ok(&mut self.data[slot])
    }

    /// Attach a default-constructed component.
    pub fn add_default(&mut self, id: Identifier) -> Result<&mut T, EcsError>
    where
        T: Default,
    {
        self.add(id, T::default())
    }

    /// Detach and return `id`'s component, compacting the table.
    pub fn remove(&mut self, id: Identifier) -> Result<T, EcsError> {
        let slot = self.slots.remove(&id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: type_name::<T>(),
        })?;

        // Last element moves into `slot`
        let value = self.data.swap_remove(slot);
        self.ids.swap_remove(slot);
        if let Some(&moved) = self.ids.get(slot) {
            self.slots.insert(moved, slot);
        }
        Ok(value)
    }

    pub fn get(&self, id: Identifier) -> Result<&T, EcsError> {
        self.try_get(id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: type_name::<T>(),
        })
    }

    pub fn get_mut(&mut self, id: Identifier) -> Result<&mut T, EcsError> {
        self.try_get_mut(id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: type_name::<T>(),
        })
    }

    pub fn try_get(&self, id: Identifier) -> Option<&T> {
        self.slots.get(&id).map(|&slot| &self.data[slot])
    }

    pub fn try_get_mut(&mut self, id: Identifier) -> Option<&mut T> {
        match self.slots.get(&id) {
            Some(&slot) => Some(&mut self.data[slot]),
            None => None,
        }
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.slots.contains_key(&id)
    }

    /// Called for every table when an entity goes away.
    /// Returns the dropped component, if the entity had one.
    pub fn on_entity_destroyed(&mut self, id: Identifier) -> Option<T> {
        if self.contains(id) {
            self.remove(id).ok()
        } else {
            None
        }
    }

    /// Component and owner at a dense slot.
    pub fn at(&self, slot: usize) -> Option<(Identifier, &T)> {
        Some((*self.ids.get(slot)?, self.data.get(slot)?))
    }

    /// Iterate `(owner, component)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Identifier, &T)> {
        self.ids.iter().copied().zip(self.data.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Identifier, &mut T)> {
        self.ids.iter().copied().zip(self.data.iter_mut())
    }

    /// The packed component data, for linear passes.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ids(n: usize) -> Vec<Identifier> {
        let mut rng = StdRng::seed_from_u64(1);
        (0..n).map(|_| Identifier::generate_with(&mut rng)).collect()
    }

    #[test]
    fn test_add_and_get() {
        let mut table: ComponentTable<i32> = ComponentTable::new(8);
        let id = Identifier::generate();

        table.add(id, 42).unwrap();
        assert_eq!(table.get(id), Ok(&42));
        assert!(table.contains(id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_double_add_fails() {
        let mut table: ComponentTable<i32> = ComponentTable::new(8);
        let id = Identifier::generate();

        table.add(id, 1).unwrap();
        let err = table.add(id, 2).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { entity, .. } if entity == id));
        assert_eq!(table.get(id), Ok(&1));
    }

    #[test]
    fn test_remove_absent_fails() {
        let mut table: ComponentTable<i32> = ComponentTable::new(8);
        assert!(matches!(
            table.remove(Identifier::generate()),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(table.get(Identifier::generate()).is_err());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut table: ComponentTable<u8> = ComponentTable::new(2);
        let all = ids(3);
        table.add(all[0], 0).unwrap();
        table.add(all[1], 1).unwrap();
        assert!(matches!(
            table.add(all[2], 2),
            Err(EcsError::ComponentCapacityExceeded { capacity: 2, .. })
        ));
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut table: ComponentTable<&str> = ComponentTable::new(8);
        let all = ids(3);
        table.add(all[0], "a").unwrap();
        table.add(all[1], "b").unwrap();
        table.add(all[2], "c").unwrap();

        assert_eq!(table.remove(all[0]), Ok("a"));

        // "c" moved into slot 0, still reachable by id
        assert_eq!(table.at(0), Some((all[2], &"c")));
        assert_eq!(table.get(all[2]), Ok(&"c"));
        assert_eq!(table.get(all[1]), Ok(&"b"));
        assert_eq!(table.as_slice(), &["c", "b"]);
    }

    #[test]
    fn test_on_entity_destroyed_is_noop_when_absent() {
        let mut table: ComponentTable<i32> = ComponentTable::new(8);
        let id = Identifier::generate();
        assert_eq!(table.on_entity_destroyed(id), None);

        table.add(id, 5).unwrap();
        assert_eq!(table.on_entity_destroyed(id), Some(5));
        assert!(table.is_empty());
    }

    #[test]
    fn test_random_add_remove_keeps_values() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut table: ComponentTable<u64> = ComponentTable::new(1024);
        let mut expected: HashMap<Identifier, u64> = HashMap::new();

        for step in 0..2000u64 {
            let remove = !expected.is_empty() && rng.gen_bool(0.4);
            if remove {
                let victim = *expected.keys().nth(rng.gen_range(0..expected.len())).unwrap();
                let before = table.len();
                assert_eq!(table.remove(victim), Ok(expected.remove(&victim).unwrap()));
                assert_eq!(table.len(), before - 1);
                assert!(!table.contains(victim));
            } else {
                let id = Identifier::generate_with(&mut rng);
                table.add(id, step).unwrap();
                expected.insert(id, step);
            }

            for (id, value) in &expected {
                assert_eq!(table.get(*id), Ok(value));
            }
        }

        // Dense: every slot is owned by a live id
        assert_eq!(table.len(), expected.len());
        for (id, value) in table.iter() {
            assert_eq!(expected.get(&id), Some(value));
        }
    }
}
