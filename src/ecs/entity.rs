//! Entity Handles and Entity Store
//!
//! An entity is a lightweight handle: its [`Identifier`], a signature
//! bitset saying which component types it carries, and an active flag.
//! Handles are plain `Copy` values stored densely in an `EntityStore`
//! with the same swap-remove discipline as a component table, so views
//! can walk them by index.

use std::collections::HashMap;

use super::component_registry::ComponentTag;
use super::error::EcsError;
use super::identifier::Identifier;

/// Hard upper bound on component types (width of [`Signature`]).
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Default entity capacity of a registry.
pub const MAX_ENTITIES: usize = 50_000;

/// Bitset of component type tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature(u64);

impl Signature {
    pub const EMPTY: Signature = Signature(0);

    pub fn set(&mut self, tag: ComponentTag) {
        self.0 |= 1u64 << tag;
    }

    pub fn clear(&mut self, tag: ComponentTag) {
        self.0 &= !(1u64 << tag);
    }

    pub fn with(mut self, tag: ComponentTag) -> Self {
        self.set(tag);
        self
    }

    pub fn contains(&self, tag: ComponentTag) -> bool {
        self.0 & (1u64 << tag) != 0
    }

    /// True if every bit of `other` is also set here.
    pub fn contains_all(&self, other: Signature) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u64 {
        self.0
    }
}

/// A live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity {
    id: Identifier,
    signature: Signature,
    active: bool,
}

impl Entity {
    /// A fresh handle: empty signature, active.
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            signature: Signature::EMPTY,
            active: true,
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn signature_mut(&mut self) -> &mut Signature {
        &mut self.signature
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Dense, fixed-capacity storage of entity handles keyed by id.
pub struct EntityStore {
    entities: Vec<Entity>,
    slots: HashMap<Identifier, usize>,
    capacity: usize,
}

impl EntityStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entities: Vec::new(),
            slots: HashMap::new(),
            capacity,
        }
    }

    /// Store a new handle for `id`.
    pub fn insert(&mut self, id: Identifier) -> Result<&mut Entity, EcsError> {
        if self.slots.contains_key(&id) {
            return Err(EcsError::DuplicateEntity(id));
        }
        if self.entities.len() >= self.capacity {
            return Err(EcsError::EntityCapacityExceeded(self.capacity));
        }

        let slot = self.entities.len();
        self.entities.push(Entity::new(id));
        self.slots.insert(id, slot);
        Ok(&mut self.entities[slot])
    }

    /// Remove `id`'s handle; the last handle moves into its slot.
    pub fn remove(&mut self, id: Identifier) -> Result<Entity, EcsError> {
        let slot = self.slots.remove(&id).ok_or(EcsError::EntityNotFound(id))?;
        let removed = self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.slots.insert(moved.id, slot);
        }
        Ok(removed)
    }

    pub fn get(&self, id: Identifier) -> Result<&Entity, EcsError> {
        self.slots
            .get(&id)
            .map(|&slot| &self.entities[slot])
            .ok_or(EcsError::EntityNotFound(id))
    }

    pub fn get_mut(&mut self, id: Identifier) -> Result<&mut Entity, EcsError> {
        match self.slots.get(&id) {
            Some(&slot) => Ok(&mut self.entities[slot]),
            None => Err(EcsError::EntityNotFound(id)),
        }
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.slots.contains_key(&id)
    }

    /// Handle at a dense slot (0..len).
    pub fn at(&self, slot: usize) -> Option<&Entity> {
        self.entities.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_bits() {
        let mut sig = Signature::EMPTY;
        sig.set(3);
        sig.set(63);
        assert!(sig.contains(3));
        assert!(sig.contains(63));
        assert!(!sig.contains(4));

        sig.clear(3);
        assert!(!sig.contains(3));
        assert!(sig.contains_all(Signature::EMPTY.with(63)));
        assert!(!sig.contains_all(Signature::EMPTY.with(63).with(1)));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut store = EntityStore::new(4);
        let a = Identifier::generate();
        let b = Identifier::generate();

        let handle = store.insert(a).unwrap();
        assert!(handle.is_active());
        assert!(handle.signature().is_empty());
        store.insert(b).unwrap();

        assert_eq!(store.remove(a).unwrap().id(), a);
        assert_eq!(store.len(), 1);
        assert_eq!(store.at(0).map(Entity::id), Some(b));
        assert!(store.get(a).is_err());
    }

    #[test]
    fn test_duplicate_and_capacity() {
        let mut store = EntityStore::new(1);
        let a = Identifier::generate();
        store.insert(a).unwrap();
        assert_eq!(store.insert(a).unwrap_err(), EcsError::DuplicateEntity(a));
        assert_eq!(
            store.insert(Identifier::generate()).unwrap_err(),
            EcsError::EntityCapacityExceeded(1)
        );
    }

    #[test]
    fn test_remove_missing() {
        let mut store = EntityStore::new(4);
        let a = Identifier::generate();
        assert_eq!(store.remove(a).unwrap_err(), EcsError::EntityNotFound(a));
    }
}
