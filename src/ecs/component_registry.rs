//! Component Type Registry
//!
//! Hands out a small integer tag per component type and owns one
//! [`ComponentTable`] per registered type. Tables are stored type-erased
//! behind [`ErasedTable`] and downcast on access.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use super::component::ComponentTable;
use super::entity::MAX_COMPONENT_TYPES;
use super::error::EcsError;
use super::identifier::Identifier;

/// Index of a registered component type, also its bit in a signature.
pub type ComponentTag = usize;

/// Anything storable in a component table.
pub trait Component: Any {}

impl<T: Any> Component for T {}

/// Operations every table supports regardless of its element type.
trait ErasedTable {
    fn on_entity_destroyed(&mut self, id: Identifier);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedTable for ComponentTable<T> {
    fn on_entity_destroyed(&mut self, id: Identifier) {
        ComponentTable::on_entity_destroyed(self, id);
    }

    fn len(&self) -> usize {
        ComponentTable::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct RegisteredType {
    name: &'static str,
    table: Box<dyn ErasedTable>,
}

/// Owns every component table, indexed by tag.
pub struct ComponentTypeRegistry {
    tags: HashMap<TypeId, ComponentTag>,
    types: Vec<RegisteredType>,
    max_types: usize,
    table_capacity: usize,
}

impl ComponentTypeRegistry {
    /// `max_types` is clamped to the signature width.
    pub fn new(max_types: usize, table_capacity: usize) -> Self {
        Self {
            tags: HashMap::new(),
            types: Vec::new(),
            max_types: max_types.min(MAX_COMPONENT_TYPES),
            table_capacity,
        }
    }

    /// Assign the next free tag to `T` and create its table.
    pub fn register<T: Component>(&mut self) -> Result<ComponentTag, EcsError> {
        let type_id = TypeId::of::<T>();
        if self.tags.contains_key(&type_id) {
            return Err(EcsError::TypeAlreadyRegistered(type_name::<T>()));
        }
        if self.types.len() >= self.max_types {
            return Err(EcsError::TypeBudgetExhausted {
                component: type_name::<T>(),
                max: self.max_types,
            });
        }

        let tag = self.types.len();
        self.tags.insert(type_id, tag);
        self.types.push(RegisteredType {
            name: type_name::<T>(),
            table: Box::new(ComponentTable::<T>::new(self.table_capacity)),
        });
        tracing::debug!(component = type_name::<T>(), tag, "registered component type");
        Ok(tag)
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.tags.contains_key(&TypeId::of::<T>())
    }

    pub fn tag_of<T: Component>(&self) -> Result<ComponentTag, EcsError> {
        self.tags
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::TypeNotRegistered(type_name::<T>()))
    }

    pub fn table<T: Component>(&self) -> Result<&ComponentTable<T>, EcsError> {
        let tag = self.tag_of::<T>()?;
        self.types[tag]
            .table
            .as_any()
            .downcast_ref::<ComponentTable<T>>()
            .ok_or(EcsError::TypeNotRegistered(type_name::<T>()))
    }

    pub fn table_mut<T: Component>(&mut self) -> Result<&mut ComponentTable<T>, EcsError> {
        let tag = self.tag_of::<T>()?;
        self.types[tag]
            .table
            .as_any_mut()
            .downcast_mut::<ComponentTable<T>>()
            .ok_or(EcsError::TypeNotRegistered(type_name::<T>()))
    }

    pub fn add<T: Component>(&mut self, id: Identifier, value: T) -> Result<&mut T, EcsError> {
        self.table_mut::<T>()?.add(id, value)
    }

    pub fn remove<T: Component>(&mut self, id: Identifier) -> Result<T, EcsError> {
        self.table_mut::<T>()?.remove(id)
    }

    pub fn get<T: Component>(&self, id: Identifier) -> Result<&T, EcsError> {
        self.table::<T>()?.get(id)
    }

    pub fn get_mut<T: Component>(&mut self, id: Identifier) -> Result<&mut T, EcsError> {
        self.table_mut::<T>()?.get_mut(id)
    }

    /// Drop `id`'s component from every table that has one.
    pub fn on_entity_destroyed(&mut self, id: Identifier) {
        for registered in &mut self.types {
            registered.table.on_entity_destroyed(id);
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn max_types(&self) -> usize {
        self.max_types
    }

    /// `(name, live component count)` per tag, for debug overlays.
    pub fn table_sizes(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.types.iter().map(|t| (t.name, t.table.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);

    #[derive(Debug, PartialEq)]
    struct Armor(i32);

    #[test]
    fn test_tags_are_sequential() {
        let mut registry = ComponentTypeRegistry::new(8, 16);
        assert_eq!(registry.register::<Health>(), Ok(0));
        assert_eq!(registry.register::<Armor>(), Ok(1));
        assert_eq!(registry.tag_of::<Armor>(), Ok(1));
        assert_eq!(registry.type_count(), 2);
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = ComponentTypeRegistry::new(8, 16);
        registry.register::<Health>().unwrap();
        assert!(matches!(
            registry.register::<Health>(),
            Err(EcsError::TypeAlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_type_budget() {
        let mut registry = ComponentTypeRegistry::new(1, 16);
        registry.register::<Health>().unwrap();
        assert!(matches!(
            registry.register::<Armor>(),
            Err(EcsError::TypeBudgetExhausted { max: 1, .. })
        ));
    }

    #[test]
    fn test_budget_clamped_to_signature_width() {
        let registry = ComponentTypeRegistry::new(1000, 16);
        assert_eq!(registry.max_types(), MAX_COMPONENT_TYPES);
    }

    #[test]
    fn test_unregistered_type() {
        let mut registry = ComponentTypeRegistry::new(8, 16);
        let id = Identifier::generate();
        assert!(matches!(registry.tag_of::<Health>(), Err(EcsError::TypeNotRegistered(_))));
        assert!(registry.add(id, Health(1)).is_err());
    }

    #[test]
    fn test_delegates_to_tables() {
        let mut registry = ComponentTypeRegistry::new(8, 16);
        registry.register::<Health>().unwrap();
        let id = Identifier::generate();

        registry.add(id, Health(10)).unwrap();
        registry.get_mut::<Health>(id).unwrap().0 -= 3;
        assert_eq!(registry.get::<Health>(id), Ok(&Health(7)));
        assert_eq!(registry.remove::<Health>(id), Ok(Health(7)));
        assert!(registry.get::<Health>(id).is_err());
    }

    #[test]
    fn test_entity_destroyed_fans_out() {
        let mut registry = ComponentTypeRegistry::new(8, 16);
        registry.register::<Health>().unwrap();
        registry.register::<Armor>().unwrap();
        let a = Identifier::generate();
        let b = Identifier::generate();

        registry.add(a, Health(1)).unwrap();
        registry.add(a, Armor(2)).unwrap();
        registry.add(b, Armor(3)).unwrap();

        registry.on_entity_destroyed(a);
        assert!(registry.get::<Health>(a).is_err());
        assert!(registry.get::<Armor>(a).is_err());
        assert_eq!(registry.get::<Armor>(b), Ok(&Armor(3)));

        let sizes: Vec<usize> = registry.table_sizes().map(|(_, n)| n).collect();
        assert_eq!(sizes, vec![0, 1]);
    }
}
