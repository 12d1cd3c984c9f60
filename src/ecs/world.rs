//! Entity Registry
//!
//! The registry is the single entry point for entity and component
//! bookkeeping. It pairs an [`EntityStore`] with a
//! [`ComponentTypeRegistry`] and keeps every entity's signature in step
//! with the tables: a bit is set exactly when the matching table holds a
//! component for that entity.

use std::any::type_name;

use super::component_registry::{Component, ComponentTag, ComponentTypeRegistry};
use super::entity::{Entity, EntityStore, MAX_ENTITIES};
use super::error::EcsError;
use super::identifier::Identifier;
use super::view::{ComponentSet, View};

/// All entities and their components.
pub struct EntityRegistry {
    entities: EntityStore,
    components: ComponentTypeRegistry,
}

impl EntityRegistry {
    /// Create a registry holding at most `max_entities` entities and
    /// `max_component_types` component types.
    pub fn new(max_entities: usize, max_component_types: usize) -> Self {
        Self {
            entities: EntityStore::new(max_entities),
            components: ComponentTypeRegistry::new(max_component_types, max_entities),
        }
    }

    // =========================================================================
    // Component Types
    // =========================================================================

    pub fn register_component<T: Component>(&mut self) -> Result<ComponentTag, EcsError> {
        self.components.register::<T>()
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.components.is_registered::<T>()
    }

    pub fn tag_of<T: Component>(&self) -> Result<ComponentTag, EcsError> {
        self.components.tag_of::<T>()
    }

    pub fn registered_type_count(&self) -> usize {
        self.components.type_count()
    }

    pub fn component_types(&self) -> &ComponentTypeRegistry {
        &self.components
    }

    // =========================================================================
    // Entity Management
    // =========================================================================

    /// Create an entity with a freshly generated id.
    pub fn create_entity(&mut self) -> Result<Identifier, EcsError> {
        self.create_entity_with_id(Identifier::generate())
    }

    /// Create an entity with a caller-chosen id (loading, networking).
    pub fn create_entity_with_id(&mut self, id: Identifier) -> Result<Identifier, EcsError> {
        self.entities.insert(id)?;
        Ok(id)
    }

    /// Remove an entity and all of its components.
    pub fn remove_entity(&mut self, id: Identifier) -> Result<(), EcsError> {
        self.entities.remove(id)?;
        self.components.on_entity_destroyed(id);
        Ok(())
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.entities.contains(id)
    }

    pub fn entity(&self, id: Identifier) -> Result<&Entity, EcsError> {
        self.entities.get(id)
    }

    pub fn set_active(&mut self, id: Identifier, active: bool) -> Result<(), EcsError> {
        self.entities.get_mut(id)?.set_active(active);
        Ok(())
    }

    /// Entity at a dense slot; slots are `0..entity_count()`.
    pub fn entity_at(&self, index: usize) -> Option<&Entity> {
        self.entities.at(index)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_capacity(&self) -> usize {
        self.entities.capacity()
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attach `value` to entity `id` and set its signature bit.
    pub fn add_component<T: Component>(&mut self, id: Identifier, value: T) -> Result<&mut T, EcsError> {
        let tag = self.components.tag_of::<T>()?;
        let entity = self.entities.get_mut(id)?;
        if entity.signature().contains(tag) {
            return Err(EcsError::DuplicateComponent {
                entity: id,
                component: type_name::<T>(),
            });
        }
        entity.signature_mut().set(tag);

        match self.components.add(id, value) {
            Ok(component) => Ok(component),
            Err(err) => {
                // Table refused (capacity), keep the bit honest
                if let Ok(entity) = self.entities.get_mut(id) {
                    entity.signature_mut().clear(tag);
                }
                Err(err)
            }
        }
    }

    pub fn add_default_component<T: Component + Default>(&mut self, id: Identifier) -> Result<&mut T, EcsError> {
        self.add_component(id, T::default())
    }

    /// Detach and return entity `id`'s `T`, clearing its signature bit.
    pub fn remove_component<T: Component>(&mut self, id: Identifier) -> Result<T, EcsError> {
        let tag = self.components.tag_of::<T>()?;
        let entity = self.entities.get_mut(id)?;
        if !entity.signature().contains(tag) {
            return Err(EcsError::MissingComponent {
                entity: id,
                component: type_name::<T>(),
            });
        }
        entity.signature_mut().clear(tag);
        self.components.remove::<T>(id)
    }

    /// False for unknown entities and unregistered types.
    pub fn has_component<T: Component>(&self, id: Identifier) -> bool {
        match (self.components.tag_of::<T>(), self.entities.get(id)) {
            (Ok(tag), Ok(entity)) => entity.signature().contains(tag),
            _ => false,
        }
    }

    pub fn get_component<T: Component>(&self, id: Identifier) -> Result<&T, EcsError> {
        self.entities.get(id)?;
        self.components.get::<T>(id)
    }

    pub fn get_component_mut<T: Component>(&mut self, id: Identifier) -> Result<&mut T, EcsError> {
        self.entities.get(id)?;
        self.components.get_mut::<T>(id)
    }

    pub fn try_component<T: Component>(&self, id: Identifier) -> Option<&T> {
        self.components.table::<T>().ok()?.try_get(id)
    }

    pub fn try_component_mut<T: Component>(&mut self, id: Identifier) -> Option<&mut T> {
        self.components.table_mut::<T>().ok()?.try_get_mut(id)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Entities carrying every component in `Q`, e.g. `view::<(Transform, Sprite)>()`.
    pub fn view<Q: ComponentSet>(&self) -> Result<View<'_>, EcsError> {
        let signature = Q::signature(&self.components)?;
        Ok(View::matching(&self.entities, signature))
    }

    /// Every active entity.
    pub fn view_all(&self) -> View<'_> {
        View::all(&self.entities)
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(MAX_ENTITIES, super::entity::MAX_COMPONENT_TYPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    fn registry() -> EntityRegistry {
        let mut registry = EntityRegistry::new(64, 8);
        registry.register_component::<Position>().unwrap();
        registry.register_component::<Velocity>().unwrap();
        registry
    }

    #[test]
    fn test_create_and_remove_entity() {
        let mut registry = registry();
        let e1 = registry.create_entity().unwrap();
        let e2 = registry.create_entity().unwrap();
        assert_eq!(registry.entity_count(), 2);

        registry.remove_entity(e1).unwrap();
        assert_eq!(registry.entity_count(), 1);
        assert!(!registry.contains(e1));
        assert!(registry.contains(e2));
        assert_eq!(registry.remove_entity(e1), Err(EcsError::EntityNotFound(e1)));
    }

    #[test]
    fn test_duplicate_id_fails() {
        let mut registry = registry();
        let id = Identifier::generate();
        registry.create_entity_with_id(id).unwrap();
        assert_eq!(registry.create_entity_with_id(id), Err(EcsError::DuplicateEntity(id)));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut registry = EntityRegistry::new(2, 8);
        registry.create_entity().unwrap();
        registry.create_entity().unwrap();
        assert_eq!(registry.create_entity(), Err(EcsError::EntityCapacityExceeded(2)));
    }

    #[test]
    fn test_signature_tracks_components() {
        let mut registry = registry();
        let id = registry.create_entity().unwrap();
        let tag = registry.tag_of::<Velocity>().unwrap();

        registry.add_component(id, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
        assert!(registry.has_component::<Velocity>(id));
        assert!(registry.entity(id).unwrap().signature().contains(tag));

        registry.remove_component::<Velocity>(id).unwrap();
        assert!(!registry.has_component::<Velocity>(id));
        assert!(!registry.entity(id).unwrap().signature().contains(tag));
    }

    #[test]
    fn test_double_attach_and_missing_detach() {
        let mut registry = registry();
        let id = registry.create_entity().unwrap();

        registry.add_default_component::<Position>(id).unwrap();
        assert!(matches!(
            registry.add_component(id, Position { x: 1.0, y: 1.0 }),
            Err(EcsError::DuplicateComponent { .. })
        ));
        // Original value is untouched
        assert_eq!(registry.get_component::<Position>(id), Ok(&Position::default()));

        assert!(matches!(
            registry.remove_component::<Velocity>(id),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn test_component_on_missing_entity() {
        let mut registry = registry();
        let ghost = Identifier::generate();
        assert_eq!(
            registry.add_component(ghost, Position::default()).unwrap_err(),
            EcsError::EntityNotFound(ghost)
        );
        assert!(!registry.has_component::<Position>(ghost));
    }

    #[test]
    fn test_unregistered_component() {
        struct Unknown;
        let mut registry = registry();
        let id = registry.create_entity().unwrap();
        assert!(matches!(
            registry.add_component(id, Unknown),
            Err(EcsError::TypeNotRegistered(_))
        ));
        assert!(!registry.has_component::<Unknown>(id));
    }

    #[test]
    fn test_remove_entity_drops_components() {
        let mut registry = registry();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        registry.add_component(a, Position { x: 1.0, y: 2.0 }).unwrap();
        registry.add_component(b, Position { x: 3.0, y: 4.0 }).unwrap();

        registry.remove_entity(a).unwrap();
        assert!(registry.try_component::<Position>(a).is_none());
        assert_eq!(registry.component_types().table::<Position>().unwrap().len(), 1);
        assert_eq!(registry.get_component::<Position>(b), Ok(&Position { x: 3.0, y: 4.0 }));

        // Id can be reused once gone
        registry.create_entity_with_id(a).unwrap();
        assert!(!registry.has_component::<Position>(a));
    }

    #[test]
    fn test_position_velocity_integration() {
        let mut registry = registry();
        let id = registry.create_entity().unwrap();
        registry.add_component(id, Position { x: 0.0, y: 0.0 }).unwrap();
        registry.add_component(id, Velocity { dx: 1.0, dy: 0.0 }).unwrap();

        let delta_time = 2.0;
        let velocity = *registry.get_component::<Velocity>(id).unwrap();
        let position = registry.get_component_mut::<Position>(id).unwrap();
        position.x += velocity.dx * delta_time;
        position.y += velocity.dy * delta_time;

        assert_eq!(registry.get_component::<Position>(id).unwrap().x, 2.0);
    }
}
