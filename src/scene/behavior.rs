//! Behaviors
//!
//! A behavior is per-entity game logic with lifecycle hooks. The scene
//! owns a [`BehaviorRegistry`] mapping names to constructors, and an
//! entity opts in by carrying a [`BehaviorComponent`] with one of those
//! names. The instance is built lazily on first dispatch, which also lets
//! a loaded scene name behaviors it has not constructed yet.
//!
//! Two trust levels share the same trait:
//! - Native: first-party Rust. A failing hook aborts the frame with an error.
//! - Scripted: driven by an embedded interpreter. A failing hook is logged
//!   and the frame carries on with the next entity.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ecs::{Component, EcsError, EntityRegistry, Identifier};

use super::commands::Commands;
use super::error::SceneError;
use super::hierarchy::Hierarchy;
use super::input::InputEvent;
use super::Scene;

/// Lifecycle hooks, all optional.
pub trait Behavior {
    /// First dispatch after the instance is built.
    fn on_create(&mut self, _ctx: &mut EntityContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// After `restore_state`, when the entity came from a saved scene.
    fn on_load(&mut self, _ctx: &mut EntityContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut EntityContext<'_>, _delta_time: f32) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_input(&mut self, _ctx: &mut EntityContext<'_>, _event: &InputEvent) -> anyhow::Result<()> {
        Ok(())
    }

    /// Entity is about to be removed.
    fn on_destroy(&mut self, _ctx: &mut EntityContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// State written into scene files.
    fn save_state(&self) -> Option<ron::Value> {
        None
    }

    fn restore_state(&mut self, _state: &ron::Value) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorKind {
    Native,
    Scripted,
}

/// Attaches a named behavior to an entity.
pub struct BehaviorComponent {
    name: String,
    instance: Option<Box<dyn Behavior>>,
    /// Loaded state not yet handed to an instance
    pending_state: Option<ron::Value>,
}

impl BehaviorComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
            pending_state: None,
        }
    }

    /// Restore `state` when the instance is first built.
    pub fn with_state(mut self, state: ron::Value) -> Self {
        self.pending_state = Some(state);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_instantiated(&self) -> bool {
        self.instance.is_some()
    }

    /// Current state for saving: the live instance's, else whatever was loaded.
    pub fn saved_state(&self) -> Option<ron::Value> {
        match &self.instance {
            Some(instance) => instance.save_state(),
            None => self.pending_state.clone(),
        }
    }

    pub(crate) fn take_instance(&mut self) -> Option<Box<dyn Behavior>> {
        self.instance.take()
    }

    pub(crate) fn put_instance(&mut self, instance: Box<dyn Behavior>) {
        if self.instance.is_none() {
            self.instance = Some(instance);
        }
    }

    pub(crate) fn take_pending_state(&mut self) -> Option<ron::Value> {
        self.pending_state.take()
    }
}

impl fmt::Debug for BehaviorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorComponent")
            .field("name", &self.name)
            .field("instantiated", &self.instance.is_some())
            .field("pending_state", &self.pending_state)
            .finish()
    }
}

type Constructor = Box<dyn Fn() -> Box<dyn Behavior>>;

struct Registration {
    kind: BehaviorKind,
    constructor: Constructor,
}

/// Name -> constructor table, handed to the scene at construction.
#[derive(Default)]
pub struct BehaviorRegistry {
    entries: HashMap<String, Registration>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a constructor under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, kind: BehaviorKind, constructor: F)
    where
        F: Fn() -> Box<dyn Behavior> + 'static,
    {
        let name = name.into();
        let registration = Registration {
            kind,
            constructor: Box::new(constructor),
        };
        if self.entries.insert(name.clone(), registration).is_some() {
            tracing::warn!(behavior = %name, "behavior constructor replaced");
        }
    }

    pub fn register_native<B: Behavior + Default + 'static>(&mut self, name: impl Into<String>) {
        self.register(name, BehaviorKind::Native, || Box::new(B::default()));
    }

    pub fn register_scripted<B: Behavior + Default + 'static>(&mut self, name: impl Into<String>) {
        self.register(name, BehaviorKind::Scripted, || Box::new(B::default()));
    }

    pub fn kind_of(&self, name: &str) -> Option<BehaviorKind> {
        self.entries.get(name).map(|r| r.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Build a fresh instance of `name`.
    pub fn instantiate(&self, name: &str) -> Result<(BehaviorKind, Box<dyn Behavior>), SceneError> {
        let registration = self
            .entries
            .get(name)
            .ok_or_else(|| SceneError::UnknownBehavior(name.to_string()))?;
        Ok((registration.kind, (registration.constructor)()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a behavior hook sees: its own entity plus the scene's storage.
///
/// Component changes, on this entity or any other, are immediate. Entity
/// removal is only queued (`die`, `destroy`) and creation goes through
/// `defer`, so the hierarchy and destroy hooks always run.
pub struct EntityContext<'a> {
    id: Identifier,
    registry: &'a mut EntityRegistry,
    hierarchy: &'a mut Hierarchy,
    commands: &'a mut Commands,
}

impl<'a> EntityContext<'a> {
    pub(crate) fn new(
        id: Identifier,
        registry: &'a mut EntityRegistry,
        hierarchy: &'a mut Hierarchy,
        commands: &'a mut Commands,
    ) -> Self {
        Self {
            id,
            registry,
            hierarchy,
            commands,
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn registry(&self) -> &EntityRegistry {
        self.registry
    }

    /// This entity's `T`.
    pub fn get<T: Component>(&self) -> Result<&T, EcsError> {
        self.registry.get_component::<T>(self.id)
    }

    pub fn get_mut<T: Component>(&mut self) -> Result<&mut T, EcsError> {
        self.registry.get_component_mut::<T>(self.id)
    }

    pub fn has<T: Component>(&self) -> bool {
        self.registry.has_component::<T>(self.id)
    }

    pub fn add<T: Component>(&mut self, value: T) -> Result<&mut T, EcsError> {
        self.registry.add_component(self.id, value)
    }

    pub fn remove<T: Component>(&mut self) -> Result<T, EcsError> {
        self.registry.remove_component::<T>(self.id)
    }

    /// Another entity's `T`.
    pub fn component_of<T: Component>(&self, id: Identifier) -> Result<&T, EcsError> {
        self.registry.get_component::<T>(id)
    }

    pub fn component_of_mut<T: Component>(&mut self, id: Identifier) -> Result<&mut T, EcsError> {
        self.registry.get_component_mut::<T>(id)
    }

    /// Flag this entity for removal once the update pass finishes.
    pub fn die(&mut self) {
        self.commands.queue_deletion(self.id);
    }

    /// Flag `id` and its subtree for removal once the update pass finishes.
    pub fn destroy(&mut self, id: Identifier) -> Result<(), EcsError> {
        self.registry.entity(id)?;
        self.commands.queue_deletion(id);
        Ok(())
    }

    pub fn is_dying(&self) -> bool {
        self.commands.is_queued_for_deletion(self.id)
    }

    /// Run `call` before the next update pass.
    pub fn defer<F>(&mut self, call: F)
    where
        F: FnOnce(&mut Scene) -> Result<(), SceneError> + 'static,
    {
        self.commands.defer(call);
    }

    pub fn parent(&self) -> Identifier {
        self.hierarchy.parent_of(self.id)
    }

    pub fn children(&self) -> &[Identifier] {
        self.hierarchy.children_of(self.id)
    }

    pub fn set_parent(&mut self, parent: Identifier) -> Result<(), SceneError> {
        self.hierarchy.set_parent(self.id, parent)
    }

    /// Ask the frame loop to stop after this frame.
    pub fn request_close(&mut self) {
        self.commands.request_close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        count: i64,
    }

    impl Behavior for Counter {
        fn save_state(&self) -> Option<ron::Value> {
            Some(ron::Value::Number(ron::Number::from(self.count)))
        }
    }

    #[test]
    fn test_registry_instantiates_by_name() {
        let mut registry = BehaviorRegistry::new();
        registry.register_native::<Counter>("counter");
        registry.register_scripted::<Counter>("script_counter");

        assert_eq!(registry.kind_of("counter"), Some(BehaviorKind::Native));
        assert_eq!(registry.kind_of("script_counter"), Some(BehaviorKind::Scripted));
        assert_eq!(registry.len(), 2);

        let (kind, instance) = registry.instantiate("counter").unwrap();
        assert_eq!(kind, BehaviorKind::Native);
        assert!(instance.save_state().is_some());
    }

    #[test]
    fn test_unknown_behavior() {
        let registry = BehaviorRegistry::new();
        assert!(matches!(
            registry.instantiate("nope"),
            Err(SceneError::UnknownBehavior(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_component_state_before_and_after_instance() {
        let state = ron::Value::Number(ron::Number::from(3i64));
        let mut component = BehaviorComponent::new("counter").with_state(state.clone());
        assert_eq!(component.saved_state(), Some(state.clone()));
        assert!(!component.is_instantiated());

        assert_eq!(component.take_pending_state(), Some(state));
        component.put_instance(Box::new(Counter { count: 9 }));
        assert!(component.is_instantiated());
        assert_eq!(
            component.saved_state(),
            Some(ron::Value::Number(ron::Number::from(9i64)))
        );
    }
}
