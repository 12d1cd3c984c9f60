//! Scene
//!
//! The scene owns the entity registry, the parent/child graph and the
//! behavior registry, and drives one frame as a fixed sequence of passes:
//!
//! 1. `process_input`: drain the input source; built-in shortcuts first,
//!    then `on_input` on every behavior
//! 2. `update`:
//!    - run deferred calls queued since the last update
//!    - `on_update` on every behavior
//!    - recompute cached parent transforms
//!    - remove entities flagged with `die()`, calling `on_destroy` once each
//!    - resolve the active camera
//! 3. `render`: sprites (by layer), then text, each with its global matrix
//!
//! Behaviors are dispatched one entity at a time. The instance is moved
//! out of its component for the duration of the hook, so the hook gets
//! free mutable access to the registry through its [`EntityContext`].

pub mod behavior;
pub mod commands;
pub mod components;
pub mod error;
pub mod hierarchy;
pub mod input;
pub mod render;
pub mod serializer;
pub mod transform;

pub use behavior::{Behavior, BehaviorComponent, BehaviorKind, BehaviorRegistry, EntityContext};
pub use commands::{Commands, DeferredCall};
pub use components::{Camera, Color, Sprite, Tag, Text};
pub use error::SceneError;
pub use hierarchy::Hierarchy;
pub use input::{InputEvent, InputQueue, InputSource, Key, MouseButton};
pub use render::{Drawable, Renderer};
pub use serializer::{EntitySnapshot, SceneSnapshot};
pub use transform::{propagate_transforms, Transform};

use tracing::{debug, warn};

use crate::config::SceneConfig;
use crate::ecs::{Component, EntityRegistry, Identifier};
use crate::math::{mat4_translation_of, Mat4, Vec2, MAT4_IDENTITY};

pub struct Scene {
    registry: EntityRegistry,
    hierarchy: Hierarchy,
    commands: Commands,
    behaviors: BehaviorRegistry,
    config: SceneConfig,
    view_position: Vec2,
    active_camera: Option<Identifier>,
    viewport_size: Vec2,
    running: bool,
    frame: u64,
}

impl Scene {
    /// Create an empty scene and register the built-in component types.
    pub fn new(config: SceneConfig, behaviors: BehaviorRegistry) -> Result<Self, SceneError> {
        let mut registry = EntityRegistry::new(config.max_entities, config.max_component_types);
        registry.register_component::<Tag>()?;
        registry.register_component::<Transform>()?;
        registry.register_component::<Sprite>()?;
        registry.register_component::<Text>()?;
        registry.register_component::<Camera>()?;
        registry.register_component::<BehaviorComponent>()?;

        Ok(Self {
            registry,
            hierarchy: Hierarchy::new(),
            commands: Commands::new(),
            behaviors,
            config,
            view_position: Vec2::ZERO,
            active_camera: None,
            viewport_size: Vec2::ZERO,
            running: true,
            frame: 0,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Create a named entity at the origin (`Tag` + default `Transform`).
    pub fn create_entity(&mut self, name: &str) -> Result<Identifier, SceneError> {
        self.create_entity_with_id(Identifier::generate(), name)
    }

    pub fn create_entity_with_id(&mut self, id: Identifier, name: &str) -> Result<Identifier, SceneError> {
        self.create_empty_entity(id)?;
        self.registry.add_component(id, Tag::new(name))?;
        self.registry.add_component(id, Transform::default())?;
        debug!(entity = %id, name, "entity created");
        Ok(id)
    }

    /// Create an entity with no components, as a root.
    pub fn create_empty_entity(&mut self, id: Identifier) -> Result<Identifier, SceneError> {
        self.registry.create_entity_with_id(id)?;
        self.hierarchy.insert(id);
        Ok(id)
    }

    /// Attach the behavior registered as `name`. It is built on first dispatch.
    pub fn attach_behavior(&mut self, id: Identifier, name: &str) -> Result<(), SceneError> {
        if !self.behaviors.contains(name) {
            return Err(SceneError::UnknownBehavior(name.to_string()));
        }
        self.registry.add_component(id, BehaviorComponent::new(name))?;
        Ok(())
    }

    /// Make `T` available to entities beyond the built-in components.
    pub fn register_component<T: Component>(&mut self) -> Result<(), SceneError> {
        self.registry.register_component::<T>()?;
        Ok(())
    }

    pub fn add_component<T: Component>(&mut self, id: Identifier, value: T) -> Result<&mut T, SceneError> {
        Ok(self.registry.add_component(id, value)?)
    }

    pub fn remove_component<T: Component>(&mut self, id: Identifier) -> Result<T, SceneError> {
        Ok(self.registry.remove_component::<T>(id)?)
    }

    pub fn get_component<T: Component>(&self, id: Identifier) -> Result<&T, SceneError> {
        Ok(self.registry.get_component::<T>(id)?)
    }

    pub fn get_component_mut<T: Component>(&mut self, id: Identifier) -> Result<&mut T, SceneError> {
        Ok(self.registry.get_component_mut::<T>(id)?)
    }

    pub fn has_component<T: Component>(&self, id: Identifier) -> bool {
        self.registry.has_component::<T>(id)
    }

    /// First entity whose `Tag` is `name`, in storage order.
    pub fn entity_by_name(&self, name: &str) -> Option<Identifier> {
        self.registry
            .view::<(Tag,)>()
            .ok()?
            .ids()
            .find(|&id| self.registry.try_component::<Tag>(id).is_some_and(|tag| tag.name == name))
    }

    /// Flag `id` (and its subtree) for removal at the end of the next update.
    pub fn die(&mut self, id: Identifier) -> Result<(), SceneError> {
        self.registry.entity(id)?;
        self.commands.queue_deletion(id);
        Ok(())
    }

    /// Inactive entities are skipped by `view_all` but keep their components.
    pub fn set_active(&mut self, id: Identifier, active: bool) -> Result<(), SceneError> {
        Ok(self.registry.set_active(id, active)?)
    }

    pub fn is_alive(&self, id: Identifier) -> bool {
        self.registry.contains(id)
    }

    /// Remove `id` and its descendants now, children first.
    /// Each instantiated behavior gets `on_destroy` exactly once.
    pub fn destroy_entity(&mut self, id: Identifier) -> Result<(), SceneError> {
        self.registry.entity(id)?;

        for child in self.hierarchy.children_of(id).to_vec() {
            if self.registry.contains(child) {
                self.destroy_entity(child)?;
            }
        }

        self.destroy_behavior(id)?;
        self.hierarchy.remove(id);
        self.registry.remove_entity(id)?;
        if self.active_camera == Some(id) {
            self.active_camera = None;
        }
        debug!(entity = %id, "entity destroyed");
        Ok(())
    }

    pub fn entity_count(&self) -> usize {
        self.registry.entity_count()
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Make `child` a child of `parent`; `Identifier::NULL` detaches it.
    pub fn set_parent(&mut self, child: Identifier, parent: Identifier) -> Result<(), SceneError> {
        // Entities created straight through the registry join the graph here
        for id in [child, parent] {
            if self.registry.contains(id) {
                self.hierarchy.insert(id);
            }
        }
        self.hierarchy.set_parent(child, parent)
    }

    pub fn remove_parent(&mut self, child: Identifier) {
        self.hierarchy.remove_parent(child);
    }

    pub fn parent_of(&self, id: Identifier) -> Identifier {
        self.hierarchy.parent_of(id)
    }

    pub fn children_of(&self, id: Identifier) -> &[Identifier] {
        self.hierarchy.children_of(id)
    }

    // =========================================================================
    // Frame Passes
    // =========================================================================

    /// Queue `call` to run at the start of the next update.
    pub fn defer_call<F>(&mut self, call: F)
    where
        F: FnOnce(&mut Scene) -> Result<(), SceneError> + 'static,
    {
        self.commands.defer(call);
    }

    /// Drain `source` completely, dispatching each event.
    pub fn process_input(&mut self, source: &mut dyn InputSource) -> Result<(), SceneError> {
        while let Some(event) = source.poll_event() {
            self.apply_shortcuts(&event);
            for id in self.behavior_entities()? {
                if self.registry.contains(id) {
                    self.dispatch(id, "input", |behavior, ctx| behavior.on_input(ctx, &event))?;
                }
            }
        }
        self.apply_close_request();
        Ok(())
    }

    /// Advance the scene by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) -> Result<(), SceneError> {
        self.run_deferred()?;

        for id in self.behavior_entities()? {
            // Earlier hooks this pass may have removed it
            if self.registry.contains(id) {
                self.dispatch(id, "update", |behavior, ctx| behavior.on_update(ctx, delta_time))?;
            }
        }

        self.refresh_transforms()?;

        for id in self.commands.take_deletions() {
            if self.registry.contains(id) {
                self.destroy_entity(id)?;
            }
        }

        self.resolve_camera()?;
        self.apply_close_request();
        self.frame += 1;
        Ok(())
    }

    /// Submit every drawable: sprites ordered by layer, then text.
    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        renderer.begin(self.view_position);

        let mut sprites: Vec<(i32, Identifier)> = self
            .registry
            .view::<(Sprite,)>()?
            .ids()
            .filter_map(|id| self.registry.try_component::<Sprite>(id).map(|s| (s.layer, id)))
            .collect();
        sprites.sort_by_key(|&(layer, _)| layer);
        for (_, id) in sprites {
            let sprite = self.registry.get_component::<Sprite>(id)?;
            sprite.draw(renderer, &self.global_transform(id));
        }

        for id in self.registry.view::<(Text,)>()?.ids() {
            let text = self.registry.get_component::<Text>(id)?;
            text.draw(renderer, &self.global_transform(id));
        }

        renderer.end();
        Ok(())
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Recompute cached parent matrices now instead of waiting for `update`.
    pub fn refresh_transforms(&mut self) -> Result<(), SceneError> {
        propagate_transforms(&mut self.registry, &self.hierarchy)?;
        Ok(())
    }

    /// Global matrix as of the last update; identity without a `Transform`.
    pub fn global_transform(&self, id: Identifier) -> Mat4 {
        self.registry
            .try_component::<Transform>(id)
            .map(Transform::global_matrix)
            .unwrap_or(MAT4_IDENTITY)
    }

    /// World position of the active camera as of the last update.
    pub fn view_position(&self) -> Vec2 {
        self.view_position
    }

    pub fn active_camera(&self) -> Option<Identifier> {
        self.active_camera
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport_size = size;
    }

    /// Completed update passes.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_close(&mut self) {
        self.running = false;
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Raw storage access. Entities removed here would skip the hierarchy
    /// and destroy hooks, so it stays inside the crate.
    pub(crate) fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    pub fn behaviors_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.behaviors
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn apply_shortcuts(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed(Key::Escape) if self.config.close_on_escape => {
                debug!("escape pressed, closing scene");
                self.running = false;
            }
            InputEvent::CloseRequested => {
                debug!("close requested by platform");
                self.running = false;
            }
            InputEvent::Resized { width, height } => {
                self.viewport_size = Vec2::new(width, height);
            }
            _ => {}
        }
    }

    fn apply_close_request(&mut self) {
        if self.commands.take_close_request() {
            debug!("close requested by behavior");
            self.running = false;
        }
    }

    fn run_deferred(&mut self) -> Result<(), SceneError> {
        let mut calls = self.commands.take_deferred().into_iter();
        while let Some(call) = calls.next() {
            if let Err(err) = call(self) {
                self.commands.requeue_deferred(calls);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Snapshot of entities carrying a behavior, taken before dispatching.
    fn behavior_entities(&self) -> Result<Vec<Identifier>, SceneError> {
        Ok(self.registry.view::<(BehaviorComponent,)>()?.ids().collect())
    }

    fn resolve_camera(&mut self) -> Result<(), SceneError> {
        let mut enabled: Vec<Identifier> = self
            .registry
            .view::<(Camera,)>()?
            .ids()
            .filter(|&id| self.registry.try_component::<Camera>(id).is_some_and(|c| c.enabled))
            .collect();
        enabled.sort();

        let chosen = enabled.first().copied();
        if let Some(id) = chosen {
            if self.active_camera != Some(id) {
                if enabled.len() > 1 {
                    warn!(count = enabled.len(), camera = %id, "several cameras enabled, using lowest id");
                }
                debug!(camera = %id, "active camera changed");
            }
            self.view_position = mat4_translation_of(&self.global_transform(id)).xy();
        }
        self.active_camera = chosen;
        Ok(())
    }

    /// Run one hook on `id`'s behavior, building the instance first if needed.
    fn dispatch<F>(&mut self, id: Identifier, phase: &'static str, hook: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut dyn Behavior, &mut EntityContext<'_>) -> anyhow::Result<()>,
    {
        let (name, existing, pending) = {
            let Some(component) = self.registry.try_component_mut::<BehaviorComponent>(id) else {
                return Ok(());
            };
            let existing = component.take_instance();
            let pending = if existing.is_none() {
                component.take_pending_state()
            } else {
                None
            };
            (component.name().to_string(), existing, pending)
        };

        let (kind, mut instance) = match existing {
            Some(instance) => {
                let kind = self.behaviors.kind_of(&name).unwrap_or(BehaviorKind::Native);
                (kind, instance)
            }
            None => self.instantiate(id, &name, pending)?,
        };

        let result = self.run_hook(id, &name, kind, phase, instance.as_mut(), hook);

        // The hook may have removed the entity or swapped its behavior
        if let Some(component) = self.registry.try_component_mut::<BehaviorComponent>(id) {
            if component.name() == name {
                component.put_instance(instance);
            }
        }
        result
    }

    fn instantiate(
        &mut self,
        id: Identifier,
        name: &str,
        pending: Option<ron::Value>,
    ) -> Result<(BehaviorKind, Box<dyn Behavior>), SceneError> {
        let (kind, mut instance) = self.behaviors.instantiate(name)?;
        debug!(entity = %id, behavior = name, ?kind, "behavior instantiated");

        self.run_hook(id, name, kind, "create", instance.as_mut(), |b, ctx| b.on_create(ctx))?;
        if let Some(state) = pending {
            self.run_hook(id, name, kind, "restore", instance.as_mut(), move |b, _| {
                b.restore_state(&state)
            })?;
            self.run_hook(id, name, kind, "load", instance.as_mut(), |b, ctx| b.on_load(ctx))?;
        }
        Ok((kind, instance))
    }

    fn destroy_behavior(&mut self, id: Identifier) -> Result<(), SceneError> {
        let Some(component) = self.registry.try_component_mut::<BehaviorComponent>(id) else {
            return Ok(());
        };
        // Never dispatched, nothing to tear down
        let Some(mut instance) = component.take_instance() else {
            return Ok(());
        };
        let name = component.name().to_string();
        let kind = self.behaviors.kind_of(&name).unwrap_or(BehaviorKind::Native);
        self.run_hook(id, &name, kind, "destroy", instance.as_mut(), |b, ctx| b.on_destroy(ctx))
    }

    /// Call `hook` and settle its result by trust level: native failures
    /// become errors, scripted failures are logged.
    fn run_hook<F>(
        &mut self,
        id: Identifier,
        name: &str,
        kind: BehaviorKind,
        phase: &'static str,
        behavior: &mut dyn Behavior,
        hook: F,
    ) -> Result<(), SceneError>
    where
        F: FnOnce(&mut dyn Behavior, &mut EntityContext<'_>) -> anyhow::Result<()>,
    {
        let result = {
            let mut ctx = EntityContext::new(id, &mut self.registry, &mut self.hierarchy, &mut self.commands);
            hook(behavior, &mut ctx)
        };

        match (result, kind) {
            (Ok(()), _) => Ok(()),
            (Err(source), BehaviorKind::Native) => Err(SceneError::Behavior {
                entity: id,
                behavior: name.to_string(),
                phase,
                source,
            }),
            (Err(err), BehaviorKind::Scripted) => {
                tracing::error!(entity = %id, behavior = name, phase, "scripted behavior failed: {err:#}");
                Ok(())
            }
        }
    }
}
