//! Scene Serialization
//!
//! A [`SceneSnapshot`] is a plain-data copy of every entity: id, built-in
//! components, behavior name and saved state, and the ordered child list.
//! Snapshots are written as pretty RON.
//!
//! Loading is additive: entities are created with their saved ids in the
//! target scene, so loading the same file twice fails on the duplicate
//! ids instead of silently merging.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::{EcsError, Identifier};

use super::behavior::BehaviorComponent;
use super::components::{Camera, Sprite, Tag, Text};
use super::error::SceneError;
use super::transform::Transform;
use super::Scene;

fn default_active() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Behavior attachment as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ron::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: Identifier,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
    /// In sibling order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<Sprite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorSnapshot>,
}

impl EntitySnapshot {
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            active: true,
            children: Vec::new(),
            tag: None,
            transform: None,
            sprite: None,
            text: None,
            camera: None,
            behavior: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub entities: Vec<EntitySnapshot>,
}

impl SceneSnapshot {
    /// Copy every entity in `scene`, in storage order.
    pub fn capture(scene: &Scene) -> Self {
        let registry = scene.registry();
        let entities = (0..registry.entity_count())
            .filter_map(|slot| registry.entity_at(slot))
            .map(|entity| {
                let id = entity.id();
                EntitySnapshot {
                    id,
                    active: entity.is_active(),
                    children: scene.children_of(id).to_vec(),
                    tag: registry.try_component::<Tag>(id).cloned(),
                    transform: registry.try_component::<Transform>(id).copied(),
                    sprite: registry.try_component::<Sprite>(id).cloned(),
                    text: registry.try_component::<Text>(id).cloned(),
                    camera: registry.try_component::<Camera>(id).copied(),
                    behavior: registry.try_component::<BehaviorComponent>(id).map(|b| BehaviorSnapshot {
                        name: b.name().to_string(),
                        state: b.saved_state(),
                    }),
                }
            })
            .collect();
        Self { entities }
    }

    /// Reject snapshots that cannot load cleanly into `scene` before
    /// touching it: duplicate or taken ids, unknown behaviors, too many
    /// entities, and child lists that dangle, repeat a child or loop.
    pub fn validate_for(&self, scene: &Scene) -> Result<(), SceneError> {
        let registry = scene.registry();
        let free = registry.entity_capacity() - registry.entity_count();
        if self.entities.len() > free {
            return Err(EcsError::EntityCapacityExceeded(registry.entity_capacity()).into());
        }

        let mut ids = HashSet::with_capacity(self.entities.len());
        for entity in &self.entities {
            if entity.id.is_null() || !ids.insert(entity.id) || registry.contains(entity.id) {
                return Err(EcsError::DuplicateEntity(entity.id).into());
            }
            if let Some(behavior) = &entity.behavior {
                if !scene.behaviors().contains(&behavior.name) {
                    return Err(SceneError::UnknownBehavior(behavior.name.clone()));
                }
            }
        }

        let mut parents: HashMap<Identifier, Identifier> = HashMap::with_capacity(self.entities.len());
        for entity in &self.entities {
            for &child in &entity.children {
                if !ids.contains(&child) {
                    return Err(EcsError::EntityNotFound(child).into());
                }
                if child == entity.id {
                    return Err(SceneError::SelfParent(child));
                }
                if let Some(first) = parents.insert(child, entity.id) {
                    return Err(SceneError::MultipleParents {
                        child,
                        first,
                        second: entity.id,
                    });
                }
            }
        }
        check_acyclic(&parents)
    }

    /// Recreate every entity in `scene`: entities, then components, then
    /// parent links. On failure every entity created so far is removed
    /// again, leaving `scene` as it was.
    pub fn restore(self, scene: &mut Scene) -> Result<(), SceneError> {
        self.validate_for(scene)?;

        let mut created = Vec::with_capacity(self.entities.len());
        let result = self.restore_into(scene, &mut created);
        if result.is_err() {
            roll_back(scene, &created);
        }
        result
    }

    fn restore_into(self, scene: &mut Scene, created: &mut Vec<Identifier>) -> Result<(), SceneError> {
        for entity in &self.entities {
            created.push(scene.create_empty_entity(entity.id)?);
        }

        let mut links = Vec::new();
        for entity in self.entities {
            let id = entity.id;
            if let Some(tag) = entity.tag {
                scene.add_component(id, tag)?;
            }
            if let Some(transform) = entity.transform {
                scene.add_component(id, transform)?;
            }
            if let Some(sprite) = entity.sprite {
                scene.add_component(id, sprite)?;
            }
            if let Some(text) = entity.text {
                scene.add_component(id, text)?;
            }
            if let Some(camera) = entity.camera {
                scene.add_component(id, camera)?;
            }
            if let Some(behavior) = entity.behavior {
                let mut component = BehaviorComponent::new(behavior.name);
                if let Some(state) = behavior.state {
                    component = component.with_state(state);
                }
                scene.add_component(id, component)?;
            }
            if !entity.active {
                scene.set_active(id, false)?;
            }
            links.extend(entity.children.into_iter().map(|child| (child, id)));
        }

        for (child, parent) in links {
            scene.set_parent(child, parent)?;
        }

        scene.refresh_transforms()?;
        tracing::debug!(entities = scene.entity_count(), "scene snapshot restored");
        Ok(())
    }

    pub fn to_ron_string(&self) -> Result<String, SceneError> {
        let config = ron::ser::PrettyConfig::new().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, SceneError> {
        Ok(ron::from_str(text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let text = self.to_ron_string()?;
        fs::write(path, text).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }
}

/// Remove the entities of a failed restore, newest first.
fn roll_back(scene: &mut Scene, created: &[Identifier]) {
    for &id in created.iter().rev() {
        // Already gone with an earlier parent's subtree
        if !scene.is_alive(id) {
            continue;
        }
        if let Err(err) = scene.destroy_entity(id) {
            tracing::warn!(entity = %id, "rollback after failed restore: {err}");
        }
    }
    tracing::debug!(entities = created.len(), "partial scene restore rolled back");
}

/// Fail if following `parents` from any entity leads back to it.
fn check_acyclic(parents: &HashMap<Identifier, Identifier>) -> Result<(), SceneError> {
    let mut settled: HashSet<Identifier> = HashSet::with_capacity(parents.len());
    for &start in parents.keys() {
        let mut path = HashSet::new();
        let mut current = start;
        while let Some(&parent) = parents.get(&current) {
            if settled.contains(&current) {
                break;
            }
            if !path.insert(current) {
                return Err(SceneError::CycleDetected { child: current, parent });
            }
            current = parent;
        }
        settled.extend(path);
    }
    Ok(())
}

/// Write every entity of `scene` to a RON file.
pub fn save_scene(scene: &Scene, path: impl AsRef<Path>) -> Result<(), SceneError> {
    SceneSnapshot::capture(scene).save(path)
}

/// Add the entities stored at `path` to `scene`.
pub fn load_scene(scene: &mut Scene, path: impl AsRef<Path>) -> Result<(), SceneError> {
    SceneSnapshot::load(path)?.restore(scene)
}
