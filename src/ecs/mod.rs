//! Entity Component Storage
//!
//! Dense, identifier-keyed storage for game objects and their data.
//!
//! Key concepts:
//! - Identifier: 128-bit random id, stable across save/load
//! - ComponentTable: packed array of one component type, O(1) add/remove
//! - Entity: handle carrying a signature of attached component types
//! - EntityRegistry: entities + component tables behind one API
//! - View: lazy filter over entities by component set
//!
//! Components are registered at runtime so game code and the loader can
//! add their own types; each registered type gets one bit in the entity
//! signature.

pub mod identifier;
pub mod error;
pub mod component;
pub mod component_registry;
pub mod entity;
pub mod world;
pub mod view;

pub use identifier::Identifier;
pub use error::{EcsError, IdentifierError};
pub use component::ComponentTable;
pub use component_registry::{Component, ComponentTag, ComponentTypeRegistry};
pub use entity::{Entity, EntityStore, Signature, MAX_COMPONENT_TYPES, MAX_ENTITIES};
pub use world::EntityRegistry;
pub use view::{ComponentSet, View};
