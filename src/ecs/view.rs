//! Views
//!
//! A view walks the registry's dense entity array and yields the handles
//! whose signature covers a requested set of component types. It is lazy
//! and forward-only; ask the registry for a new one to start over.
//!
//! Order is storage order, which stops matching creation order as soon
//! as anything is removed. A view borrows the registry, so the borrow
//! checker rules out structural changes while one is alive; collect the
//! ids first (see [`View::ids`]) when entities must be mutated.

use super::component_registry::{Component, ComponentTypeRegistry};
use super::entity::{Entity, EntityStore, Signature};
use super::error::EcsError;
use super::identifier::Identifier;

/// A set of component types, written as a tuple: `(A,)`, `(A, B)`, ...
pub trait ComponentSet {
    fn signature(types: &ComponentTypeRegistry) -> Result<Signature, EcsError>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn signature(types: &ComponentTypeRegistry) -> Result<Signature, EcsError> {
                let mut signature = Signature::EMPTY;
                $( signature.set(types.tag_of::<$name>()?); )+
                Ok(signature)
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

#[derive(Debug, Clone, Copy)]
enum Filter {
    /// Every active entity
    All,
    /// Entities whose signature contains all these bits
    Matching(Signature),
}

/// Lazy filtered iterator over registry entities.
pub struct View<'a> {
    entities: &'a EntityStore,
    filter: Filter,
    next: usize,
}

impl<'a> View<'a> {
    pub(crate) fn matching(entities: &'a EntityStore, signature: Signature) -> Self {
        Self {
            entities,
            filter: Filter::Matching(signature),
            next: 0,
        }
    }

    pub(crate) fn all(entities: &'a EntityStore) -> Self {
        Self {
            entities,
            filter: Filter::All,
            next: 0,
        }
    }

    /// Just the ids of the remaining matches.
    pub fn ids(self) -> impl Iterator<Item = Identifier> + 'a {
        self.map(Entity::id)
    }

    fn accepts(&self, entity: &Entity) -> bool {
        match self.filter {
            Filter::All => entity.is_active(),
            Filter::Matching(signature) => entity.signature().contains_all(signature),
        }
    }
}

impl<'a> Iterator for View<'a> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<&'a Entity> {
        while let Some(entity) = self.entities.at(self.next) {
            self.next += 1;
            if self.accepts(entity) {
                return Some(entity);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.entities.len().saturating_sub(self.next)))
    }
}
