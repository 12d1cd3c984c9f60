//! Parent/Child Hierarchy
//!
//! Each live entity has one parent id (`Identifier::NULL` for roots) and
//! an ordered list of children. The two directions are always updated
//! together, so a child's parent pointer and its parent's child list
//! never disagree.
//!
//! The graph is kept acyclic: `set_parent` refuses any link that would
//! make an entity its own ancestor.

use std::collections::HashMap;

use crate::ecs::{EcsError, Identifier};

use super::error::SceneError;

#[derive(Debug, Default)]
pub struct Hierarchy {
    /// Parent of each tracked entity (NULL = root)
    parents: HashMap<Identifier, Identifier>,
    /// Children of each tracked entity, in insertion order
    children: HashMap<Identifier, Vec<Identifier>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `id` as a root with no children.
    pub fn insert(&mut self, id: Identifier) {
        self.parents.entry(id).or_insert(Identifier::NULL);
        self.children.entry(id).or_default();
    }

    /// Stop tracking `id`, unlinking it from its parent.
    /// Its children become roots; returns them.
    pub fn remove(&mut self, id: Identifier) -> Vec<Identifier> {
        self.detach(id);
        self.parents.remove(&id);
        let orphans = self.children.remove(&id).unwrap_or_default();
        for child in &orphans {
            if let Some(parent) = self.parents.get_mut(child) {
                *parent = Identifier::NULL;
            }
        }
        orphans
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.parents.contains_key(&id)
    }

    /// Parent of `id`, `Identifier::NULL` for roots and unknown ids.
    pub fn parent_of(&self, id: Identifier) -> Identifier {
        self.parents.get(&id).copied().unwrap_or(Identifier::NULL)
    }

    pub fn children_of(&self, id: Identifier) -> &[Identifier] {
        self.children.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Make `child` a child of `parent`, detaching it from any previous
    /// parent first. A NULL `parent` turns `child` into a root.
    pub fn set_parent(&mut self, child: Identifier, parent: Identifier) -> Result<(), SceneError> {
        if !self.contains(child) {
            return Err(EcsError::EntityNotFound(child).into());
        }
        if parent.is_null() {
            self.detach(child);
            return Ok(());
        }
        if !self.contains(parent) {
            return Err(EcsError::EntityNotFound(parent).into());
        }
        if child == parent {
            return Err(SceneError::SelfParent(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected { child, parent });
        }

        self.detach(child);
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);
        Ok(())
    }

    /// Turn `child` into a root.
    pub fn remove_parent(&mut self, child: Identifier) {
        self.detach(child);
    }

    /// True if `ancestor` appears on the parent chain above `id`.
    pub fn is_ancestor(&self, ancestor: Identifier, id: Identifier) -> bool {
        let mut current = self.parent_of(id);
        // Bounded by the entity count; the graph is acyclic by construction
        for _ in 0..=self.parents.len() {
            if current.is_null() {
                return false;
            }
            if current == ancestor {
                return true;
            }
            current = self.parent_of(current);
        }
        false
    }

    /// Stack of ids from `leaf` up to its root: `[leaf, parent, ..., root]`.
    /// Popping it visits the chain root first.
    pub fn chain_to_root(&self, leaf: Identifier) -> Vec<Identifier> {
        let mut stack = vec![leaf];
        let mut current = self.parent_of(leaf);
        while !current.is_null() && stack.len() <= self.parents.len() {
            stack.push(current);
            current = self.parent_of(current);
        }
        stack
    }

    /// Every descendant of `id`, depth-first, parents before children.
    pub fn descendants(&self, id: Identifier) -> Vec<Identifier> {
        let mut out = Vec::new();
        let mut pending: Vec<Identifier> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.children_of(next).iter().rev().copied());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    fn detach(&mut self, child: Identifier) {
        let Some(parent) = self.parents.get_mut(&child) else {
            return;
        };
        let old_parent = std::mem::replace(parent, Identifier::NULL);
        if let Some(siblings) = self.children.get_mut(&old_parent) {
            siblings.retain(|&e| e != child);
        }
    }
}
