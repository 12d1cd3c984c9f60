//! Storage errors
//!
//! Conditions that a debug build of a typical engine would assert on
//! (double add, missing component, full registry) are returned as values
//! here. Capacity and duplicate-id failures can come from loading a
//! corrupted save file, so callers get a chance to recover.

use thiserror::Error;

use super::identifier::Identifier;

/// Failure to parse an [`Identifier`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("malformed identifier {0:?}: expected 32 hex digits")]
    Malformed(String),
}

/// Errors raised by the entity/component storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity {0} already exists")]
    DuplicateEntity(Identifier),

    #[error("entity {0} not found")]
    EntityNotFound(Identifier),

    #[error("entity capacity exceeded (max {0})")]
    EntityCapacityExceeded(usize),

    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        entity: Identifier,
        component: &'static str,
    },

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Identifier,
        component: &'static str,
    },

    #[error("{component} table is full (max {capacity})")]
    ComponentCapacityExceeded {
        component: &'static str,
        capacity: usize,
    },

    #[error("component type {0} is already registered")]
    TypeAlreadyRegistered(&'static str),

    #[error("component type {0} was never registered")]
    TypeNotRegistered(&'static str),

    #[error("component type budget exhausted (max {max} types), cannot register {component}")]
    TypeBudgetExhausted {
        component: &'static str,
        max: usize,
    },
}
