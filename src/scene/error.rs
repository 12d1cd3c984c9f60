//! Scene errors

use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::{EcsError, Identifier};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error("entity {0} cannot be its own parent")]
    SelfParent(Identifier),

    #[error("parenting {child} under {parent} would create a cycle")]
    CycleDetected { child: Identifier, parent: Identifier },

    #[error("entity {child} is listed as a child of both {first} and {second}")]
    MultipleParents {
        child: Identifier,
        first: Identifier,
        second: Identifier,
    },

    #[error("no behavior registered as {0:?}")]
    UnknownBehavior(String),

    /// A native behavior callback failed. Scripted failures are logged instead.
    #[error("behavior {behavior:?} on entity {entity} failed during {phase}")]
    Behavior {
        entity: Identifier,
        behavior: String,
        phase: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serialize scene: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to parse scene: {0}")]
    Deserialize(#[from] ron::error::SpannedError),

    #[error("scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
