//! Crate error type
//!
//! Content warnings are collected rather than propagated; everything else flows
//! through `Result` back to the host loop.

use thiserror::Error;

/// Which kind of definition a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    ObjectType,
    WaveBlock,
    Upgrade,
    GuiScene,
    Level,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DefinitionKind::ObjectType => "object type",
            DefinitionKind::WaveBlock => "wave block",
            DefinitionKind::Upgrade => "upgrade",
            DefinitionKind::GuiScene => "GUI scene",
            DefinitionKind::Level => "level",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing {kind} definition `{name}`")]
    MissingDefinition { kind: DefinitionKind, name: String },

    #[error("corrupted save: {0}")]
    CorruptedSave(String),

    #[error("malformed attribute `{attribute}` on <{tag}>: `{value}`")]
    ContentParse {
        tag: String,
        attribute: String,
        value: String,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn missing(kind: DefinitionKind, name: impl Into<String>) -> Self {
        CoreError::MissingDefinition {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
