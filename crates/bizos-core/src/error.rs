use thiserror::Error;

#[derive(Debug, Error)]
pub enum BizosError {
    #[error("not initialized: run 'bizos init'")]
    NotInitialized,

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("unknown artifact '{0}': expected business-name, legal-setup, branding, marketing, or growth")]
    InvalidArtifact(String),

    #[error("idea not found: {0}")]
    IdeaNotFound(String),

    #[error("no business idea selected: run 'bizos select' first")]
    NoSelection,

    #[error("no legal setup saved: run 'bizos artifact set legal-setup' first")]
    NoLegalSetup,

    #[error("no legal checklist step {0}")]
    InvalidStep(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BizosError>;
