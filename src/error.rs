use thiserror::Error;

/// Unified error type for git-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Command failed: {0}")]
    Command(String),

    /// A pipeline step failed; carries the name of the step that raised it.
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<ReleaseError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::Tag(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        ReleaseError::Branch(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a command error with context
    pub fn command(msg: impl Into<String>) -> Self {
        ReleaseError::Command(msg.into())
    }

    /// Wrap an error raised while executing the named step
    pub fn step(step: impl Into<String>, source: ReleaseError) -> Self {
        ReleaseError::Step {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Name of the step that failed, if this error came out of the pipeline
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            ReleaseError::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}
