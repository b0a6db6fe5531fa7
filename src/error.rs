// src/error.rs

//! Error types for the package builder
//!
//! Every pipeline stage has its own variant so a failed build can always be
//! traced back to the stage and the external command that broke it.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Why an external command did not succeed
#[derive(Debug)]
pub enum CommandFailure {
    /// Process exited with a non-zero status
    Exit(i32),
    /// Process was terminated by a signal
    Signal(Option<i32>),
    /// Process exceeded the configured timeout and was killed
    TimedOut(Duration),
    /// Run was cancelled while the process was running
    Cancelled,
    /// Process could not be started
    Spawn(io::Error),
    /// Waiting on the process failed
    Io(io::Error),
}

impl CommandFailure {
    /// Exit status of the process, if it exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit(code) => write!(f, "exited with status {}", code),
            Self::Signal(Some(sig)) => write!(f, "killed by signal {}", sig),
            Self::Signal(None) => write!(f, "terminated without an exit status"),
            Self::TimedOut(limit) => write!(f, "timed out after {} seconds", limit.as_secs()),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Spawn(e) => write!(f, "could not be started: {}", e),
            Self::Io(e) => write!(f, "could not be waited on: {}", e),
        }
    }
}

/// Builder errors
#[derive(Error, Debug)]
pub enum Error {
    /// No recipe file exists for the requested name
    #[error("recipe not found: {name} (looked for {})", path.display())]
    RecipeNotFound { name: String, path: PathBuf },

    /// Recipe file exists but is malformed or ambiguous
    #[error("invalid recipe {}: {reason}", path.display())]
    InvalidRecipe { path: PathBuf, reason: String },

    /// Builder configuration file could not be read or parsed
    #[error("invalid configuration {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    /// Filesystem failure inside the workspace
    #[error("workspace error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fetching or checking out upstream source failed
    #[error("source acquisition failed: `{command}` {failure}")]
    Acquisition {
        command: String,
        failure: CommandFailure,
    },

    /// A patch was rejected by the source tree
    #[error("patch {patch} did not apply: {failure}")]
    PatchApplication {
        patch: String,
        failure: CommandFailure,
    },

    /// A recipe build step failed
    #[error("build step {index} `{command}` {failure}")]
    BuildStep {
        index: usize,
        command: String,
        failure: CommandFailure,
    },

    /// Preparing the image build context failed
    #[error("packaging failed: {message}")]
    Packaging {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The image build tool failed
    #[error("image build for {tag} {failure}")]
    ImageBuild {
        tag: String,
        failure: CommandFailure,
    },

    /// Filesystem failure outside the workspace
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled between stages
    #[error("build cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn workspace(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn packaging(message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self::Packaging {
            message: message.into(),
            source,
        }
    }

    /// The failing external command's details, if this error came from one
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            Self::Acquisition { failure, .. }
            | Self::PatchApplication { failure, .. }
            | Self::BuildStep { failure, .. }
            | Self::ImageBuild { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Process exit code for this error
    ///
    /// A failing external command's own status is propagated. Everything
    /// else, including signal deaths, maps to 1.
    pub fn exit_code(&self) -> i32 {
        self.command_failure()
            .and_then(CommandFailure::exit_code)
            .filter(|code| *code != 0)
            .unwrap_or(1)
    }
}
