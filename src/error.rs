use std::path::PathBuf;

use thiserror::Error;

/// Ways a configuration run can end without producing properties.
#[derive(Error, Debug)]
pub enum ConfigureError {
    #[error("`{configurator}` does not apply to project `{project}`")]
    NotApplicable {
        configurator: String,
        project: String,
    },

    #[error("`{configurator}` was cancelled")]
    Cancelled { configurator: String },

    #[error("cannot resolve path {}", path.display())]
    PathResolution { path: PathBuf },

    #[error("`{configurator}` failed to configure project `{project}`: {source:#}")]
    Failed {
        configurator: String,
        project: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ConfigureError {
    pub fn cancelled(configurator: &str) -> Self {
        Self::Cancelled {
            configurator: configurator.to_string(),
        }
    }

    pub fn failed(configurator: &str, project: &str, source: anyhow::Error) -> Self {
        Self::Failed {
            configurator: configurator.to_string(),
            project: project.to_string(),
            source,
        }
    }

    /// Cancellation is an abort requested by the host, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
