//! End-to-end export: project directory in, property map out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::config::{LoadedProjectConfig, load_project_config_from_dir};
use crate::configurator::{
    CancellationToken, ConfigurationRequest, ProjectConfigurator, ProjectDescriptor,
    SelectionPolicy, apply_configurator, configure_project, select,
};
use crate::error::ConfigureError;
use crate::languages::{builtin_configurators, builtin_names, configurator_from_name};
use crate::paths::RootContext;
use crate::properties::PropertyMap;

/// Knobs a host passes for one export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Overrides the config file's `selection`.
    pub policy: Option<SelectionPolicy>,
    /// Run exactly this configurator, failing if it does not apply.
    pub only: Option<String>,
    /// Extra roots besides the project directory itself.
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub project: ProjectDescriptor,
    pub applied: Vec<&'static str>,
    pub config_path: Option<PathBuf>,
    pub properties: PropertyMap,
}

/// Names of the built-in configurators that apply to `dir`, honouring the
/// project config's `disabled` list.
pub fn detect(dir: &Path) -> Result<Vec<&'static str>> {
    let project = project_at(dir)?;
    let config = load_project_config_from_dir(project.location())?;
    let configurators = enabled_configurators(config.as_ref());
    Ok(select(&configurators, &project, SelectionPolicy::All)
        .iter()
        .map(|configurator| configurator.name())
        .collect())
}

pub fn export(
    dir: &Path,
    options: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportOutcome> {
    let project = project_at(dir)?;
    let config = load_project_config_from_dir(project.location())?;
    if let Some(loaded) = &config {
        debug!(path = %loaded.path.display(), "loaded project config");
    }

    let mut roots = vec![project.location().to_path_buf()];
    roots.extend(options.roots.iter().cloned());
    let mut request = ConfigurationRequest::with_context(project, RootContext::new(roots))?;

    let applied = match options.only.as_deref() {
        Some(name) => {
            let Some(configurator) = configurator_from_name(name) else {
                bail!(
                    "Unknown configurator `{}`. Supported values: {}.",
                    name,
                    builtin_names().join(", ")
                );
            };
            apply_configurator(configurator.as_ref(), &mut request, cancel)?;
            vec![configurator.name()]
        }
        None => {
            let policy = options
                .policy
                .or_else(|| config.as_ref().and_then(|loaded| loaded.data.selection))
                .unwrap_or_default();
            let configurators = enabled_configurators(config.as_ref());
            configure_project(&configurators, &mut request, policy, cancel)?
        }
    };

    if let Some(loaded) = &config {
        cancel.check("config")?;
        loaded.data.apply(&mut request);
    }
    info!(
        project = request.project().name(),
        configurators = applied.len(),
        properties = request.properties().len(),
        "export finished"
    );

    let project = request.project().clone();
    Ok(ExportOutcome {
        project,
        applied,
        config_path: config.map(|loaded| loaded.path),
        properties: request.into_properties(),
    })
}

/// True when the error chain bottoms out in a cancellation.
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ConfigureError>()
        .is_some_and(ConfigureError::is_cancelled)
}

fn project_at(dir: &Path) -> Result<ProjectDescriptor> {
    if !dir.is_dir() {
        bail!("project directory {} does not exist", dir.display());
    }
    let canonical = dir
        .canonicalize()
        .with_context(|| format!("resolving project directory {}", dir.display()))?;
    Ok(ProjectDescriptor::from_dir(&canonical))
}

fn enabled_configurators(config: Option<&LoadedProjectConfig>) -> Vec<Box<dyn ProjectConfigurator>> {
    builtin_configurators()
        .into_iter()
        .filter(|configurator| {
            let disabled = config.is_some_and(|loaded| loaded.data.is_disabled(configurator.name()));
            if disabled {
                debug!(configurator = configurator.name(), "disabled by project config");
            }
            !disabled
        })
        .collect()
}
