mod cancel;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigureError;
use crate::paths::{RootContext, normalize_path_components};
use crate::properties::{PropertyMap, append_property_list};

pub use cancel::CancellationToken;

/// A project as the host hands it to configurators: a display name and where
/// it lives. Configurators only inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    name: String,
    location: PathBuf,
}

impl ProjectDescriptor {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Describe the project rooted at `dir`, named after its last component.
    pub fn from_dir(dir: &Path) -> Self {
        let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        let location = normalize_path_components(&absolute);
        let name = location
            .components()
            .next_back()
            .and_then(|component| match component {
                std::path::Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "project".to_string());
        Self { name, location }
    }

    pub fn from_current_dir() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_dir(&root)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// True when `relative` exists below the project location.
    pub fn has_file(&self, relative: &str) -> bool {
        self.location.join(relative).is_file()
    }

    pub fn has_dir(&self, relative: &str) -> bool {
        self.location.join(relative).is_dir()
    }
}

/// Everything one configuration run reads and writes. Created by the caller
/// per run and consumed with [`ConfigurationRequest::into_properties`].
#[derive(Debug, Clone)]
pub struct ConfigurationRequest {
    project: ProjectDescriptor,
    root: PathBuf,
    context: RootContext,
    properties: PropertyMap,
}

impl ConfigurationRequest {
    /// Request rooted at the project location, which is also the only known root.
    pub fn new(project: ProjectDescriptor) -> Self {
        let context = RootContext::single(project.location());
        let root = context
            .primary_root()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project.location().to_path_buf());
        Self {
            project,
            root,
            context,
            properties: PropertyMap::new(),
        }
    }

    /// Request resolved against a caller-supplied set of roots. The project
    /// location has to fall inside one of them.
    pub fn with_context(
        project: ProjectDescriptor,
        context: RootContext,
    ) -> Result<Self, ConfigureError> {
        let root = context
            .resolve(project.location())
            .ok_or_else(|| ConfigureError::PathResolution {
                path: project.location().to_path_buf(),
            })?;
        Ok(Self {
            project,
            root,
            context,
            properties: PropertyMap::new(),
        })
    }

    pub fn project(&self) -> &ProjectDescriptor {
        &self.project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn context(&self) -> &RootContext {
        &self.context
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    pub fn into_properties(self) -> PropertyMap {
        self.properties
    }

    pub fn absolute_path(&self, path: &Path) -> Option<String> {
        self.context.absolute_path(path)
    }

    /// `path` relative to the request root, `None` when it cannot be resolved.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        self.context.relative_path(&self.root, path)
    }

    /// Append the resolvable `paths`, relative to the root, under `key`.
    /// Nothing is written when none of them resolves.
    pub fn append_relative_paths<P: AsRef<Path>>(&mut self, key: &str, paths: &[P]) {
        let resolved: Vec<String> = paths
            .iter()
            .filter_map(|path| self.relative_path(path.as_ref()))
            .collect();
        if resolved.is_empty() {
            debug!(key, "no resolvable paths, skipping property");
            return;
        }
        append_property_list(&mut self.properties, key, resolved.into_iter().map(Some));
    }
}

/// A strategy that recognises one kind of project and writes its properties.
pub trait ProjectConfigurator {
    /// Stable identifier, used in logs, config files and `--only`.
    fn name(&self) -> &'static str;

    /// Whether this configurator knows how to handle `project`. Must not
    /// mutate anything.
    fn can_configure(&self, project: &ProjectDescriptor) -> bool;

    /// Write properties for the request's project. Long-running work polls
    /// `cancel` between steps.
    fn configure(
        &self,
        request: &mut ConfigurationRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ConfigureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Stop at the first configurator that applies.
    First,
    /// Run every configurator that applies, in list order.
    #[default]
    All,
}

/// Configurators from `configurators` that apply to `project`, in order.
pub fn select<'a>(
    configurators: &'a [Box<dyn ProjectConfigurator>],
    project: &ProjectDescriptor,
    policy: SelectionPolicy,
) -> Vec<&'a dyn ProjectConfigurator> {
    let mut selected = Vec::new();
    for configurator in configurators {
        if !configurator.can_configure(project) {
            debug!(
                configurator = configurator.name(),
                project = project.name(),
                "configurator does not apply"
            );
            continue;
        }
        selected.push(configurator.as_ref());
        if policy == SelectionPolicy::First {
            break;
        }
    }
    selected
}

/// Run a single configurator, refusing when it does not apply.
pub fn apply_configurator(
    configurator: &dyn ProjectConfigurator,
    request: &mut ConfigurationRequest,
    cancel: &CancellationToken,
) -> Result<(), ConfigureError> {
    if !configurator.can_configure(request.project()) {
        return Err(ConfigureError::NotApplicable {
            configurator: configurator.name().to_string(),
            project: request.project().name().to_string(),
        });
    }
    cancel.check(configurator.name())?;
    info!(
        configurator = configurator.name(),
        project = request.project().name(),
        "applying configurator"
    );
    configurator.configure(request, cancel)
}

/// Select under `policy` and apply each configurator in turn. Returns the
/// names of the configurators that ran; the first error stops the run.
pub fn configure_project(
    configurators: &[Box<dyn ProjectConfigurator>],
    request: &mut ConfigurationRequest,
    policy: SelectionPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<&'static str>, ConfigureError> {
    let selected = select(configurators, request.project(), policy);
    let mut applied = Vec::with_capacity(selected.len());
    for configurator in selected {
        apply_configurator(configurator, request, cancel)?;
        applied.push(configurator.name());
    }
    Ok(applied)
}
