use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::common::{existing_dirs, failure, read_project_file};
use crate::configurator::{
    CancellationToken, ConfigurationRequest, ProjectConfigurator, ProjectDescriptor,
};
use crate::error::ConfigureError;
use crate::properties::{
    EXCLUSIONS, PROJECT_NAME, PROJECT_VERSION, SOURCES, TESTS, append_property_list,
    set_property,
};

const MANIFEST: &str = "Cargo.toml";
const NAME: &str = "rust";

/// Cargo packages and workspaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustConfigurator;

#[derive(Debug, Default, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
    workspace: Option<CargoWorkspace>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
    // `version.workspace = true` is a table, so keep it loose.
    version: Option<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CargoWorkspace {
    #[serde(default)]
    members: Vec<String>,
    package: Option<WorkspacePackage>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspacePackage {
    version: Option<String>,
}

impl CargoManifest {
    fn version(&self) -> Option<&str> {
        self.package
            .as_ref()
            .and_then(|package| package.version.as_ref())
            .and_then(toml::Value::as_str)
            .or_else(|| {
                self.workspace
                    .as_ref()
                    .and_then(|workspace| workspace.package.as_ref())
                    .and_then(|package| package.version.as_deref())
            })
    }
}

impl ProjectConfigurator for RustConfigurator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn can_configure(&self, project: &ProjectDescriptor) -> bool {
        project.has_file(MANIFEST)
    }

    fn configure(
        &self,
        request: &mut ConfigurationRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ConfigureError> {
        cancel.check(NAME)?;
        let manifest = load_manifest(request.project()).map_err(|e| failure(NAME, request, e))?;
        if manifest.package.is_none() && manifest.workspace.is_none() {
            return Err(failure(
                NAME,
                request,
                anyhow::anyhow!("{MANIFEST} has neither [package] nor [workspace]"),
            ));
        }

        let mut crate_dirs = Vec::new();
        if manifest.package.is_some() {
            crate_dirs.push(request.project().location().to_path_buf());
        }
        if let Some(workspace) = &manifest.workspace {
            for member in &workspace.members {
                cancel.check(NAME)?;
                let expanded = expand_member(request.project().location(), member)
                    .map_err(|e| failure(NAME, request, e))?;
                crate_dirs.extend(expanded);
            }
        }
        debug!(crates = crate_dirs.len(), "resolved cargo crates");

        cancel.check(NAME)?;
        let name = manifest
            .package
            .as_ref()
            .map(|package| package.name.clone())
            .unwrap_or_else(|| request.project().name().to_string());
        set_property(request.properties_mut(), PROJECT_NAME, Some(name.as_str()));
        set_property(
            request.properties_mut(),
            PROJECT_VERSION,
            manifest.version(),
        );

        let sources: Vec<PathBuf> = crate_dirs
            .iter()
            .flat_map(|dir| existing_dirs(dir, &["src"]))
            .collect();
        let tests: Vec<PathBuf> = crate_dirs
            .iter()
            .flat_map(|dir| existing_dirs(dir, &["tests", "benches"]))
            .collect();
        request.append_relative_paths(SOURCES, &sources);
        request.append_relative_paths(TESTS, &tests);
        append_property_list(request.properties_mut(), EXCLUSIONS, [Some("target/**")]);
        Ok(())
    }
}

fn load_manifest(project: &ProjectDescriptor) -> Result<CargoManifest> {
    let content = read_project_file(project, MANIFEST)?;
    toml::from_str(&content).with_context(|| format!("parsing {MANIFEST}"))
}

/// Workspace members are plain paths or a single trailing `*` glob.
fn expand_member(root: &Path, member: &str) -> Result<Vec<PathBuf>> {
    let Some(parent) = member.strip_suffix("/*") else {
        return Ok(vec![root.join(member)]);
    };
    let dir = root.join(parent);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut members = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        if path.join(MANIFEST).is_file() {
            members.push(path);
        }
    }
    members.sort();
    Ok(members)
}
