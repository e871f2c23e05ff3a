use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::common::{
    existing_dirs, exclude_tests_under_root, failure, leading_version, read_project_file,
};
use crate::configurator::{
    CancellationToken, ConfigurationRequest, ProjectConfigurator, ProjectDescriptor,
};
use crate::error::ConfigureError;
use crate::properties::{
    EXCLUSIONS, PROJECT_NAME, PROJECT_VERSION, PYTHON_VERSION, SOURCES, TESTS,
    append_property_list, set_property,
};

const NAME: &str = "python";
const MARKERS: &[&str] = &["pyproject.toml", "setup.py", "setup.cfg", "requirements.txt"];

/// Python projects laid out with pyproject, setuptools or a bare requirements.txt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonConfigurator;

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    project: Option<PyProjectTable>,
    tool: Option<ToolTable>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProjectTable {
    name: Option<String>,
    version: Option<String>,
    #[serde(rename = "requires-python")]
    requires_python: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    poetry: Option<PoetryTable>,
}

#[derive(Debug, Default, Deserialize)]
struct PoetryTable {
    name: Option<String>,
    version: Option<String>,
}

/// What the metadata files tell us, with `[project]` winning over poetry.
#[derive(Debug, Default)]
struct PythonMetadata {
    name: Option<String>,
    version: Option<String>,
    python: Option<String>,
}

impl From<PyProject> for PythonMetadata {
    fn from(pyproject: PyProject) -> Self {
        let project = pyproject.project.unwrap_or_default();
        let poetry = pyproject
            .tool
            .and_then(|tool| tool.poetry)
            .unwrap_or_default();
        Self {
            name: project.name.or(poetry.name),
            version: project.version.or(poetry.version),
            python: project
                .requires_python
                .as_deref()
                .and_then(leading_version),
        }
    }
}

impl ProjectConfigurator for PythonConfigurator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn can_configure(&self, project: &ProjectDescriptor) -> bool {
        MARKERS.iter().any(|marker| project.has_file(marker))
    }

    fn configure(
        &self,
        request: &mut ConfigurationRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ConfigureError> {
        cancel.check(NAME)?;
        let metadata = load_metadata(request.project()).map_err(|e| failure(NAME, request, e))?;

        cancel.check(NAME)?;
        let location = request.project().location().to_path_buf();
        let sources = source_dirs(&location, metadata.name.as_deref());
        let tests = existing_dirs(&location, &["tests", "test"]);

        set_property(
            request.properties_mut(),
            PROJECT_NAME,
            metadata.name.as_deref(),
        );
        set_property(
            request.properties_mut(),
            PROJECT_VERSION,
            metadata.version.as_deref(),
        );
        set_property(
            request.properties_mut(),
            PYTHON_VERSION,
            metadata.python.as_deref(),
        );
        request.append_relative_paths(SOURCES, &sources);
        request.append_relative_paths(TESTS, &tests);
        append_property_list(
            request.properties_mut(),
            EXCLUSIONS,
            [".venv/**", "venv/**", "**/__pycache__/**"].map(Some),
        );
        exclude_tests_under_root(request, &sources, &tests);
        Ok(())
    }
}

fn load_metadata(project: &ProjectDescriptor) -> Result<PythonMetadata> {
    if !project.has_file("pyproject.toml") {
        return Ok(PythonMetadata::default());
    }
    let content = read_project_file(project, "pyproject.toml")?;
    let pyproject: PyProject = toml::from_str(&content).context("parsing pyproject.toml")?;
    Ok(pyproject.into())
}

/// `src/` layout first, then a package named after the project, then the root.
fn source_dirs(location: &std::path::Path, name: Option<&str>) -> Vec<PathBuf> {
    let src = existing_dirs(location, &["src"]);
    if !src.is_empty() {
        return src;
    }
    if let Some(name) = name {
        let package = name.replace('-', "_");
        let found = existing_dirs(location, &[package.as_str()]);
        if !found.is_empty() {
            return found;
        }
    }
    vec![location.to_path_buf()]
}
