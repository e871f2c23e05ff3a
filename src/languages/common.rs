use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::configurator::{ConfigurationRequest, ProjectDescriptor};
use crate::error::ConfigureError;
use crate::properties::{EXCLUSIONS, append_property_list};

/// Directories from `candidates` that exist below `base`, in candidate order.
pub fn existing_dirs(base: &Path, candidates: &[&str]) -> Vec<PathBuf> {
    candidates
        .iter()
        .map(|candidate| base.join(candidate))
        .filter(|path| path.is_dir())
        .collect()
}

/// When the project root itself is a source directory, the test dirs below it
/// would be indexed twice. Exclude them from the sources instead.
pub fn exclude_tests_under_root(
    request: &mut ConfigurationRequest,
    sources: &[PathBuf],
    tests: &[PathBuf],
) {
    let location = request.project().location();
    if !sources.iter().any(|source| source == location) {
        return;
    }
    let patterns: Vec<String> = tests
        .iter()
        .filter_map(|test| request.relative_path(test))
        .map(|relative| format!("{}/**", relative.replace('\\', "/")))
        .collect();
    if patterns.is_empty() {
        return;
    }
    append_property_list(
        request.properties_mut(),
        EXCLUSIONS,
        patterns.iter().map(|pattern| Some(pattern.as_str())),
    );
}

/// Read a metadata file that sits in the project root.
pub fn read_project_file(project: &ProjectDescriptor, file: &str) -> Result<String> {
    let path = project.location().join(file);
    fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

/// Wrap a plumbing error with the configurator and project it happened in.
pub fn failure(
    configurator: &str,
    request: &ConfigurationRequest,
    source: anyhow::Error,
) -> ConfigureError {
    ConfigureError::failed(configurator, request.project().name(), source)
}

/// Leading version number out of a requirement such as `>=3.10,<4`.
pub fn leading_version(requirement: &str) -> Option<String> {
    let start = requirement.find(|c: char| c.is_ascii_digit())?;
    let version: String = requirement[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let version = version.trim_end_matches('.');
    (!version.is_empty()).then(|| version.to_string())
}
