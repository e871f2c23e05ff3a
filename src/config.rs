use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::configurator::{ConfigurationRequest, SelectionPolicy};
use crate::properties::{EXCLUSIONS, SOURCES, TESTS, append_property_list, set_property};

const CONFIG_CANDIDATES: &[(&str, ConfigFormat)] = &[
    ("propex.yml", ConfigFormat::Yaml),
    ("propex.yaml", ConfigFormat::Yaml),
    ("propex.toml", ConfigFormat::Toml),
];

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

#[derive(Debug, Clone)]
pub struct LoadedProjectConfig {
    pub path: PathBuf,
    pub data: ProjectConfig,
}

/// Per-project overrides read from `propex.yml` / `propex.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub selection: Option<SelectionPolicy>,
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub tests: Vec<PathBuf>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ProjectConfig {
    pub fn is_disabled(&self, configurator: &str) -> bool {
        self.disabled
            .iter()
            .any(|name| name.trim().eq_ignore_ascii_case(configurator))
    }

    /// Contribute the configured paths and properties after the configurators
    /// ran. Explicit `properties` are written last and win.
    pub fn apply(&self, request: &mut ConfigurationRequest) {
        for (key, paths) in [(SOURCES, &self.sources), (TESTS, &self.tests)] {
            let unresolved = paths
                .iter()
                .filter(|path| request.relative_path(path).is_none());
            for path in unresolved {
                warn!(key, path = %path.display(), "configured path is outside the project roots, skipping");
            }
            request.append_relative_paths(key, paths);
        }
        if !self.exclusions.is_empty() {
            append_property_list(
                request.properties_mut(),
                EXCLUSIONS,
                self.exclusions.iter().map(Some),
            );
        }
        for (key, value) in &self.properties {
            set_property(request.properties_mut(), key, Some(value.as_str()));
        }
    }
}

pub fn load_project_config_from_dir(base_dir: &Path) -> Result<Option<LoadedProjectConfig>> {
    for (file, format) in CONFIG_CANDIDATES {
        let path = base_dir.join(file);
        if !path.exists() {
            continue;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading project config at {}", path.display()))?;
        let data = match format {
            ConfigFormat::Yaml => parse_yaml_str(&content)
                .with_context(|| format!("parsing YAML config at {}", path.display()))?,
            ConfigFormat::Toml => parse_toml_str(&content)
                .with_context(|| format!("parsing TOML config at {}", path.display()))?,
        };
        return Ok(Some(LoadedProjectConfig { path, data }));
    }
    Ok(None)
}

pub(crate) fn parse_yaml_str(content: &str) -> Result<ProjectConfig> {
    // An empty file parses as YAML null; treat it like an empty mapping.
    if content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

pub(crate) fn parse_toml_str(content: &str) -> Result<ProjectConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configurator::ProjectDescriptor;
    use tempfile::tempdir;

    #[test]
    fn parses_yaml_overrides() {
        let tmp = tempdir().expect("temp dir");
        let yaml = r#"selection: first
disabled: [JS]
sources:
  - generated
exclusions:
  - "**/*.gen.rs"
properties:
  sonar.projectKey: my-key
"#;
        fs::write(tmp.path().join("propex.yml"), yaml).expect("write yaml");

        let loaded = load_project_config_from_dir(tmp.path())
            .expect("parse yaml")
            .expect("config present");

        assert_eq!(loaded.path, tmp.path().join("propex.yml"));
        assert_eq!(loaded.data.selection, Some(SelectionPolicy::First));
        assert!(loaded.data.is_disabled("js"));
        assert!(!loaded.data.is_disabled("rust"));
        assert_eq!(loaded.data.sources, vec![PathBuf::from("generated")]);
        assert_eq!(
            loaded.data.properties.get("sonar.projectKey").map(String::as_str),
            Some("my-key")
        );
    }

    #[test]
    fn parses_toml_overrides() {
        let tmp = tempdir().expect("temp dir");
        let toml = r#"selection = "all"
tests = ["it"]

[properties]
"sonar.projectKey" = "from-toml"
"#;
        fs::write(tmp.path().join("propex.toml"), toml).expect("write toml");

        let loaded = load_project_config_from_dir(tmp.path())
            .expect("parse toml")
            .expect("config present");
        assert_eq!(loaded.data.selection, Some(SelectionPolicy::All));
        assert_eq!(loaded.data.tests, vec![PathBuf::from("it")]);
        assert_eq!(
            loaded.data.properties.get("sonar.projectKey").map(String::as_str),
            Some("from-toml")
        );
    }

    #[test]
    fn yaml_wins_over_toml_and_missing_config_is_none() {
        let tmp = tempdir().expect("temp dir");
        assert!(load_project_config_from_dir(tmp.path())
            .expect("no config")
            .is_none());

        fs::write(tmp.path().join("propex.toml"), "selection = \"all\"\n").expect("toml");
        fs::write(tmp.path().join("propex.yaml"), "selection: first\n").expect("yaml");
        let loaded = load_project_config_from_dir(tmp.path())
            .expect("parse")
            .expect("config present");
        assert_eq!(loaded.path, tmp.path().join("propex.yaml"));
    }

    #[test]
    fn rejects_unknown_selection_policy() {
        let err = parse_yaml_str("selection: sometimes\n").expect_err("invalid policy");
        assert!(err.to_string().contains("sometimes"), "{err}");
        assert!(parse_yaml_str("").expect("empty file").disabled.is_empty());
    }

    #[test]
    fn apply_appends_paths_and_overrides_properties() {
        let tmp = tempdir().expect("temp dir");
        let mut request = ConfigurationRequest::new(ProjectDescriptor::from_dir(tmp.path()));
        set_property(request.properties_mut(), SOURCES, Some("src"));
        set_property(request.properties_mut(), "sonar.projectName", Some("detected"));

        let config = ProjectConfig {
            sources: vec![PathBuf::from("generated"), PathBuf::from("../outside")],
            tests: vec![PathBuf::from("it")],
            exclusions: vec!["**/*.gen.rs".to_string()],
            properties: [("sonar.projectName".to_string(), "configured".to_string())]
                .into_iter()
                .collect(),
            ..ProjectConfig::default()
        };
        config.apply(&mut request);

        let props = request.into_properties();
        assert_eq!(props.get(SOURCES).map(String::as_str), Some("src;generated"));
        assert_eq!(props.get(TESTS).map(String::as_str), Some("it"));
        assert_eq!(props.get(EXCLUSIONS).map(String::as_str), Some("**/*.gen.rs"));
        assert_eq!(
            props.get("sonar.projectName").map(String::as_str),
            Some("configured")
        );
    }
}
