use anyhow::{Context, Result};
use serde::Deserialize;

use super::common::{existing_dirs, exclude_tests_under_root, failure, read_project_file};
use crate::configurator::{
    CancellationToken, ConfigurationRequest, ProjectConfigurator, ProjectDescriptor,
};
use crate::error::ConfigureError;
use crate::properties::{
    EXCLUSIONS, PROJECT_NAME, PROJECT_VERSION, SOURCES, TESTS, TSCONFIG_PATHS,
    append_property_list, set_property,
};

const NAME: &str = "js";
const PACKAGE_JSON: &str = "package.json";
const TSCONFIG: &str = "tsconfig.json";

/// JavaScript and TypeScript packages described by package.json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsConfigurator;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
}

impl ProjectConfigurator for JsConfigurator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn can_configure(&self, project: &ProjectDescriptor) -> bool {
        project.has_file(PACKAGE_JSON)
    }

    fn configure(
        &self,
        request: &mut ConfigurationRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ConfigureError> {
        cancel.check(NAME)?;
        let package = load_package_json(request.project()).map_err(|e| failure(NAME, request, e))?;

        cancel.check(NAME)?;
        let location = request.project().location().to_path_buf();
        let mut sources = existing_dirs(&location, &["src", "lib"]);
        if sources.is_empty() {
            sources.push(location.clone());
        }
        let tests = existing_dirs(&location, &["test", "tests", "__tests__"]);

        set_property(request.properties_mut(), PROJECT_NAME, package.name.as_deref());
        set_property(
            request.properties_mut(),
            PROJECT_VERSION,
            package.version.as_deref(),
        );
        request.append_relative_paths(SOURCES, &sources);
        request.append_relative_paths(TESTS, &tests);
        if request.project().has_file(TSCONFIG) {
            let tsconfig = location.join(TSCONFIG);
            let relative = request.relative_path(&tsconfig);
            set_property(request.properties_mut(), TSCONFIG_PATHS, relative.as_deref());
        }
        append_property_list(
            request.properties_mut(),
            EXCLUSIONS,
            ["node_modules/**", "dist/**", "coverage/**"].map(Some),
        );
        exclude_tests_under_root(request, &sources, &tests);
        Ok(())
    }
}

fn load_package_json(project: &ProjectDescriptor) -> Result<PackageJson> {
    let content = read_project_file(project, PACKAGE_JSON)?;
    serde_json::from_str(&content).with_context(|| format!("parsing {PACKAGE_JSON}"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;
    use crate::properties::PropertyMap;

    fn run(dir: &Path) -> Result<PropertyMap, ConfigureError> {
        let mut request = ConfigurationRequest::new(ProjectDescriptor::from_dir(dir));
        JsConfigurator.configure(&mut request, &CancellationToken::new())?;
        Ok(request.into_properties())
    }

    #[test]
    fn typescript_package_exports_tsconfig() {
        let tmp = tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(PACKAGE_JSON),
            r#"{
  "name": "web-app",
  "version": "1.4.0",
  "devDependencies": { "typescript": "^5.4.0" }
}
"#,
        )
        .expect("package.json");
        fs::create_dir_all(tmp.path().join("src")).expect("src");
        fs::create_dir_all(tmp.path().join("lib")).expect("lib");
        fs::create_dir_all(tmp.path().join("__tests__")).expect("tests");
        fs::write(tmp.path().join(TSCONFIG), "{}\n").expect("tsconfig");

        let props = run(tmp.path()).expect("configure");
        assert_eq!(props.get(PROJECT_NAME).map(String::as_str), Some("web-app"));
        assert_eq!(props.get(PROJECT_VERSION).map(String::as_str), Some("1.4.0"));
        assert_eq!(props.get(SOURCES).map(String::as_str), Some("src;lib"));
        assert_eq!(props.get(TESTS).map(String::as_str), Some("__tests__"));
        assert_eq!(
            props.get(TSCONFIG_PATHS).map(String::as_str),
            Some("tsconfig.json")
        );
    }

    #[test]
    fn plain_package_uses_root_as_sources() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join(PACKAGE_JSON), "{}\n").expect("package.json");

        let props = run(tmp.path()).expect("configure");
        assert_eq!(props.get(SOURCES).map(String::as_str), Some("."));
        assert!(!props.contains_key(TESTS));
        assert!(!props.contains_key(TSCONFIG_PATHS));
        assert!(!props.contains_key(PROJECT_NAME));
        assert_eq!(
            props.get(EXCLUSIONS).map(String::as_str),
            Some("node_modules/**;dist/**;coverage/**")
        );
    }

    #[test]
    fn typescript_dependency_without_tsconfig_sets_no_path() {
        let tmp = tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(PACKAGE_JSON),
            r#"{"devDependencies": {"typescript": "^5.4.0"}}"#,
        )
        .expect("package.json");

        let props = run(tmp.path()).expect("configure");
        assert!(!props.contains_key(TSCONFIG_PATHS));
    }

    #[test]
    fn root_sources_exclude_test_dirs() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join(PACKAGE_JSON), "{}\n").expect("package.json");
        fs::create_dir_all(tmp.path().join("__tests__")).expect("tests");

        let props = run(tmp.path()).expect("configure");
        assert_eq!(props.get(SOURCES).map(String::as_str), Some("."));
        assert_eq!(props.get(TESTS).map(String::as_str), Some("__tests__"));
        assert_eq!(
            props.get(EXCLUSIONS).map(String::as_str),
            Some("node_modules/**;dist/**;coverage/**;__tests__/**")
        );
    }

    #[test]
    fn invalid_json_is_a_configuration_failure() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join(PACKAGE_JSON), "{ nope").expect("package.json");

        let err = run(tmp.path()).expect_err("invalid json");
        assert!(matches!(err, ConfigureError::Failed { .. }));
        assert!(err.to_string().contains("parsing package.json"), "{err}");
    }
}
