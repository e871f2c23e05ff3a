use std::collections::BTreeMap;

/// Separator joining multi-value property entries. Consumers split on it, so
/// it must never change.
pub const DELIMITER: char = ';';

pub const PROJECT_NAME: &str = "sonar.projectName";
pub const PROJECT_VERSION: &str = "sonar.projectVersion";
pub const SOURCES: &str = "sonar.sources";
pub const TESTS: &str = "sonar.tests";
pub const EXCLUSIONS: &str = "sonar.exclusions";
pub const PYTHON_VERSION: &str = "sonar.python.version";
pub const TSCONFIG_PATHS: &str = "sonar.typescript.tsconfigPaths";

/// Accumulated properties for one project, kept sorted by key.
pub type PropertyMap = BTreeMap<String, String>;

/// Insert or overwrite `key`. A `None` value is an optional contribution and
/// leaves the map untouched.
pub fn set_property(map: &mut PropertyMap, key: &str, value: Option<&str>) {
    let Some(value) = value else {
        return;
    };
    map.insert(key.to_string(), value.to_string());
}

/// Append `value` to whatever `key` already holds, separated by [`DELIMITER`].
pub fn append_property(map: &mut PropertyMap, key: &str, value: Option<&str>) {
    let Some(value) = value else {
        return;
    };
    match map.get_mut(key) {
        Some(existing) => {
            existing.push(DELIMITER);
            existing.push_str(value);
        }
        None => {
            map.insert(key.to_string(), value.to_string());
        }
    }
}

/// Overwrite `key` with the joined list. `None` entries are dropped, empty
/// strings are kept.
pub fn set_property_list<I, S>(map: &mut PropertyMap, key: &str, values: I)
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    map.insert(key.to_string(), join_values(values));
}

pub fn append_property_list<I, S>(map: &mut PropertyMap, key: &str, values: I)
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let joined = join_values(values);
    append_property(map, key, Some(joined.as_str()));
}

fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (idx, value) in values.into_iter().flatten().enumerate() {
        if idx > 0 {
            joined.push(DELIMITER);
        }
        joined.push_str(value.as_ref());
    }
    joined
}

/// Render the map as `key=value` lines, escaped for `.properties` readers.
pub fn render_properties(map: &PropertyMap) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    out
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '=' | ':' | ' ' if is_key => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
