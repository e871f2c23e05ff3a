//! Lexical path resolution against a set of known roots.
//!
//! Nothing here touches the filesystem: `.` and `..` are folded by hand and a
//! path only resolves when it lands inside one of the roots. Failures come
//! back as `None` so callers can skip the property they were computing.

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct RootContext {
    /// Normalized absolute roots. The first one anchors relative input.
    roots: Vec<PathBuf>,
}

impl RootContext {
    /// Build a context from the given roots. Relative roots are taken against
    /// the current working directory.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = roots
            .into_iter()
            .map(|root| {
                let root = root.as_ref();
                if root.is_absolute() {
                    normalize_path_components(root)
                } else {
                    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                    normalize_path_components(&cwd.join(root))
                }
            })
            .collect();
        Self { roots }
    }

    pub fn single(root: impl AsRef<Path>) -> Self {
        Self::new([root])
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn primary_root(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    /// Resolve `path` to a normalized absolute path inside a known root.
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.primary_root()?.join(path)
        };
        let normalized = normalize_path_components(&absolute);
        self.roots
            .iter()
            .any(|root| normalized.starts_with(root))
            .then_some(normalized)
    }

    /// Absolute form of `path` with forward slashes, or `None` when it falls
    /// outside every known root.
    pub fn absolute_path(&self, path: &Path) -> Option<String> {
        self.resolve(path)
            .map(|resolved| path_to_forward_slashes(&resolved))
    }

    /// `path` relative to `root`, both resolved first. The root itself comes
    /// back as `"."`, never as an empty string.
    pub fn relative_path(&self, root: &Path, path: &Path) -> Option<String> {
        let absolute_root = self.resolve(root)?;
        let absolute_path = self.resolve(path)?;
        let relative = relativize(&absolute_root, &absolute_path)?;
        let rendered = relative.to_string_lossy().into_owned();
        if rendered.is_empty() {
            Some(".".to_string())
        } else {
            Some(rendered)
        }
    }
}

/// Walk up from `base` with `..` until a shared ancestor, then down to
/// `target`. `None` when the two share no anchor (different drives).
fn relativize(base: &Path, target: &Path) -> Option<PathBuf> {
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();

    let common = base
        .iter()
        .zip(&target)
        .take_while(|(left, right)| left == right)
        .count();
    if common == 0 {
        return None;
    }

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_os_str());
    }
    Some(relative)
}

pub(crate) fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    // `/..` stays put so the result can never climb above a root.
                    components.push(Component::ParentDir);
                }
            }
        }
    }

    components.iter().collect()
}

fn path_to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
