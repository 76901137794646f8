//! Name-keyed lookup tables for loaded resources.
//!
//! Assets are registered once at startup and are read-only afterwards. A
//! dictionary never holds two entries under the same key: adding a duplicate
//! is an error rather than a silent overwrite.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: &'static str, name: String },
    #[error("{kind} '{name}' is not registered")]
    Missing { kind: &'static str, name: String },
    #[error("cannot derive an asset name from path '{0}'")]
    BadPath(String),
    #[error("failed to load {kind} '{name}': {reason}")]
    Load {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

/// Derives the lookup key from an asset path: its file stem.
/// `"Assets/Models/sphere"` and `"assets/models/sphere.obj"` both map to `"sphere"`.
pub fn asset_name_from_path(path: &str) -> Result<String, AssetError> {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AssetError::BadPath(path.to_string()))
}

#[derive(Debug)]
pub struct ContentDictionary<T> {
    kind: &'static str,
    entries: BTreeMap<String, T>,
}

impl<T> ContentDictionary<T> {
    /// `kind` names the resource type in errors and logs ("texture", "model").
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Loads the asset at `path` and registers it under the path's file stem.
    pub fn add<F>(&mut self, path: &str, loader: F) -> Result<&T, AssetError>
    where
        F: FnOnce(&Path) -> Result<T, String>,
    {
        let name = asset_name_from_path(path)?;
        if self.entries.contains_key(&name) {
            return Err(AssetError::Duplicate {
                kind: self.kind,
                name,
            });
        }
        let value = loader(Path::new(path)).map_err(|reason| AssetError::Load {
            kind: self.kind,
            name: name.clone(),
            reason,
        })?;
        log::debug!("Loaded {} '{}' from {}", self.kind, name, path);
        Ok(self.entries.entry(name).or_insert(value))
    }

    pub fn add_named(&mut self, name: &str, value: T) -> Result<&T, AssetError> {
        if self.entries.contains_key(name) {
            return Err(AssetError::Duplicate {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        Ok(self.entries.entry(name.to_string()).or_insert(value))
    }

    pub fn get(&self, name: &str) -> Result<&T, AssetError> {
        self.entries.get(name).ok_or_else(|| AssetError::Missing {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Releases every entry. Called at shutdown.
    pub fn dispose(&mut self) {
        if !self.entries.is_empty() {
            log::info!("Released {} {} asset(s)", self.entries.len(), self.kind);
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_file_stem_of_path() {
        assert_eq!(
            asset_name_from_path("Assets/Models/sphere").as_deref(),
            Ok("sphere")
        );
        assert_eq!(
            asset_name_from_path("assets/fonts/menu.ttf").as_deref(),
            Ok("menu")
        );
        assert!(asset_name_from_path("").is_err());
    }

    #[test]
    fn add_loads_and_get_returns_value() {
        let mut models = ContentDictionary::new("model");
        models
            .add("Assets/Models/cube", |path| {
                Ok(path.display().to_string().len())
            })
            .expect("cube should load");
        assert_eq!(models.get("cube"), Ok(&"Assets/Models/cube".len()));
        assert!(models.contains("cube"));
        assert_eq!(models.len(), 1);
    }

    #[test]
    fn duplicate_key_is_rejected_and_loader_not_called() {
        let mut models = ContentDictionary::new("model");
        models.add("a/sphere", |_| Ok(1)).expect("first add");
        let mut called = false;
        let err = models
            .add("b/sphere", |_| {
                called = true;
                Ok(2)
            })
            .expect_err("duplicate should fail");
        assert!(!called);
        assert!(matches!(err, AssetError::Duplicate { .. }));
        assert_eq!(models.get("sphere"), Ok(&1));
    }

    #[test]
    fn missing_key_reports_kind_and_name() {
        let textures: ContentDictionary<u8> = ContentDictionary::new("texture");
        let err = textures.get("grass").expect_err("absent key");
        assert_eq!(err.to_string(), "texture 'grass' is not registered");
    }

    #[test]
    fn loader_failure_does_not_register() {
        let mut fonts: ContentDictionary<u32> = ContentDictionary::new("font");
        let err = fonts
            .add("fonts/menu", |_| Err("file not found".to_string()))
            .expect_err("load should fail");
        assert!(err.to_string().contains("file not found"));
        assert!(!fonts.contains("menu"));
    }

    #[test]
    fn dispose_clears_everything() {
        let mut fonts = ContentDictionary::new("font");
        fonts.add_named("ui", 18).expect("add ui");
        fonts.add_named("menu", 28).expect("add menu");
        assert_eq!(fonts.names().collect::<Vec<_>>(), vec!["menu", "ui"]);
        fonts.dispose();
        assert!(fonts.is_empty());
    }
}
