//! Asset manifest: which textures, models, fonts and sound cues exist, and
//! the startup step that turns it into name-keyed dictionaries.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hedge_core::assets::{AssetError, ContentDictionary};
use hedge_render::mesh::MeshData;
use hedge_render::texture::{checker_image, load_rgba_from_path};
use image::RgbaImage;

use crate::sound::{SoundCategory, SoundCue};

#[derive(Debug, Deserialize, Clone)]
pub struct ManifestFile {
    pub version: String,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
    #[serde(default)]
    pub sounds: Vec<SoundEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TextureEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Models are keyed by the stem of `path` and generated procedurally.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelEntry {
    pub path: String,
    pub mesh: MeshKind,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    Cube,
    Sphere,
    Quad,
}

impl MeshKind {
    pub fn mesh_data(self) -> MeshData {
        match self {
            MeshKind::Cube => MeshData::cube(),
            MeshKind::Sphere => MeshData::sphere(16, 24),
            MeshKind::Quad => MeshData::quad(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FontEntry {
    pub path: String,
    #[serde(default = "default_font_size")]
    pub size: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SoundEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub category: SoundCategory,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub looping: bool,
}

pub struct TextureAsset {
    pub image: RgbaImage,
    /// The file could not be read and `image` is a generated checkerboard.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontAsset {
    pub path: String,
    pub size: f32,
}

pub struct LoadedAssets {
    pub textures: ContentDictionary<TextureAsset>,
    pub models: ContentDictionary<MeshKind>,
    pub fonts: ContentDictionary<FontAsset>,
    pub sounds: ContentDictionary<SoundCue>,
}

impl LoadedAssets {
    pub fn dispose(&mut self) {
        self.textures.dispose();
        self.models.dispose();
        self.fonts.dispose();
        self.sounds.dispose();
    }
}

pub fn load_manifest_from_path(path: &Path) -> Result<ManifestFile, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let manifest: ManifestFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse manifest JSON {}: {e}", path.display()))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

fn validate_manifest(manifest: &ManifestFile) -> Result<(), String> {
    if manifest.models.is_empty() {
        return Err("Manifest validation failed: models list is empty".to_string());
    }
    for sound in &manifest.sounds {
        if !(0.0..=1.0).contains(&sound.volume) {
            return Err(format!(
                "Manifest validation failed: sound '{}' volume {} is outside 0..=1",
                sound.name, sound.volume
            ));
        }
    }
    for font in &manifest.fonts {
        if font.size <= 0.0 {
            return Err(format!(
                "Manifest validation failed: font '{}' size must be > 0",
                font.path
            ));
        }
    }
    let mut names = HashSet::new();
    for texture in &manifest.textures {
        if !names.insert(texture.name.as_str()) {
            log::warn!(
                "Manifest lists texture '{}' more than once; the load will reject it",
                texture.name
            );
        }
    }
    Ok(())
}

/// Loads every manifest entry into its dictionary. Duplicate names are load
/// failures. Missing texture or sound files degrade to placeholders with a
/// warning so a partial asset checkout still starts.
pub fn load_assets(manifest: &ManifestFile) -> Result<LoadedAssets, AssetError> {
    let mut textures = ContentDictionary::new("texture");
    for entry in &manifest.textures {
        let asset = match load_rgba_from_path(&entry.path) {
            Ok(image) => TextureAsset {
                image,
                fallback: false,
            },
            Err(e) => {
                log::warn!("Texture '{}' using checkerboard: {}", entry.name, e);
                TextureAsset {
                    image: checker_image(64, 8, [255, 0, 255, 255], [32, 32, 32, 255]),
                    fallback: true,
                }
            }
        };
        textures.add_named(&entry.name, asset)?;
    }

    let mut models = ContentDictionary::new("model");
    for entry in &manifest.models {
        let kind = entry.mesh;
        models.add(&entry.path, |_| Ok(kind))?;
    }

    let mut fonts = ContentDictionary::new("font");
    for entry in &manifest.fonts {
        let size = entry.size;
        fonts.add(&entry.path, |path| {
            Ok(FontAsset {
                path: path.display().to_string(),
                size,
            })
        })?;
    }

    let mut sounds = ContentDictionary::new("sound");
    for entry in &manifest.sounds {
        let data = match fs::read(&entry.path) {
            Ok(bytes) => Some(Arc::from(bytes)),
            Err(e) => {
                log::warn!(
                    "Sound '{}' registered silent: {}: {e}",
                    entry.name,
                    entry.path.display()
                );
                None
            }
        };
        sounds.add_named(
            &entry.name,
            SoundCue {
                name: entry.name.clone(),
                path: entry.path.clone(),
                category: entry.category,
                volume: entry.volume,
                looping: entry.looping,
                data,
            },
        )?;
    }

    let placeholders = textures.iter().filter(|(_, t)| t.fallback).count()
        + sounds.iter().filter(|(_, c)| c.is_silent()).count();
    log::info!(
        "Assets loaded from manifest v{}: {} texture(s), {} model(s), {} font(s), {} sound(s), {} placeholder(s)",
        manifest.version,
        textures.len(),
        models.len(),
        fonts.len(),
        sounds.len(),
        placeholders
    );
    Ok(LoadedAssets {
        textures,
        models,
        fonts,
        sounds,
    })
}

const fn default_font_size() -> f32 {
    16.0
}

const fn default_volume() -> f32 {
    1.0
}
