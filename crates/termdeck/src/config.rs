use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::style::{BorderKind, Layout, StyleConfig, StyleDecodeError, StyleLayer};
use crate::theme::Theme;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "termdeck";
const LOCAL_FILENAME: &str = "termdeck.yaml";

/// Written to the user config directory the first time no config is found.
pub const DEFAULT_CONFIG: &str = r##"# termdeck configuration
global:
  style:
    border: rounded
    border_color: "#9999CC"
    layout: center
    theme: dracula

presets:
  minimal:
    style:
      border: hidden
      theme: notty
  dark:
    style:
      border: rounded
      theme: dracula
"##;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    #[serde(default)]
    pub style: StyleLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: LayerConfig,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, LayerConfig>,
}

impl Config {
    /// Per-user config file, e.g. `~/.config/termdeck/config.yaml`.
    pub fn path() -> Result<PathBuf, DeckError> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| DeckError::Config {
                path: PathBuf::from(FILENAME),
                message: "could not determine config directory".to_string(),
            })
    }

    /// Pick the config file to use: an explicit path, then `termdeck.yaml`
    /// in the working directory, then the per-user file (created with
    /// [`DEFAULT_CONFIG`] when missing).
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, DeckError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(LOCAL_FILENAME);
        if local.is_file() {
            return Ok(local);
        }

        let path = Self::path()?;
        Self::bootstrap(&path)?;
        Ok(path)
    }

    /// Write the default config to `path` unless something is already there.
    pub fn bootstrap(path: &Path) -> Result<(), DeckError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DeckError::io(parent, e))?;
        }
        std::fs::write(path, DEFAULT_CONFIG).map_err(|e| DeckError::io(path, e))?;
        log::info!("Wrote default config to {}", path.display());
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self, DeckError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DeckError::io(path, e))?;
        Self::parse(&contents).map_err(|e| DeckError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Resolve a slide's own style layer against this config's global
    /// layer and the preset the slide names.
    pub fn resolve(&self, slide: &StyleLayer) -> Result<StyleConfig, StyleDecodeError> {
        let preset = slide.preset().and_then(|name| {
            let preset = self.presets.get(name);
            if preset.is_none() {
                log::warn!("Unknown preset '{name}', ignoring");
            }
            preset
        });
        resolve(&self.global.style, preset.map(|p| &p.style), slide)
    }
}

/// Merge three style layers, narrowest last: a field set on the slide wins
/// over the preset, which wins over the global layer. Unset fields never
/// overwrite a broader setting.
pub fn resolve(
    global: &StyleLayer,
    preset: Option<&StyleLayer>,
    slide: &StyleLayer,
) -> Result<StyleConfig, StyleDecodeError> {
    global.validate()?;
    if let Some(preset) = preset {
        preset.validate()?;
    }
    slide.validate()?;

    let pick = |field: fn(&StyleLayer) -> Option<&str>| {
        field(slide)
            .or_else(|| preset.and_then(field))
            .or_else(|| field(global))
    };

    Ok(StyleConfig {
        border: BorderKind::from_name(pick(StyleLayer::border).unwrap_or_default()),
        border_color: pick(StyleLayer::border_color).map(str::to_string),
        layout: Layout::parse(pick(StyleLayer::layout).unwrap_or_default())?,
        theme: Theme::resolve(pick(StyleLayer::theme).unwrap_or_default()),
        preset: slide.preset().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Align;

    fn layer(border: Option<&str>, preset: Option<&str>) -> StyleLayer {
        StyleLayer {
            border: border.map(str::to_string),
            preset: preset.map(str::to_string),
            ..StyleLayer::default()
        }
    }

    fn config_with_preset() -> Config {
        let mut config = Config::default();
        config.global.style = layer(Some("rounded"), None);
        config.presets.insert(
            "p".to_string(),
            LayerConfig {
                style: layer(Some("hidden"), None),
            },
        );
        config
    }

    #[test]
    fn test_preset_overrides_global() {
        let config = config_with_preset();
        let style = config.resolve(&layer(None, Some("p"))).unwrap();
        assert_eq!(style.border, BorderKind::Hidden);
    }

    #[test]
    fn test_slide_overrides_preset() {
        let config = config_with_preset();
        let style = config.resolve(&layer(Some("double"), Some("p"))).unwrap();
        assert_eq!(style.border, BorderKind::Double);
    }

    #[test]
    fn test_global_applies_without_preset() {
        let config = config_with_preset();
        let style = config.resolve(&StyleLayer::default()).unwrap();
        assert_eq!(style.border, BorderKind::Rounded);
    }

    #[test]
    fn test_unknown_preset_is_ignored() {
        let config = config_with_preset();
        let style = config.resolve(&layer(None, Some("nope"))).unwrap();
        assert_eq!(style.border, BorderKind::Rounded);
        assert_eq!(style.preset.as_deref(), Some("nope"));
    }

    #[test]
    fn test_unset_layout_does_not_override() {
        let global = StyleLayer {
            layout: Some("center".to_string()),
            ..StyleLayer::default()
        };
        let slide = StyleLayer {
            layout: Some(String::new()),
            ..StyleLayer::default()
        };
        let style = resolve(&global, None, &slide).unwrap();
        assert_eq!(style.layout.horizontal, Align::Center);

        // Explicit "left, top" is distinct from "not set"
        let slide = StyleLayer {
            layout: Some("left, top".to_string()),
            ..StyleLayer::default()
        };
        let style = resolve(&global, None, &slide).unwrap();
        assert_eq!(style.layout, Layout::default());
    }

    #[test]
    fn test_invalid_layout_fails_resolve() {
        let mut config = config_with_preset();
        config.presets.get_mut("p").unwrap().style.layout = Some("sideways".to_string());
        assert_eq!(
            config.resolve(&layer(None, Some("p"))),
            Err(StyleDecodeError::Position("sideways".to_string()))
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        for slide in [
            StyleLayer::default(),
            layer(None, Some("minimal")),
            StyleLayer {
                layout: Some("right, bottom".to_string()),
                border_color: Some("default".to_string()),
                ..layer(Some("thick"), Some("dark"))
            },
        ] {
            let first = config.resolve(&slide).unwrap();
            let second = config.resolve(&first.to_layer()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.global.style.border(), Some("rounded"));
        assert_eq!(config.global.style.border_color(), Some("#9999CC"));
        assert_eq!(config.presets["minimal"].style.theme(), Some("notty"));
        assert_eq!(config.presets["dark"].style.border(), Some("rounded"));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_bootstrap_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);

        Config::bootstrap(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        std::fs::write(&path, "global: {}\n").unwrap();
        Config::bootstrap(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "global: {}\n");
    }

    #[test]
    fn test_load_from_reports_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        std::fs::write(&path, "global: [unclosed").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(DeckError::Config { .. })
        ));
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.yaml")),
            Err(DeckError::Io { .. })
        ));
    }
}
