pub mod splitter;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::deck::Deck;
use crate::error::DeckError;
use crate::style::StyleLayer;

/// A slide's front matter as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProperties {
    #[serde(default)]
    pub style: StyleLayer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
}

impl RawProperties {
    /// Decode the front matter of slide number `slide` (1-based, for error
    /// messages). Blank front matter yields the defaults.
    pub fn decode(text: &str, slide: usize) -> Result<Self, DeckError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let properties: Self =
            serde_yaml::from_str(text).map_err(|e| DeckError::PropertiesDecode {
                slide,
                message: e.to_string(),
            })?;
        properties
            .style
            .validate()
            .map_err(|e| DeckError::PropertiesDecode {
                slide,
                message: e.to_string(),
            })?;
        Ok(properties)
    }
}

/// Split `content` into slides and decode each slide's front matter.
pub fn split_slides(content: &str) -> Result<Vec<(String, RawProperties)>, DeckError> {
    splitter::split(content)
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let (properties, body) = splitter::front_matter(chunk);
            Ok((body.to_string(), RawProperties::decode(properties, i + 1)?))
        })
        .collect()
}

/// Parse a whole document and resolve every slide's style against `config`.
pub fn parse(content: &str, config: &Config) -> Result<Deck, DeckError> {
    Deck::build(split_slides(content)?, config)
}

/// Read the source and config files from disk and build a deck.
pub fn load_deck(source: &Path, config_path: &Path) -> Result<Deck, DeckError> {
    let config = Config::load_from(config_path)?;
    let content = std::fs::read_to_string(source).map_err(|e| DeckError::io(source, e))?;
    let deck = parse(&content, &config)?;
    log::debug!(
        "Parsed {} slides from {} with config {}",
        deck.len(),
        source.display(),
        config_path.display()
    );
    Ok(deck)
}
