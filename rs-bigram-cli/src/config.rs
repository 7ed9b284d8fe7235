use std::error::Error;
use std::fs;
use std::path::Path;

use rs_bigram_core::model::generation_input::GenerationInput;
use serde::Deserialize;

/// Settings read from a TOML file.
///
/// Every field is optional; command-line flags take precedence and
/// defaults are applied last.
///
/// ```toml
/// input = "data"
/// extension = "csv"
/// column = 2
/// count = 5
/// seed = 42
///
/// [generation]
/// max_tokens = 40
/// nb_try = 10
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub input: Option<String>,
    pub extension: Option<String>,
    pub column: Option<usize>,
    pub count: Option<usize>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub generation: GenerationInput,
}

impl Settings {
    /// Reads and validates a settings file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(text)?;
        settings.generation.validate()?;
        Ok(settings)
    }
}
