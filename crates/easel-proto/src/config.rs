use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub art: ArtConfig,
    #[serde(default)]
    pub poems: PoemsConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Time between automatic refreshes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How often the countdown is re-evaluated.
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,
}

/// Art Institute of Chicago search + IIIF image server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtConfig {
    #[serde(default = "default_art_api_base")]
    pub api_base: String,
    #[serde(default = "default_iiif_base")]
    pub iiif_base: String,
    /// Style facets (`style_titles.keyword`) to pick from on each refresh.
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,
    /// Items per search page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// The API refuses to page past this many results.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    /// Full search sequences attempted before giving up on records without an image.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoemsConfig {
    #[serde(default = "default_poetrydb_base")]
    pub poetrydb_base: String,
    /// Single-call endpoint returning `{author, title, text}`. When unset only
    /// the curated author list is used.
    #[serde(default)]
    pub random_poem_url: Option<String>,
    #[serde(default = "default_authors")]
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Reformats a poem for the local speech engine.
    #[serde(default = "default_format_url")]
    pub format_url: String,
    /// Reformats a poem for the synthetic voice service.
    #[serde(default = "default_voice_format_url")]
    pub voice_format_url: String,
    /// Returns `{audioBase64}` for the posted text.
    #[serde(default = "default_voice_url")]
    pub voice_url: String,
    /// Returns `{result}` commentary for the posted poem.
    #[serde(default = "default_analysis_url")]
    pub analysis_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Voice name tried first; falls back to the engine default, then the first voice.
    #[serde(default = "default_preferred_voice")]
    pub preferred_voice: String,
    /// Poems with more words than this are read by the local engine.
    #[serde(default = "default_long_poem_words")]
    pub long_poem_words: usize,
    #[serde(default = "default_word_limit")]
    pub word_limit: usize,
    #[serde(default = "default_analysis_word_limit")]
    pub analysis_word_limit: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            countdown_tick_ms: default_countdown_tick_ms(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms.clamp(50, 1000))
    }
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            api_base: default_art_api_base(),
            iiif_base: default_iiif_base(),
            styles: default_styles(),
            page_limit: default_page_limit(),
            max_results: default_max_results(),
            image_width: default_image_width(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ArtConfig {
    /// Highest page number the search API will serve.
    pub fn max_page(&self) -> u32 {
        (self.max_results / self.page_limit.max(1)).max(1)
    }
}

impl Default for PoemsConfig {
    fn default() -> Self {
        Self {
            poetrydb_base: default_poetrydb_base(),
            random_poem_url: None,
            authors: default_authors(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            format_url: default_format_url(),
            voice_format_url: default_voice_format_url(),
            voice_url: default_voice_url(),
            analysis_url: default_analysis_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            preferred_voice: default_preferred_voice(),
            long_poem_words: default_long_poem_words(),
            word_limit: default_word_limit(),
            analysis_word_limit: default_analysis_word_limit(),
        }
    }
}

fn default_interval_secs() -> u64 {
    600
}

fn default_countdown_tick_ms() -> u64 {
    250
}

fn default_art_api_base() -> String {
    "https://api.artic.edu/api/v1".to_string()
}

fn default_iiif_base() -> String {
    "https://www.artic.edu/iiif/2".to_string()
}

fn default_styles() -> Vec<String> {
    [
        "contemporary",
        "modernism",
        "impressionism",
        "post-impressionism",
        "surrealism",
        "abstract expressionism",
        "ukiyo-e",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_page_limit() -> u32 {
    12
}

fn default_max_results() -> u32 {
    1000
}

fn default_image_width() -> u32 {
    843
}

fn default_max_attempts() -> u32 {
    5
}

fn default_poetrydb_base() -> String {
    "https://poetrydb.org".to_string()
}

fn default_authors() -> Vec<String> {
    [
        "Emily Dickinson",
        "William Shakespeare",
        "Walt Whitman",
        "John Keats",
        "Percy Bysshe Shelley",
        "William Blake",
        "William Wordsworth",
        "Samuel Taylor Coleridge",
        "Christina Rossetti",
        "Edgar Allan Poe",
        "Gerard Manley Hopkins",
        "Thomas Hardy",
        "John Donne",
        "George Herbert",
        "Andrew Marvell",
        "Paul Laurence Dunbar",
        "Elizabeth Barrett Browning",
        "Henry Wadsworth Longfellow",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_format_url() -> String {
    "https://7yoo2uxbqwjbdq5m7umkf3jqnu0lybwl.lambda-url.us-east-1.on.aws/".to_string()
}

fn default_voice_format_url() -> String {
    "https://enz5qscq63ayvs6yrniy6dhwgm0ubtmu.lambda-url.us-east-1.on.aws/".to_string()
}

fn default_voice_url() -> String {
    "https://gxobpdah6xcfgzetwjxu7ljopu0wbybi.lambda-url.us-east-1.on.aws/".to_string()
}

fn default_analysis_url() -> String {
    "https://i76rczicem43ribpgiczbetgue0ugawn.lambda-url.us-east-1.on.aws/".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_preferred_voice() -> String {
    "en-gb".to_string()
}

fn default_long_poem_words() -> usize {
    300
}

fn default_word_limit() -> usize {
    500
}

fn default_analysis_word_limit() -> usize {
    450
}

const POEMS_TABLE: &str = "[poems]\n";
const RANDOM_POEM_EXAMPLE: &str = "# Endpoint returning {author, title, text}; used for half the poems when set.\n\
# random_poem_url = \"https://example.com/random-poem\"\n";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, self.to_toml()?)?;
        Ok(())
    }

    /// TOML text for the config file. An unset `random_poem_url` is written
    /// as a commented example so the second poem source can be found.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let mut content = toml::to_string_pretty(self)?;
        if self.poems.random_poem_url.is_none() {
            if let Some(idx) = content.find(POEMS_TABLE) {
                content.insert_str(idx + POEMS_TABLE.len(), RANDOM_POEM_EXAMPLE);
            }
        }
        Ok(content)
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            art: ArtConfig::default(),
            poems: PoemsConfig::default(),
            services: ServicesConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.refresh.interval(), Duration::from_secs(600));
        assert!(config.art.api_base.starts_with("https://"));
        assert!(!config.art.styles.is_empty());
        assert!(!config.poems.authors.is_empty());
        assert!(config.poems.random_poem_url.is_none());
        assert_eq!(config.speech.long_poem_words, 300);
        assert!(Config::config_path().ends_with("easel/config.toml"));
    }

    #[test]
    fn test_max_page_is_bounded_by_result_window() {
        let art = ArtConfig::default();
        assert_eq!(art.max_page(), 83);

        let odd = ArtConfig {
            page_limit: 0,
            max_results: 0,
            ..ArtConfig::default()
        };
        assert_eq!(odd.max_page(), 1);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [refresh]
            interval_secs = 10

            [poems]
            random_poem_url = "http://localhost:9000/poem"
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval(), Duration::from_secs(10));
        assert_eq!(config.refresh.countdown_tick_ms, 250);
        assert_eq!(
            config.poems.random_poem_url.as_deref(),
            Some("http://localhost:9000/poem")
        );
        assert_eq!(config.poems.poetrydb_base, "https://poetrydb.org");
        assert_eq!(config.art.page_limit, 12);
    }

    #[test]
    fn test_generated_file_carries_random_poem_example() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("[poems]\n# Endpoint returning"));
        assert!(text.contains("# random_poem_url = \"https://example.com/random-poem\""));
        let back: Config = toml::from_str(&text).unwrap();
        assert!(back.poems.random_poem_url.is_none());

        let mut config = Config::default();
        config.poems.random_poem_url = Some("http://localhost:9000/poem".into());
        let text = config.to_toml().unwrap();
        assert!(!text.contains("# random_poem_url"));
        assert!(text.contains("random_poem_url = \"http://localhost:9000/poem\""));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.services.analysis_url, Config::default().services.analysis_url);
    }
}
