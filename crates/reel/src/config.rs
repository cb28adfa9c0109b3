//! Layered configuration.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use reel_error::{ConfigError, ReelError, ReelResult};
use reel_generation::GenerationConfig;
use reel_model::RetryPolicy;
use reel_planning::PlanningConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled defaults, lowest precedence.
const DEFAULT_CONFIG: &str = include_str!("../reel.toml");

/// Complete pipeline configuration.
///
/// Sources in order of precedence (later sources override earlier):
/// 1. Bundled defaults (`reel.toml` shipped with the crate)
/// 2. `~/.config/reel/reel.toml`
/// 3. `./reel.toml`
/// 4. A file given explicitly (`--config`)
/// 5. Environment variables prefixed `REEL__`, with `__` between keys
///    (`REEL__PLANNING__MAX_HIGH_ITERATIONS=3`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ReelConfig {
    /// Seed for retry jitter and example order
    #[serde(default)]
    seed: u64,
    /// Root under which every document gets its working directory
    #[setters(into)]
    output_dir: PathBuf,
    /// Model roles
    models: ModelsConfig,
    /// Transport retry budget shared by every model role
    #[serde(default)]
    retry: RetryPolicy,
    /// Planning budgets and switches
    #[serde(default)]
    planning: PlanningConfig,
    /// Generation budgets and polling
    #[serde(default)]
    generation: GenerationConfig,
    /// External services and local tools
    services: ServicesConfig,
}

/// The three model roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ModelsConfig {
    /// Drafts plans, locates document assets, rewrites slide captions
    planner: ModelRoleConfig,
    /// Judges plans and visuals, classifies and repairs
    evaluator: ModelRoleConfig,
    /// Writes generation prompts and animation code
    artist: ModelRoleConfig,
}

/// One OpenAI-compatible model endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ModelRoleConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model name
    model: String,
    /// Environment variable holding the API key
    api_key_env: String,
    /// Sampling temperature
    #[serde(default)]
    temperature: Option<f32>,
    /// Completion token limit
    #[serde(default)]
    max_tokens: Option<u32>,
    /// Persona message; the built-in one is used when absent
    #[serde(default)]
    system_message: Option<String>,
}

impl ModelRoleConfig {
    /// Read the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the variable is unset or empty.
    pub fn api_key(&self) -> ReelResult<String> {
        secret(&self.api_key_env)
    }
}

/// External services and local tool commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ServicesConfig {
    /// Text-to-video and text-to-image tasks
    media: MediaServiceConfig,
    /// Narration synthesis
    speech: SpeechServiceConfig,
    /// Presenter avatar
    avatar: AvatarServiceConfig,
    /// Protein structure search and download
    structures: StructureServiceConfig,
    /// Local rendering and composition tools
    render: RenderConfig,
}

/// DashScope-style asynchronous media task API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct MediaServiceConfig {
    /// API root, e.g. `https://dashscope.aliyuncs.com/api/v1`
    endpoint: String,
    /// Environment variable holding the API key
    api_key_env: String,
    /// Text-to-video model
    video_model: String,
    /// Text-to-image model
    image_model: String,
    /// Video size as `W*H`
    video_size: String,
    /// Image size as `W*H`
    image_size: String,
}

/// Speech synthesis API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct SpeechServiceConfig {
    /// API root
    endpoint: String,
    /// Environment variable holding the API key
    api_key_env: String,
    /// Speech model
    model: String,
    /// Voice name
    voice: String,
}

/// Talking-head avatar API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct AvatarServiceConfig {
    /// API root, e.g. `https://tavusapi.com/v2`
    endpoint: String,
    /// Environment variable holding the API key
    api_key_env: String,
    /// Presenter replica to animate
    replica_id: String,
}

/// Structure search and download endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct StructureServiceConfig {
    /// Full-text search endpoint
    search_endpoint: String,
    /// Root that serves `<ID>.pdb` files
    download_endpoint: String,
}

/// Programs used for local media work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct RenderConfig {
    /// ffmpeg executable
    ffmpeg: String,
    /// ffprobe executable
    ffprobe: String,
    /// manim executable
    manim: String,
    /// PyMOL executable
    pymol: String,
    /// Frames in one molecule turntable
    #[serde(default = "default_turntable_frames")]
    turntable_frames: u32,
    /// Turntable frame rate
    #[serde(default = "default_turntable_fps")]
    turntable_fps: u32,
    /// pdftotext executable
    pdftotext: String,
    /// pdftoppm executable
    pdftoppm: String,
}

fn default_turntable_frames() -> u32 {
    60
}

fn default_turntable_fps() -> u32 {
    12
}

/// Read a secret from the environment.
///
/// # Errors
///
/// Returns a configuration error when `name` is unset or empty.
pub fn secret(name: &str) -> ReelResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::new(format!("Environment variable {} is not set", name)).into()),
    }
}

impl ReelConfig {
    /// Load configuration from every layer, with `explicit` above the
    /// user files and below the environment.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file is missing or any layer does not
    /// parse into a complete configuration.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> ReelResult<Self> {
        debug!("Loading configuration: env > explicit > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/reel/reel.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("reel").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("REEL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        finish(builder.build())
    }

    /// Bundled defaults overlaid with TOML `text`. No user files or
    /// environment variables are read.
    ///
    /// # Errors
    ///
    /// Returns error if `text` is not valid TOML or the result is
    /// incomplete.
    pub fn from_toml(text: &str) -> ReelResult<Self> {
        finish(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(text, FileFormat::Toml))
                .build(),
        )
    }

    /// The bundled defaults alone.
    ///
    /// # Errors
    ///
    /// Returns error if the bundled file is broken.
    pub fn bundled() -> ReelResult<Self> {
        Self::from_toml("")
    }
}

fn finish(built: Result<Config, config::ConfigError>) -> ReelResult<ReelConfig> {
    let config: ReelConfig = built
        .map_err(|e| {
            ReelError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?
        .try_deserialize()
        .map_err(|e| {
            ReelError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })?;
    config.retry().validate().map_err(|e| {
        ReelError::from(ConfigError::new(format!("Invalid retry configuration: {}", e)))
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_component_defaults() {
        let config = ReelConfig::bundled().unwrap();
        assert_eq!(config.planning(), &PlanningConfig::default());
        assert_eq!(config.generation(), &GenerationConfig::default());
        assert_eq!(config.retry(), &RetryPolicy::default());
        assert_eq!(config.models().evaluator().model(), "gpt-4o");
        assert_eq!(*config.services().render().turntable_frames(), 60);
    }

    #[test]
    fn overlay_overrides_single_keys() {
        let config = ReelConfig::from_toml(
            "seed = 7\n[planning]\nwith_reflection = false\n[models.artist]\nmodel = \"qwen-vl-max\"\n",
        )
        .unwrap();
        assert_eq!(*config.seed(), 7);
        assert!(!*config.planning().reflection());
        assert_eq!(*config.planning().max_high_iterations(), 15);
        assert_eq!(config.models().artist().model(), "qwen-vl-max");
        assert_eq!(config.models().artist().endpoint(), "https://api.openai.com/v1");
    }

    #[test]
    fn malformed_overlay_is_a_config_error() {
        let err = ReelConfig::from_toml("[generation]\nmax_render_repairs = \"many\"\n").unwrap_err();
        assert!(err.to_string().contains("configuration"));
    }

    #[test]
    fn negative_retry_delay_is_a_config_error() {
        let err = ReelConfig::from_toml("[retry]\ninitial_delay_secs = -1.0\n").unwrap_err();
        assert!(err.to_string().contains("initial_delay_secs"));
    }

    #[test]
    fn shrinking_retry_base_is_a_config_error() {
        let err = ReelConfig::from_toml("[retry]\nexp_base = 0.5\n").unwrap_err();
        assert!(err.to_string().contains("exp_base"));
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let err = secret("REEL_TEST_SECRET_THAT_IS_NEVER_SET").unwrap_err();
        assert!(err.to_string().contains("REEL_TEST_SECRET_THAT_IS_NEVER_SET"));
    }
}
