use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::config::{Domain, Profile, RetrievalConfig};

#[derive(Clone, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Local,
    Memory,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AliasSettings {
    pub name: String,
    #[serde(default)]
    pub active_index: Option<String>,
}

impl Default for AliasSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            active_index: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DedupeSettings {
    #[serde(default = "default_true")]
    pub by_hash: bool,
    #[serde(default = "default_hash_normalization")]
    pub hash_normalization: String,
}

fn default_true() -> bool {
    true
}

fn default_hash_normalization() -> String {
    "lowercase_whitespace".to_string()
}

impl Default for DedupeSettings {
    fn default() -> Self {
        Self {
            by_hash: true,
            hash_normalization: default_hash_normalization(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmbeddingsSettings {
    pub active_profile: String,
    #[serde(default)]
    pub alias: AliasSettings,
    #[serde(default)]
    pub domains: HashMap<String, Domain>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub dedupe: DedupeSettings,
}

/// Sanitiser mode (spec.md §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SanitizerMode {
    #[default]
    Off,
    Shadow,
    On,
}

/// Whether matched PII spans are redacted (`[{TYPE}]`) or pseudonymised
/// (`[{TYPE}:{HASH}]`) in `on` mode (spec.md §4.1 step 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderMode {
    #[default]
    Redact,
    Pseudonym,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SanitiserSettings {
    #[serde(default)]
    pub mode: SanitizerMode,
    #[serde(default = "default_sanitizer_profile")]
    pub profile: String,
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default)]
    pub placeholder_mode: PlaceholderMode,
    #[serde(default)]
    pub hash_salt: String,
    #[serde(default)]
    pub audit_enabled: bool,
    #[serde(default = "default_audit_path")]
    pub audit_path: String,
}

fn default_sanitizer_profile() -> String {
    "default".to_string()
}
fn default_config_dir() -> String {
    "./config/sanitizer".to_string()
}
fn default_audit_path() -> String {
    "./data/audit/sanitizer.jsonl".to_string()
}

impl Default for SanitiserSettings {
    fn default() -> Self {
        Self {
            mode: SanitizerMode::default(),
            profile: default_sanitizer_profile(),
            config_dir: default_config_dir(),
            placeholder_mode: PlaceholderMode::default(),
            hash_salt: String::new(),
            audit_enabled: false,
            audit_path: default_audit_path(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct IngestLimits {
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    #[serde(default = "default_allow_mime")]
    pub allow_mime: Vec<String>,
}

fn default_max_upload_mb() -> u64 {
    25
}

fn default_allow_mime() -> Vec<String> {
    vec![
        "application/pdf".into(),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
        "application/vnd.openxmlformats-officedocument.presentationml.presentation".into(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into(),
        "text/html".into(),
        "text/plain".into(),
    ]
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_upload_mb: default_max_upload_mb(),
            allow_mime: default_allow_mime(),
        }
    }
}

impl IngestLimits {
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DocxAssetSettings {
    #[serde(default)]
    pub extract_images: bool,
    #[serde(default)]
    pub inline_placeholders: bool,
    #[serde(default)]
    pub figure_chunks: bool,
}

impl Default for DocxAssetSettings {
    fn default() -> Self {
        Self {
            extract_images: false,
            inline_placeholders: false,
            figure_chunks: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AssetsSettings {
    #[serde(default = "default_assets_root")]
    pub assets_root: String,
    #[serde(default)]
    pub docx: DocxAssetSettings,
}

fn default_assets_root() -> String {
    "./data/assets".to_string()
}

impl Default for AssetsSettings {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            docx: DocxAssetSettings::default(),
        }
    }
}

/// Single typed application configuration, validated once at startup
/// (SPEC_FULL.md §10.3). Downstream code consumes strongly-typed fields —
/// no nested dict lookups (spec.md §9 "Dynamic config dicts").
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    pub http_port: u16,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default)]
    pub storage: StorageKind,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsSettings,
    #[serde(default)]
    pub sanitiser: SanitiserSettings,
    #[serde(default)]
    pub ingest: IngestLimits,
    #[serde(default)]
    pub assets: AssetsSettings,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl AppConfig {
    /// Resolves a profile by name, per spec.md §4.5 step "profile known"
    /// validation (`unknown_profile` otherwise).
    pub fn profile(&self, name: &str) -> Result<&Profile, crate::error::AppError> {
        self.embeddings
            .profiles
            .get(name)
            .ok_or_else(|| crate::error::AppError::UnknownProfile(name.to_string()))
    }

    /// Resolves a domain override by key, per spec.md §4.6 step 2
    /// (`unknown_domain` otherwise).
    pub fn domain(&self, key: &str) -> Result<&Domain, crate::error::AppError> {
        self.embeddings
            .domains
            .get(key)
            .ok_or_else(|| crate::error::AppError::UnknownDomain(key.to_string()))
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
