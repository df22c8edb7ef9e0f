use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const DEFAULT_CLOUDINARY_UPLOAD_URL: &str = "https://api.cloudinary.com/v1_1";

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_POSTGRES_URL: &str = "postgres://localhost:5432/pdfqa";
pub const DEFAULT_DATABASE: &str = "pdfqa";
pub const DEFAULT_COLLECTION: &str = "documents";

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HUGGINGFACE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_TEI_URL: &str = "http://localhost:8080";

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_HUGGINGFACE_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_HUGGINGFACE_GENERATION_MODEL: &str = "EleutherAI/gpt-neo-2.7B";
pub const DEFAULT_OPENAI_GENERATION_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_MAX_LENGTH: u32 = 150;
pub const DEFAULT_METRICS_RETENTION_DAYS: u32 = 30;

const APP_DIR: &str = "pdfqa";
const PROJECT_DIR: &str = ".pdfqa";
const CONFIG_FILE: &str = "config.toml";
const REDACTED: &str = "********";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub document_store: DocumentStoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// A loaded configuration together with the files it was read from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub global_path: Option<PathBuf>,
    pub project_path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn project_config_dir() -> Option<PathBuf> {
        std::env::current_dir().ok().map(|p| p.join(PROJECT_DIR))
    }

    pub fn project_path() -> Option<PathBuf> {
        Self::project_config_dir().map(|p| p.join(CONFIG_FILE))
    }

    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(APP_DIR))
    }

    pub fn metrics_db_path() -> Option<PathBuf> {
        Self::data_dir().map(|p| p.join("metrics.db"))
    }

    /// Load configuration from `.env`, the global and project files, and
    /// the process environment, in increasing order of precedence.
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let _ = dotenvy::dotenv();
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(Self::global_path(), Self::project_path(), &env)
    }

    pub fn load_from(
        global_path: Option<PathBuf>,
        project_path: Option<PathBuf>,
        env: &HashMap<String, String>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let global_path = global_path.filter(|p| p.exists());
        let project_path = project_path.filter(|p| p.exists());

        let mut merged = toml::Table::new();
        for path in [&global_path, &project_path].into_iter().flatten() {
            let content = std::fs::read_to_string(path)?;
            let table: toml::Table = toml::from_str(&content)?;
            merge_tables(&mut merged, table);
        }

        let mut config: Config = toml::from_str(&toml::to_string(&merged)?)?;
        config.apply_env(env);

        Ok(ResolvedConfig {
            config,
            global_path,
            project_path,
        })
    }

    /// Override settings from environment variables.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) {
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(address) = get("PDFQA_ADDRESS") {
            self.server.address = address;
        }

        match self.document_store.driver {
            DocumentDriver::MongoDB => {
                if let Some(uri) = get("MONGO_URI") {
                    self.document_store.url = Some(uri);
                }
            }
            DocumentDriver::PostgreSQL => {
                if let Some(url) = get("DATABASE_URL") {
                    self.document_store.url = Some(url);
                }
            }
            DocumentDriver::SQLite => {}
        }
        if let Some(database) = get("MONGO_DB_NAME") {
            self.document_store.database = database;
        }
        if let Some(collection) = get("MONGO_COLLECTION_NAME") {
            self.document_store.collection = collection;
        }

        if let Some(cloud_name) = get("CLOUDINARY_CLOUD_NAME") {
            self.storage.cloud_name = Some(cloud_name);
        }
        if let Some(api_key) = get("CLOUDINARY_API_KEY") {
            self.storage.api_key = Some(api_key);
        }
        if let Some(api_secret) = get("CLOUDINARY_API_SECRET") {
            self.storage.api_secret = Some(api_secret);
        }

        let huggingface_key = get("HUGGINGFACE_API_KEY");
        let openai_key = get("OPENAI_API_KEY");

        let embedding_key = match self.embedding.driver {
            EmbeddingDriver::OpenAI => openai_key.clone(),
            EmbeddingDriver::HuggingFace => huggingface_key.clone(),
            EmbeddingDriver::Tei => None,
        };
        if embedding_key.is_some() {
            self.embedding.api_key = embedding_key;
        }

        let generation_key = match self.generation.driver {
            GenerationDriver::HuggingFace => huggingface_key,
            GenerationDriver::OpenAI => openai_key,
        };
        if generation_key.is_some() {
            self.generation.api_key = generation_key;
        }
    }

    /// Check bounds and the credentials required by the selected drivers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.generation.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_length must be at least 1".to_string(),
            ));
        }

        if self.storage.driver == StorageDriver::Cloudinary {
            require(&self.storage.cloud_name, "storage.cloud_name (CLOUDINARY_CLOUD_NAME)")?;
            require(&self.storage.api_key, "storage.api_key (CLOUDINARY_API_KEY)")?;
            require(&self.storage.api_secret, "storage.api_secret (CLOUDINARY_API_SECRET)")?;
        }

        match self.embedding.driver {
            EmbeddingDriver::OpenAI => {
                require(&self.embedding.api_key, "embedding.api_key (OPENAI_API_KEY)")?
            }
            EmbeddingDriver::HuggingFace => {
                require(&self.embedding.api_key, "embedding.api_key (HUGGINGFACE_API_KEY)")?
            }
            EmbeddingDriver::Tei => {}
        }

        match self.generation.driver {
            GenerationDriver::HuggingFace => {
                require(&self.generation.api_key, "generation.api_key (HUGGINGFACE_API_KEY)")?
            }
            GenerationDriver::OpenAI => {
                require(&self.generation.api_key, "generation.api_key (OPENAI_API_KEY)")?
            }
        }

        Ok(())
    }

    /// A copy with every secret replaced, suitable for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let mask = |secret: &mut Option<String>| {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        };
        mask(&mut config.storage.api_secret);
        mask(&mut config.embedding.api_key);
        mask(&mut config.generation.api_key);
        if let Some(url) = config.document_store.url.as_mut() {
            *url = redact_url_password(url);
        }
        config
    }

    pub fn init_global() -> Result<PathBuf, ConfigError> {
        let path = Self::global_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn init_project() -> Result<PathBuf, ConfigError> {
        let path = Self::project_path().ok_or_else(|| {
            ConfigError::PathError("could not determine project directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn require(value: &Option<String>, name: &str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingSetting(name.to_string())),
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn redact_url_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:{REDACTED}@{host}"),
        None => url.to_string(),
    }
}

macro_rules! driver_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => write!(f, $label),)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageDriver {
    #[default]
    #[serde(rename = "cloudinary")]
    Cloudinary,
    #[serde(rename = "local")]
    Local,
}

driver_enum!(StorageDriver { Cloudinary => "cloudinary", Local => "local" });

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentDriver {
    #[default]
    #[serde(rename = "mongodb")]
    MongoDB,
    #[serde(rename = "postgres")]
    PostgreSQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

driver_enum!(DocumentDriver { MongoDB => "mongodb", PostgreSQL => "postgres", SQLite => "sqlite" });

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingDriver {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "tei")]
    Tei,
}

driver_enum!(EmbeddingDriver { OpenAI => "openai", HuggingFace => "huggingface", Tei => "tei" });

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationDriver {
    #[default]
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "openai")]
    OpenAI,
}

driver_enum!(GenerationDriver { HuggingFace => "huggingface", OpenAI => "openai" });

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Directory for spooled uploads; the system temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_upload_bytes: default_max_upload_bytes(),
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StorageDriver,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,

    #[serde(default = "default_cloudinary_upload_url")]
    pub upload_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_cloudinary_upload_url() -> String {
    DEFAULT_CLOUDINARY_UPLOAD_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

impl StorageConfig {
    pub fn local_dir(&self) -> Option<PathBuf> {
        self.local_dir
            .clone()
            .or_else(|| Config::data_dir().map(|p| p.join("objects")))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
            upload_url: default_cloudinary_upload_url(),
            local_dir: None,
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    #[serde(default)]
    pub driver: DocumentDriver,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_pool_max")]
    pub pool_max: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_pool_max() -> u32 {
    5
}

impl DocumentStoreConfig {
    pub fn connection_url(&self) -> String {
        match (&self.url, self.driver) {
            (Some(url), _) => url.clone(),
            (None, DocumentDriver::PostgreSQL) => DEFAULT_POSTGRES_URL.to_string(),
            (None, _) => DEFAULT_MONGO_URI.to_string(),
        }
    }

    pub fn sqlite_path(&self) -> Option<PathBuf> {
        self.sqlite_path
            .clone()
            .or_else(|| Config::data_dir().map(|p| p.join("documents.db")))
    }
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            driver: DocumentDriver::default(),
            url: None,
            database: default_database(),
            collection: default_collection(),
            pool_max: default_pool_max(),
            sqlite_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub driver: EmbeddingDriver,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_batch_size() -> u32 {
    64
}

impl EmbeddingConfig {
    pub fn endpoint(&self) -> String {
        let url = self.url.as_deref().unwrap_or(match self.driver {
            EmbeddingDriver::OpenAI => DEFAULT_OPENAI_URL,
            EmbeddingDriver::HuggingFace => DEFAULT_HUGGINGFACE_URL,
            EmbeddingDriver::Tei => DEFAULT_TEI_URL,
        });
        url.trim_end_matches('/').to_string()
    }

    pub fn model_name(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.driver {
                EmbeddingDriver::OpenAI => DEFAULT_OPENAI_EMBEDDING_MODEL,
                EmbeddingDriver::HuggingFace => DEFAULT_HUGGINGFACE_EMBEDDING_MODEL,
                EmbeddingDriver::Tei => "tei",
            }
            .to_string()
        })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            driver: EmbeddingDriver::default(),
            url: None,
            model: None,
            api_key: None,
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub driver: GenerationDriver,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upper bound on generated length, passed to the provider as-is.
    #[serde(default = "default_max_length")]
    pub max_length: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_max_length() -> u32 {
    DEFAULT_MAX_LENGTH
}

impl GenerationConfig {
    pub fn endpoint(&self) -> String {
        let url = self.url.as_deref().unwrap_or(match self.driver {
            GenerationDriver::HuggingFace => DEFAULT_HUGGINGFACE_URL,
            GenerationDriver::OpenAI => DEFAULT_OPENAI_URL,
        });
        url.trim_end_matches('/').to_string()
    }

    pub fn model_name(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.driver {
                GenerationDriver::HuggingFace => DEFAULT_HUGGINGFACE_GENERATION_MODEL,
                GenerationDriver::OpenAI => DEFAULT_OPENAI_GENERATION_MODEL,
            }
            .to_string()
        })
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            driver: GenerationDriver::default(),
            url: None,
            model: None,
            api_key: None,
            max_length: default_max_length(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    DEFAULT_METRICS_RETENTION_DAYS
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            retention_days: default_retention_days(),
        }
    }
}
