use crate::{
    error::{ApiError, Result},
    services::{prompts::PromptTemplate, recommendation::PipelineOptions},
};
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Path of the CSV book catalog loaded at startup
    pub catalog_path: String,
    pub default_top_k: usize,
    pub max_top_k: usize,

    pub huggingface_api_key: String,
    pub huggingface_base_url: String,
    pub huggingface_model_name: String,

    pub pinecone_api_key: String,
    /// Full data-plane URL of the index, e.g. `https://books-abc123.svc.us-east1-gcp.pinecone.io`
    pub pinecone_index_host: String,
    pub pinecone_namespace: Option<String>,
    /// Metadata field holding the tagged description of each vector
    pub pinecone_content_field: String,

    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub llm_temperature: f32,

    pub prompt_template: PromptTemplate,
    pub include_purchase_links: bool,
    pub include_book_metadata: bool,
    /// Used when a catalog row has no purchase link; `{isbn}` is replaced with the catalog key
    pub purchase_link_template: Option<String>,

    pub index_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Config {
    /// Load configuration from defaults and `APP_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("catalog_path", "books_cleaned_with_categories.csv")?
            .set_default("default_top_k", 5_i64)?
            .set_default("max_top_k", 50_i64)?
            .set_default("huggingface_base_url", "https://api-inference.huggingface.co")?
            .set_default(
                "huggingface_model_name",
                "sentence-transformers/all-MiniLM-L6-v2",
            )?
            .set_default("pinecone_content_field", "tagged_description")?
            .set_default("gemini_base_url", "https://generativelanguage.googleapis.com")?
            .set_default("gemini_model", "gemini-2.0-flash-lite")?
            .set_default("llm_temperature", 0.7_f64)?
            .set_default("prompt_template", "bookworm")?
            .set_default("include_purchase_links", false)?
            .set_default("include_book_metadata", true)?
            .set_default("index_timeout_secs", 15_i64)?
            .set_default("llm_timeout_secs", 30_i64)?
            .set_default("connect_timeout_secs", 10_i64)?
            .add_source(environment.try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k {
            return Err(ApiError::ConfigError(format!(
                "default_top_k must be between 1 and max_top_k ({}), got {}",
                self.max_top_k, self.default_top_k
            )));
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ApiError::ConfigError(format!(
                "llm_temperature must be within 0.0..=2.0, got {}",
                self.llm_temperature
            )));
        }

        for (name, value) in [
            ("huggingface_api_key", &self.huggingface_api_key),
            ("pinecone_api_key", &self.pinecone_api_key),
            ("pinecone_index_host", &self.pinecone_index_host),
            ("gemini_api_key", &self.gemini_api_key),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::ConfigError(format!("{} is empty", name)));
            }
        }

        Ok(())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            template: self.prompt_template,
            include_purchase_links: self.include_purchase_links,
            include_book_metadata: self.include_book_metadata,
            temperature: self.llm_temperature,
            default_top_k: self.default_top_k,
            max_top_k: self.max_top_k,
            index_timeout: Duration::from_secs(self.index_timeout_secs),
            llm_timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
