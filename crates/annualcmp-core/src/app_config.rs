#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Presence selects the Gemini embedding and answer backends.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub embedding_dim: usize,
    pub chunk_size: usize,
    pub search_top_k: usize,
    pub request_timeout_secs: u64,
    pub default_fiscal_year: i32,
}

impl AppConfig {
    /// Whether an external AI service is configured at all.
    #[must_use]
    pub fn has_gemini(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_base_url", &self.gemini_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("generation_model", &self.generation_model)
            .field("embedding_dim", &self.embedding_dim)
            .field("chunk_size", &self.chunk_size)
            .field("search_top_k", &self.search_top_k)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("default_fiscal_year", &self.default_fiscal_year)
            .finish()
    }
}
