use std::env;

/// How a project-article pair earns its final "relevant" verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevancePolicy {
    /// The adjudicator's verdict stands on its own.
    Adjudicated,
    /// The adjudicator must say yes AND at least one thematic area must match.
    Hybrid,
}

impl RelevancePolicy {
    fn parse(s: &str) -> Self {
        match s {
            "hybrid" => RelevancePolicy::Hybrid,
            "adjudicated" => RelevancePolicy::Adjudicated,
            other => panic!("RELEVANCE_POLICY must be 'adjudicated' or 'hybrid', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Chat/adjudication provider (OpenAI-compatible)
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,

    // Embedding provider (OpenAI-compatible)
    pub embedding_api_key: String,
    pub embedding_base_url: String,
    pub embedding_model: String,

    // Pipeline tuning
    pub relevance_threshold: f32,
    pub relevance_policy: RelevancePolicy,
    pub batch_concurrency: usize,

    // Feed/page fetching
    pub fetch_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            llm_api_key: required_env("LLM_API_KEY"),
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string()),
            llm_timeout_secs: parsed_env("LLM_TIMEOUT_SECS", 60),
            embedding_api_key: required_env("EMBEDDING_API_KEY"),
            embedding_base_url: env::var("EMBEDDING_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            relevance_threshold: parsed_env("RELEVANCE_THRESHOLD", 0.38),
            relevance_policy: RelevancePolicy::parse(
                &env::var("RELEVANCE_POLICY").unwrap_or_else(|_| "adjudicated".to_string()),
            ),
            batch_concurrency: parsed_env("BATCH_CONCURRENCY", 1),
            fetch_timeout_secs: parsed_env("FETCH_TIMEOUT_SECS", 10),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value: '{raw}'")),
        Err(_) => default,
    }
}
