use std::fmt;
use std::str::FromStr;

/// Where MCQs are read from and where evaluation runs are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Local JSON files, safe for dry runs.
    Test,
    /// MongoDB (`questions` / `evaluations` collections).
    Db,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Mode::Test),
            "db" => Ok(Mode::Db),
            other => Err(format!("mode must be 'test' or 'db', got '{}'", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Test => write!(f, "test"),
            Mode::Db => write!(f, "db"),
        }
    }
}

/// How questions are sampled out of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sampler {
    Random,
    Sequential,
}

impl FromStr for Sampler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Sampler::Random),
            "sequential" => Ok(Sampler::Sequential),
            other => Err(format!(
                "sampler must be 'random' or 'sequential', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sampler::Random => write!(f, "random"),
            Sampler::Sequential => write!(f, "sequential"),
        }
    }
}

/// Runtime configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// test (JSON files) or db (MongoDB)
    pub mode: Mode,
    /// random or sequential question sampling
    pub sampler: Sampler,
    /// How many questions one run pulls from the store
    pub sample_size: usize,
    /// Questions per validation batch (one LLM call per batch)
    pub batch_size: usize,
    /// Whether accepted shuffle verdicts actually reorder choices
    pub shuffle_choices: bool,
    /// Verbose per-question logging
    pub verbose_logging: bool,
    // --- LLM ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    /// The validator ("master") model
    pub master_model: String,
    /// The models being examined
    pub student_models: Vec<String>,
    /// Upper bound for a single completion call, in seconds
    pub llm_timeout_secs: u64,
    // --- MongoDB (db mode) ---
    pub mongo_uri: String,
    pub db_name: String,
    pub mcq_collection: String,
    pub eval_collection: String,
    // --- Files (test mode) ---
    pub mcq_json_file: String,
    pub eval_json_file: String,
    /// Directory holding the images referenced by diagram_data.image_path
    pub image_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Test,
            sampler: Sampler::Random,
            sample_size: 10,
            batch_size: 2,
            shuffle_choices: true,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://openrouter.ai/api/v1".to_string(),
            master_model: "anthropic/claude-opus-4".to_string(),
            student_models: vec![
                "openai/gpt-4o-mini".to_string(),
                "anthropic/claude-sonnet-4".to_string(),
            ],
            llm_timeout_secs: 90,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            db_name: "mathlabs".to_string(),
            mcq_collection: "questions".to_string(),
            eval_collection: "evaluations".to_string(),
            mcq_json_file: "dataset/baseline.json".to_string(),
            eval_json_file: "evaluations.json".to_string(),
            image_dir: "dataset/images".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            mode: std::env::var("EVAL_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.mode),
            sampler: std::env::var("EVAL_SAMPLER").ok().and_then(|v| v.parse().ok()).unwrap_or(default.sampler),
            sample_size: std::env::var("SAMPLE_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.sample_size),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.batch_size),
            shuffle_choices: std::env::var("SHUFFLE_CHOICES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.shuffle_choices),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("OPENROUTER_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            master_model: std::env::var("MASTER_MODEL").unwrap_or(default.master_model),
            student_models: std::env::var("STUDENT_MODELS")
                .map(|v| v.split(',').map(|m| m.trim().to_string()).filter(|m| !m.is_empty()).collect())
                .unwrap_or(default.student_models),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
            mongo_uri: std::env::var("MONGO_URI").unwrap_or(default.mongo_uri),
            db_name: std::env::var("DB_NAME").unwrap_or(default.db_name),
            mcq_collection: std::env::var("MCQ_COLLECTION").unwrap_or(default.mcq_collection),
            eval_collection: std::env::var("EVAL_COLLECTION").unwrap_or(default.eval_collection),
            mcq_json_file: std::env::var("MCQ_JSON_FILE").unwrap_or(default.mcq_json_file),
            eval_json_file: std::env::var("EVAL_JSON_FILE").unwrap_or(default.eval_json_file),
            image_dir: std::env::var("IMAGE_DIR").unwrap_or(default.image_dir),
        }
    }
}
