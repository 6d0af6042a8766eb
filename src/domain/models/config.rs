use serde::{Deserialize, Serialize};

/// Main configuration structure for symbiont
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Supervised worker process configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Snapshot store configuration
    #[serde(default)]
    pub snapshots: SnapshotConfig,

    /// History log configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Evolution loop configuration
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Code-generation collaborator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Self {
            worker: WorkerConfig::default(),
            snapshots: SnapshotConfig::default(),
            history: HistoryConfig::default(),
            evolution: EvolutionConfig::default(),
            generator: GeneratorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration for the supervised worker process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerConfig {
    /// Path to the worker source file watched for changes and rewritten
    /// by the evolution loop
    #[serde(default = "default_source_path")]
    pub source_path: String,

    /// Executable used to launch the worker
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments passed to the worker executable
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Seconds between supervisor polls of liveness and fingerprint
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait after SIGTERM before force-killing the worker
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,

    /// Seconds to wait after a repair attempt before relaunching
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Seconds a relaunched worker must stay alive before the fix
    /// attempt counter resets
    #[serde(default = "default_stable_after_secs")]
    pub stable_after_secs: u64,

    /// Maximum self-correction attempts before rolling back to the
    /// latest snapshot
    #[serde(default = "default_max_fix_attempts")]
    pub max_fix_attempts: u32,
}

fn default_source_path() -> String {
    "app/worker.py".to_string()
}

fn default_command() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["app/worker.py".to_string()]
}

const fn default_poll_interval_secs() -> u64 {
    2
}

const fn default_grace_period_secs() -> u64 {
    5
}

const fn default_settle_delay_secs() -> u64 {
    3
}

const fn default_stable_after_secs() -> u64 {
    10
}

const fn default_max_fix_attempts() -> u32 {
    3
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            command: default_command(),
            args: default_args(),
            poll_interval_secs: default_poll_interval_secs(),
            grace_period_secs: default_grace_period_secs(),
            settle_delay_secs: default_settle_delay_secs(),
            stable_after_secs: default_stable_after_secs(),
            max_fix_attempts: default_max_fix_attempts(),
        }
    }
}

/// Snapshot store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotConfig {
    /// Directory holding timestamped backup copies of the worker source
    #[serde(default = "default_snapshot_dir")]
    pub dir: String,
}

fn default_snapshot_dir() -> String {
    ".symbiont/snapshots".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
        }
    }
}

/// History log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryConfig {
    /// Path of the JSON history log
    #[serde(default = "default_history_path")]
    pub path: String,

    /// Number of recent entries folded into generation prompts
    #[serde(default = "default_prompt_entries")]
    pub prompt_entries: usize,
}

fn default_history_path() -> String {
    ".symbiont/evolution_log.json".to_string()
}

const fn default_prompt_entries() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            prompt_entries: default_prompt_entries(),
        }
    }
}

/// Evolution loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EvolutionConfig {
    /// Seconds between iterations when not in interactive mode
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum proposal requests per iteration
    #[serde(default = "default_max_proposal_attempts")]
    pub max_proposal_attempts: u32,

    /// Fixed delay between proposal attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// When true, wait for the trigger file instead of sleeping between
    /// iterations
    #[serde(default)]
    pub interactive: bool,

    /// Marker file whose presence starts the next iteration
    /// (interactive mode only; consumed on use)
    #[serde(default = "default_trigger_path")]
    pub trigger_path: String,

    /// Optional file carrying a free-text user request, consumed before
    /// context assembly
    #[serde(default = "default_request_path")]
    pub request_path: String,

    /// Source context assembly configuration
    #[serde(default)]
    pub context: ContextConfig,
}

const fn default_interval_secs() -> u64 {
    300
}

const fn default_max_proposal_attempts() -> u32 {
    3
}

const fn default_retry_delay_secs() -> u64 {
    5
}

fn default_trigger_path() -> String {
    ".symbiont/trigger".to_string()
}

fn default_request_path() -> String {
    ".symbiont/request".to_string()
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_proposal_attempts: default_max_proposal_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            interactive: false,
            trigger_path: default_trigger_path(),
            request_path: default_request_path(),
            context: ContextConfig::default(),
        }
    }
}

/// Source context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContextConfig {
    /// Root directory walked when assembling source context
    #[serde(default = "default_context_root")]
    pub root: String,

    /// Paths excluded from the context (files, or directories with a
    /// trailing slash)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// File extensions included in the context
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files larger than this are skipped
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_context_root() -> String {
    "app".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

const fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            root: default_context_root(),
            exclude: vec![],
            extensions: default_extensions(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// Code-generation collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// Base URL of the generation API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
