use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainConfig {
    /// Anvil/Geth-compatible JSON-RPC endpoint.
    pub rpc_url: String,
    pub timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Operator chat id for new-wallet notifications.
    pub admin_id: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Prefer the BOT_TOKEN environment variable; this field exists for
    /// local setups only.
    #[serde(default)]
    pub bot_token: Option<String>,
}

fn default_poll_timeout() -> u64 {
    30
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }

    /// Bot token, environment first.
    pub fn bot_token(&self) -> anyhow::Result<String> {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            return Ok(token);
        }
        self.telegram
            .bot_token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN is not set (env or config)"))
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.poll_timeout_secs)
    }
}
