use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub proposer_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub parallel_proposals: bool,
    pub classify_references: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // CLAUDE_API_KEY is the legacy name; both are accepted.
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .or_else(|_| env::var("CLAUDE_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-20240620".to_string()),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            proposer_timeout_secs: env::var("PROPOSER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
            parallel_proposals: env_flag("PARALLEL_PROPOSALS"),
            classify_references: env_flag("CLASSIFY_REFERENCES"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
