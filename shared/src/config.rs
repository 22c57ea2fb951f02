use anyhow::Context;
use dotenv::dotenv;
use most_rsi::config::{load_rules, EngineConfig};
use most_rsi::exchange::RetryPolicy;
use std::time::Duration;

pub struct Config {
    pub symbols: Vec<String>,
    pub intervals: Vec<String>,
    pub candle_limit: usize,
    pub alert_cooldown_secs: u64,
    pub max_fetch_retries: u32,
    pub fetch_retry_delay_ms: u64,
    pub warmup_margin: usize,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub alert_rules_path: Option<String>,
    pub binance_rest_url: String,
    pub binance_ws_url: String,
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let telegram_chat_id = match std::env::var("TELEGRAM_CHAT_ID") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .with_context(|| format!("TELEGRAM_CHAT_ID is not a chat id: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Config {
            symbols: list(
                &std::env::var("SYMBOLS").unwrap_or_else(|_| "BTCUSDT,ETHUSDT".to_string()),
            )
            .into_iter()
            .map(|s| s.to_uppercase())
            .collect(),
            intervals: list(
                &std::env::var("ALERT_INTERVALS").unwrap_or_else(|_| "1h,4h,1d".to_string()),
            ),
            candle_limit: parsed("CANDLE_LIMIT", 500)?,
            alert_cooldown_secs: parsed("ALERT_COOLDOWN_SECS", 3600)?,
            max_fetch_retries: parsed("MAX_FETCH_RETRIES", 3)?,
            fetch_retry_delay_ms: parsed("FETCH_RETRY_DELAY_MS", 5000)?,
            warmup_margin: parsed("WARMUP_MARGIN", 10)?,
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            telegram_chat_id,
            alert_rules_path: std::env::var("ALERT_RULES_PATH").ok(),
            binance_rest_url: std::env::var("BINANCE_REST_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            binance_ws_url: std::env::var("BINANCE_WS_URL")
                .unwrap_or_else(|_| "wss://stream.binance.com:9443/ws".to_string()),
        })
    }

    /// Engine settings: defaults from the core, overridden by the environment
    /// and, if set, the rules file. Rules without their own cooldown get
    /// `ALERT_COOLDOWN_SECS`.
    pub fn engine_config(&self) -> Result<EngineConfig, anyhow::Error> {
        let mut rules = match &self.alert_rules_path {
            Some(path) => load_rules(path).with_context(|| format!("Failed to load alert rules from {}", path))?,
            None => EngineConfig::default().rules,
        };
        for rule in rules.iter_mut() {
            rule.inherit_cooldown(self.alert_cooldown_secs);
        }

        let config = EngineConfig {
            candle_limit: self.candle_limit,
            warmup_margin: self.warmup_margin,
            rules,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_fetch_retries,
            Duration::from_millis(self.fetch_retry_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_parsing() {
        assert_eq!(list(" BTCUSDT, ethusdt ,,"), vec!["BTCUSDT", "ethusdt"]);
        assert!(list("").is_empty());
    }

    fn config_with_rules(path: Option<String>) -> Config {
        Config {
            symbols: vec!["BTCUSDT".to_string()],
            intervals: vec!["1h".to_string()],
            candle_limit: 500,
            alert_cooldown_secs: 900,
            max_fetch_retries: 3,
            fetch_retry_delay_ms: 5000,
            warmup_margin: 10,
            telegram_bot_token: None,
            telegram_chat_id: None,
            alert_rules_path: path,
            binance_rest_url: "https://api.binance.com".to_string(),
            binance_ws_url: "wss://stream.binance.com:9443/ws".to_string(),
        }
    }

    #[test]
    fn test_rules_file_keeps_explicit_cooldown() {
        let path = std::env::temp_dir().join(format!("most_rsi_rules_{}.json", std::process::id()));
        let rule = |name: &str, cooldown: &str| {
            format!(
                r#"{{"name": "{name}", {cooldown} "kind": {{"type": "threshold",
                    "source": {{"profile": "fast", "field": "rsi"}},
                    "condition": {{"op": "below", "level": 30.0}}}}}}"#
            )
        };
        let json = format!(
            "[{}, {}]",
            rule("pinned", r#""cooldown_secs": 3600,"#),
            rule("inherited", "")
        );
        std::fs::write(&path, json).unwrap();

        let engine = config_with_rules(Some(path.display().to_string()))
            .engine_config()
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(engine.rules[0].cooldown_secs, Some(3600));
        assert_eq!(engine.rules[1].cooldown_secs, Some(900));
    }

    #[test]
    fn test_default_rules_take_env_cooldown() {
        let engine = config_with_rules(None).engine_config().unwrap();
        assert!(engine.rules.iter().all(|r| r.cooldown_secs == Some(900)));
    }
}
