use crate::services::binance::BinanceRestLoader;
use crate::services::telegram::{LogNotifier, TelegramNotifier};
use most_rsi::alerts::{CooldownLedger, Dispatcher, Notifier};
use most_rsi::engine::EngineRegistry;
use most_rsi::exchange::{HistoricalLoader, RetryPolicy};
use shared::Config;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub registry: EngineRegistry,
    pub dispatcher: Dispatcher,
    pub loader: Arc<dyn HistoricalLoader>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new() -> Result<Self, anyhow::Error> {
        let config = Config::from_env()?;
        let engine_config = config.engine_config()?;
        tracing::info!(
            "Loaded {} profiles and {} alert rules (history: {} bars)",
            engine_config.profiles.len(),
            engine_config.rules.len(),
            engine_config.required_history()
        );

        let notifier: Arc<dyn Notifier> = match (&config.telegram_bot_token, config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                tracing::info!("Telegram notifications enabled for chat {}", chat_id);
                Arc::new(TelegramNotifier::new(token, chat_id))
            }
            _ => {
                tracing::warn!("⚠️ TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID missing, alerts go to the log only");
                Arc::new(LogNotifier)
            }
        };

        let loader: Arc<dyn HistoricalLoader> = Arc::new(BinanceRestLoader::new(&config.binance_rest_url)?);

        Ok(AppState {
            registry: EngineRegistry::new(engine_config)?,
            dispatcher: Dispatcher::new(notifier, Arc::new(CooldownLedger::new())),
            loader,
            retry: config.retry_policy(),
            config,
        })
    }
}
