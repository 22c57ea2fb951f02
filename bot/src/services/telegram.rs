//! Alert delivery: Telegram and a log-only fallback

use async_trait::async_trait;
use most_rsi::alerts::{AlertEvent, Notifier};
use most_rsi::error::NotifyError;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

/// Sends alerts to a single chat configured at construction
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        self.bot
            .send_message(self.chat_id, format_alert_message(event))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Used when no Telegram credentials are configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event).map_err(|e| NotifyError::Transport(e.to_string()))?;
        tracing::info!("🔔 Alert {}", payload);
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn format_alert_message(event: &AlertEvent) -> String {
    let mut message = format!(
        "🔔 <b>{}</b> {} · <code>{}</code>\n{}\n",
        escape_html(&event.symbol),
        escape_html(&event.timeframe),
        escape_html(&event.rule),
        escape_html(&event.description),
    );

    if let Some(price) = event.price {
        message.push_str(&format!("💰 Price: <b>{:.4}</b>\n", price));
    }
    for (label, value) in &event.values {
        message.push_str(&format!("• {}: <b>{:.2}</b>\n", escape_html(label), value));
    }
    message.push_str(&format!(
        "🕐 {}",
        event.triggered_at.format("%Y-%m-%d %H:%M UTC")
    ));
    message
}
