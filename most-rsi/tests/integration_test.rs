//! Integration tests for most-rsi

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use most_rsi::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Helper function to create test bars one minute apart
fn create_test_bars(count: usize, base_price: f64) -> Vec<RawBar> {
    (0..count)
        .map(|i| {
            let price = base_price + (i as f64 * 0.1) + (i as f64 % 10.0) * 0.5;
            Bar::new(i as i64 * 60_000, price, price + 1.0, price - 1.0, price, 1000.0, true).into()
        })
        .collect()
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fires on every cycle once the slow RSI is defined
fn always_rule(cooldown_secs: u64) -> AlertRule {
    AlertRule::new(
        "always",
        AlertKind::Threshold {
            source: Source::new("slow", Field::Rsi),
            condition: Threshold::at_least(0.0),
        },
    )
    .with_cooldown(cooldown_secs)
}

fn config_with(rules: Vec<AlertRule>) -> EngineConfig {
    EngineConfig {
        rules,
        ..Default::default()
    }
}

#[derive(Default)]
struct CountingNotifier {
    sent: AtomicUsize,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn send(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("chat not found".to_string()))
    }
}

async fn join(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        handle.await.unwrap();
    }
}

#[test]
fn test_recompute_round_trip_is_bit_identical() {
    let config = Arc::new(EngineConfig::default());
    let bars = create_test_bars(300, 100.0);

    let mut a = PairEngine::new("BTCUSDT", "1h", Arc::clone(&config));
    let mut b = PairEngine::new("BTCUSDT", "1h", config);
    a.seed(bars.clone()).unwrap();
    b.seed(bars).unwrap();

    for i in 300..310 {
        let bar: RawBar = Bar::new(i * 60_000, 130.0, 131.0, 129.0, 130.0 + (i % 3) as f64, 900.0, true).into();
        a.on_bar(bar.clone(), at(i)).unwrap();
        b.on_bar(bar, at(i)).unwrap();
    }

    let bits = |r: &Readings| -> Vec<Option<u64>> {
        r.values()
            .flat_map(|o| [o.rsi, o.moving_average, o.most_line])
            .map(|v| v.map(f64::to_bits))
            .collect()
    };
    assert_eq!(bits(&a.snapshot().current), bits(&b.snapshot().current));
    assert_eq!(bits(&a.snapshot().previous), bits(&b.snapshot().previous));
    assert_eq!(bits(&a.recompute().unwrap()), bits(&a.snapshot().current));
}

#[test]
fn test_window_capacity_respected_through_engine() {
    let config = EngineConfig {
        candle_limit: 80,
        ..Default::default()
    };
    let mut engine = PairEngine::new("ETHUSDT", "4h", Arc::new(config));
    engine.seed(create_test_bars(200, 50.0)).unwrap();
    assert_eq!(engine.window().len(), 80);

    engine
        .on_bar(Bar::new(200 * 60_000, 60.0, 61.0, 59.0, 60.0, 10.0, false).into(), at(0))
        .unwrap();
    engine
        .on_bar(Bar::new(200 * 60_000, 60.0, 62.0, 59.0, 61.5, 12.0, true).into(), at(1))
        .unwrap();
    assert_eq!(engine.window().len(), 80);
    assert_eq!(engine.window().last().map(|b| b.close), Some(61.5));
}

#[test]
fn test_out_of_order_bar_rejected() {
    let mut engine = PairEngine::new("BTCUSDT", "1h", Arc::new(EngineConfig::default()));
    engine.seed(create_test_bars(100, 100.0)).unwrap();
    let cycles = engine.snapshot().cycles;

    let stale: RawBar = Bar::new(0, 1.0, 1.0, 1.0, 1.0, 1.0, true).into();
    let err = engine.on_bar(stale, at(0)).unwrap_err();
    assert!(matches!(err, EngineError::Data(DataError::OutOfOrder { .. })));
    assert_eq!(engine.snapshot().cycles, cycles);
}

#[tokio::test]
async fn test_registry_lifecycle() {
    init_tracing();
    let registry = EngineRegistry::new(EngineConfig::default()).unwrap();

    registry.register("BTCUSDT", "1h", create_test_bars(120, 100.0)).await.unwrap();
    registry.register("BTCUSDT", "1d", create_test_bars(120, 100.0)).await.unwrap();
    registry.register("ETHUSDT", "1h", create_test_bars(120, 10.0)).await.unwrap();

    assert_eq!(
        registry.pairs().await,
        vec![
            PairKey::new("BTCUSDT", "1d"),
            PairKey::new("BTCUSDT", "1h"),
            PairKey::new("ETHUSDT", "1h"),
        ]
    );
    assert!(registry.snapshot("ETHUSDT", "1h").await.is_some());

    assert_eq!(registry.remove_symbol("BTCUSDT").await, 2);
    assert!(!registry.contains("BTCUSDT", "1h").await);

    let err = registry
        .process_bar("BTCUSDT", "1h", RawBar::default(), at(0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownPair { .. }));
}

#[test]
fn test_registry_rejects_invalid_config() {
    let mut config = EngineConfig::default();
    config.profiles[0].ma_length = 0;
    assert!(matches!(
        EngineRegistry::new(config),
        Err(ConfigError::InvalidProfile(name)) if name == "fast"
    ));

    let config = EngineConfig {
        candle_limit: 20,
        ..Default::default()
    };
    assert!(matches!(
        EngineRegistry::new(config),
        Err(ConfigError::CapacityTooSmall { limit: 20, .. })
    ));
}

#[tokio::test]
async fn test_cooldown_single_dispatch_within_horizon() {
    init_tracing();
    let registry = EngineRegistry::new(config_with(vec![always_rule(3600)])).unwrap();
    registry.register("BTCUSDT", "1h", create_test_bars(120, 100.0)).await.unwrap();

    let notifier = Arc::new(CountingNotifier::default());
    let dispatcher = Dispatcher::new(notifier.clone(), Arc::new(CooldownLedger::new()));

    for (i, secs) in [(120, 0), (121, 600)] {
        let bar: RawBar = Bar::new(i * 60_000, 110.0, 111.0, 109.0, 110.0, 1.0, true).into();
        let events = registry.process_bar("BTCUSDT", "1h", bar, at(secs)).await.unwrap();
        assert_eq!(events.len(), 1);
        join(dispatcher.dispatch(events)).await;
    }

    assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cooldown_two_dispatches_beyond_horizon() {
    let registry = EngineRegistry::new(config_with(vec![always_rule(3600)])).unwrap();
    registry.register("BTCUSDT", "1h", create_test_bars(120, 100.0)).await.unwrap();

    let notifier = Arc::new(CountingNotifier::default());
    let dispatcher = Dispatcher::new(notifier.clone(), Arc::new(CooldownLedger::new()));

    for (i, secs) in [(120, 0), (121, 3600)] {
        let bar: RawBar = Bar::new(i * 60_000, 110.0, 111.0, 109.0, 110.0, 1.0, true).into();
        let events = registry.process_bar("BTCUSDT", "1h", bar, at(secs)).await.unwrap();
        join(dispatcher.dispatch(events)).await;
    }

    assert_eq!(notifier.sent.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeframes_have_separate_cooldowns() {
    let registry = EngineRegistry::new(config_with(vec![always_rule(3600)])).unwrap();
    registry.register("BTCUSDT", "1h", create_test_bars(120, 100.0)).await.unwrap();
    registry.register("BTCUSDT", "4h", create_test_bars(120, 100.0)).await.unwrap();

    let notifier = Arc::new(CountingNotifier::default());
    let dispatcher = Dispatcher::new(notifier.clone(), Arc::new(CooldownLedger::new()));

    for timeframe in ["1h", "4h"] {
        let bar: RawBar = Bar::new(120 * 60_000, 110.0, 111.0, 109.0, 110.0, 1.0, true).into();
        let events = registry.process_bar("BTCUSDT", timeframe, bar, at(0)).await.unwrap();
        join(dispatcher.dispatch(events)).await;
    }

    assert_eq!(notifier.sent.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_send_leaves_ledger_unstamped() {
    let ledger = Arc::new(CooldownLedger::new());
    let failing = Dispatcher::new(Arc::new(FailingNotifier), Arc::clone(&ledger));

    let registry = EngineRegistry::new(config_with(vec![always_rule(3600)])).unwrap();
    registry.register("BTCUSDT", "1h", create_test_bars(120, 100.0)).await.unwrap();

    let bar: RawBar = Bar::new(120 * 60_000, 110.0, 111.0, 109.0, 110.0, 1.0, true).into();
    let events = registry.process_bar("BTCUSDT", "1h", bar, at(0)).await.unwrap();
    join(failing.dispatch(events.clone())).await;
    assert!(ledger.is_empty());

    // The next cycle may retry immediately
    let notifier = Arc::new(CountingNotifier::default());
    let working = Dispatcher::new(notifier.clone(), Arc::clone(&ledger));
    join(working.dispatch(events)).await;
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_concurrent_reservations_send_once() {
    let ledger = Arc::new(CooldownLedger::new());
    let notifier = Arc::new(CountingNotifier::default());
    let dispatcher = Dispatcher::new(notifier.clone(), ledger);

    let registry = EngineRegistry::new(config_with(vec![always_rule(3600)])).unwrap();
    registry.register("BTCUSDT", "1h", create_test_bars(120, 100.0)).await.unwrap();
    let bar: RawBar = Bar::new(120 * 60_000, 110.0, 111.0, 109.0, 110.0, 1.0, true).into();
    let events = registry.process_bar("BTCUSDT", "1h", bar, at(0)).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let dispatcher = dispatcher.clone();
        let events = events.clone();
        tasks.push(tokio::spawn(async move { join(dispatcher.dispatch(events)).await }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rules_round_trip_through_json() {
    let rules = default_rules();
    let json = serde_json::to_string(&rules).unwrap();
    let parsed: Vec<AlertRule> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, rules);

    assert!(config_with(parsed).validate().is_ok());
}
