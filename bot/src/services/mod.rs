pub mod binance;
pub mod kline_feed;
pub mod monitor;
pub mod telegram;
