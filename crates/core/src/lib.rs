pub mod calendar;
pub mod config;
pub mod config_loader;
pub mod month;
pub mod retry;
pub mod schedule;
pub mod types;
pub mod valuation;

pub use calendar::{TradingCalendar, TradingSession};
pub use config::{AppConfig, CalendarConfig, MarketDataConfig, StorageConfig, TrackerConfig};
pub use config_loader::ConfigLoader;
pub use month::Month;
pub use retry::RetryPolicy;
pub use schedule::RolloverSchedule;
pub use types::{ContractLeg, OptionRight, Position};
