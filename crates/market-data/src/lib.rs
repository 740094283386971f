pub mod client;
pub mod error;
pub mod sina;

pub use client::{ContractCodes, ExpiryInfo, MarketData, OptionQuote};
pub use error::MarketDataError;
pub use sina::SinaMarketData;
