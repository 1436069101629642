//! Client for the Rainbow Six Siege marketplace behind the Ubisoft GraphQL gateway.
//!
//! Resolves catalog URLs to item identifiers, reads market data and the
//! account balance, and places or cancels buy orders. Responses are mapped to
//! the typed values in [`types`] before they leave the crate.
mod config;
mod conversion;
mod error;
mod http;
mod operation;
mod resolver;
mod schema;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use http::HttpClient;
pub use types::{
    Cancellation, CurrencyId, ItemId, ItemReference, MarketSnapshot, OrderPlacement, SpaceId,
    TradeId, TradeState,
};

pub type Result<T> = std::result::Result<T, Error>;
