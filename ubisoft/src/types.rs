//! Typed values handed from the client to its callers.
use derive_more::{Deref, Display, From, Into};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct ItemId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct SpaceId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Into, Deref, Deserialize)]
pub struct CurrencyId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Into, Deref, Deserialize)]
pub struct TradeId(String);

/// An item together with the game space whose market lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReference {
    pub item_id: ItemId,
    pub space_id: SpaceId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub name: String,
    pub item_type: String,
    pub is_owned: bool,
    pub currency_id: CurrencyId,
    pub lowest_sell_price: u64,
}

impl fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Type: {}, Is owned: {}, Lowest price: {}",
            self.name, self.item_type, self.is_owned, self.lowest_sell_price
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Deserialize)]
pub enum TradeState {
    Created,
    Succeeded,
    Failed,
    Cancelled,
    Expired,
    #[serde(other)]
    Unknown,
}

/// What the market did with a freshly submitted buy order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderPlacement {
    /// The order is live and waiting for a seller.
    Created(TradeId),
    /// A seller accepted the order as it was placed.
    Filled(TradeId),
    Rejected { reason: String },
}

/// Answer to a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cancellation {
    Cancelled,
    /// The trade had already completed when the cancel arrived.
    Filled,
    /// The trade no longer exists, either filled or removed elsewhere.
    NotFound,
    Refused {
        code: Option<String>,
        message: String,
    },
}
