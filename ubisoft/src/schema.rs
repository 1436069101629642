//! Wire shapes of the GraphQL gateway responses.
use crate::types::{CurrencyId, TradeId, TradeState};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

const INVALID_TICKET: &str = "INVALID_TICKET";
const AUTH_MARKERS: [&str; 2] = ["expired", INVALID_TICKET];

#[derive(Deserialize, Debug)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    /// Returns `data`, or the first reported error when the gateway sent none.
    pub fn into_data(self) -> Result<T> {
        match (self.data, self.errors.into_iter().next()) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error.into()),
            (None, None) => Err(Error::MissingData("data")),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct GraphQlError {
    #[serde(default)]
    pub message: String,
    pub extensions: Option<ErrorExtensions>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ErrorExtensions {
    pub code: Option<Value>,
}

impl GraphQlError {
    /// The gateway sends codes both as strings and as numbers.
    pub fn code(&self) -> Option<String> {
        match self.extensions.as_ref()?.code.as_ref()? {
            Value::String(code) => Some(code.clone()),
            Value::Null => None,
            code => Some(code.to_string()),
        }
    }
}

impl From<GraphQlError> for Error {
    fn from(error: GraphQlError) -> Self {
        Error::GraphQl {
            code: error.code(),
            message: error.message,
        }
    }
}

/// True when a raw `errors` payload says the session ticket is no longer valid.
pub(crate) fn is_auth_failure(payload: &str) -> bool {
    AUTH_MARKERS.iter().any(|marker| payload.contains(marker))
}

/// Narrower check for mutations, whose refusals may mention expiry on their own.
pub(crate) fn is_invalid_ticket(payload: &str) -> bool {
    payload.contains(INVALID_TICKET)
}

#[derive(Deserialize, Debug)]
pub(crate) struct Viewer<T> {
    pub meta: T,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemDetailsData {
    pub game: ItemDetailsGame,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemDetailsGame {
    pub marketable_item: Option<MarketableItem>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarketableItem {
    pub item: StoreItem,
    pub market_data: Option<MarketData>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct StoreItem {
    pub name: String,
    pub r#type: String,
    pub viewer: Viewer<OwnershipMeta>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OwnershipMeta {
    pub is_owned: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarketData {
    pub sell_stats: Option<Vec<SellStats>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SellStats {
    pub payment_item_id: CurrencyId,
    pub lowest_price: Option<u64>,
    pub highest_price: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct BalanceData {
    pub game: BalanceGame,
}

#[derive(Deserialize, Debug)]
pub(crate) struct BalanceGame {
    pub viewer: Viewer<BalanceMeta>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BalanceMeta {
    pub secondary_store_item: Option<Viewer<QuantityMeta>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct QuantityMeta {
    pub quantity: u64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateBuyOrderData {
    pub create_buy_order: Option<TradeEnvelope>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelOrderData {
    pub cancel_order: Option<TradeEnvelope>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TradeEnvelope {
    pub trade: Trade,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Trade {
    pub trade_id: TradeId,
    pub state: TradeState,
    pub failures: Option<Value>,
}
