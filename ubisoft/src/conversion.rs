use crate::schema::{
    CancelOrderData, CreateBuyOrderData, GraphQlError, GraphQlResponse, ItemDetailsData, Trade,
};
use crate::types::{Cancellation, ItemId, MarketSnapshot, OrderPlacement, TradeState};
use crate::{Error, Result};

/// Error code the gateway answers with when cancelling an unknown trade.
const TRADE_NOT_FOUND: &str = "1830";

impl MarketSnapshot {
    pub(crate) fn from_details(item_id: &ItemId, data: ItemDetailsData) -> Result<Self> {
        let marketable = data
            .game
            .marketable_item
            .ok_or(Error::MissingData("marketableItem"))?;

        // Only the first entry is priced in the currency the item trades in.
        let stats = marketable
            .market_data
            .and_then(|m| m.sell_stats)
            .and_then(|stats| stats.into_iter().next())
            .ok_or_else(|| Error::NoLiquidity(item_id.clone()))?;

        let lowest_sell_price = stats
            .lowest_price
            .ok_or_else(|| Error::NoLiquidity(item_id.clone()))?;

        if let Some(highest) = stats.highest_price {
            log::debug!("{item_id} sells between {lowest_sell_price} and {highest}");
        }

        Ok(Self {
            name: marketable.item.name,
            item_type: marketable.item.r#type,
            is_owned: marketable.item.viewer.meta.is_owned,
            currency_id: stats.payment_item_id,
            lowest_sell_price,
        })
    }
}

impl From<Trade> for OrderPlacement {
    fn from(trade: Trade) -> Self {
        match trade.state {
            TradeState::Created => OrderPlacement::Created(trade.trade_id),
            TradeState::Succeeded => OrderPlacement::Filled(trade.trade_id),
            state => {
                let reason = match trade.failures {
                    Some(failures) if !failures.is_null() => {
                        format!("trade {} is {state}: {failures}", trade.trade_id)
                    }
                    _ => format!("trade {} is {state}", trade.trade_id),
                };
                OrderPlacement::Rejected { reason }
            }
        }
    }
}

impl GraphQlResponse<CreateBuyOrderData> {
    /// Gateway errors without a trade mean the order was refused.
    pub(crate) fn into_placement(self) -> Result<OrderPlacement> {
        if let Some(envelope) = self.data.and_then(|d| d.create_buy_order) {
            return Ok(envelope.trade.into());
        }
        match self.errors.into_iter().next() {
            Some(error) => Ok(OrderPlacement::Rejected {
                reason: describe(&error),
            }),
            None => Err(Error::MissingData("createBuyOrder")),
        }
    }
}

impl From<Trade> for Cancellation {
    fn from(trade: Trade) -> Self {
        match trade.state {
            TradeState::Cancelled => Cancellation::Cancelled,
            TradeState::Succeeded => Cancellation::Filled,
            // Nothing confirms the order is gone, so it may still be live.
            state => Cancellation::Refused {
                code: None,
                message: format!("trade {} is {state}", trade.trade_id),
            },
        }
    }
}

impl GraphQlResponse<CancelOrderData> {
    pub(crate) fn into_cancellation(self) -> Result<Cancellation> {
        if let Some(error) = self.errors.into_iter().next() {
            return Ok(match error.code() {
                Some(code) if code == TRADE_NOT_FOUND => Cancellation::NotFound,
                code => Cancellation::Refused {
                    code,
                    message: error.message,
                },
            });
        }
        self.data
            .and_then(|d| d.cancel_order)
            .map(|envelope| envelope.trade.into())
            .ok_or(Error::MissingData("cancelOrder"))
    }
}

fn describe(error: &GraphQlError) -> String {
    match error.code() {
        Some(code) => format!("{code}: {}", error.message),
        None => error.message.clone(),
    }
}
