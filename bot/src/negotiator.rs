use crate::market::Marketplace;
use log::{debug, info};
use std::fmt;
use ubisoft::{Cancellation, Error, ItemReference, MarketSnapshot, OrderPlacement, Result, TradeId};

/// Lowest price the marketplace accepts for a buy order.
pub const MIN_BID: u64 = 120;

#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    /// Buyer cap on every bid, never below [`MIN_BID`].
    pub max_price: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Resolving,
    CheckingOwnership,
    CheckingBalance,
    Bidding,
    Cancelling,
}

fn enter(phase: Phase) {
    debug!("Entering {phase:?}");
}

/// The current bid and the order placed for it, if it is still live.
#[derive(Debug)]
struct BidState {
    price: u64,
    active_trade: Option<TradeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Purchased {
        price: u64,
    },
    AlreadyOwned,
    InsufficientFunds {
        balance: u64,
        required: u64,
    },
    PriceCeilingReached {
        price: u64,
    },
    OrderRejected {
        price: u64,
        reason: String,
    },
    CancelFailed {
        price: u64,
        trade_id: TradeId,
        reason: String,
    },
    AuthExpired,
    ResolutionFailed {
        reason: String,
    },
}

impl NegotiationOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            NegotiationOutcome::Purchased { .. } | NegotiationOutcome::AlreadyOwned => 0,
            NegotiationOutcome::PriceCeilingReached { .. } => 2,
            NegotiationOutcome::InsufficientFunds { .. } => 3,
            NegotiationOutcome::OrderRejected { .. } => 4,
            NegotiationOutcome::CancelFailed { .. } => 5,
            NegotiationOutcome::AuthExpired => 6,
            NegotiationOutcome::ResolutionFailed { .. } => 7,
        }
    }

    /// Outcomes the operator has to act on before running again.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            NegotiationOutcome::CancelFailed { .. }
                | NegotiationOutcome::AuthExpired
                | NegotiationOutcome::ResolutionFailed { .. }
        )
    }
}

impl fmt::Display for NegotiationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationOutcome::Purchased { price } => {
                write!(f, "Successfully purchased item for {price} credits")
            }
            NegotiationOutcome::AlreadyOwned => write!(f, "You already own this item"),
            NegotiationOutcome::InsufficientFunds { balance, required } => write!(
                f,
                "Insufficient funds: {balance} credits available, lowest sell price is {required}"
            ),
            NegotiationOutcome::PriceCeilingReached { price } => {
                write!(f, "Price ceiling reached ({price} credits). Stopping")
            }
            NegotiationOutcome::OrderRejected { price, reason } => {
                write!(f, "Buy order for {price} credits was rejected: {reason}")
            }
            NegotiationOutcome::CancelFailed {
                price,
                trade_id,
                reason,
            } => write!(
                f,
                "Failed to cancel order {trade_id} placed at {price} credits ({reason}). \
                 Check the trade in the marketplace before running again"
            ),
            NegotiationOutcome::AuthExpired => write!(
                f,
                "Authorization is expired. Please replace your tokens in the .env file"
            ),
            NegotiationOutcome::ResolutionFailed { reason } => {
                write!(f, "Failed to retrieve item and space IDs: {reason}")
            }
        }
    }
}

/// First bid of a run: half the lowest listing, capped by the buyer's
/// maximum and never below [`MIN_BID`].
pub fn opening_bid(lowest_sell_price: u64, max_price: Option<u64>) -> u64 {
    let half = lowest_sell_price / 2;
    max_price
        .map_or(half, |max| half.min(max))
        .max(MIN_BID)
}

/// Bids on a single item, one order at a time, raising the price by one
/// credit per round until a seller accepts or the ceiling is hit.
pub struct Negotiator<M> {
    market: M,
    settings: Settings,
}

impl<M: Marketplace> Negotiator<M> {
    pub fn new(market: M, settings: Settings) -> Self {
        Self { market, settings }
    }

    pub async fn run(&self, catalog_url: &str) -> Result<NegotiationOutcome> {
        enter(Phase::Resolving);
        let item = match self.market.resolve(catalog_url).await {
            Ok(item) => item,
            Err(e) => return settle(e),
        };
        let snapshot = match self.market.market_snapshot(&item).await {
            Ok(snapshot) => snapshot,
            Err(e) => return settle(e),
        };
        info!("{snapshot}");

        enter(Phase::CheckingOwnership);
        if snapshot.is_owned {
            return Ok(NegotiationOutcome::AlreadyOwned);
        }

        enter(Phase::CheckingBalance);
        let balance = match self.market.balance(&item, &snapshot.currency_id).await {
            Ok(balance) => balance,
            Err(e) => return settle(e),
        };
        info!("Balance: {balance} credits");

        if balance < snapshot.lowest_sell_price {
            return Ok(NegotiationOutcome::InsufficientFunds {
                balance,
                required: snapshot.lowest_sell_price,
            });
        }

        self.negotiate(&item, &snapshot).await
    }

    fn ceiling(&self, lowest_sell_price: u64) -> u64 {
        self.settings
            .max_price
            .map_or(lowest_sell_price, |max| lowest_sell_price.min(max))
    }

    async fn negotiate(
        &self,
        item: &ItemReference,
        snapshot: &MarketSnapshot,
    ) -> Result<NegotiationOutcome> {
        let ceiling = self.ceiling(snapshot.lowest_sell_price);
        let mut bid = BidState {
            price: opening_bid(snapshot.lowest_sell_price, self.settings.max_price),
            active_trade: None,
        };
        info!("Opening bid {} credits, ceiling {ceiling}", bid.price);

        loop {
            enter(Phase::Bidding);
            info!("Trying to buy item for {} credits", bid.price);

            match self
                .market
                .create_order(item, &snapshot.currency_id, bid.price)
                .await
            {
                Ok(OrderPlacement::Created(trade_id)) => bid.active_trade = Some(trade_id),
                Ok(OrderPlacement::Filled(_)) => {
                    return Ok(NegotiationOutcome::Purchased { price: bid.price })
                }
                Ok(OrderPlacement::Rejected { reason }) => {
                    return Ok(NegotiationOutcome::OrderRejected {
                        price: bid.price,
                        reason,
                    })
                }
                // Nothing is live yet, so an expired session is safe to report as such.
                Err(Error::AuthExpired) => return Ok(NegotiationOutcome::AuthExpired),
                Err(e) => return Err(e),
            }

            enter(Phase::Cancelling);
            if let Some(outcome) = self.withdraw(item, &mut bid).await {
                return Ok(outcome);
            }

            if bid.price >= ceiling {
                return Ok(NegotiationOutcome::PriceCeilingReached { price: bid.price });
            }
            bid.price += 1;
        }
    }

    /// Cancels the live order. `None` means it was withdrawn and bidding may go on.
    async fn withdraw(
        &self,
        item: &ItemReference,
        bid: &mut BidState,
    ) -> Option<NegotiationOutcome> {
        let trade_id = bid.active_trade.clone()?;
        let price = bid.price;

        let reason = match self.market.cancel_order(item, &trade_id).await {
            Ok(Cancellation::Cancelled) => {
                bid.active_trade = None;
                return None;
            }
            Ok(Cancellation::Filled) => return Some(NegotiationOutcome::Purchased { price }),
            Ok(Cancellation::NotFound) => "trade not found".to_string(),
            Ok(Cancellation::Refused { code: Some(code), message }) => format!("{code}: {message}"),
            Ok(Cancellation::Refused { code: None, message }) => message,
            // Any failure leaves the order state unknown.
            Err(e) => e.to_string(),
        };

        Some(NegotiationOutcome::CancelFailed {
            price,
            trade_id,
            reason,
        })
    }
}

/// Maps a failure before bidding started to its outcome; transport errors pass through.
fn settle(error: Error) -> Result<NegotiationOutcome> {
    match error {
        Error::AuthExpired => Ok(NegotiationOutcome::AuthExpired),
        Error::Resolution(reason) => Ok(NegotiationOutcome::ResolutionFailed { reason }),
        e @ Error::NoLiquidity(_) => Ok(NegotiationOutcome::ResolutionFailed {
            reason: e.to_string(),
        }),
        e => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use ubisoft::{CurrencyId, ItemId, SpaceId};

    const URL: &str = "https://www.ubisoft.com/marketplace?itemId=item-1";

    #[derive(Default)]
    struct Calls {
        snapshots: usize,
        balances: usize,
        created: Vec<u64>,
        cancelled: Vec<TradeId>,
    }

    /// Scripted marketplace: every order is created and withdrawn unless told otherwise.
    #[derive(Default)]
    struct MockMarket {
        lowest: u64,
        balance: u64,
        owned: bool,
        unresolvable: bool,
        no_listings: bool,
        auth_expired: bool,
        balance_down: bool,
        fill_at: Option<u64>,
        reject_at: Option<u64>,
        filled_on_cancel_at: Option<u64>,
        not_found_at: Option<u64>,
        refused_at: Option<u64>,
        cancel_down_at: Option<u64>,
        create_auth_expired_at: Option<u64>,
        calls: Mutex<Calls>,
    }

    impl MockMarket {
        fn new(lowest: u64, balance: u64) -> Self {
            Self {
                lowest,
                balance,
                ..Default::default()
            }
        }

        fn created(&self) -> Vec<u64> {
            self.calls.lock().unwrap().created.clone()
        }

        fn order_calls(&self) -> usize {
            let calls = self.calls.lock().unwrap();
            calls.created.len() + calls.cancelled.len()
        }
    }

    #[async_trait]
    impl Marketplace for MockMarket {
        async fn resolve(&self, catalog_url: &str) -> Result<ItemReference> {
            if self.unresolvable {
                return Err(Error::Resolution(format!("{catalog_url} has no space id")));
            }
            Ok(ItemReference {
                item_id: ItemId::from("item-1".to_string()),
                space_id: SpaceId::from("space-1".to_string()),
            })
        }

        async fn market_snapshot(&self, item: &ItemReference) -> Result<MarketSnapshot> {
            self.calls.lock().unwrap().snapshots += 1;
            if self.auth_expired {
                return Err(Error::AuthExpired);
            }
            if self.no_listings {
                return Err(Error::NoLiquidity(item.item_id.clone()));
            }
            Ok(MarketSnapshot {
                name: "Glacier".into(),
                item_type: "WeaponSkin".into(),
                is_owned: self.owned,
                currency_id: CurrencyId::from("credits".to_string()),
                lowest_sell_price: self.lowest,
            })
        }

        async fn balance(&self, _item: &ItemReference, _currency: &CurrencyId) -> Result<u64> {
            self.calls.lock().unwrap().balances += 1;
            if self.balance_down {
                return Err(Error::MissingData("game"));
            }
            Ok(self.balance)
        }

        async fn create_order(
            &self,
            _item: &ItemReference,
            _currency: &CurrencyId,
            price: u64,
        ) -> Result<OrderPlacement> {
            let mut calls = self.calls.lock().unwrap();
            calls.created.push(price);
            let trade_id = TradeId::from(format!("trade-{price}"));

            if self.create_auth_expired_at == Some(price) {
                return Err(Error::AuthExpired);
            }
            Ok(if self.fill_at == Some(price) {
                OrderPlacement::Filled(trade_id)
            } else if self.reject_at == Some(price) {
                OrderPlacement::Rejected {
                    reason: "trade is Failed".into(),
                }
            } else {
                OrderPlacement::Created(trade_id)
            })
        }

        async fn cancel_order(
            &self,
            _item: &ItemReference,
            trade_id: &TradeId,
        ) -> Result<Cancellation> {
            let mut calls = self.calls.lock().unwrap();
            calls.cancelled.push(trade_id.clone());
            let price = calls.created.last().copied();

            if price.is_some() && price == self.cancel_down_at {
                return Err(Error::MissingData("cancelOrder"));
            }
            Ok(if price.is_some() && price == self.refused_at {
                Cancellation::Refused {
                    code: Some("1831".into()),
                    message: "Trade cannot be cancelled".into(),
                }
            } else if price.is_some() && price == self.not_found_at {
                Cancellation::NotFound
            } else if price.is_some() && price == self.filled_on_cancel_at {
                Cancellation::Filled
            } else {
                Cancellation::Cancelled
            })
        }
    }

    async fn run(market: &MockMarket) -> Result<NegotiationOutcome> {
        run_with(market, Settings::default()).await
    }

    async fn run_with(market: &MockMarket, settings: Settings) -> Result<NegotiationOutcome> {
        Negotiator::new(Shared(market), settings).run(URL).await
    }

    /// Lets the tests keep inspecting the mock after handing it to the negotiator.
    struct Shared<'a>(&'a MockMarket);

    #[async_trait]
    impl<'a> Marketplace for Shared<'a> {
        async fn resolve(&self, catalog_url: &str) -> Result<ItemReference> {
            self.0.resolve(catalog_url).await
        }

        async fn market_snapshot(&self, item: &ItemReference) -> Result<MarketSnapshot> {
            self.0.market_snapshot(item).await
        }

        async fn balance(&self, item: &ItemReference, currency: &CurrencyId) -> Result<u64> {
            self.0.balance(item, currency).await
        }

        async fn create_order(
            &self,
            item: &ItemReference,
            currency: &CurrencyId,
            price: u64,
        ) -> Result<OrderPlacement> {
            self.0.create_order(item, currency, price).await
        }

        async fn cancel_order(
            &self,
            item: &ItemReference,
            trade_id: &TradeId,
        ) -> Result<Cancellation> {
            self.0.cancel_order(item, trade_id).await
        }
    }

    #[test]
    fn test_opening_bid_halves_high_prices() {
        for lowest in [240, 241, 999, 1000, 1001, 50_000] {
            assert_eq!(opening_bid(lowest, None), lowest / 2);
        }
    }

    #[test]
    fn test_opening_bid_floor() {
        for lowest in [0, 1, 100, 200, 239] {
            assert_eq!(opening_bid(lowest, None), MIN_BID);
        }
    }

    #[test]
    fn test_opening_bid_respects_max_price() {
        assert_eq!(opening_bid(1000, Some(300)), 300);
        assert_eq!(opening_bid(1000, Some(800)), 500);
        assert_eq!(opening_bid(1000, Some(MIN_BID)), MIN_BID);
    }

    #[tokio::test]
    async fn test_escalates_to_lowest_price() {
        let market = MockMarket::new(1000, 2000);

        let outcome = run(&market).await.unwrap();

        assert_eq!(outcome, NegotiationOutcome::PriceCeilingReached { price: 1000 });
        let created = market.created();
        assert_eq!(created.first(), Some(&500));
        assert_eq!(created.last(), Some(&1000));
        assert_eq!(created.len(), 501);
        assert!(created.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(market.calls.lock().unwrap().cancelled.len(), 501);
    }

    #[tokio::test]
    async fn test_floor_above_lowest_price_stops_after_one_round() {
        let market = MockMarket::new(100, 500);

        let outcome = run(&market).await.unwrap();

        assert_eq!(outcome, NegotiationOutcome::PriceCeilingReached { price: 120 });
        assert_eq!(market.created(), vec![120]);
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let market = MockMarket::new(100, 50);

        let outcome = run(&market).await.unwrap();

        assert_eq!(
            outcome,
            NegotiationOutcome::InsufficientFunds {
                balance: 50,
                required: 100
            }
        );
        assert_eq!(market.order_calls(), 0);
    }

    #[tokio::test]
    async fn test_already_owned_skips_orders() {
        let market = MockMarket {
            owned: true,
            ..MockMarket::new(1000, 2000)
        };

        assert_eq!(run(&market).await.unwrap(), NegotiationOutcome::AlreadyOwned);
        assert_eq!(market.order_calls(), 0);
        assert_eq!(market.calls.lock().unwrap().balances, 0);
    }

    #[tokio::test]
    async fn test_auth_expired_stops_before_balance() {
        let market = MockMarket {
            auth_expired: true,
            ..MockMarket::new(1000, 2000)
        };

        assert_eq!(run(&market).await.unwrap(), NegotiationOutcome::AuthExpired);
        assert_eq!(market.calls.lock().unwrap().balances, 0);
        assert_eq!(market.order_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_not_found_halts_first_round() {
        let market = MockMarket {
            not_found_at: Some(500),
            ..MockMarket::new(1000, 2000)
        };

        let outcome = run(&market).await.unwrap();

        assert_eq!(
            outcome,
            NegotiationOutcome::CancelFailed {
                price: 500,
                trade_id: TradeId::from("trade-500".to_string()),
                reason: "trade not found".into(),
            }
        );
        assert_eq!(market.created(), vec![500]);
    }

    #[tokio::test]
    async fn test_cancel_refused_halts() {
        let market = MockMarket {
            refused_at: Some(500),
            ..MockMarket::new(1000, 2000)
        };

        let outcome = run(&market).await.unwrap();

        assert_eq!(
            outcome,
            NegotiationOutcome::CancelFailed {
                price: 500,
                trade_id: TradeId::from("trade-500".to_string()),
                reason: "1831: Trade cannot be cancelled".into(),
            }
        );
        assert_eq!(market.created(), vec![500]);
    }

    #[tokio::test]
    async fn test_cancel_error_halts() {
        let market = MockMarket {
            cancel_down_at: Some(500),
            ..MockMarket::new(1000, 2000)
        };

        let outcome = run(&market).await.unwrap();

        assert!(matches!(
            outcome,
            NegotiationOutcome::CancelFailed { price: 500, .. }
        ));
        assert_eq!(market.created(), vec![500]);
    }

    #[tokio::test]
    async fn test_auth_expired_while_bidding() {
        let market = MockMarket {
            create_auth_expired_at: Some(501),
            ..MockMarket::new(1000, 2000)
        };

        assert_eq!(run(&market).await.unwrap(), NegotiationOutcome::AuthExpired);
        assert_eq!(market.created(), vec![500, 501]);
        assert_eq!(market.calls.lock().unwrap().cancelled.len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_reference() {
        let market = MockMarket {
            unresolvable: true,
            ..MockMarket::new(1000, 2000)
        };

        let outcome = run(&market).await.unwrap();

        assert!(matches!(outcome, NegotiationOutcome::ResolutionFailed { .. }));
        assert_eq!(market.calls.lock().unwrap().snapshots, 0);
    }

    #[tokio::test]
    async fn test_no_listings_is_resolution_failure() {
        let market = MockMarket {
            no_listings: true,
            ..MockMarket::new(1000, 2000)
        };

        let outcome = run(&market).await.unwrap();

        assert!(matches!(outcome, NegotiationOutcome::ResolutionFailed { .. }));
        assert_eq!(market.calls.lock().unwrap().balances, 0);
    }

    #[tokio::test]
    async fn test_balance_failure_is_fatal() {
        let market = MockMarket {
            balance_down: true,
            ..MockMarket::new(1000, 2000)
        };

        assert!(matches!(run(&market).await, Err(Error::MissingData(_))));
        assert_eq!(market.order_calls(), 0);
    }

    #[tokio::test]
    async fn test_immediate_fill_is_purchase() {
        let market = MockMarket {
            fill_at: Some(503),
            ..MockMarket::new(1000, 2000)
        };

        assert_eq!(
            run(&market).await.unwrap(),
            NegotiationOutcome::Purchased { price: 503 }
        );
        assert_eq!(market.created(), vec![500, 501, 502, 503]);
        assert_eq!(market.calls.lock().unwrap().cancelled.len(), 3);
    }

    #[tokio::test]
    async fn test_filled_before_cancel_is_purchase() {
        let market = MockMarket {
            filled_on_cancel_at: Some(501),
            ..MockMarket::new(1000, 2000)
        };

        assert_eq!(
            run(&market).await.unwrap(),
            NegotiationOutcome::Purchased { price: 501 }
        );
        assert_eq!(market.created(), vec![500, 501]);
    }

    #[tokio::test]
    async fn test_rejected_order_ends_run() {
        let market = MockMarket {
            reject_at: Some(502),
            ..MockMarket::new(1000, 2000)
        };

        let outcome = run(&market).await.unwrap();

        assert!(matches!(
            outcome,
            NegotiationOutcome::OrderRejected { price: 502, .. }
        ));
        assert_eq!(market.created(), vec![500, 501, 502]);
        assert_eq!(market.calls.lock().unwrap().cancelled.len(), 2);
    }

    #[tokio::test]
    async fn test_max_price_caps_ceiling() {
        let market = MockMarket::new(1000, 2000);

        let outcome = run_with(
            &market,
            Settings {
                max_price: Some(510),
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome, NegotiationOutcome::PriceCeilingReached { price: 510 });
        assert_eq!(market.created().len(), 11);
    }

    #[tokio::test]
    async fn test_iterations_are_bounded() {
        for lowest in [0, 119, 120, 121, 239, 240, 241, 777] {
            let market = MockMarket::new(lowest, lowest);
            run(&market).await.unwrap();

            let opening = opening_bid(lowest, None);
            let bound = lowest.saturating_sub(opening) + 1;
            assert!(market.created().len() as u64 <= bound, "lowest {lowest}");
        }
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let outcomes = [
            NegotiationOutcome::PriceCeilingReached { price: 1 },
            NegotiationOutcome::InsufficientFunds {
                balance: 0,
                required: 1,
            },
            NegotiationOutcome::OrderRejected {
                price: 1,
                reason: String::new(),
            },
            NegotiationOutcome::CancelFailed {
                price: 1,
                trade_id: TradeId::from("t".to_string()),
                reason: String::new(),
            },
            NegotiationOutcome::AuthExpired,
            NegotiationOutcome::ResolutionFailed {
                reason: String::new(),
            },
        ];
        let mut codes: Vec<u8> = outcomes.iter().map(|o| o.exit_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), outcomes.len());
        assert!(!codes.contains(&0));
        assert!(!codes.contains(&1));
    }
}
