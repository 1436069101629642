use async_trait::async_trait;
use ubisoft::{
    Cancellation, CurrencyId, HttpClient, ItemReference, MarketSnapshot, OrderPlacement, Result,
    TradeId,
};

/// Remote operations the negotiator drives.
///
/// `cancel_order` doubles as the acceptance probe: a live order that can be
/// withdrawn was not taken by any seller at that price.
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn resolve(&self, catalog_url: &str) -> Result<ItemReference>;

    async fn market_snapshot(&self, item: &ItemReference) -> Result<MarketSnapshot>;

    async fn balance(&self, item: &ItemReference, currency: &CurrencyId) -> Result<u64>;

    async fn create_order(
        &self,
        item: &ItemReference,
        currency: &CurrencyId,
        price: u64,
    ) -> Result<OrderPlacement>;

    async fn cancel_order(&self, item: &ItemReference, trade_id: &TradeId) -> Result<Cancellation>;
}

#[async_trait]
impl Marketplace for HttpClient {
    async fn resolve(&self, catalog_url: &str) -> Result<ItemReference> {
        HttpClient::resolve(self, catalog_url).await
    }

    async fn market_snapshot(&self, item: &ItemReference) -> Result<MarketSnapshot> {
        self.fetch_market_snapshot(item).await
    }

    async fn balance(&self, item: &ItemReference, currency: &CurrencyId) -> Result<u64> {
        self.fetch_balance(item, currency).await
    }

    async fn create_order(
        &self,
        item: &ItemReference,
        currency: &CurrencyId,
        price: u64,
    ) -> Result<OrderPlacement> {
        self.create_buy_order(item, currency, price).await
    }

    async fn cancel_order(&self, item: &ItemReference, trade_id: &TradeId) -> Result<Cancellation> {
        HttpClient::cancel_order(self, item, trade_id).await
    }
}
