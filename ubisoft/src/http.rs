use crate::config::Config;
use crate::operation::Operation;
use crate::schema::{
    is_auth_failure, is_invalid_ticket, BalanceData, CancelOrderData, CreateBuyOrderData, GraphQlResponse,
    ItemDetailsData,
};
use crate::types::{
    Cancellation, CurrencyId, ItemReference, MarketSnapshot, OrderPlacement, TradeId,
};
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

#[derive(Clone)]
pub struct HttpClient {
    pub(crate) client: reqwest::Client,
    headers: HeaderMap,
    graphql_url: String,
    interval: std::time::Duration,
    /// Earliest instant the next request may leave
    request_ok: Arc<Mutex<Instant>>,
}

impl HttpClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            headers: config.headers()?,
            graphql_url: config.graphql_url,
            interval: config.request_interval,
            request_ok: Arc::new(Mutex::new(Instant::now())),
        })
    }

    /// Sends `builder` once the request interval has elapsed and returns the body.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<String> {
        {
            let mut request_ok = self.request_ok.lock().await;
            sleep_until(*request_ok).await;
            *request_ok = Instant::now() + self.interval;
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || (!status.is_success() && is_auth_failure(&text)) {
            return Err(Error::AuthExpired);
        }
        if !status.is_success() {
            return Err(Error::Response(status, text));
        }

        Ok(text)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: Operation,
        variables: Value,
    ) -> Result<GraphQlResponse<T>> {
        let body = json!([{
            "operationName": operation.to_string(),
            "variables": variables,
            "query": operation.query(),
        }]);

        log::debug!("Sending {operation}");
        let builder = self
            .client
            .post(&self.graphql_url)
            .headers(self.headers.clone())
            .json(&body);
        let text = self.send(builder).await?;

        // The gateway answers a batch with one entry per operation.
        let mut batch: Vec<Value> =
            serde_json::from_str(&text).map_err(|_| Error::Deserialize(text.clone()))?;
        if batch.is_empty() {
            return Err(Error::MissingData("response"));
        }
        let entry = batch.swap_remove(0);

        if let Some(errors) = entry.get("errors") {
            let payload = errors.to_string();
            let expired = if operation.reports_session_expiry() {
                is_auth_failure(&payload)
            } else {
                is_invalid_ticket(&payload)
            };
            if expired {
                return Err(Error::AuthExpired);
            }
        }

        serde_json::from_value(entry).map_err(|e| Error::Deserialize(format!("{operation}: {e}")))
    }

    pub async fn fetch_market_snapshot(&self, item: &ItemReference) -> Result<MarketSnapshot> {
        let data = self
            .post::<ItemDetailsData>(
                Operation::GetItemDetails,
                json!({
                    "spaceId": item.space_id.as_str(),
                    "itemId": item.item_id.as_str(),
                }),
            )
            .await?
            .into_data()?;

        MarketSnapshot::from_details(&item.item_id, data)
    }

    /// Quantity of `currency` the account holds in the item's game space.
    pub async fn fetch_balance(&self, item: &ItemReference, currency: &CurrencyId) -> Result<u64> {
        let data = self
            .post::<BalanceData>(
                Operation::GetBalance,
                json!({
                    "spaceId": item.space_id.as_str(),
                    "itemId": currency.as_str(),
                }),
            )
            .await?
            .into_data()?;

        Ok(data
            .game
            .viewer
            .meta
            .secondary_store_item
            .map(|item| item.meta.quantity)
            .unwrap_or_default())
    }

    pub async fn create_buy_order(
        &self,
        item: &ItemReference,
        currency: &CurrencyId,
        price: u64,
    ) -> Result<OrderPlacement> {
        self.post::<CreateBuyOrderData>(
            Operation::CreateBuyOrder,
            json!({
                "spaceId": item.space_id.as_str(),
                "tradeItems": [{"itemId": item.item_id.as_str(), "quantity": 1}],
                "paymentProposal": {
                    "paymentItemId": currency.as_str(),
                    "price": price,
                },
            }),
        )
        .await?
        .into_placement()
    }

    pub async fn cancel_order(&self, item: &ItemReference, trade_id: &TradeId) -> Result<Cancellation> {
        self.post::<CancelOrderData>(
            Operation::CancelOrder,
            json!({
                "spaceId": item.space_id.as_str(),
                "tradeId": trade_id.as_str(),
            }),
        )
        .await?
        .into_cancellation()
    }
}
