use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Broker, BrokerError};
use crate::types::{format_usd, AccountState, OrderAck, OrderRequest};

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

/// Alpaca REST brokerage. Live versus paper trading is a base-url choice
/// (`APCA_API_BASE_URL`), not a code path.
pub struct AlpacaBroker {
    name: String,
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

/// Alpaca serializes money fields as JSON strings.
#[derive(Debug, Deserialize)]
struct AccountPayload {
    equity: String,
    buying_power: String,
}

#[derive(Debug, Deserialize)]
struct OrderPayload {
    id: String,
    status: String,
    #[serde(default)]
    qty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    message: String,
}

#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    symbol: &'a str,
    side: &'a str,
    #[serde(rename = "type")]
    order_type: &'a str,
    time_in_force: &'a str,
    notional: String,
    extended_hours: bool,
    client_order_id: &'a str,
}

impl AlpacaBroker {
    pub fn new(
        name: String,
        http: Client,
        base_url: String,
        api_key: String,
        api_secret: String,
    ) -> Self {
        Self {
            name,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header(KEY_HEADER, &self.api_key)
            .header(SECRET_HEADER, &self.api_secret)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header(KEY_HEADER, &self.api_key)
            .header(SECRET_HEADER, &self.api_secret)
    }

    /// Map a non-success response onto the error taxonomy: 401 is an auth
    /// failure, any other 4xx is a brokerage-reported rejection, 5xx is an
    /// API outage.
    async fn check(response: Response) -> Result<Response, BrokerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorPayload>(&body)
            .map(|payload| payload.message)
            .unwrap_or(body);
        if status == StatusCode::UNAUTHORIZED {
            Err(BrokerError::Auth(message))
        } else if status.is_client_error() {
            Err(BrokerError::Rejected(message))
        } else {
            Err(BrokerError::Api(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl Broker for AlpacaBroker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn account_state(&self) -> Result<AccountState, BrokerError> {
        let response = self
            .get("/v2/account")
            .send()
            .await
            .map_err(transport)?;
        let payload: AccountPayload = Self::check(response)
            .await?
            .json()
            .await
            .map_err(transport)?;
        Ok(AccountState {
            equity: parse_money("equity", &payload.equity)?,
            buying_power: parse_money("buying_power", &payload.buying_power)?,
        })
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        let body = OrderBody {
            symbol: &order.symbol,
            side: "buy",
            order_type: "market",
            time_in_force: "day",
            notional: format_usd(order.notional),
            extended_hours: order.extended_hours,
            client_order_id: &order.client_order_id,
        };
        debug!(
            "Submitting market buy {} for ${} (client order id {})",
            order.symbol, body.notional, order.client_order_id
        );
        let response = self
            .post("/v2/orders")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let payload: OrderPayload = Self::check(response)
            .await?
            .json()
            .await
            .map_err(transport)?;
        let qty = payload
            .qty
            .as_deref()
            .and_then(|raw| Decimal::from_str(raw).ok());
        Ok(OrderAck {
            order_id: payload.id,
            status: payload.status,
            qty,
        })
    }
}

fn transport(err: reqwest::Error) -> BrokerError {
    BrokerError::Transport(err.to_string())
}

fn parse_money(field: &str, raw: &str) -> Result<Decimal, BrokerError> {
    Decimal::from_str(raw)
        .map_err(|_| BrokerError::Transport(format!("unparseable {field} in account payload: `{raw}`")))
}
