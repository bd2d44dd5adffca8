use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::auth::jwt::create_token;
use crate::domain::drone::DroneId;
use crate::domain::ledger::{
    CallResult, LedgerError, LedgerGateway, LedgerResult, Query, Receipt, Transaction,
};

/// Error body returned by a ledger node
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Gateway to a remote ledger node
///
/// Transactions go to `POST {base}/api/ledgers/{address}/transactions`,
/// queries to `POST {base}/api/ledgers/{address}/calls`. Every request that
/// acts on behalf of a drone carries a short-lived bearer token naming it.
pub struct HttpLedgerGateway {
    base_url: String,
    address: String,
    jwt_secret: String,
    client: Client,
}

impl HttpLedgerGateway {
    /// Creates a gateway bound to one deployed contract
    ///
    /// # Arguments
    /// * `base_url` - Ledger node endpoint (e.g. `http://127.0.0.1:8545`)
    /// * `address` - Contract address on that node
    /// * `jwt_secret` - Secret shared with the node for signing caller tokens
    /// * `timeout` - Upper bound on each request, including confirmation
    pub fn new(
        base_url: impl Into<String>,
        address: impl Into<String>,
        jwt_secret: impl Into<String>,
        timeout: Duration,
    ) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            address: address.into(),
            jwt_secret: jwt_secret.into(),
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/ledgers/{}/{}", self.base_url, self.address, endpoint)
    }

    fn authorize(&self, req: RequestBuilder, caller: DroneId) -> LedgerResult<RequestBuilder> {
        let token = create_token(caller, &self.jwt_secret)
            .map_err(|e| LedgerError::Network(format!("Failed to sign request: {}", e)))?;
        Ok(req.header("Authorization", format!("Bearer {}", token)))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        function: &str,
    ) -> LedgerResult<T> {
        let response = req.send().await.map_err(transport_error)?;
        let response = check_status(response, function).await?;

        response
            .json()
            .await
            .map_err(|e| LedgerError::MalformedResponse(format!("{}: {}", function, e)))
    }
}

fn transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout(e.to_string())
    } else {
        LedgerError::Network(e.to_string())
    }
}

/// Maps a non-success status to the matching gateway error
async fn check_status(response: Response, function: &str) -> LedgerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };

    Err(match status {
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => LedgerError::Timeout(reason),
        s if s.is_client_error() => LedgerError::rejected(function, reason),
        _ => LedgerError::Network(format!("{}: {}", status, reason)),
    })
}

#[async_trait]
impl LedgerGateway for HttpLedgerGateway {
    async fn submit_transaction(&self, caller: DroneId, tx: Transaction) -> LedgerResult<Receipt> {
        let function = tx.function_name();
        tracing::debug!("{} submitting {} to {}", caller, function, self.address);

        let req = self.client.post(self.url("transactions")).json(&tx);
        let req = self.authorize(req, caller)?;
        self.send(req, function).await
    }

    async fn call(&self, query: Query, caller: Option<DroneId>) -> LedgerResult<CallResult> {
        let function = query.function_name();
        let mut req = self.client.post(self.url("calls")).json(&query);

        if let Some(caller) = caller {
            req = self.authorize(req, caller)?;
        }

        self.send(req, function).await
    }
}
