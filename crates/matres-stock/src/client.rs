//! Shared HTTP client for stock provider APIs.

use reqwest::{Client, Response};

use matres_models::BROWSER_USER_AGENT;

use crate::config::StockConfig;
use crate::error::{StockError, StockResult};

/// Build the HTTP client used by all stock providers.
pub fn build_http_client(config: &StockConfig) -> StockResult<Client> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .user_agent(BROWSER_USER_AGENT);

    if let Some(proxy) = config.proxy.as_deref() {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| StockError::InvalidConfig(format!("invalid proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(StockError::Network)
}

/// Turn a response into its body text, mapping non-success statuses to errors.
pub(crate) async fn read_body(response: Response) -> StockResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(StockError::from_http_status(status.as_u16(), body));
    }
    Ok(body)
}
