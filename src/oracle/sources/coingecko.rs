//! CoinGecko simple-price REST client
//!
//! One GET per refresh: `/simple/price?ids=bitcoin,...&vs_currencies=usd`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{PriceError, PriceFetcher};
use crate::types::Asset;

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone, Deserialize)]
struct CoinPrice {
    usd: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PriceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn ids_param(assets: &[Asset]) -> String {
        assets
            .iter()
            .map(|a| a.coingecko_id())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Map a decoded response back onto assets, dropping absent or
    /// non-positive quotes
    fn parse_prices(body: &str, assets: &[Asset]) -> Result<HashMap<Asset, f64>, PriceError> {
        let raw: HashMap<String, CoinPrice> = serde_json::from_str(body)?;

        Ok(assets
            .iter()
            .filter_map(|&asset| {
                let usd = raw.get(asset.coingecko_id())?.usd?;
                (usd.is_finite() && usd > 0.0).then_some((asset, usd))
            })
            .collect())
    }
}

#[async_trait]
impl PriceFetcher for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch(&self, assets: &[Asset]) -> Result<HashMap<Asset, f64>, PriceError> {
        let url = format!("{}/simple/price", self.base_url);
        let ids = Self::ids_param(assets);

        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let prices = Self::parse_prices(&body, assets)?;

        tracing::debug!(source = "CoinGecko", quoted = prices.len(), "Fetched live prices");
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn ids_follow_asset_order() {
        assert_eq!(
            CoinGeckoClient::ids_param(&Asset::ALL),
            "bitcoin,ethereum,solana,binancecoin,cardano"
        );
    }

    #[test]
    fn parse_keeps_only_valid_quotes() {
        let body = r#"{
            "bitcoin": {"usd": 68123.0},
            "ethereum": {"usd": 0},
            "solana": {},
            "cardano": {"usd": 0.51}
        }"#;

        let prices = CoinGeckoClient::parse_prices(body, &Asset::ALL).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[&Asset::BTC], 68123.0);
        assert_eq!(prices[&Asset::ADA], 0.51);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = CoinGeckoClient::parse_prices("<html>rate limited</html>", &Asset::ALL);
        assert!(matches!(err, Err(PriceError::Decode(_))));
    }

    // ========================================================================
    // Against a local HTTP server
    // ========================================================================

    const ALL_IDS: &str = "bitcoin,ethereum,solana,binancecoin,cardano";

    async fn partial_quotes(
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        let ids_ok = params.get("ids").map(String::as_str) == Some(ALL_IDS);
        let vs_ok = params.get("vs_currencies").map(String::as_str) == Some("usd");
        if !(ids_ok && vs_ok) {
            return Err(StatusCode::BAD_REQUEST);
        }
        Ok(Json(json!({
            "bitcoin": {"usd": 70100.5},
            "ethereum": {"usd": -1.0},
            "solana": {"usd": 151.25}
        })))
    }

    /// Serve a fake price API on an ephemeral port and return its base URL
    async fn spawn_price_api() -> String {
        let app = Router::new()
            .route("/ok/simple/price", get(partial_quotes))
            .route(
                "/down/simple/price",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .route(
                "/slow/simple/price",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Json(json!({"bitcoin": {"usd": 1.0}}))
                }),
            )
            .route("/html/simple/price", get(|| async { "<html>rate limited</html>" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> CoinGeckoClient {
        CoinGeckoClient::new(base_url, Duration::from_millis(100)).unwrap()
    }

    #[tokio::test]
    async fn fetch_sends_ids_and_keeps_partial_quotes() {
        let base = spawn_price_api().await;
        let prices = client(&format!("{}/ok/", base))
            .fetch(&Asset::ALL)
            .await
            .unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[&Asset::BTC], 70100.5);
        assert_eq!(prices[&Asset::SOL], 151.25);
        assert!(!prices.contains_key(&Asset::ETH));
    }

    #[tokio::test]
    async fn fetch_reports_error_status() {
        let base = spawn_price_api().await;
        let err = client(&format!("{}/down", base))
            .fetch(&Asset::ALL)
            .await
            .unwrap_err();
        assert!(matches!(err, PriceError::Status(503)), "{err:?}");
    }

    #[tokio::test]
    async fn fetch_times_out_on_slow_upstream() {
        let base = spawn_price_api().await;
        let err = client(&format!("{}/slow", base))
            .fetch(&Asset::ALL)
            .await
            .unwrap_err();
        match err {
            PriceError::Http(e) => assert!(e.is_timeout(), "{e}"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_rejects_non_json_body() {
        let base = spawn_price_api().await;
        let err = client(&format!("{}/html", base))
            .fetch(&Asset::ALL)
            .await
            .unwrap_err();
        assert!(matches!(err, PriceError::Decode(_)), "{err:?}");
    }
}
