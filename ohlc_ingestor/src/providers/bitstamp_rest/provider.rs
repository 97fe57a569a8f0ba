use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, Url};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{bar::Bar, request_params::OhlcRequest},
    providers::{
        ApiSnafu, ClientBuildSnafu, InvalidBaseUrlSnafu, InvalidRateLimitSnafu, OhlcSource,
        ProviderError, ProviderInitError, ReqwestSnafu,
        bitstamp_rest::{
            params::{construct_params, validate_request},
            response::BitstampResponse,
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://www.bitstamp.net/api/v2/ohlc";

/// Connection settings for [`BitstampProvider`].
#[derive(Debug, Clone)]
pub struct BitstampConfig {
    /// Endpoint root; the pair and a trailing slash are appended per call.
    pub base_url: String,
    /// Per-call timeout. There is no retry.
    pub timeout: Duration,
    /// Client-side pacing.
    pub requests_per_second: u32,
}

impl Default for BitstampConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            requests_per_second: 4,
        }
    }
}

pub struct BitstampProvider {
    client: Client,
    base_url: Url,
    limiter: DefaultDirectRateLimiter,
}

impl BitstampProvider {
    /// Creates a new Bitstamp provider. The OHLC endpoint is public, so no
    /// credentials are read.
    pub fn new(config: BitstampConfig) -> Result<Self, ProviderInitError> {
        let trimmed = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(&format!("{trimmed}/")).map_err(|e| {
            InvalidBaseUrlSnafu {
                url: config.base_url.clone(),
                message: e.to_string(),
            }
            .build()
        })?;

        let rps = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            InvalidRateLimitSnafu {
                message: "requests_per_second must be > 0",
            }
            .build()
        })?;
        let quota = Quota::per_second(rps).allow_burst(nonzero!(1u32));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ohlc_ingestor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::direct(quota),
        })
    }

    /// `{base}/{pair}/`
    pub fn ohlc_url(&self, pair: &str) -> Result<Url, ProviderError> {
        self.base_url.join(&format!("{pair}/")).map_err(|e| {
            ApiSnafu {
                message: format!("cannot build URL for pair {pair:?}: {e}"),
            }
            .build()
        })
    }
}

#[async_trait]
impl OhlcSource for BitstampProvider {
    async fn fetch_bars(&self, request: &OhlcRequest) -> Result<Vec<Bar>, ProviderError> {
        validate_request(request)?;
        let url = self.ohlc_url(&request.pair)?;

        self.limiter.until_ready().await;
        debug!(%url, start = request.start, end = request.end, limit = request.limit, "GET ohlc");

        let response = self
            .client
            .get(url)
            .query(&construct_params(request))
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;
        if !status.is_success() {
            return ApiSnafu {
                message: format!("HTTP {status}: {}", body.trim()),
            }
            .fail();
        }

        BitstampResponse::parse(&body)?.into_bars()
    }
}
