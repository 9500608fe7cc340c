use std::time::Duration;

use a24_core::AppConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{Api24Category, Api24Product};

const MERCHANT_HEADER: &str = "x-merchant-id";

/// Connection and retry settings for [`Api24Client`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub token: String,
    pub merchant_id: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extra attempts after the first failure; `0` disables retries.
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
            merchant_id: config.merchant_id.clone(),
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        }
    }
}

/// HTTP client for the API24 merchant API.
///
/// Every request carries the bearer token and merchant id. Non-2xx responses
/// map to typed [`ClientError`] variants; transient ones are retried per
/// [`ClientSettings::max_retries`].
pub struct Api24Client {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl Api24Client {
    /// Builds a client from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the base URL does not parse,
    /// [`ClientError::InvalidHeader`] if a credential is not a valid header
    /// value, and [`ClientError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&settings.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = header_value("Authorization", &format!("Bearer {}", settings.token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            MERCHANT_HEADER,
            header_value(MERCHANT_HEADER, &settings.merchant_id)?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the flat category list from `/basedata/categories`.
    ///
    /// # Errors
    ///
    /// Any transport, status, or body error after retries are exhausted.
    pub async fn fetch_categories(&self) -> Result<Vec<Api24Category>, ClientError> {
        let url = self.endpoint("basedata/categories")?;
        let categories: Option<Vec<Api24Category>> = self.get_json(url, "categories").await?;
        Ok(categories.unwrap_or_default())
    }

    /// Fetches one page of `/products`. Pages are 1-based; an empty vector
    /// (from `[]` or a `null` body) marks the end of the catalog.
    ///
    /// # Errors
    ///
    /// Any transport, status, or body error after retries are exhausted.
    pub async fn fetch_products_page(&self, page: u32) -> Result<Vec<Api24Product>, ClientError> {
        let mut url = self.endpoint("products")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        let products: Option<Vec<Api24Product>> =
            self.get_json(url, &format!("products page {page}")).await?;
        Ok(products.unwrap_or_default())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ClientError::RateLimited { retry_after_secs });
                }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(ClientError::Unauthorized {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                if status == StatusCode::NOT_FOUND {
                    return Err(ClientError::NotFound {
                        url: url.to_string(),
                    });
                }
                if !status.is_success() {
                    return Err(ClientError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|source| ClientError::Deserialize {
                    context: context.to_owned(),
                    source,
                })
            }
        })
        .await
    }
}

/// Parses the configured base URL, forcing a trailing slash so that
/// endpoint paths join below it instead of replacing its last segment.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ClientError::InvalidBaseUrl {
        base_url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            base_url: raw.to_owned(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url)
}

fn header_value(name: &'static str, raw: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(raw).map_err(|_| ClientError::InvalidHeader { name })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
