//! HTTP reachability check for product images.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::ports::ImageProbe;

/// Probes with `HEAD`, retrying as `GET` when the host answers 405.
/// Any 2xx counts as reachable; errors and other statuses do not.
pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        let status = match self.client.head(url).send().await {
            Ok(resp) if resp.status() == StatusCode::METHOD_NOT_ALLOWED => {
                match self.client.get(url).send().await {
                    Ok(resp) => resp.status(),
                    Err(e) => {
                        tracing::debug!(url, error = %e, "image GET failed");
                        return false;
                    }
                }
            }
            Ok(resp) => resp.status(),
            Err(e) => {
                tracing::debug!(url, error = %e, "image HEAD failed");
                return false;
            }
        };

        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "image not reachable");
        }
        status.is_success()
    }
}
