use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by API24 (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("API24 rejected credentials ({status}) for {url}")]
    Unauthorized { status: u16, url: String },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("value for header {name} contains characters not allowed in HTTP headers")]
    InvalidHeader { name: &'static str },

    #[error("invalid API24 base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Why an upstream product record was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("originalPrice is missing or not a number")]
    MissingPrice,

    #[error("originalPrice {0} is not positive")]
    NonPositivePrice(String),

    #[error("name is missing or empty")]
    MissingName,

    #[error("barcode is missing or empty")]
    MissingBarcode,

    #[error("required field {0} is missing or empty")]
    MissingField(&'static str),
}
