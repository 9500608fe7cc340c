pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

mod rate_limit;

pub use client::{Api24Client, ClientSettings};
pub use error::{ClientError, NormalizeError};
pub use normalize::normalize_product;
pub use types::{Api24Attribute, Api24Category, Api24GalleryImage, Api24Product};
