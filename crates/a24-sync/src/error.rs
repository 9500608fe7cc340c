use a24_client::ClientError;
use a24_db::DbError;
use thiserror::Error;

/// Errors that abort a phase. Per-record problems are counted in the phase
/// report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to fetch categories from API24: {0}")]
    CategoryFetch(#[source] ClientError),

    #[error("storage error: {0}")]
    Db(#[from] DbError),
}
