use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Credential store error: {0}")]
    Store(#[from] crate::credentials::StoreError),
}
