use thiserror::Error;

pub mod customers;
pub mod sales;

pub use customers::SqlCustomerDirectory;
pub use sales::SqlSaleLedger;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}
