use async_trait::async_trait;
use thiserror::Error;

use crate::dialog::states::SaleDraft;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderReference {
    pub order_id: String,
}

impl OrderReference {
    /// Short reference quoted back to the seller, e.g. `a1b2c3d4` for a
    /// freshly minted UUID. Ids shorter than eight characters pass through.
    pub fn short(&self) -> &str {
        self.order_id.get(..8).unwrap_or(&self.order_id)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("customer lookup failed: {0}")]
    Storage(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("sale draft is missing {0}")]
    IncompleteDraft(&'static str),
    #[error("sale commit failed: {0}")]
    Storage(String),
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<CustomerRef>, LookupError>;
}

#[async_trait]
pub trait SaleLedger: Send + Sync {
    async fn commit(&self, draft: &SaleDraft) -> Result<OrderReference, CommitError>;
}
