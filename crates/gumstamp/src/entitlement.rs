//! Entitlement checks for gated operations.
//!
//! When a product id is configured, uploads and token issuance require a
//! license key that an [`EntitlementCheck`] accepts for that product.

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a completed entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementDecision {
    Grant,
    Deny,
}

/// The check could not reach a decision.
#[derive(Debug, Error)]
#[error("entitlement check unavailable: {0}")]
pub struct EntitlementError(String);

impl EntitlementError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Decides whether a credential entitles its holder to a product.
#[async_trait]
pub trait EntitlementCheck: Send + Sync {
    async fn check(
        &self,
        credential: &str,
        product: &str,
    ) -> Result<EntitlementDecision, EntitlementError>;
}

/// Grants every credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl EntitlementCheck for AllowAll {
    async fn check(&self, _: &str, _: &str) -> Result<EntitlementDecision, EntitlementError> {
        Ok(EntitlementDecision::Grant)
    }
}

/// Denies every credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl EntitlementCheck for DenyAll {
    async fn check(&self, _: &str, _: &str) -> Result<EntitlementDecision, EntitlementError> {
        Ok(EntitlementDecision::Deny)
    }
}

#[async_trait]
impl<F> EntitlementCheck for F
where
    F: Fn(&str, &str) -> EntitlementDecision + Send + Sync,
{
    async fn check(
        &self,
        credential: &str,
        product: &str,
    ) -> Result<EntitlementDecision, EntitlementError> {
        Ok(self(credential, product))
    }
}
