//! The Gumstamp facade: upload, issuance, sale notifications, downloads.
//!
//! This is what a request-serving layer calls. It owns the configuration,
//! the token codec, the registry and the materializer, and applies the
//! entitlement gate to creator-facing operations.

use std::sync::Arc;

use bytes::Bytes;

use gumstamp_core::{validate_claims, Claims, DocumentId, TokenCodec};
use gumstamp_stamp::{PdfStamper, Stamper};
use gumstamp_store::{FsRegistry, SourceRegistry, StampTemplate};

use crate::config::GumstampConfig;
use crate::entitlement::{DenyAll, EntitlementCheck, EntitlementDecision};
use crate::error::{GumstampError, Result};
use crate::materializer::{Artifact, Materializer};

/// Returned after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub document_id: DocumentId,
    /// Download URL with a literal `{token}` placeholder.
    pub download_template: String,
}

/// A freshly signed token and the link that redeems it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub download_url: String,
}

/// Sale ping from the commerce platform. Every field is optional on the
/// wire; product id and email are required to issue a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleNotification {
    pub sale_id: Option<String>,
    pub product_id: Option<String>,
    pub email: Option<String>,
}

/// The main Gumstamp service.
pub struct Gumstamp<R, S> {
    config: GumstampConfig,
    codec: TokenCodec,
    registry: Arc<R>,
    materializer: Materializer<R, S>,
    entitlement: Arc<dyn EntitlementCheck>,
}

impl Gumstamp<FsRegistry, PdfStamper> {
    /// Bootstrap the storage directories and open a filesystem-backed
    /// service with the lopdf stamper.
    pub async fn open(config: GumstampConfig) -> Result<Self> {
        let layout = config.layout();
        layout.ensure().await?;
        let registry = FsRegistry::new(layout);
        Ok(Self::new(config, registry, PdfStamper::new()))
    }
}

impl<R, S> Gumstamp<R, S>
where
    R: SourceRegistry,
    S: Stamper + 'static,
{
    /// Assemble a service from its parts.
    ///
    /// Gated operations deny every license key until an entitlement check
    /// is supplied with [`with_entitlement`](Self::with_entitlement).
    pub fn new(config: GumstampConfig, registry: R, stamper: S) -> Self {
        let codec = TokenCodec::new(&config.secret_key);
        let registry = Arc::new(registry);
        let materializer = Materializer::new(
            codec.clone(),
            config.token_max_age,
            Arc::clone(&registry),
            Arc::new(stamper),
            config.layout(),
        );

        Self {
            config,
            codec,
            registry,
            materializer,
            entitlement: Arc::new(DenyAll),
        }
    }

    /// Use `check` for the entitlement gate.
    pub fn with_entitlement(mut self, check: impl EntitlementCheck + 'static) -> Self {
        self.entitlement = Arc::new(check);
        self
    }

    pub fn config(&self) -> &GumstampConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn materializer(&self) -> &Materializer<R, S> {
        &self.materializer
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creator operations (gated)
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a source document, replacing any previous upload.
    pub async fn upload(
        &self,
        document_id: &str,
        source: Bytes,
        template: Option<StampTemplate>,
        license_key: Option<&str>,
    ) -> Result<UploadReceipt> {
        self.check_entitlement(license_key).await?;

        let document_id = DocumentId::parse(document_id)?;
        self.registry.store(&document_id, source, template).await?;

        tracing::info!(document_id = %document_id, "uploaded source");
        Ok(UploadReceipt {
            document_id,
            download_template: self.config.download_template(),
        })
    }

    /// Sign a token for `claims`.
    pub async fn issue_token(
        &self,
        claims: Claims,
        license_key: Option<&str>,
    ) -> Result<IssuedToken> {
        self.check_entitlement(license_key).await?;
        self.issue(claims)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Buyer operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a token for a completed sale. Not gated.
    pub fn record_sale(&self, sale: SaleNotification) -> Result<IssuedToken> {
        let product_id = present(sale.product_id)
            .ok_or_else(|| GumstampError::InvalidInput("sale has no product id".into()))?;
        let email = present(sale.email)
            .ok_or_else(|| GumstampError::InvalidInput("sale has no buyer email".into()))?;

        let mut claims = Claims::new(product_id, email);
        if let Some(sale_id) = sale.sale_id {
            claims = claims.with_sale_id(sale_id);
        }
        tracing::info!(
            document_id = %claims.document_id,
            sale_id = claims.sale_id().unwrap_or("-"),
            "sale recorded"
        );
        self.issue(claims)
    }

    /// Redeem a token for its stamped artifact.
    pub async fn materialize(&self, token: &str) -> Result<Artifact> {
        self.materializer.materialize(token).await
    }

    fn issue(&self, claims: Claims) -> Result<IssuedToken> {
        validate_claims(&claims)?;
        let token = self.codec.sign(&claims);
        Ok(IssuedToken {
            download_url: self.config.download_url(&token),
            token,
        })
    }

    async fn check_entitlement(&self, license_key: Option<&str>) -> Result<()> {
        let Some(product_id) = self.config.product_id.as_deref() else {
            return Ok(());
        };
        let license_key = license_key
            .filter(|key| !key.is_empty())
            .ok_or(GumstampError::LicenseRequired)?;

        match self.entitlement.check(license_key, product_id).await? {
            EntitlementDecision::Grant => Ok(()),
            EntitlementDecision::Deny => {
                tracing::debug!(product_id, "license denied");
                Err(GumstampError::LicenseDenied)
            }
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gumstamp_core::SecretKey;
    use gumstamp_store::MemoryRegistry;

    fn service(product_id: Option<&str>) -> Gumstamp<MemoryRegistry, PdfStamper> {
        let mut config = GumstampConfig::new(SecretKey::new(b"k".to_vec()).unwrap(), "/unused")
            .with_base_url("https://dl.example.com");
        if let Some(product_id) = product_id {
            config = config.with_product_id(product_id);
        }
        Gumstamp::new(config, MemoryRegistry::new(), PdfStamper::new())
    }

    #[tokio::test]
    async fn test_ungated_upload_and_issue() {
        let svc = service(None);

        let receipt = svc
            .upload("p_1", Bytes::from_static(b"%PDF-1.4"), None, None)
            .await
            .unwrap();
        assert_eq!(receipt.document_id.as_str(), "p_1");
        assert_eq!(
            receipt.download_template,
            "https://dl.example.com/download/{token}"
        );

        let issued = svc
            .issue_token(Claims::new("p_1", "a@b.com"), None)
            .await
            .unwrap();
        assert_eq!(
            issued.download_url,
            format!("https://dl.example.com/download/{}", issued.token)
        );
        let claims = svc
            .codec()
            .verify(&issued.token, svc.config().token_max_age)
            .unwrap();
        assert_eq!(claims, Claims::new("p_1", "a@b.com"));
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let svc = service(None);

        let err = svc
            .upload("../x", Bytes::from_static(b"%PDF-1.4"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::InvalidInput(_)));

        let err = svc
            .upload("p_1", Bytes::from_static(b"GIF89a"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_gate_requires_license() {
        let svc = service(Some("pro")).with_entitlement(crate::entitlement::AllowAll);

        let err = svc
            .issue_token(Claims::new("p_1", "a@b.com"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::LicenseRequired));

        let err = svc
            .upload("p_1", Bytes::from_static(b"%PDF-1.4"), None, Some(""))
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::LicenseRequired));

        assert!(svc
            .issue_token(Claims::new("p_1", "a@b.com"), Some("LIC"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_gate_denies_by_default() {
        let svc = service(Some("pro"));

        let err = svc
            .issue_token(Claims::new("p_1", "a@b.com"), Some("LIC"))
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::LicenseDenied));
    }

    #[tokio::test]
    async fn test_gate_uses_product_id() {
        let svc = service(Some("pro")).with_entitlement(|key: &str, product: &str| {
            if key == "LIC" && product == "pro" {
                EntitlementDecision::Grant
            } else {
                EntitlementDecision::Deny
            }
        });

        assert!(svc
            .issue_token(Claims::new("p_1", "a@b.com"), Some("LIC"))
            .await
            .is_ok());
        let err = svc
            .issue_token(Claims::new("p_1", "a@b.com"), Some("OTHER"))
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::LicenseDenied));
    }

    #[tokio::test]
    async fn test_gate_unavailable() {
        struct Offline;

        #[async_trait::async_trait]
        impl EntitlementCheck for Offline {
            async fn check(
                &self,
                _: &str,
                _: &str,
            ) -> std::result::Result<EntitlementDecision, crate::entitlement::EntitlementError>
            {
                Err(crate::entitlement::EntitlementError::new("connection refused"))
            }
        }

        let svc = service(Some("pro")).with_entitlement(Offline);
        let err = svc
            .issue_token(Claims::new("p_1", "a@b.com"), Some("LIC"))
            .await
            .unwrap_err();
        assert!(matches!(err, GumstampError::EntitlementUnavailable(_)));
        assert!(!err.is_expected());
    }

    #[test]
    fn test_record_sale() {
        let svc = service(Some("pro"));

        let issued = svc
            .record_sale(SaleNotification {
                sale_id: Some("sale-1".into()),
                product_id: Some("p_1".into()),
                email: Some("a@b.com".into()),
            })
            .unwrap();
        let claims = svc
            .codec()
            .verify(&issued.token, svc.config().token_max_age)
            .unwrap();
        assert_eq!(claims.sale_id(), Some("sale-1"));
    }

    #[test]
    fn test_record_sale_requires_fields() {
        let svc = service(None);

        let err = svc
            .record_sale(SaleNotification {
                email: Some("a@b.com".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GumstampError::InvalidInput(_)));

        let err = svc
            .record_sale(SaleNotification {
                product_id: Some("p_1".into()),
                email: Some("   ".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GumstampError::InvalidInput(_)));
    }
}
