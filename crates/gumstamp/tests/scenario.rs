//! End-to-end tests: upload, issue, materialize, serve from cache.

use std::sync::atomic::Ordering;

use bytes::Bytes;

use gumstamp::core::{unix_now, Claims};
use gumstamp::{CacheOutcome, GumstampError, StampTemplate};
use gumstamp_testkit::{
    contains_text, init_tracing, page_contents, sample_pdf, sample_pdf_with_sizes,
    CountingStamper, TestFixture,
};

#[tokio::test]
async fn test_licensed_copy_is_stamped_once() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    let stamper = CountingStamper::new();
    let calls = stamper.counter();
    let service = fixture.service(stamper).await;

    service
        .upload(
            "p_1",
            Bytes::from(sample_pdf(2)),
            Some(StampTemplate::footer("Licensed to {email}")),
            None,
        )
        .await?;

    let claims = Claims::new("p_1", "a@b.com");
    let issued = service.issue_token(claims.clone(), None).await?;
    assert!(issued
        .download_url
        .starts_with("https://dl.example.com/download/"));

    let first = service.materialize(&issued.token).await?;
    assert_eq!(first.outcome, CacheOutcome::Generated);
    assert_eq!(first.filename, "a@b.com.pdf");
    assert_eq!(first.content_type, "application/pdf");

    let pages = page_contents(&first.bytes);
    assert_eq!(pages.len(), 2);
    for page in &pages {
        assert!(contains_text(page, "Licensed to a@b.com"));
    }

    // A second, distinct token for the same buyer
    let again = service.codec().sign_at(&claims, unix_now() - 60);
    assert_ne!(again, issued.token);
    let second = service.materialize(&again).await?;

    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(second.bytes, first.bytes);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let path = fixture.layout().stamped_dir().join("p_1").join("a@b.com.pdf");
    assert_eq!(std::fs::read(path)?, first.bytes.as_ref());
    Ok(())
}

#[tokio::test]
async fn test_every_page_carries_footer() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let service = fixture.service(CountingStamper::new()).await;

    let sizes = [(612, 792), (842, 595), (300, 420), (1224, 792)];
    service
        .upload("mixed", Bytes::from(sample_pdf_with_sizes(&sizes)), None, None)
        .await?;

    let issued = service
        .issue_token(Claims::new("mixed", "reader@example.com"), None)
        .await?;
    let artifact = service.materialize(&issued.token).await?;

    let pages = page_contents(&artifact.bytes);
    assert_eq!(pages.len(), sizes.len());
    for (index, page) in pages.iter().enumerate() {
        assert!(contains_text(page, "Purchased by reader@example.com"));
        assert!(contains_text(page, &format!("Page {}", index + 1)));
    }
    Ok(())
}

#[tokio::test]
async fn test_sale_id_collapses_buyers() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let stamper = CountingStamper::new();
    let calls = stamper.counter();
    let service = fixture.service(stamper).await;
    service
        .upload("p_2", Bytes::from(sample_pdf(1)), None, None)
        .await?;

    let a = Claims::new("p_2", "a@b.com").with_sale_id("sale-77");
    let b = Claims::new("p_2", "other@b.com").with_sale_id("sale-77");
    let first = service
        .materialize(&service.issue_token(a, None).await?.token)
        .await?;
    let second = service
        .materialize(&service.issue_token(b, None).await?.token)
        .await?;

    assert_eq!(first.cache_key, second.cache_key);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.artifact_count("p_2"), 1);

    // Without a sale id, each email gets its own copy
    for email in ["x@b.com", "y@b.com"] {
        let token = service
            .issue_token(Claims::new("p_2", email), None)
            .await?
            .token;
        service.materialize(&token).await?;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(fixture.artifact_count("p_2"), 3);
    Ok(())
}

#[tokio::test]
async fn test_rejected_tokens() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let service = fixture.service(CountingStamper::new()).await;
    service
        .upload("p_1", Bytes::from(sample_pdf(1)), None, None)
        .await?;

    let issued = service
        .issue_token(Claims::new("p_1", "a@b.com"), None)
        .await?;

    let mut tampered = issued.token.clone().into_bytes();
    tampered[3] = if tampered[3] == b'A' { b'B' } else { b'A' };
    let err = service
        .materialize(&String::from_utf8(tampered)?)
        .await
        .unwrap_err();
    assert!(matches!(err, GumstampError::Unauthorized));

    let expired = service
        .codec()
        .sign_at(&Claims::new("p_1", "a@b.com"), 1_000_000_000);
    let err = service.materialize(&expired).await.unwrap_err();
    assert!(matches!(err, GumstampError::Unauthorized));

    let stranger = fixture_with_other_secret_token();
    let err = service.materialize(&stranger).await.unwrap_err();
    assert!(matches!(err, GumstampError::Unauthorized));
    Ok(())
}

fn fixture_with_other_secret_token() -> String {
    let codec = gumstamp::TokenCodec::new(&gumstamp::SecretKey::generate());
    codec.sign(&Claims::new("p_1", "a@b.com"))
}

#[tokio::test]
async fn test_unknown_document() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let service = fixture.service(CountingStamper::new()).await;

    let issued = service
        .issue_token(Claims::new("nope", "a@b.com"), None)
        .await?;
    let err = service.materialize(&issued.token).await.unwrap_err();
    assert!(matches!(err, GumstampError::NotFound(_)));
    assert!(err.is_expected());
    Ok(())
}

#[tokio::test]
async fn test_failed_stamp_leaves_nothing_behind() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let service = fixture.service(CountingStamper::new().failing()).await;
    service
        .upload("p_1", Bytes::from(sample_pdf(1)), None, None)
        .await?;

    let issued = service
        .issue_token(Claims::new("p_1", "a@b.com"), None)
        .await?;
    let err = service.materialize(&issued.token).await.unwrap_err();

    assert!(matches!(err, GumstampError::TransformFailure(_)));
    assert_eq!(fixture.artifact_count("p_1"), 0);
    assert!(!fixture.has_temp_files("p_1"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_source_is_transform_failure() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let service = fixture.service(CountingStamper::new()).await;
    // Passes the header sniff, fails to parse
    service
        .upload("broken", Bytes::from_static(b"%PDF-1.4\nnot a document"), None, None)
        .await?;

    let issued = service
        .issue_token(Claims::new("broken", "a@b.com"), None)
        .await?;
    let err = service.materialize(&issued.token).await.unwrap_err();

    assert!(matches!(err, GumstampError::TransformFailure(_)));
    assert!(!err.is_expected());
    assert_eq!(fixture.artifact_count("broken"), 0);
    Ok(())
}

#[tokio::test]
async fn test_reupload_keeps_existing_copies() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let service = fixture.service(CountingStamper::new()).await;
    service
        .upload("p_1", Bytes::from(sample_pdf(1)), None, None)
        .await?;

    let claims = Claims::new("p_1", "a@b.com");
    let token = service.issue_token(claims.clone(), None).await?.token;
    let before = service.materialize(&token).await?;

    service
        .upload("p_1", Bytes::from(sample_pdf(3)), None, None)
        .await?;
    let after = service.materialize(&token).await?;

    // Cached copies are permanent
    assert_eq!(after.outcome, CacheOutcome::Hit);
    assert_eq!(page_contents(&after.bytes).len(), 1);
    assert_eq!(after.bytes, before.bytes);
    Ok(())
}
