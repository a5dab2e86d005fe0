//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a service over a temporary
//! storage root, an instrumented stamper, and small PDF builders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use tempfile::TempDir;

use gumstamp::{Gumstamp, GumstampConfig};
use gumstamp_core::SecretKey;
use gumstamp_stamp::{PdfStamper, StampError, StampParams, Stamper};
use gumstamp_store::{FsRegistry, StorageLayout};

/// Secret used by every fixture, so tokens are reproducible across runs.
pub const FIXTURE_SECRET: &[u8] = b"gumstamp test secret";

/// A fixed "now": 2024-06-01T12:00:00Z.
pub const FIXTURE_NOW: u64 = 1_717_243_200;

/// Wraps a stamper and counts invocations. Optionally slows each call down
/// to widen race windows, or fails every call.
pub struct CountingStamper<S = PdfStamper> {
    inner: S,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    fail: bool,
}

impl CountingStamper<PdfStamper> {
    pub fn new() -> Self {
        Self::wrap(PdfStamper::new())
    }
}

impl Default for CountingStamper<PdfStamper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Stamper> CountingStamper<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
            fail: false,
        }
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call with a parse error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Shared handle to the call counter, readable after the stamper has
    /// been moved into a service.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl<S: Stamper> Stamper for CountingStamper<S> {
    fn stamp(&self, source: &[u8], params: &StampParams) -> gumstamp_stamp::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(StampError::Parse("injected failure".into()));
        }
        self.inner.stamp(source, params)
    }
}

/// A test fixture with a temporary storage root.
pub struct TestFixture {
    pub dir: TempDir,
    pub config: GumstampConfig,
}

impl TestFixture {
    /// Create a fixture rooted in a fresh temporary directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let secret = SecretKey::new(FIXTURE_SECRET.to_vec()).expect("non-empty secret");
        let config = GumstampConfig::new(secret, dir.path().join("storage"))
            .with_base_url("https://dl.example.com");
        Self { dir, config }
    }

    /// The storage layout under the fixture's root.
    pub fn layout(&self) -> StorageLayout {
        self.config.layout()
    }

    /// A filesystem-backed service with the given stamper.
    pub async fn service<S: Stamper + 'static>(&self, stamper: S) -> Gumstamp<FsRegistry, S> {
        let layout = self.layout();
        layout.ensure().await.expect("create storage dirs");
        Gumstamp::new(self.config.clone(), FsRegistry::new(layout), stamper)
    }

    /// Number of finished artifacts stored for a document.
    pub fn artifact_count(&self, document_id: &str) -> usize {
        let dir = self.layout().stamped_dir().join(document_id);
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().map_or(false, |ext| ext == "pdf"))
                .count(),
            Err(_) => 0,
        }
    }

    /// Whether any temp files are left in a document's artifact directory.
    pub fn has_temp_files(&self, document_id: &str) -> bool {
        let dir = self.layout().stamped_dir().join(document_id);
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy().starts_with(".tmp-")),
            Err(_) => false,
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A US Letter PDF with `pages` pages.
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    sample_pdf_with_sizes(&vec![(612, 792); pages])
}

/// A PDF with one page per `(width, height)`, each drawing its page number.
pub fn sample_pdf_with_sizes(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Courier".to_vec()));
    let font_id = doc.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let resources_id = doc.add_object(resources);

    let mut kids = Vec::with_capacity(sizes.len());
    for (index, (width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(height - 72)]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let bytes = content.encode().expect("encode page content");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(*width),
                Object::Integer(*height),
            ]),
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Reference(resources_id));
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize sample pdf");
    out
}

/// Decoded content of every page, in page order.
pub fn page_contents(pdf: &[u8]) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(pdf).expect("parse pdf");
    doc.get_pages()
        .into_values()
        .map(|id| doc.get_page_content(id).expect("page content"))
        .collect()
}

/// Whether `content` contains `text` verbatim.
pub fn contains_text(content: &[u8], text: &str) -> bool {
    content
        .windows(text.len())
        .any(|window| window == text.as_bytes())
}

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
