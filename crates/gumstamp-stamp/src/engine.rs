//! The Stamper trait and its lopdf implementation.
//!
//! Stamping is a pure bytes-to-bytes transform: parse, append overlay
//! content streams to every page, re-encode. Nothing touches the disk.

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Result, StampError};
use crate::font::sanitize;
use crate::overlay::{
    self, PageBox, DIAGONAL_OPACITY, DIAGONAL_STATE, FONT_RESOURCE, FOOTER_OPACITY, FOOTER_STATE,
    LETTER,
};

/// Guards against cyclic `Parent` chains in malformed page trees.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Text to draw on every page. `None` or an empty string skips that overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampParams {
    pub footer_text: Option<String>,
    pub diagonal_text: Option<String>,
}

impl StampParams {
    /// Footer only.
    pub fn footer(text: impl Into<String>) -> Self {
        Self {
            footer_text: Some(text.into()),
            diagonal_text: None,
        }
    }

    /// Add a diagonal watermark.
    pub fn with_diagonal(mut self, text: impl Into<String>) -> Self {
        self.diagonal_text = Some(text.into());
        self
    }

    fn footer_line(&self) -> Option<String> {
        non_empty(&self.footer_text)
    }

    fn diagonal_line(&self) -> Option<String> {
        non_empty(&self.diagonal_text)
    }
}

fn non_empty(text: &Option<String>) -> Option<String> {
    text.as_deref().filter(|t| !t.is_empty()).map(sanitize)
}

/// Turns source bytes into stamped bytes.
///
/// Implementations must be deterministic: the same source and parameters
/// always produce the same output. Calls are blocking and CPU-bound.
pub trait Stamper: Send + Sync {
    fn stamp(&self, source: &[u8], params: &StampParams) -> Result<Vec<u8>>;
}

/// Production stamper built on lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfStamper;

impl PdfStamper {
    pub fn new() -> Self {
        Self
    }
}

impl Stamper for PdfStamper {
    fn stamp(&self, source: &[u8], params: &StampParams) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(source).map_err(|e| StampError::Parse(e.to_string()))?;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(StampError::Structure("document has no pages".into()));
        }

        let footer = params.footer_line();
        let diagonal = params.diagonal_line();

        if footer.is_some() || diagonal.is_some() {
            let shared = SharedResources::install(&mut doc, footer.is_some(), diagonal.is_some());
            for page_id in &pages {
                let (frame, matrix) =
                    overlay::upright(&media_box(&doc, *page_id), rotation(&doc, *page_id));
                let mut ops = Vec::new();
                if let Some(text) = &footer {
                    ops.extend(overlay::footer(&frame, text));
                }
                if let Some(text) = &diagonal {
                    ops.extend(overlay::diagonal(&frame, text));
                }
                let overlay = Content { operations: overlay::place(matrix, ops) }
                    .encode()
                    .map_err(|e| StampError::Encode(e.to_string()))?;
                stamp_page(&mut doc, *page_id, &shared, overlay)?;
            }
        }

        let mut out = Vec::with_capacity(source.len() + 1024);
        doc.save_to(&mut out)
            .map_err(|e| StampError::Encode(e.to_string()))?;

        tracing::debug!(pages = pages.len(), bytes = out.len(), "stamped document");
        Ok(out)
    }
}

/// Font and graphics-state objects shared by every stamped page.
struct SharedResources {
    font: ObjectId,
    footer_state: Option<ObjectId>,
    diagonal_state: Option<ObjectId>,
}

impl SharedResources {
    fn install(doc: &mut Document, footer: bool, diagonal: bool) -> Self {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let font = doc.add_object(font);

        let footer_state = footer.then(|| doc.add_object(opacity_state(FOOTER_OPACITY)));
        let diagonal_state = diagonal.then(|| doc.add_object(opacity_state(DIAGONAL_OPACITY)));

        Self {
            font,
            footer_state,
            diagonal_state,
        }
    }
}

fn opacity_state(alpha: f32) -> Dictionary {
    let mut state = Dictionary::new();
    state.set("Type", Object::Name(b"ExtGState".to_vec()));
    state.set("ca", Object::Real(alpha));
    state.set("CA", Object::Real(alpha));
    state
}

/// Wrap the page's original content in `q`/`Q`, append the overlay, and
/// give the page a resource dictionary that names the overlay's font and
/// graphics states.
fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    shared: &SharedResources,
    overlay: Vec<u8>,
) -> Result<()> {
    let original = content_refs(doc, page_id);
    let resources = page_resources(doc, page_id, shared);

    let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    let overlay = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(original.len() + 3);
    contents.push(Object::Reference(open));
    contents.extend(original.into_iter().map(Object::Reference));
    contents.push(Object::Reference(close));
    contents.push(Object::Reference(overlay));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| StampError::Structure(format!("page {:?}: {}", page_id, e)))?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// References to the page's existing content streams, in drawing order.
fn content_refs(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let contents = match doc.get_dictionary(page_id).and_then(|page| page.get(b"Contents")) {
        Ok(contents) => contents,
        Err(_) => return Vec::new(),
    };
    match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => references(items),
            _ => vec![*id],
        },
        Object::Array(items) => references(items),
        _ => Vec::new(),
    }
}

fn references(items: &[Object]) -> Vec<ObjectId> {
    items.iter().filter_map(|item| item.as_reference().ok()).collect()
}

/// The page's effective resources, copied inline, plus the overlay entries.
fn page_resources(doc: &Document, page_id: ObjectId, shared: &SharedResources) -> Dictionary {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|res| res.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut fonts = sub_dictionary(doc, &resources, b"Font");
    fonts.set(FONT_RESOURCE, Object::Reference(shared.font));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = sub_dictionary(doc, &resources, b"ExtGState");
    if let Some(id) = shared.footer_state {
        states.set(FOOTER_STATE, Object::Reference(id));
    }
    if let Some(id) = shared.diagonal_state {
        states.set(DIAGONAL_STATE, Object::Reference(id));
    }
    resources.set("ExtGState", Object::Dictionary(states));

    resources
}

fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .map(|value| resolve(doc, value))
        .and_then(|value| value.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

/// The page's MediaBox, following the `Parent` chain. Falls back to
/// US Letter when no usable box exists.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> PageBox {
    inherited(doc, page_id, b"MediaBox")
        .and_then(|value| value.as_array().ok())
        .and_then(|items| page_box(doc, items))
        .unwrap_or(LETTER)
}

/// The page's inherited `/Rotate`, in degrees.
fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited(doc, page_id, b"Rotate")
        .and_then(|value| value.as_i64().ok())
        .unwrap_or(0)
}

fn page_box(doc: &Document, items: &[Object]) -> Option<PageBox> {
    if items.len() != 4 {
        return None;
    }
    let mut corners = [0.0f32; 4];
    for (slot, item) in corners.iter_mut().zip(items) {
        *slot = number(resolve(doc, item))?;
    }
    PageBox::from_corners(corners[0], corners[1], corners[2], corners[3])
}

fn number(value: &Object) -> Option<f32> {
    match value {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Look up an inheritable page attribute, resolving references.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, value: &'a Object) -> &'a Object {
    match value {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(value),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;

    fn int(value: i64) -> Object {
        Object::Integer(value)
    }

    /// Minimal PDF with one page per `(width, height)` and a filled square
    /// as the original content.
    fn build_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for (width, height) in sizes {
            let content = Content {
                operations: vec![
                    Operation::new("g", vec![Object::Real(0.5)]),
                    Operation::new("re", vec![int(10), int(10), int(50), int(50)]),
                    Operation::new("f", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set(
                "MediaBox",
                Object::Array(vec![int(0), int(0), int(*width), int(*height)]),
            );
            page.set("Contents", Object::Reference(content_id));
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
        doc.save_to(&mut out).unwrap();
        out
    }

    /// Like [`build_pdf`] but the MediaBox lives on the Pages node only.
    fn build_pdf_inherited_box(width: i64, height: i64, with_box: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        let page_id = doc.add_object(page);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(1));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        if with_box {
            pages.set(
                "MediaBox",
                Object::Array(vec![int(0), int(0), int(width), int(height)]),
            );
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn page_contents(bytes: &[u8]) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| doc.get_page_content(id).unwrap())
            .collect()
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_every_page_gets_footer() {
        let source = build_pdf(&[(612, 792), (842, 595), (200, 300)]);
        let out = PdfStamper
            .stamp(&source, &StampParams::footer("Purchased by a@b.com"))
            .unwrap();

        let pages = page_contents(&out);
        assert_eq!(pages.len(), 3);
        for content in &pages {
            assert!(contains(content, "Purchased by a@b.com"));
            assert!(contains(content, FONT_RESOURCE));
        }
    }

    #[test]
    fn test_page_sizes_preserved() {
        let source = build_pdf(&[(612, 792), (842, 595)]);
        let out = PdfStamper
            .stamp(&source, &StampParams::footer("x").with_diagonal("SAMPLE"))
            .unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let boxes: Vec<PageBox> = doc
            .get_pages()
            .into_values()
            .map(|id| media_box(&doc, id))
            .collect();
        assert_eq!(boxes[0], LETTER);
        assert_eq!(boxes[1], PageBox::from_corners(0.0, 0.0, 842.0, 595.0).unwrap());
    }

    #[test]
    fn test_diagonal_only_when_requested() {
        let source = build_pdf(&[(612, 792)]);

        let plain = PdfStamper.stamp(&source, &StampParams::footer("f")).unwrap();
        assert!(!contains(&page_contents(&plain)[0], DIAGONAL_STATE));

        let marked = PdfStamper
            .stamp(&source, &StampParams::footer("f").with_diagonal("DRAFT"))
            .unwrap();
        let content = &page_contents(&marked)[0];
        assert!(contains(content, DIAGONAL_STATE));
        assert!(contains(content, "DRAFT"));
    }

    #[test]
    fn test_original_content_is_isolated() {
        let source = build_pdf(&[(612, 792)]);
        let out = PdfStamper.stamp(&source, &StampParams::footer("f")).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page_id = doc.get_pages().into_values().next().unwrap();
        let contents = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap();
        // q, original, Q, overlay
        assert_eq!(contents.len(), 4);

        let first = doc.get_page_content(page_id).unwrap();
        assert!(first.starts_with(b"q"));
    }

    #[test]
    fn test_stamping_is_deterministic() {
        let source = build_pdf(&[(612, 792), (300, 300)]);
        let params = StampParams::footer("Purchased by a@b.com").with_diagonal("a@b.com");

        let first = PdfStamper.stamp(&source, &params).unwrap();
        let second = PdfStamper.stamp(&source, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_params_passes_pages_through() {
        let source = build_pdf(&[(612, 792), (612, 792)]);
        let out = PdfStamper.stamp(&source, &StampParams::default()).unwrap();

        assert_eq!(page_contents(&out), page_contents(&source));
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let source = build_pdf(&[(612, 792)]);
        let params = StampParams {
            footer_text: Some(String::new()),
            diagonal_text: Some(String::new()),
        };
        let out = PdfStamper.stamp(&source, &params).unwrap();

        assert_eq!(page_contents(&out), page_contents(&source));
    }

    #[test]
    fn test_non_ascii_is_replaced() {
        let source = build_pdf(&[(612, 792)]);
        let out = PdfStamper
            .stamp(&source, &StampParams::footer("Purchased by jos\u{e9}@b.com"))
            .unwrap();

        assert!(contains(&page_contents(&out)[0], "Purchased by jos?@b.com"));
    }

    #[test]
    fn test_corrupt_source_is_parse_error() {
        let err = PdfStamper
            .stamp(b"definitely not a pdf", &StampParams::footer("x"))
            .unwrap_err();
        assert!(matches!(err, StampError::Parse(_)));
    }

    #[test]
    fn test_inherited_media_box() {
        let source = build_pdf_inherited_box(400, 500, true);
        let doc = Document::load_mem(&source).unwrap();
        let page_id = doc.get_pages().into_values().next().unwrap();

        assert_eq!(
            media_box(&doc, page_id),
            PageBox::from_corners(0.0, 0.0, 400.0, 500.0).unwrap()
        );

        let out = PdfStamper.stamp(&source, &StampParams::footer("hello")).unwrap();
        assert!(contains(&page_contents(&out)[0], "hello"));
    }

    /// Set `/Rotate` on every page of `source`.
    fn rotate_pages(source: &[u8], rotate: i64) -> Vec<u8> {
        let mut doc = Document::load_mem(source).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in pages {
            doc.get_dictionary_mut(page_id)
                .unwrap()
                .set("Rotate", int(rotate));
        }
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// Decoded operations of the page's last content stream.
    fn overlay_ops(pdf: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = doc.get_pages().into_values().next().unwrap();
        let contents = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap();
        let last = contents.last().unwrap().as_reference().unwrap();
        let stream = doc.get_object(last).unwrap().as_stream().unwrap();
        let bytes = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        Content::decode(&bytes).unwrap().operations
    }

    #[test]
    fn test_rotated_page_overlay_is_upright() {
        let source = rotate_pages(&build_pdf(&[(612, 792)]), 90);
        let out = PdfStamper
            .stamp(&source, &StampParams::footer("Purchased by a@b.com"))
            .unwrap();

        let ops = overlay_ops(&out);
        assert_eq!(ops[0].operator, "q");
        assert_eq!(ops[1].operator, "cm");
        let matrix: Vec<f32> = ops[1]
            .operands
            .iter()
            .map(|operand| operand.as_float().unwrap())
            .collect();
        assert_eq!(matrix, vec![0.0, 1.0, -1.0, 0.0, 612.0, 0.0]);
        assert!(contains(&page_contents(&out)[0], "Purchased by a@b.com"));
    }

    #[test]
    fn test_unrotated_page_overlay_has_no_frame_matrix() {
        let out = PdfStamper
            .stamp(&build_pdf(&[(612, 792)]), &StampParams::footer("f"))
            .unwrap();
        let ops = overlay_ops(&out);
        assert!(ops.iter().all(|op| op.operator != "cm"));
    }

    #[test]
    fn test_missing_media_box_defaults_to_letter() {
        let source = build_pdf_inherited_box(0, 0, false);
        let doc = Document::load_mem(&source).unwrap();
        let page_id = doc.get_pages().into_values().next().unwrap();

        assert_eq!(media_box(&doc, page_id), LETTER);
    }
}
