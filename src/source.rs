//! Loading overlay source pages from files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lopdf::Document;
use pdf_writer::{Content, Finish, Name, Pdf, Rect as PdfRect, Ref as PdfRef};
use tracing::debug;

use crate::error::{OverlayError, Result};
use crate::layout_page::LayoutPage;

/// Reads page 1 of a PDF, or an SVG drawing, as an overlay.
pub fn load_overlay(path: &Path) -> Result<LayoutPage> {
    if !path.exists() {
        return Err(OverlayError::MissingResource(path.to_path_buf()));
    }
    let is_svg = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    debug!(path = %path.display(), is_svg, "loading overlay source");

    let doc = if is_svg {
        svg_to_document(&fs::read_to_string(path)?)?
    } else {
        Document::load(path)?
    };
    LayoutPage::from_first_page(&doc)
}

/// A one-page vector PDF showing the SVG at its natural size.
pub fn svg_to_document(svg: &str) -> Result<Document> {
    Ok(Document::load_mem(&svg_to_page_pdf_bytes(svg)?)?)
}

fn svg_to_page_pdf_bytes(svg: &str) -> Result<Vec<u8>> {
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt)
        .map_err(|e| OverlayError::Svg(format!("parse failed: {e}")))?;
    let (w, h) = (tree.size().width(), tree.size().height());

    // the chunk's XObject is drawn in a 1x1 unit box
    let (svg_chunk, svg_root_ref) =
        svg2pdf::to_chunk(&tree, svg2pdf::ConversionOptions::default())
            .map_err(|e| OverlayError::Svg(format!("to_chunk failed: {e}")))?;

    let mut alloc = PdfRef::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let svg_name = Name(b"S1");

    let mut map = HashMap::new();
    let svg_chunk = svg_chunk.renumber(|old| *map.entry(old).or_insert_with(|| alloc.bump()));
    let svg_id = *map
        .get(&svg_root_ref)
        .ok_or_else(|| OverlayError::Svg("svg root ref missing after renumber".into()))?;

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(PdfRect::new(0.0, 0.0, w, h));
    page.parent(page_tree_id);
    page.contents(content_id);
    let mut res = page.resources();
    res.x_objects().pair(svg_name, svg_id);
    res.finish();
    page.finish();

    let mut content = Content::new();
    content.transform([w, 0.0, 0.0, h, 0.0, 0.0]).x_object(svg_name);
    pdf.stream(content_id, &content.finish());
    pdf.extend(&svg_chunk);

    Ok(pdf.finish())
}
