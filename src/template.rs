use std::path::Path;

use lopdf::{Document, ObjectId};
use tracing::info;

use crate::error::{OverlayError, Result};
use crate::layout_page::LayoutPage;
use crate::overlay::Compositor;
use crate::source::load_overlay;

/// A target document that overlays are stamped onto, one after another.
///
/// ```no_run
/// use pdf_overlay::Template;
/// use std::path::Path;
///
/// Template::open(Path::new("invoice.pdf"))?
///     .overlay_file(Path::new("letterhead.pdf"))?
///     .save(Path::new("invoice.stamped.pdf"))?;
/// # Ok::<(), pdf_overlay::OverlayError>(())
/// ```
pub struct Template {
    document: Document,
    compositor: Compositor,
}

impl Template {
    pub fn open(path: &Path) -> Result<Template> {
        if !path.exists() {
            return Err(OverlayError::MissingResource(path.to_path_buf()));
        }
        info!(path = %path.display(), "opening target");
        Ok(Template::from_document(Document::load(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Template> {
        Ok(Template::from_document(Document::load_mem(bytes)?))
    }

    pub fn from_document(document: Document) -> Template {
        Template { document, compositor: Compositor::default() }
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Template {
        self.compositor = compositor;
        self
    }

    /// Overlays page 1 of a PDF (or an SVG drawing) read from `path`.
    pub fn overlay_file(self, path: &Path) -> Result<Template> {
        let overlay = load_overlay(path)?;
        self.overlay_layout(&overlay)
    }

    /// Overlays page 1 of `source`.
    pub fn overlay_document(self, source: &Document) -> Result<Template> {
        let overlay = LayoutPage::from_first_page(source)?;
        self.overlay_layout(&overlay)
    }

    pub fn overlay_page(self, source: &Document, page_id: ObjectId) -> Result<Template> {
        let overlay = LayoutPage::from_page(source, page_id)?;
        self.overlay_layout(&overlay)
    }

    pub fn overlay_layout(mut self, overlay: &LayoutPage) -> Result<Template> {
        self.compositor.apply(&mut self.document, overlay)?;
        Ok(self)
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.document.save_to(&mut out)?;
        Ok(out)
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.document.save(path)?;
        info!(path = %path.display(), pages = self.page_count(), "saved");
        Ok(())
    }
}
