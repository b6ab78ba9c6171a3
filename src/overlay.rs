//! Stamping a [`LayoutPage`] onto every page of a document.
//!
//! Each page's `/Contents` becomes
//!
//! ```text
//! [ q  <original content>  Q  <placement> ]
//! ```
//!
//! where the placement stream centers the overlay, drawn as a shared Form
//! XObject, over the page:
//!
//! ```text
//! q
//! q 1 0 0 1 <h> <v> cm /OL1 Do Q
//! Q
//! ```

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::codec::content_stream;
use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::layout_page::{LayoutPage, flatten_contents};
use crate::number::format_coordinate;
use crate::objects::{effective_resources, owned_dict, remap_dict_refs, remap_refs, resource_names};

/// Resource name prefix for the overlay form.
pub const DEFAULT_FORM_PREFIX: &str = "OL";

/// New objects waiting to be added to a document, numbered after its
/// current highest id.
struct Staging {
    max_id: u32,
    objects: Vec<(ObjectId, Object)>,
}

impl Staging {
    fn new(doc: &Document) -> Self {
        Staging { max_id: doc.max_id, objects: Vec::new() }
    }

    fn reserve(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    fn add<T: Into<Object>>(&mut self, obj: T) -> ObjectId {
        let id = self.reserve();
        self.objects.push((id, obj.into()));
        id
    }

    fn commit(self, doc: &mut Document) {
        doc.objects.extend(self.objects);
        doc.max_id = self.max_id;
    }
}

/// Everything that changes on one page.
struct PagePlan {
    page_id: ObjectId,
    contents: Vec<Object>,
    resources: Dictionary,
}

/// Applies overlays to documents.
#[derive(Debug, Clone)]
pub struct Compositor {
    prefix: String,
}

impl Default for Compositor {
    fn default() -> Self {
        Compositor { prefix: DEFAULT_FORM_PREFIX.to_string() }
    }
}

impl Compositor {
    /// Uses `prefix` (followed by a number) to name the overlay form.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Compositor { prefix: prefix.into() }
    }

    /// Draws `overlay` centered on top of every page of `doc`.
    ///
    /// All pages are planned before anything is written, so on error the
    /// document is left as it was.
    pub fn apply(&self, doc: &mut Document, overlay: &LayoutPage) -> Result<()> {
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        if page_ids.is_empty() {
            return Ok(());
        }

        let mut staging = Staging::new(doc);
        let form_id = import_form(overlay, &mut staging)?;

        let mut plans = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            plans.push(self.plan_page(doc, page_id, overlay, form_id, &mut staging)?);
        }

        let added = staging.objects.len();
        staging.commit(doc);
        for plan in &plans {
            let page = doc.get_object_mut(plan.page_id)?.as_dict_mut()?;
            page.set("Resources", plan.resources.clone());
            page.set("Contents", plan.contents.clone());
        }
        info!(pages = plans.len(), objects = added, ?form_id, "applied overlay");
        Ok(())
    }

    fn plan_page(
        &self,
        doc: &Document,
        page_id: ObjectId,
        overlay: &LayoutPage,
        form_id: ObjectId,
        staging: &mut Staging,
    ) -> Result<PagePlan> {
        let page = doc.get_object(page_id)?.as_dict()?;

        let mut contents = vec![Object::Reference(staging.add(content_stream("q\n")?))];
        for leaf in flatten_contents(doc, page.get(b"Contents").ok())? {
            let id = match leaf.id {
                Some(id) => id,
                None => staging.add(leaf.stream.clone()),
            };
            contents.push(Object::Reference(id));
        }
        contents.push(Object::Reference(staging.add(content_stream("Q\n")?)));

        let mut resources = effective_resources(doc, page_id)?;
        let mut x_objects = match resources.get(b"XObject") {
            Ok(obj) => owned_dict(doc, obj)?,
            Err(_) => Dictionary::new(),
        };
        let name = allocate_name(
            &self.prefix,
            &resource_names(doc, &resources),
            x_objects.len() + 1,
        );
        x_objects.set(name.as_str(), Object::Reference(form_id));
        resources.set("XObject", x_objects);

        let page_box = Rect::media_box_of(doc, page_id)?;
        let (h_shift, v_shift) = centering_shift(&page_box, &overlay.media_box())?;
        let placement = placement_text(&name, h_shift, v_shift);
        contents.push(Object::Reference(staging.add(content_stream(&placement)?)));

        debug!(?page_id, %name, h_shift, v_shift, "planned overlay");
        Ok(PagePlan { page_id, contents, resources })
    }
}

/// Shorthand for [`Compositor::apply`] with the default prefix.
pub fn overlay_document(doc: &mut Document, overlay: &LayoutPage) -> Result<()> {
    Compositor::default().apply(doc, overlay)
}

/// Copies the overlay's resource objects and its content (as a Form XObject)
/// into the staging area, returning the form's id.
fn import_form(overlay: &LayoutPage, staging: &mut Staging) -> Result<ObjectId> {
    let map: BTreeMap<ObjectId, ObjectId> =
        overlay.objects().keys().map(|old| (*old, staging.reserve())).collect();
    for (old, obj) in overlay.objects() {
        let mut obj = obj.clone();
        remap_refs(&mut obj, &map);
        staging.objects.push((map[old], obj));
    }

    let mut resources = overlay.resources().clone();
    remap_dict_refs(&mut resources, &map);

    let mut form = overlay.content().clone();
    form.dict.set("Type", "XObject");
    form.dict.set("Subtype", "Form");
    form.dict.set("FormType", Object::Integer(1));
    form.dict.set("BBox", overlay.media_box().retranslated().to_object());
    form.dict.set("Matrix", identity_matrix());
    form.dict.set("Resources", resources);
    Ok(staging.add(form))
}

fn identity_matrix() -> Object {
    Object::Array(vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), 0.into()])
}

/// `prefix` followed by the first number from `start` up that no resource
/// category uses yet.
fn allocate_name(prefix: &str, taken: &BTreeSet<Vec<u8>>, start: usize) -> String {
    let mut n = start;
    loop {
        let candidate = format!("{prefix}{n}");
        if !taken.contains(candidate.as_bytes()) {
            return candidate;
        }
        n += 1;
    }
}

/// Offset that centers `overlay` on `page`. Negative when the overlay is
/// larger than the page.
pub fn centering_shift(page: &Rect, overlay: &Rect) -> Result<(f32, f32)> {
    let h = (page.width() - overlay.width()) / 2.0;
    let v = (page.height() - overlay.height()) / 2.0;
    if !h.is_finite() || !v.is_finite() {
        return Err(OverlayError::Structural(format!(
            "cannot center overlay {overlay:?} on page {page:?}"
        )));
    }
    Ok((h, v))
}

/// The content that draws form `name` translated by the shift.
pub fn placement_text(name: &str, h_shift: f32, v_shift: f32) -> String {
    format!(
        "q\nq 1 0 0 1 {} {} cm /{name} Do Q\nQ\n",
        format_coordinate(h_shift),
        format_coordinate(v_shift)
    )
}
