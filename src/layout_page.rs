//! Flattening a page's `/Contents` into one self-contained overlay page.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::codec::{deflate_stream, plain_bytes};
use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::objects::{collect_closure, effective_resources, type_name};

/// The only shapes a `/Contents` value may take.
enum ContentNode<'a> {
    Leaf(&'a Stream),
    Array(&'a [Object]),
    Reference(ObjectId),
}

impl<'a> ContentNode<'a> {
    fn classify(obj: &'a Object) -> Result<Self> {
        match obj {
            Object::Stream(stream) => Ok(ContentNode::Leaf(stream)),
            Object::Array(items) => Ok(ContentNode::Array(items)),
            Object::Reference(id) => Ok(ContentNode::Reference(*id)),
            other => Err(OverlayError::Structural(format!(
                "Contents are unknown type: {}",
                type_name(other)
            ))),
        }
    }
}

/// A leaf content stream, with the object id it was reached through if it
/// is an indirect object.
pub(crate) struct ContentLeaf<'a> {
    pub id: Option<ObjectId>,
    pub stream: &'a Stream,
}

/// Depth-first, left-to-right list of the leaf streams under `contents`.
/// A missing or null value has no leaves.
pub(crate) fn flatten_contents<'a>(
    doc: &'a Document,
    contents: Option<&'a Object>,
) -> Result<Vec<ContentLeaf<'a>>> {
    let mut leaves = Vec::new();
    match contents {
        None | Some(Object::Null) => {}
        Some(obj) => walk(doc, obj, None, &mut Vec::new(), &mut leaves)?,
    }
    Ok(leaves)
}

fn walk<'a>(
    doc: &'a Document,
    obj: &'a Object,
    id: Option<ObjectId>,
    path: &mut Vec<ObjectId>,
    out: &mut Vec<ContentLeaf<'a>>,
) -> Result<()> {
    match ContentNode::classify(obj)? {
        ContentNode::Leaf(stream) => out.push(ContentLeaf { id, stream }),
        ContentNode::Array(items) => {
            for item in items {
                walk(doc, item, None, path, out)?;
            }
        }
        ContentNode::Reference(target) => {
            if path.contains(&target) {
                return Err(OverlayError::Structural(format!(
                    "Contents reference cycle through {} {} R",
                    target.0, target.1
                )));
            }
            path.push(target);
            walk(doc, doc.get_object(target)?, Some(target), path, out)?;
            path.pop();
        }
    }
    Ok(())
}

/// A page reduced to what an overlay needs: its MediaBox, all of its content
/// as one compressed stream, and its resources.
///
/// A `LayoutPage` owns copies of every indirect object its resources point
/// to, so it outlives the document it was read from and can be applied to
/// any number of target documents. It is never modified after creation.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    media_box: Rect,
    content: Stream,
    resources: Dictionary,
    objects: BTreeMap<ObjectId, Object>,
}

impl LayoutPage {
    /// Normalizes one page of `doc`. The document is only read.
    pub fn from_page(doc: &Document, page_id: ObjectId) -> Result<LayoutPage> {
        let media_box = Rect::media_box_of(doc, page_id)?;
        let resources = effective_resources(doc, page_id)?;
        let contents = doc.get_object(page_id)?.as_dict()?.get(b"Contents").ok();

        let leaves = flatten_contents(doc, contents)?;
        let mut concat = Vec::new();
        for leaf in &leaves {
            let bytes = plain_bytes(leaf.stream)?;
            debug!(id = ?leaf.id, len = bytes.len(), "appending content stream");
            concat.extend_from_slice(&bytes);
        }
        let content = deflate_stream(Dictionary::new(), &concat)?;

        let objects = collect_closure(doc, &Object::Dictionary(resources.clone()))?;
        info!(
            ?page_id,
            streams = leaves.len(),
            bytes = concat.len(),
            resource_objects = objects.len(),
            "normalized overlay page"
        );

        Ok(LayoutPage { media_box, content, resources, objects })
    }

    /// Normalizes the first page of `doc`; any further pages are ignored.
    pub fn from_first_page(doc: &Document) -> Result<LayoutPage> {
        let first = doc.get_pages().values().next().copied().ok_or(OverlayError::NoPages)?;
        LayoutPage::from_page(doc, first)
    }

    pub fn media_box(&self) -> Rect {
        self.media_box
    }

    /// The compressed content stream.
    pub fn content(&self) -> &Stream {
        &self.content
    }

    /// The decompressed content bytes.
    pub fn content_bytes(&self) -> Result<Vec<u8>> {
        plain_bytes(&self.content)
    }

    pub fn resources(&self) -> &Dictionary {
        &self.resources
    }

    /// Indirect objects reachable from the resources, keyed by their id in
    /// the source document.
    pub fn objects(&self) -> &BTreeMap<ObjectId, Object> {
        &self.objects
    }
}
