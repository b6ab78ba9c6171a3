use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{OverlayError, Result};
use crate::objects::{inherited, resolve, type_name};

/// US Letter, used when a page tree carries no MediaBox at all.
pub const DEFAULT_MEDIA_BOX: Rect = Rect { x0: 0.0, y0: 0.0, x1: 612.0, y1: 792.0 };

/// A page rectangle in default user space units, lower-left to upper-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Builds a rectangle from any two opposite corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Same size, moved so the lower-left corner sits on the origin.
    pub fn retranslated(&self) -> Rect {
        Rect { x0: 0.0, y0: 0.0, x1: self.width(), y1: self.height() }
    }

    /// Reads a `[x0 y0 x1 y1]` array, resolving indirect numbers.
    pub fn from_object(doc: &Document, obj: &Object) -> Result<Rect> {
        let arr = resolve(doc, obj)?.as_array()?;
        if arr.len() != 4 {
            return Err(OverlayError::Structural(format!(
                "rectangle has {} entries, expected 4",
                arr.len()
            )));
        }
        let mut v = [0f32; 4];
        for (slot, item) in v.iter_mut().zip(arr) {
            *slot = as_f32(resolve(doc, item)?).ok_or_else(|| {
                OverlayError::Structural(format!(
                    "rectangle entry is {}, expected a number",
                    type_name(item)
                ))
            })?;
        }
        Ok(Rect::new(v[0], v[1], v[2], v[3]))
    }

    pub fn to_object(&self) -> Object {
        Object::Array(vec![self.x0.into(), self.y0.into(), self.x1.into(), self.y1.into()])
    }

    /// The MediaBox of a page, walking up the `/Parent` chain.
    pub fn media_box_of(doc: &Document, page_id: ObjectId) -> Result<Rect> {
        match inherited(doc, page_id, b"MediaBox")? {
            Some(obj) => Rect::from_object(doc, obj),
            None => {
                warn!(?page_id, "page has no MediaBox, using US Letter");
                Ok(DEFAULT_MEDIA_BOX)
            }
        }
    }
}

fn as_f32(n: &Object) -> Option<f32> {
    match n {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
