//! Stamp one overlay page (letterhead, watermark, stamp) onto every page of a
//! PDF by rewriting page content streams, keeping the original vector content
//! untouched.
//!
//! ```no_run
//! use pdf_overlay::{LayoutPage, overlay_document};
//! use lopdf::Document;
//!
//! let letterhead = Document::load("letterhead.pdf")?;
//! let overlay = LayoutPage::from_first_page(&letterhead)?;
//!
//! let mut target = Document::load("report.pdf")?;
//! overlay_document(&mut target, &overlay)?;
//! target.save("report.stamped.pdf")?;
//! # Ok::<(), pdf_overlay::OverlayError>(())
//! ```

mod codec;
pub use codec::{content_stream, deflate_stream, plain_bytes};

pub mod config;

mod error;
pub use error::*;

mod geometry;
pub use geometry::*;

mod layout_page;
pub use layout_page::LayoutPage;

mod number;
pub use number::format_coordinate;

mod objects;

mod overlay;
pub use overlay::*;

mod source;
pub use source::{load_overlay, svg_to_document};

mod template;
pub use template::Template;

pub mod text;

mod text_stamp;
pub use text_stamp::*;

pub use lopdf;
