//! Text overlays: a block of Helvetica text on an otherwise empty page.

use lopdf::{Dictionary, Document, Object, dictionary};
use pdf_writer::{Content, Name, Str};

use crate::codec::deflate_stream;
use crate::config::{TextAlign, TextStyle};
use crate::error::Result;
use crate::geometry::Rect;
use crate::layout_page::LayoutPage;
use crate::text::{SAFE_FOR_FONT, remove_unsupported_characters, transliterate, wordwrap};

const FONT_NAME: &[u8] = b"F1";

// Helvetica (WinAnsi, 32..126) widths in 1/1000 em
const HELV_W_32_126: [i16; 95] = [
    278,278,355,556,556,889,667,191,333,333,389,584,278,333,278,278,
    556,556,556,556,556,556,556,556,556,556,278,278,584,584,584,556,
    1015,667,667,722,722,667,611,778,722,278,500,667,556,833,722,778,
    667,778,722,667,611,722,667,944,667,667,611,278,278,278,469,556,
    333,556,556,500,556,556,278,556,556,222,222,500,222,833,556,556,
    556,556,333,500,278,556,500,722,500,500,500,334,260,334,584,
];

/// Width of `text` set in Helvetica at `font_size`.
pub fn string_width(text: &str, font_size: f32) -> f32 {
    let w1000: f32 = text
        .bytes()
        .map(|b| {
            if (32..=126).contains(&b) {
                HELV_W_32_126[(b - 32) as usize] as f32
            } else {
                600.0
            }
        })
        .sum();
    w1000 * font_size / 1000.0
}

/// The x offset that centers `text` on a page `page_width` wide.
pub fn center_x_of_string(text: &str, font_size: f32, page_width: f32) -> f32 {
    (page_width - string_width(text, font_size)) / 2.0
}

/// A text overlay, laid out from the top of the page.
#[derive(Debug, Clone)]
pub struct TextStamp {
    text: String,
    style: TextStyle,
    page: Rect,
}

impl TextStamp {
    pub fn new(text: impl Into<String>, style: TextStyle, page: Rect) -> Self {
        TextStamp { text: text.into(), style, page }
    }

    /// The lines that will be drawn: transliterated, reduced to characters
    /// the font can show, then wrapped.
    pub fn lines(&self) -> Vec<String> {
        let safe = transliterate(&self.text, &SAFE_FOR_FONT);
        let cleaned: Vec<String> = safe.split('\n').map(remove_unsupported_characters).collect();
        wordwrap(&cleaned.join("\n"), self.style.line_length)
    }

    /// Content stream operators for the text block.
    pub fn content(&self) -> Vec<u8> {
        let [r, g, b] = self.style.color;
        let size = self.style.font_size;
        let top = self.page.y1 - self.style.margin - size;

        let mut content = Content::new();
        for (i, line) in self.lines().iter().enumerate() {
            let x = match self.style.align {
                TextAlign::Left => self.page.x0 + self.style.margin,
                TextAlign::Center => self.page.x0 + center_x_of_string(line, size, self.page.width()),
            };
            let y = top - i as f32 * self.style.leading;
            content
                .begin_text()
                .set_font(Name(FONT_NAME), size)
                .set_stroke_rgb(r, g, b)
                .set_fill_rgb(r, g, b)
                .next_line(x, y)
                .show(Str(line.as_bytes()))
                .end_text();
        }
        content.finish()
    }

    /// A one-page document carrying the text block.
    pub fn to_document(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let contents_id = doc.add_object(deflate_stream(Dictionary::new(), &self.content())?);

        let mut fonts = Dictionary::new();
        fonts.set(FONT_NAME, font_id);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => self.page.to_object(),
            "Resources" => dictionary! { "Font" => fonts },
            "Contents" => contents_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }

    pub fn to_layout_page(&self) -> Result<LayoutPage> {
        LayoutPage::from_first_page(&self.to_document()?)
    }
}
