//! Reading and writing content-stream bytes.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Object, Stream};

use crate::error::Result;

/// Compresses `bytes` into a new `/FlateDecode` stream carrying `dict`.
pub fn deflate_stream(mut dict: Dictionary, bytes: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    let compressed = encoder.finish()?;
    dict.set("Filter", "FlateDecode");
    Ok(Stream::new(dict, compressed))
}

/// A plain content stream holding `text`, compressed.
pub fn content_stream(text: &str) -> Result<Stream> {
    deflate_stream(Dictionary::new(), text.as_bytes())
}

/// The decoded bytes of a stream.
///
/// Flate chains without decode parameters are inflated here so a corrupt
/// stream fails with an I/O error instead of decoding short. Other filters
/// go through lopdf.
pub fn plain_bytes(stream: &Stream) -> Result<Vec<u8>> {
    let filters = filter_names(&stream.dict);
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }
    let flate_only = filters.iter().all(|f| f.as_slice() == b"FlateDecode");
    if flate_only && !stream.dict.has(b"DecodeParms") {
        let mut bytes = stream.content.clone();
        for _ in &filters {
            bytes = inflate(&bytes)?;
        }
        return Ok(bytes);
    }
    Ok(stream.decompressed_content()?)
}

/// `/Filter` as a list; absent, null and `[]` all mean no filter.
fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .map(|item| match item {
                Object::Name(name) => name.clone(),
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
