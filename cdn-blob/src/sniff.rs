//! Content type detection from leading bytes.
//!
//! The stored content type is picked from what the bytes are, never from
//! the uploaded filename. Only the first [`SNIFF_LEN`] bytes are examined.

/// Number of leading bytes considered.
pub const SNIFF_LEN: usize = 512;

/// Fallback for unrecognised binary content.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// Exact prefix signatures, checked in order.
const PREFIXES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_UTF8),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b".snd", "audio/basic"),
    (b"OggS\x00", "application/ogg"),
    (b"MThd\x00\x00\x00\x06", "audio/midi"),
    (b"ID3", "audio/mpeg"),
    (b"fLaC", "audio/flac"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00asm", "application/wasm"),
    (b"<?xml", "text/xml; charset=utf-8"),
];

/// Container formats: (outer tag at 0, inner tag at 8, content type).
const RIFF_LIKE: &[(&[u8], &[u8], &str)] = &[
    (b"RIFF", b"WEBPVP", "image/webp"),
    (b"RIFF", b"AVI ", "video/avi"),
    (b"RIFF", b"WAVE", "audio/wave"),
    (b"FORM", b"AIFF", "audio/aiff"),
];

/// HTML openers, matched case-insensitively after leading whitespace and
/// followed by a space or `>`.
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Detect the content type of `data`.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(html) = sniff_html(data) {
        return html;
    }

    for (prefix, content_type) in PREFIXES {
        if data.starts_with(prefix) {
            return content_type;
        }
    }

    for (outer, inner, content_type) in RIFF_LIKE {
        if data.len() >= 8 + inner.len() && data.starts_with(outer) && &data[8..8 + inner.len()] == *inner {
            return content_type;
        }
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    if !data.is_empty() && !data.iter().any(|b| is_binary_byte(*b)) {
        return TEXT_UTF8;
    }

    OCTET_STREAM
}

fn sniff_html(data: &[u8]) -> Option<&'static str> {
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let data = &data[start..];

    for tag in HTML_TAGS {
        if data.len() <= tag.len() {
            continue;
        }
        if data[..tag.len()].eq_ignore_ascii_case(tag) && matches!(data[tag.len()], b' ' | b'>') {
            return Some("text/html; charset=utf-8");
        }
    }
    None
}

/// ISO base media: a box of declared size whose type is `ftyp` with an
/// `mp4`-family brand.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size < 12 || box_size % 4 != 0 || data.len() < box_size {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }

    // major brand at 8, then compatible brands from 16 in steps of 4
    let mut offset = 8;
    while offset + 3 <= box_size {
        if offset != 12 && &data[offset..offset + 3] == b"mp4" {
            return true;
        }
        offset += 4;
    }
    false
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_by_magic() {
        assert_eq!(sniff_content_type(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00"), "image/png");
        assert_eq!(sniff_content_type(b"\xFF\xD8\xFF\xE0\x00\x10JFIF"), "image/jpeg");
        assert_eq!(sniff_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff_content_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn media_and_archives() {
        assert_eq!(sniff_content_type(b"RIFF\x24\x00\x00\x00WAVEfmt "), "audio/wave");
        assert_eq!(sniff_content_type(b"ID3\x03\x00"), "audio/mpeg");
        assert_eq!(sniff_content_type(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(sniff_content_type(b"%PDF-1.7"), "application/pdf");
    }

    #[test]
    fn mp4_brand() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0, 0x18]);
        data.extend_from_slice(b"ftypisom");
        data.extend_from_slice(&[0, 0, 2, 0]);
        data.extend_from_slice(b"isommp41");
        assert_eq!(sniff_content_type(&data), "video/mp4");
    }

    #[test]
    fn html_is_case_insensitive_after_whitespace() {
        assert_eq!(sniff_content_type(b"  \n<html><body>"), "text/html; charset=utf-8");
        assert_eq!(sniff_content_type(b"<!doctype html>"), "text/html; charset=utf-8");
        assert_eq!(sniff_content_type(b"<Bogus>"), TEXT_UTF8);
    }

    #[test]
    fn text_and_binary_fallbacks() {
        assert_eq!(sniff_content_type(b"hello world\n"), TEXT_UTF8);
        assert_eq!(sniff_content_type(b"\x00\x01\x02\x03"), OCTET_STREAM);
        assert_eq!(sniff_content_type(b""), OCTET_STREAM);
    }

    #[test]
    fn filename_plays_no_part() {
        // a PNG is a PNG whatever it was called
        let png = b"\x89PNG\x0D\x0A\x1A\x0A";
        assert_eq!(sniff_content_type(png), "image/png");
    }
}
