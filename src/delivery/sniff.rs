//! # Content Sniffing
//!
//! Determines the true MIME type from leading magic bytes. Stored and
//! client-supplied extensions are never trusted: legacy uploads were
//! renamed freely and their extensions routinely lie about content.

/// A sniffed content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedType {
    pub mime: &'static str,
    pub extension: &'static str,
}

const FALLBACK: SniffedType = SniffedType {
    mime: "application/octet-stream",
    extension: "bin",
};

/// Sniff the MIME type of `data` from its magic bytes.
///
/// Covers the formats patterns are uploaded in (PDF plus the common raster
/// formats, and ZIP for bundled projector files). Anything unrecognized
/// falls back to `application/octet-stream`.
pub fn sniff(data: &[u8]) -> SniffedType {
    const TABLE: &[(&[u8], SniffedType)] = &[
        (b"%PDF", SniffedType { mime: "application/pdf", extension: "pdf" }),
        (b"\x89PNG\r\n\x1a\n", SniffedType { mime: "image/png", extension: "png" }),
        (b"\xFF\xD8\xFF", SniffedType { mime: "image/jpeg", extension: "jpg" }),
        (b"GIF87a", SniffedType { mime: "image/gif", extension: "gif" }),
        (b"GIF89a", SniffedType { mime: "image/gif", extension: "gif" }),
        (b"II*\x00", SniffedType { mime: "image/tiff", extension: "tiff" }),
        (b"MM\x00*", SniffedType { mime: "image/tiff", extension: "tiff" }),
        (b"BM", SniffedType { mime: "image/bmp", extension: "bmp" }),
        (b"PK\x03\x04", SniffedType { mime: "application/zip", extension: "zip" }),
    ];

    // WEBP: RIFF container with a WEBP tag at offset 8
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return SniffedType { mime: "image/webp", extension: "webp" };
    }

    for (magic, sniffed) in TABLE {
        if data.starts_with(magic) {
            return *sniffed;
        }
    }

    FALLBACK
}
