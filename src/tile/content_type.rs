//! Content types for tile payloads.

/// PNG file signature.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// JPEG start-of-image marker.
const JPEG_SOI: &[u8] = &[0xFF, 0xD8];

/// Content type for a tile of the given (lowercased) cache format.
///
/// `MIXED` caches store PNG and JPEG tiles side by side, so the payload's
/// magic bytes decide. PNG variants (`png8`, `png24`, `png32`) all map to
/// `image/png`.
pub fn tile_content_type(format: &str, data: &[u8]) -> String {
    match format {
        "mixed" => sniff_content_type(data)
            .unwrap_or("application/octet-stream")
            .to_string(),
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        f if f.starts_with("png") => "image/png".to_string(),
        other => format!("image/{}", other),
    }
}

/// Identify a PNG or JPEG payload from its leading bytes.
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PNG_SIGNATURE) {
        Some("image/png")
    } else if data.starts_with(JPEG_SOI) {
        Some("image/jpeg")
    } else {
        None
    }
}
