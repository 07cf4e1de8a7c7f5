//! Synthesized responses used when neither cache nor network can answer.

use offgrid_core::Snapshot;

/// A 1×1 fully transparent PNG.
pub const TRANSPARENT_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x04, 0x00, 0x00, 0x00, 0xb5, 0x1c, 0x0c, 0x02, 0x00, 0x00, 0x00, 0x0b, 0x49,
    0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0xfc, 0xff, 0x1f, 0x00, 0x03, 0x03, 0x02, 0x00, 0xee, 0x67, 0x17, 0xd9, 0x00,
    0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

pub const PLACEHOLDER_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// The placeholder image served for icon requests.
///
/// Always the same bytes and headers.
pub fn synthesize_placeholder() -> Snapshot {
    Snapshot::new(
        200,
        vec![
            ("content-type".into(), "image/png".into()),
            ("cache-control".into(), PLACEHOLDER_CACHE_CONTROL.into()),
        ],
        TRANSPARENT_PNG,
    )
}

/// Minimal HTML document for navigations with no network and no cached shell.
pub fn offline_document(html: &str) -> Snapshot {
    Snapshot::new(200, vec![("content-type".into(), "text/html".into())], html.to_string())
}
