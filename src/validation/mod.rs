//! Message validation
//!
//! Pure functions deciding whether inbound chat payloads may be relayed.
//! They never emit anything themselves.

mod image;
mod text;

pub use image::{
    estimated_decoded_size, has_allowed_prefix, validate_image, ImageRejection,
    ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES,
};
pub use text::{escape_html, is_truthy, sanitize_text, MAX_TEXT_CHARS};
