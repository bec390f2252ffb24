//! Image payload validation
//!
//! Images travel as data URIs and are relayed as opaque strings. Only the
//! prefix and an estimated decoded size are checked; nothing is decoded.

use serde_json::Value;
use thiserror::Error;

/// Ceiling on the estimated decoded image size (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Image subtypes accepted in the `data:image/<type>;base64,` prefix
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["png", "jpeg", "jpg", "webp"];

const DATA_URI_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

/// Why an image payload was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRejection {
    #[error("image payload is not a string")]
    NotAString,

    #[error("image payload is not a png/jpeg/jpg/webp base64 data URI")]
    BadPrefix,

    #[error("estimated image size {estimated} bytes exceeds {max} bytes")]
    TooLarge { estimated: usize, max: usize },
}

/// Validate a raw `image` value
///
/// On success the original string is returned unchanged.
pub fn validate_image(raw: &Value) -> Result<&str, ImageRejection> {
    let Value::String(data) = raw else {
        return Err(ImageRejection::NotAString);
    };

    if !has_allowed_prefix(data) {
        return Err(ImageRejection::BadPrefix);
    }

    let estimated = estimated_decoded_size(data);
    if estimated > MAX_IMAGE_BYTES {
        return Err(ImageRejection::TooLarge {
            estimated,
            max: MAX_IMAGE_BYTES,
        });
    }

    Ok(data.as_str())
}

/// Anchored, case-sensitive match of `data:image/(png|jpeg|jpg|webp);base64,`
pub fn has_allowed_prefix(data: &str) -> bool {
    let Some(rest) = data.strip_prefix(DATA_URI_PREFIX) else {
        return false;
    };

    ALLOWED_IMAGE_TYPES.iter().any(|kind| {
        rest.strip_prefix(kind)
            .is_some_and(|tail| tail.starts_with(BASE64_MARKER))
    })
}

/// `floor(len * 3 / 4)` over the whole string, prefix included, where
/// `len` is the UTF-8 byte length (not the character count)
///
/// An approximation of the decoded size; padding is not accounted for.
/// Non-ASCII input counts every byte, so it is estimated larger than its
/// character count would suggest.
pub fn estimated_decoded_size(data: &str) -> usize {
    data.len().saturating_mul(3) / 4
}
