//! Opaque, URL-safe encoding of user ids for activation links.

use std::{num::ParseIntError, string::FromUtf8Error};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

#[derive(Debug, thiserror::Error)]
pub enum UidError {
    #[error("uid is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("uid is not valid utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("uid does not hold a user id: {0}")]
    NotAnId(#[from] ParseIntError),
}

/// URL-safe base64 (no padding) of the decimal id.
pub fn encode_uid(id: i32) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

/// Padding is tolerated so links produced by padding encoders still resolve.
pub fn decode_uid(uid: &str) -> Result<i32, UidError> {
    let bytes = URL_SAFE_NO_PAD.decode(uid.trim_end_matches('='))?;
    let decoded = String::from_utf8(bytes)?;
    Ok(decoded.parse::<i32>()?)
}
