//! Reversible text transforms applied to records before they hit the store.
//!
//! The only contract is `decode(encode(x)) == x`. None of the transforms
//! promise a size reduction.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::CodecError;

/// A lossless, reversible text-to-text transform.
pub trait TextTransform: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn encode(&self, text: &str) -> String;

    fn decode(&self, encoded: &str) -> Result<String, CodecError>;
}

/// Stores text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTransform;

impl TextTransform for PlainTransform {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn encode(&self, text: &str) -> String {
        text.to_string()
    }

    fn decode(&self, encoded: &str) -> Result<String, CodecError> {
        Ok(encoded.to_string())
    }
}

/// Base64 over the UTF-8 bytes. Grows the payload by a third.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Transform;

impl TextTransform for Base64Transform {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn encode(&self, text: &str) -> String {
        STANDARD.encode(text.as_bytes())
    }

    fn decode(&self, encoded: &str) -> Result<String, CodecError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| transform_error(self.name(), e))?;
        String::from_utf8(bytes).map_err(|e| transform_error(self.name(), e))
    }
}

/// LZ4 block compression with a size prefix, then base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Transform;

impl TextTransform for Lz4Transform {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn encode(&self, text: &str) -> String {
        STANDARD.encode(lz4_flex::compress_prepend_size(text.as_bytes()))
    }

    fn decode(&self, encoded: &str) -> Result<String, CodecError> {
        let compressed = STANDARD
            .decode(encoded)
            .map_err(|e| transform_error(self.name(), e))?;
        check_declared_len(&compressed).map_err(|e| transform_error(self.name(), e))?;
        let bytes = lz4_flex::decompress_size_prepended(&compressed)
            .map_err(|e| transform_error(self.name(), e))?;
        String::from_utf8(bytes).map_err(|e| transform_error(self.name(), e))
    }
}

/// LZ4 cannot expand a block by more than this factor.
const LZ4_MAX_RATIO: usize = 255;
/// Headroom for block framing on tiny or extremely repetitive inputs.
const LZ4_SLACK: usize = 64 * 1024;
/// Largest decoded record accepted, whatever the prefix claims.
const LZ4_MAX_DECODED: usize = 256 * 1024 * 1024;

/// Refuse size prefixes the payload could not possibly expand to, before
/// anything is allocated for them.
fn check_declared_len(compressed: &[u8]) -> Result<(), String> {
    let Some((prefix, body)) = compressed.split_first_chunk::<4>() else {
        return Err("missing size prefix".into());
    };
    let declared = u32::from_le_bytes(*prefix) as usize;
    let possible = body
        .len()
        .saturating_mul(LZ4_MAX_RATIO)
        .saturating_add(LZ4_SLACK)
        .min(LZ4_MAX_DECODED);
    if declared > possible {
        return Err(format!(
            "declared size {} exceeds {} possible from {} compressed bytes",
            declared,
            possible,
            body.len()
        ));
    }
    Ok(())
}

/// Configurable choice of built-in transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Plain,
    #[default]
    Base64,
    Lz4,
}

impl TransformKind {
    pub fn build(self) -> Box<dyn TextTransform> {
        match self {
            TransformKind::Plain => Box::new(PlainTransform),
            TransformKind::Base64 => Box::new(Base64Transform),
            TransformKind::Lz4 => Box::new(Lz4Transform),
        }
    }
}

fn transform_error(name: &'static str, err: impl std::fmt::Display) -> CodecError {
    CodecError::Transform {
        transform: name,
        message: err.to_string(),
    }
}
