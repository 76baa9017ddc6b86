use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{CutoutError, CutoutResult};

pub use kurbo::{Point, Rect};

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red, premultiplied.
    pub r: u8,
    /// Green, premultiplied.
    pub g: u8,
    /// Blue, premultiplied.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8Premul {
    /// Premultiply a straight-alpha colour.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Channel array in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// An uploaded image file: name, declared content type and the raw encoded bytes.
///
/// Cloning is cheap and shares the byte buffer. Two handles refer to "the same file" when they
/// share that buffer (see [`SourceFile::same_bytes`]).
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// File name sent as the multipart filename.
    pub name: String,
    /// MIME type sent with the multipart part.
    pub content_type: String,
    bytes: Arc<Vec<u8>>,
}

impl SourceFile {
    /// Wrap encoded bytes.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Read a file from disk, inferring the content type from its extension.
    pub fn from_path(path: &Path) -> CutoutResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CutoutError::validation("image path has no file name"))?
            .to_string();
        let content_type = content_type_for_name(&name);
        Ok(Self::new(name, content_type, bytes))
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Size of the encoded bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when both handles share one byte buffer.
    pub fn same_bytes(&self, other: &SourceFile) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

/// Guess a MIME type from a file name's extension.
pub fn content_type_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
