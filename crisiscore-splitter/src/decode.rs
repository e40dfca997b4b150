//! Line decoding for the primary (UTF-8) pass and the fallback pass.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

/// Label of the fallback encoding used when none is configured explicitly.
pub const DEFAULT_FALLBACK_ENCODING: &str = "windows-1252";

/// Decodes raw line bytes with a single encoding, never substituting
/// replacement characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDecoder {
    encoding: &'static Encoding,
}

impl LineDecoder {
    /// The primary decoder.
    pub fn utf8() -> Self {
        Self { encoding: UTF_8 }
    }

    /// Look up a decoder by WHATWG label (`"latin1"`, `"windows-1252"`, `"shift_jis"`, ...).
    ///
    /// Returns `None` for unknown labels and for encodings that are not ASCII
    /// compatible, since lines are located by scanning for `\n` bytes.
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .filter(|encoding| encoding.is_ascii_compatible())
            .map(|encoding| Self { encoding })
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decode one line. `None` means the bytes are malformed for this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        if self.encoding == UTF_8 {
            std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
        } else {
            self.encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
        }
    }
}
