//! Character encoding detection and normalisation.
//!
//! Design sets in this ecosystem mix UTF-8 files with legacy Japanese
//! encodings (EUC-JP is the historical default, Shift_JIS and ISO-2022-JP
//! also appear). Everything handed to the template engine and everything
//! sent to clients is normalised to UTF-8 first.

use std::{borrow::Cow, fmt, str::FromStr, sync::LazyLock};

use regex::bytes::Regex;
use tracing::debug;

/// Character encodings recognised in design-set files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    EucJp,
    Sjis,
    Ascii,
    Jis,
}

impl Encoding {
    /// Canonical display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::EucJp => "EUC-JP",
            Self::Sjis => "SJIS",
            Self::Ascii => "ASCII",
            Self::Jis => "JIS",
        }
    }

    /// The `encoding_rs` codec backing this encoding.
    ///
    /// ASCII maps to UTF-8 since it is a strict subset.
    fn codec(self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 | Self::Ascii => encoding_rs::UTF_8,
            Self::EucJp => encoding_rs::EUC_JP,
            Self::Sjis => encoding_rs::SHIFT_JIS,
            Self::Jis => encoding_rs::ISO_2022_JP,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an encoding label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown encoding label: {0}")]
pub struct UnknownEncoding(pub String);

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase().replace('_', "-");
        match label.as_str() {
            "UTF-8" | "UTF8" => Ok(Self::Utf8),
            "EUC-JP" | "EUCJP" | "EUC" | "EUCJP-WIN" => Ok(Self::EucJp),
            "SJIS" | "SHIFT-JIS" | "SJIS-WIN" | "CP932" | "WINDOWS-31J" => Ok(Self::Sjis),
            "ASCII" | "US-ASCII" => Ok(Self::Ascii),
            "JIS" | "ISO-2022-JP" => Ok(Self::Jis),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const ISO_2022_JP_ESCAPES: [&[u8]; 4] = [b"\x1B$@", b"\x1B$B", b"\x1B(J", b"\x1B(B"];

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#)
        .expect("meta charset pattern is valid")
});

/// Detect the encoding of raw file content.
///
/// Content-based detection runs first. When it cannot single out one
/// encoding the UTF-8 byte-order mark, then an HTML `<meta charset>`
/// declaration decide, and EUC-JP is assumed if neither is present.
#[must_use]
pub fn detect(bytes: &[u8]) -> Encoding {
    if let Some(encoding) = detect_by_content(bytes) {
        return encoding;
    }

    if bytes.starts_with(UTF8_BOM) {
        return Encoding::Utf8;
    }

    if let Some(encoding) = detect_by_meta(bytes) {
        return encoding;
    }

    debug!(len = bytes.len(), "encoding inconclusive, assuming EUC-JP");
    Encoding::EucJp
}

fn detect_by_content(bytes: &[u8]) -> Option<Encoding> {
    if bytes.is_ascii() {
        let has_escape = ISO_2022_JP_ESCAPES
            .iter()
            .any(|seq| bytes.windows(seq.len()).any(|w| w == *seq));
        return Some(if has_escape {
            Encoding::Jis
        } else {
            Encoding::Ascii
        });
    }

    if std::str::from_utf8(bytes).is_ok() {
        return Some(Encoding::Utf8);
    }

    let euc = decodes_cleanly(encoding_rs::EUC_JP, bytes);
    let sjis = decodes_cleanly(encoding_rs::SHIFT_JIS, bytes);
    match (euc, sjis) {
        (true, false) => Some(Encoding::EucJp),
        (false, true) => Some(Encoding::Sjis),
        _ => None,
    }
}

fn decodes_cleanly(codec: &'static encoding_rs::Encoding, bytes: &[u8]) -> bool {
    codec
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
}

fn detect_by_meta(bytes: &[u8]) -> Option<Encoding> {
    let caps = META_CHARSET.captures(bytes)?;
    let charset = String::from_utf8_lossy(&caps[1]).to_ascii_uppercase();

    if charset.contains("EUC") {
        Some(Encoding::EucJp)
    } else if charset.contains("UTF-8") {
        Some(Encoding::Utf8)
    } else if charset.contains("SHIFT_JIS") || charset.contains("SJIS") {
        Some(Encoding::Sjis)
    } else {
        None
    }
}

/// Transcode `bytes` from one encoding to another.
///
/// Never fails: if the input is not valid in `from`, or cannot be
/// represented in `to`, the original bytes are returned unchanged.
#[must_use]
pub fn convert(bytes: &[u8], from: Encoding, to: Encoding) -> Cow<'_, [u8]> {
    if from == to || (from.codec() == to.codec() && to != Encoding::Ascii) {
        return Cow::Borrowed(bytes);
    }

    let Some(decoded) = from
        .codec()
        .decode_without_bom_handling_and_without_replacement(bytes)
    else {
        debug!(%from, %to, "transcoding failed, keeping original bytes");
        return Cow::Borrowed(bytes);
    };

    match to {
        Encoding::Utf8 => Cow::Owned(decoded.into_owned().into_bytes()),
        Encoding::Ascii if decoded.is_ascii() => Cow::Owned(decoded.into_owned().into_bytes()),
        Encoding::Ascii => Cow::Borrowed(bytes),
        _ => {
            let (encoded, _, unmappable) = to.codec().encode(&decoded);
            if unmappable {
                debug!(%from, %to, "unmappable characters, keeping original bytes");
                Cow::Borrowed(bytes)
            } else {
                Cow::Owned(encoded.into_owned())
            }
        }
    }
}

/// Detect the encoding of `bytes` and return the content as UTF-8 text.
///
/// Bytes that still are not valid UTF-8 after conversion are replaced
/// with U+FFFD, so the result is always usable.
#[must_use]
pub fn to_utf8(bytes: &[u8]) -> String {
    let encoding = detect(bytes);
    let converted = convert(bytes, encoding, Encoding::Utf8);
    let text = String::from_utf8_lossy(&converted);
    text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string()
}
