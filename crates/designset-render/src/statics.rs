//! Static design-set files (stylesheets, scripts, images).

use designset_core::encoding;
use tracing::debug;

use crate::{
    designset::DesignSet,
    error::{RenderError, Result},
    fileset::extension,
};

/// A file ready to be sent to a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
    /// MIME type for the `Content-Type` header.
    pub content_type: &'static str,
    /// Response body.
    pub body: Vec<u8>,
}

/// MIME type for a design-set path and whether the body is text that
/// should be normalised to UTF-8.
#[must_use]
pub fn content_type_for(path: &str) -> (&'static str, bool) {
    match extension(path).as_deref() {
        Some("css") => ("text/css; charset=utf-8", true),
        Some("js") => ("application/javascript; charset=utf-8", true),
        Some("jpg" | "jpeg") => ("image/jpeg", false),
        Some("png") => ("image/png", false),
        Some("gif") => ("image/gif", false),
        Some("svg") => ("image/svg+xml", false),
        _ => ("application/octet-stream", false),
    }
}

/// Load a design-set relative file for serving.
pub fn load_static(design_set: &DesignSet, rel: &str) -> Result<StaticAsset> {
    let bytes = design_set
        .read(rel)
        .ok_or_else(|| RenderError::FileNotFound(format!("{}/{rel}", design_set.name())))?;

    let (content_type, is_text) = content_type_for(rel);
    let body = if is_text {
        encoding::to_utf8(&bytes).into_bytes()
    } else {
        bytes.into_owned()
    };

    debug!(designset = %design_set.name(), path = rel, content_type, "serving static file");
    Ok(StaticAsset { content_type, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::FileSet;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("standard/css/a.CSS").0, "text/css; charset=utf-8");
        assert_eq!(content_type_for("img/logo.jpeg").0, "image/jpeg");
        assert_eq!(content_type_for("img/logo.svg").0, "image/svg+xml");
        assert_eq!(content_type_for("fonts/a.woff2").0, "application/octet-stream");
    }

    #[test]
    fn test_text_is_normalised_and_images_verbatim() {
        let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode("/* ｶﾀｶﾅ見出し */");
        let png = vec![0x89, b'P', b'N', b'G', 0xff, 0x00];
        let ds = DesignSet::new(
            "shop",
            FileSet::memory([
                ("shop/standard/css/common.css".to_string(), sjis.into_owned()),
                ("shop/img/logo.png".to_string(), png.clone()),
            ]),
        );

        let css = load_static(&ds, "standard/css/common.css").unwrap();
        assert_eq!(css.content_type, "text/css; charset=utf-8");
        assert_eq!(String::from_utf8(css.body).unwrap(), "/* ｶﾀｶﾅ見出し */");

        let image = load_static(&ds, "img/logo.png").unwrap();
        assert_eq!(image.body, png);

        let err = load_static(&ds, "standard/css/missing.css").unwrap_err();
        assert!(err.is_not_found());
    }
}
