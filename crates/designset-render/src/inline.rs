//! Asset inlining.
//!
//! [`generate_inline_block`] collects a template's stylesheets and scripts
//! into one fragment; [`splice`] drops the same-origin references from the
//! rendered page, upgrades protocol-relative references to https and places
//! the fragment in the document head.

use std::{collections::BTreeMap, fmt::Write, sync::LazyLock};

use designset_core::encoding;
use regex::{Captures, Regex};
use tracing::debug;

use crate::{designset::DesignSet, fileset::file_stem};

static LOCAL_STYLESHEET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]*href=["']([^"']*\.css)["'][^>]*>"#)
        .expect("stylesheet pattern is valid")
});

static LOCAL_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<script[^>]*src=["']([^"']*\.js)["'][^>]*></script>"#)
        .expect("script pattern is valid")
});

static PROTOCOL_RELATIVE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<link[^>]*href=["'])//([^"']*["'][^>]*>)"#)
        .expect("protocol-relative link pattern is valid")
});

static PROTOCOL_RELATIVE_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<script[^>]*src=["'])//([^"']*["'][^>]*></script>)"#)
        .expect("protocol-relative script pattern is valid")
});

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head>").expect("head pattern is valid"));

static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[^>]*>").expect("html pattern is valid"));

#[derive(Clone, Copy)]
enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::Css => "standard/css",
            Self::Js => "standard/js",
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    const fn open_tag(self) -> &'static str {
        match self {
            Self::Css => "<style type=\"text/css\">",
            Self::Js => "<script type=\"text/javascript\">",
        }
    }

    const fn close_tag(self) -> &'static str {
        match self {
            Self::Css => "</style>",
            Self::Js => "</script>",
        }
    }
}

/// Asset file names in inlining order: `common`, then the template's own
/// file, then every other file in the directory. No name appears twice.
fn ordered_assets(design_set: &DesignSet, kind: AssetKind, stem: &str) -> Vec<(String, String)> {
    let mut available: BTreeMap<String, String> = design_set.list(kind.dir(), kind.extension());
    let mut ordered = Vec::with_capacity(available.len());

    for preferred in [
        format!("common.{}", kind.extension()),
        format!("{stem}.{}", kind.extension()),
    ] {
        if let Some(path) = available.remove(&preferred) {
            ordered.push((preferred, path));
        }
    }
    ordered.extend(available);
    ordered
}

/// Build the `<style>`/`<script>` fragment for a template.
///
/// Returns an empty string when the design set has no stylesheets or
/// scripts.
#[must_use]
pub fn generate_inline_block(design_set: &DesignSet, template: &str) -> String {
    let stem = file_stem(template);
    let mut block = String::new();

    for kind in [AssetKind::Css, AssetKind::Js] {
        for (name, path) in ordered_assets(design_set, kind, stem) {
            let Some(bytes) = design_set.files().read(&path) else {
                continue;
            };
            let content = encoding::to_utf8(&bytes);
            let _ = write!(
                block,
                "{}\n/* {name} */\n{content}\n{}\n",
                kind.open_tag(),
                kind.close_tag()
            );
            debug!(designset = %design_set.name(), asset = %path, "inlined asset");
        }
    }

    block
}

fn is_external(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Splice an inline fragment into rendered HTML.
///
/// Same-origin stylesheet links and script tags are removed; absolute and
/// protocol-relative references stay, the latter rewritten to `https://`.
/// The fragment goes before the first `</head>`, else into a new head after
/// `<html ...>`, else into a new head at the very start.
#[must_use]
pub fn splice(html: &str, fragment: &str) -> String {
    let keep_external = |caps: &Captures<'_>| {
        if is_external(&caps[1]) {
            caps[0].to_string()
        } else {
            String::new()
        }
    };

    let html = LOCAL_STYLESHEET.replace_all(html, keep_external);
    let html = LOCAL_SCRIPT.replace_all(&html, keep_external);
    let html = PROTOCOL_RELATIVE_LINK.replace_all(&html, "${1}https://${2}");
    let html = PROTOCOL_RELATIVE_SCRIPT
        .replace_all(&html, "${1}https://${2}")
        .into_owned();

    // Only the first `</head>` receives the fragment; later ones are left as is.
    if let Some(m) = HEAD_CLOSE.find(&html) {
        let mut out = String::with_capacity(html.len() + fragment.len() + 1);
        out.push_str(&html[..m.start()]);
        out.push_str(fragment);
        out.push('\n');
        out.push_str(&html[m.start()..]);
        return out;
    }

    if let Some(m) = HTML_OPEN.find(&html) {
        let mut out = String::with_capacity(html.len() + fragment.len() + 18);
        out.push_str(&html[..m.end()]);
        out.push_str("\n<head>\n");
        out.push_str(fragment);
        out.push_str("\n</head>");
        out.push_str(&html[m.end()..]);
        return out;
    }

    format!("<head>\n{fragment}\n</head>\n{html}")
}
