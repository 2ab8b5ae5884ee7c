//! Storefront text filters registered with the template engine.
//!
//! Arguments mirror the storefront template language: `cut_html(40, "…")`,
//! `number_format(2)`, `escape("url")` and so on. Every filter accepts any
//! value and stringifies it; undefined and none render as empty text.

use std::sync::LazyLock;

use minijinja::{Environment, Value, value::ValueKind};
use regex::Regex;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n\r|\n|\r").expect("line break pattern is valid"));

/// Register every filter on `env`. `escape` replaces the engine builtin.
pub fn register(env: &mut Environment<'_>) {
    env.add_filter("cut_html", cut_html);
    env.add_filter("number_format", number_format);
    env.add_filter("count", count);
    env.add_filter("nl2br", nl2br);
    env.add_filter("escape", escape);
}

fn text(value: &Value) -> String {
    if value.is_undefined() || value.is_none() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Strip tags, then truncate to `length` characters and append `etc`.
pub fn cut_html(value: Value, length: Option<usize>, etc: Option<String>) -> String {
    let length = length.unwrap_or(100);
    let stripped = TAG.replace_all(&text(&value), "").into_owned();

    if stripped.chars().count() <= length {
        return stripped;
    }
    let mut cut: String = stripped.chars().take(length).collect();
    cut.push_str(etc.as_deref().unwrap_or("..."));
    cut
}

/// Group digits of a numeric value; non-numeric input is returned as text.
pub fn number_format(
    value: Value,
    decimals: Option<usize>,
    dec_point: Option<String>,
    thousands_sep: Option<String>,
) -> String {
    let number = match value.kind() {
        ValueKind::Number => f64::try_from(value.clone()).ok(),
        ValueKind::String => value.as_str().and_then(|s| s.trim().parse::<f64>().ok()),
        _ => None,
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        return text(&value);
    };

    format_number(
        number,
        decimals.unwrap_or(0),
        dec_point.as_deref().unwrap_or("."),
        thousands_sep.as_deref().unwrap_or(","),
    )
}

/// Upper bound on requested decimal places.
const MAX_DECIMALS: usize = 50;

/// Largest magnitude at which every integer is exact in an `f64`.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

fn format_number(number: f64, decimals: usize, dec_point: &str, thousands_sep: &str) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(0));
    let scaled = number.abs() * factor;
    // Round half away from zero while the scaled value still has a fraction;
    // beyond that the formatter's own rounding is exact.
    let rounded = if scaled < EXACT_INTEGER_LIMIT {
        scaled.round() / factor
    } else {
        number.abs()
    };
    let fixed = format!("{rounded:.decimals$}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(fixed.len() + digits.len() / 3 * thousands_sep.len() + 1);
    if number.is_sign_negative() && rounded != 0.0 {
        out.push('-');
    }
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(thousands_sep);
        }
        out.push(*digit);
    }
    if decimals > 0 {
        out.push_str(dec_point);
        out.push_str(frac_part);
    }
    out
}

/// Length of a sequence or map; zero for anything else.
pub fn count(value: Value) -> usize {
    match value.kind() {
        ValueKind::Seq | ValueKind::Map => value.len().unwrap_or(0),
        _ => 0,
    }
}

/// Insert `<br />` before every line break, keeping the break itself.
pub fn nl2br(value: Value) -> String {
    LINE_BREAK.replace_all(&text(&value), "<br />${0}").into_owned()
}

/// Escape for an output context: `html` (default), `json`, `url`,
/// `javascript`/`js`. Unknown modes escape as html.
pub fn escape(value: Value, mode: Option<String>) -> String {
    let input = text(&value);
    match mode.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("json") => escape_json(&input),
        Some("url") => escape_url(&input),
        Some("javascript" | "js") => escape_js(&input),
        _ => escape_html(&input),
    }
}

/// Escape `& < > " '` for HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_json(input: &str) -> String {
    serde_json::to_string(input)
        .map(|quoted| quoted.replace('/', "\\/"))
        .unwrap_or_else(|_| input.to_string())
}

// Form encoding: space becomes `+`, only `-_.` and alphanumerics stay literal.
fn escape_url(input: &str) -> String {
    urlencoding::encode(input)
        .replace("%20", "+")
        .replace('~', "%7E")
}

fn escape_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_html() {
        let value = Value::from("<p>Hello <b>world</b></p>");
        assert_eq!(cut_html(value.clone(), None, None), "Hello world");
        assert_eq!(cut_html(value.clone(), Some(5), None), "Hello...");
        assert_eq!(cut_html(value, Some(5), Some("…".into())), "Hello…");
        let japanese = Value::from("日本語のテキスト");
        assert_eq!(cut_html(japanese, Some(3), None), "日本語...");
        assert_eq!(cut_html(Value::UNDEFINED, Some(3), None), "");
    }

    #[test]
    fn test_number_format() {
        assert_eq!(number_format(Value::from(1_234_567), None, None, None), "1,234,567");
        assert_eq!(number_format(Value::from(1234.5), Some(2), None, None), "1,234.50");
        assert_eq!(number_format(Value::from("9800"), None, None, None), "9,800");
        assert_eq!(
            number_format(Value::from(1234.5), Some(1), Some(",".into()), Some(".".into())),
            "1.234,5"
        );
        assert_eq!(number_format(Value::from(-1500), None, None, None), "-1,500");
        assert_eq!(number_format(Value::from(999.5), None, None, None), "1,000");
        assert_eq!(number_format(Value::from("free"), None, None, None), "free");
        assert_eq!(number_format(Value::from(-0.2), None, None, None), "0");
        assert_eq!(number_format(Value::from(2.5), None, None, None), "3");
    }

    #[test]
    fn test_number_format_extreme_inputs() {
        assert_eq!(
            number_format(Value::from(1234.5), Some(400), None, None),
            format!("1,234.5{}", "0".repeat(MAX_DECIMALS - 1))
        );

        let huge = number_format(Value::from(1e308), Some(2), None, None);
        assert!(huge.starts_with("100,000,000,000,000,001,097"));
        assert!(huge.ends_with(".00"));
        assert!(!huge.contains("inf") && !huge.contains("NaN"));
    }

    #[test]
    fn test_count() {
        assert_eq!(count(Value::from(vec![1, 2, 3])), 3);
        assert_eq!(count(Value::from_serialize(serde_json::json!({"a": 1, "b": 2}))), 2);
        assert_eq!(count(Value::from("abc")), 0);
        assert_eq!(count(Value::UNDEFINED), 0);
    }

    #[test]
    fn test_nl2br() {
        assert_eq!(nl2br(Value::from("a\nb")), "a<br />\nb");
        assert_eq!(nl2br(Value::from("a\r\nb\rc")), "a<br />\r\nb<br />\rc");
    }

    #[test]
    fn test_escape_modes() {
        let value = Value::from("<a href='x'>\"&\"</a>");
        assert_eq!(
            escape(value.clone(), None),
            "&lt;a href=&#039;x&#039;&gt;&quot;&amp;&quot;&lt;/a&gt;"
        );
        assert_eq!(escape(value.clone(), Some("unknown".into())), escape(value, None));

        assert_eq!(escape(Value::from("a b&c~"), Some("url".into())), "a+b%26c%7E");
        assert_eq!(escape(Value::from("it's \"x\""), Some("js".into())), "it\\'s \\\"x\\\"");
        assert_eq!(
            escape(Value::from("日本</script>"), Some("JSON".into())),
            "\"日本<\\/script>\""
        );
    }

    #[test]
    fn test_filters_in_environment() {
        let mut env = Environment::new();
        register(&mut env);
        let out = env
            .render_str(
                "{{ price|number_format }} {{ items|count }} {{ name|escape('url') }}",
                minijinja::context! { price => 12000, items => vec![1, 2], name => "a b" },
            )
            .unwrap();
        assert_eq!(out, "12,000 2 a+b");
    }
}
