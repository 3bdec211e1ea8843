// HTML to plain text.
//
// Feed summaries often carry markup. Tags are removed without inserting any
// separator (adjacent text nodes are concatenated), script/style bodies and
// comments are dropped, and the common character references are decoded.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("script/style pattern is valid")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z/!?][^>]*>").expect("tag pattern is valid"));

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#).expect("img pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z]{2,8});")
        .expect("entity pattern is valid")
});

/// Strip markup from `text`, returning its visible text.
///
/// Plain text passes through unchanged (apart from entity decoding), so it's
/// safe to call on descriptions that may or may not be HTML.
pub fn strip_html(text: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(text, "");
    let without_comments = COMMENT.replace_all(&without_blocks, "");
    let without_tags = TAG.replace_all(&without_comments, "");
    decode_entities(&without_tags)
}

/// Source of the first `<img>` element in an HTML fragment, if any.
pub fn first_image_src(html: &str) -> Option<String> {
    let caps = IMG_SRC.captures(html)?;
    let src = decode_entities(caps.get(1)?.as_str().trim());
    if src.is_empty() {
        None
    } else {
        Some(src)
    }
}

/// Decode named (common subset) and numeric character references.
/// Unknown references are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            match decode_entity(body) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "laquo" => '«',
        "raquo" => '»',
        "rsquo" => '’',
        "lsquo" => '‘',
        "rdquo" => '”',
        "ldquo" => '“',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "eacute" => 'é',
        "egrave" => 'è',
        "ecirc" => 'ê',
        "agrave" => 'à',
        "acirc" => 'â',
        "ccedil" => 'ç',
        "ocirc" => 'ô',
        "ucirc" => 'û',
        "ugrave" => 'ù',
        "icirc" => 'î',
        "iuml" => 'ï',
        "euro" => '€',
        _ => return None,
    };
    Some(c)
}
