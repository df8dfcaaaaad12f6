use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h[1-3]\b[^>]*>(.*?)</h[1-3]>").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").unwrap());
static DEVICE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)deviceid=([0-9a-f]+)").unwrap());

/// Longest line still accepted as a sensor name.
const MAX_NAME_LEN: usize = 64;

/// Flattens markup into text with one line per text run between tags.
///
/// Scripts, styles and comments are dropped, entities decoded, whitespace
/// inside a line collapsed and empty lines removed.
pub fn to_text(markup: &str) -> String {
    let visible = INVISIBLE.replace_all(markup, " ");
    let broken = TAG.replace_all(&visible, "\n");
    let decoded = decode_entities(&broken);

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of a fragment on a single line.
pub fn inner_text(fragment: &str) -> String {
    to_text(fragment).lines().collect::<Vec<_>>().join(" ")
}

pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "deg" => '°',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        _ => return None,
    };
    Some(c)
}

/// Text of the first `h1`-`h3` heading, or else the first link, together
/// with the fragment that element was cut out of.
pub fn split_heading(fragment: &str) -> (Option<String>, String) {
    let Some(caps) = HEADING.captures(fragment).or_else(|| LINK.captures(fragment)) else {
        return (None, fragment.to_string());
    };
    let heading = inner_text(&caps[1]);
    if heading.is_empty() {
        return (None, fragment.to_string());
    }

    let element = caps.get(0).map_or(0..0, |m| m.range());
    let rest = format!("{}\n{}", &fragment[..element.start], &fragment[element.end..]);
    (Some(heading), rest)
}

/// Vendor device id from a `deviceid=` query parameter, uppercased.
pub fn device_id(fragment: &str) -> Option<String> {
    DEVICE_ID
        .captures(fragment)
        .map(|caps| caps[1].to_uppercase())
}

/// The nearest non-empty line ending before byte `offset` of `text`,
/// including the part of the current line left of `offset`.
pub fn line_before(text: &str, offset: usize) -> Option<String> {
    let prefix = text.get(..offset)?;
    prefix
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.chars().count() <= MAX_NAME_LEN)
        .map(str::to_string)
}
