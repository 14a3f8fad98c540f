/*!
 * Lightweight HTML text helpers.
 *
 * The scraped pages are only ever mined for link targets, table rows and
 * visible text, so a handful of tolerant scanners is enough. Closing `</tr>`
 * and `</td>` tags are optional, as browsers allow.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[/!?]?[A-Za-z][^<>]*|!--.*?--)>").expect("valid tag pattern")
});

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").expect("valid script pattern")
});

static ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s(?:[^>]*?\s)?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid href pattern")
});

static ROW_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<tr\b[^>]*>").expect("valid row pattern"));
static ROW_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</tr\s*>|<tr\b|</table\s*>").expect("valid row end pattern"));
static CELL_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<td\b[^>]*>").expect("valid cell pattern"));
static CELL_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</td\s*>|<td\b|<th\b").expect("valid cell end pattern"));

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").expect("valid entity pattern")
});

/// Decode the common named entities and all numeric character references
pub fn decode_entities(s: &str) -> String {
    ENTITY.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => None,
            }
        };
        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    }).into_owned()
}

/// Visible text of an HTML fragment: tags removed, entities decoded, line breaks kept
pub fn to_text(html: &str) -> String {
    let without_scripts = SCRIPT_OR_STYLE.replace_all(html, "");
    decode_entities(&TAG.replace_all(&without_scripts, ""))
}

/// Text of a fragment with each tag replaced by a space and whitespace collapsed
pub fn to_spaced_text(html: &str) -> String {
    let spaced = TAG.replace_all(html, " ");
    normalize_ws(&decode_entities(&spaced))
}

/// Collapse whitespace runs to a single space and trim the ends
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All `href` targets of anchor tags, in document order, entities decoded
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    ANCHOR_HREF.captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| decode_entities(m.as_str()))
        .collect()
}

/// Inner HTML of every element opened by `open`, ending at the first match of `end`
fn blocks<'a>(html: &'a str, open: &Regex, end: &Regex) -> Vec<&'a str> {
    open.find_iter(html)
        .map(|m| {
            let rest = &html[m.end()..];
            let stop = end.find(rest).map(|e| e.start()).unwrap_or(rest.len());
            &rest[..stop]
        })
        .collect()
}

/// Inner HTML of every `<tr>` row
pub fn table_rows(html: &str) -> Vec<&str> {
    blocks(html, &ROW_OPEN, &ROW_END)
}

/// Inner HTML of every `<td>` cell in a row
pub fn row_cells(row: &str) -> Vec<&str> {
    blocks(row, &CELL_OPEN, &CELL_END)
}
