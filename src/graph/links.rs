use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // [[target]] or [[target|display]]
    static ref WIKILINK_RE: Regex = Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").unwrap();
    // [label](target), not preceded by another bracket
    static ref MDLINK_RE: Regex = Regex::new(r"\[[^\]]*\]\(([^)\s]+)\)").unwrap();
}

/// A raw link occurrence, before resolution against the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLink {
    /// `[[Target]]`, resolved by stem/title lookup.
    Wiki(String),
    /// `[label](path)`, resolved against the source note's directory.
    Relative(String),
}

/// Extract every link occurrence from a note body.
///
/// External URL schemes are never graph material and are dropped here;
/// `#fragment` suffixes are dropped so `note.md#heading` targets the note.
pub fn extract_links(content: &str) -> Vec<RawLink> {
    let mut links = Vec::new();

    for caps in WIKILINK_RE.captures_iter(content) {
        let target = strip_fragment(caps[1].trim());
        if !target.is_empty() {
            links.push(RawLink::Wiki(target.to_string()));
        }
    }

    for caps in MDLINK_RE.captures_iter(content) {
        let target = caps[1].trim();
        if is_external(target) {
            continue;
        }
        let target = strip_fragment(target);
        if !target.is_empty() {
            links.push(RawLink::Relative(target.to_string()));
        }
    }

    links
}

fn is_external(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("mailto:")
}

fn strip_fragment(target: &str) -> &str {
    match target.find('#') {
        Some(idx) => &target[..idx],
        None => target,
    }
}
