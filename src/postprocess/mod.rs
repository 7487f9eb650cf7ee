//! Markdown post-processing
//!
//! Single-pass regex transforms over whatever text the model returned. None
//! of them fail: when a pattern finds nothing the text passes through
//! unchanged.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use reqwest::Url;

use crate::models::DaySegment;
use crate::search::{plus_encode, search_activities};

pub mod links;

pub use links::{correct_links, prune_dead_links};

/// Heading used when the section has to be appended
pub const EXTRA_DETAILS_HEADING: &str = "## Extra Details";

static TONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(Visit|Explore|Enjoy|Dine|Lunch)\b(\s+at\b)?").unwrap());

// `Day 1:`, `**Day 2:**`, `### Day 3 (Wed 14 May):`, `- Day 4 - Beaches:`
static DAY_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[#>*_-]+[ \t]*)*(?i:day)[ \t]+(\d{1,2})\b[^\n:]{0,40}:").unwrap()
});

// The label alone on its line: `## Extra Details`, `**Extra Details:**`, `Extra details:`
static EXTRA_DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*|__)?[ \t]*extra[ \t]+details[ \t]*:?[ \t]*(?:\*\*|__)?[ \t]*:?[ \t]*\r?$",
    )
    .unwrap()
});

// One level of parentheses inside the target: `[Wiki](/wiki/Retiro_(Madrid))`
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]\n]+)\]\(((?:[^()\s]|\([^()\s]*\))*)\)").unwrap()
});

// `Cat Cafe (<https://catcafe.example>)` as appended by `correct_links`, or a bare `<https://...>`
static AUTOLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t]*\(<(https?://[^<>\s]+)>\)|<(https?://[^<>\s]+)>").unwrap()
});

static NO_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[ \t]*(?:\(\s*no link found\s*\)|no link found)").unwrap());

static PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b\p{Lu}[\p{L}\p{M}'’-]*
        (?:
            [\ \t]+
            (?:(?:de|del|la|las|los|el|of|the|di|da|do|y|e|van|von)[\ \t]+)?
            \p{Lu}[\p{L}\p{M}'’-]*
        )+",
    )
    .unwrap()
});

/// Words that never start a place name
const STOPWORDS: &[&str] = &[
    "a", "after", "afternoon", "an", "and", "at", "before", "breakfast", "brunch", "catch",
    "day", "details", "dine", "dinner", "don't", "end", "enjoy", "evening", "explore", "extra",
    "finish", "for", "grab", "head", "here", "if", "in", "it's", "lunch", "morning", "night",
    "note", "on", "over", "pro", "savor", "start", "stop", "stroll", "take", "then", "this",
    "tip", "tips", "to", "treat", "try", "visit", "wander", "yourself", "you", "your",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "mon", "tue", "wed", "thu", "fri", "sat", "sun",
];

const CONNECTORS: &[&str] = &[
    "de", "del", "la", "las", "los", "el", "of", "the", "di", "da", "do", "y", "e", "van", "von",
];

fn is_stopword(word: &str) -> bool {
    let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
    STOPWORDS.iter().any(|s| s.eq_ignore_ascii_case(word))
}

fn is_connector(word: &str) -> bool {
    CONNECTORS.contains(&word)
}

/// Warm up the wording: whole-word, capitalized replacements only.
/// `Lunch:` and friends are labels and stay as they are.
pub fn polish_tone(text: &str) -> String {
    TONE_RE
        .replace_all(text, |caps: &Captures| {
            let word_end = caps.get(1).map_or(0, |m| m.end());
            if text[word_end..].starts_with(':') {
                return caps[0].to_string();
            }
            let replacement = match &caps[1] {
                "Visit" => "Head over to",
                "Explore" => "Wander through",
                "Enjoy" => "Savor",
                "Dine" => "Treat yourself to dinner at",
                _ => "Stop for lunch at",
            };
            match caps.get(2) {
                // "Dine at X" must not become "... dinner at at X"
                Some(at) if !replacement.ends_with(" at") => format!("{replacement}{}", at.as_str()),
                _ => replacement.to_string(),
            }
        })
        .into_owned()
}

/// Byte ranges of the day blocks and the start of a trailing Extra Details section
struct DayLayout {
    markers: Vec<(usize, u32)>,
    extra_start: Option<usize>,
}

impl DayLayout {
    fn scan(text: &str) -> Self {
        let markers: Vec<(usize, u32)> = DAY_MARKER_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let number = caps[1].parse().ok()?;
                Some((start, number))
            })
            .collect();

        let last_marker = markers.last().map(|&(start, _)| start).unwrap_or(0);
        let extra_start = EXTRA_DETAILS_RE
            .find_iter(text)
            .map(|m| m.start())
            .find(|&start| start >= last_marker);

        Self {
            markers,
            extra_start,
        }
    }

    fn segments<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (u32, &'a str)> + '_ {
        let end = self.extra_start.unwrap_or(text.len());
        self.markers.iter().enumerate().map(move |(i, &(start, number))| {
            let stop = self
                .markers
                .get(i + 1)
                .map(|&(next, _)| next)
                .unwrap_or(end)
                .min(end)
                .max(start);
            (number, text[start..stop].trim_end())
        })
    }
}

/// One segment per `Day N:` marker; preamble and Extra Details are not part of any day
pub fn split_days(text: &str) -> Vec<DaySegment> {
    let layout = DayLayout::scan(text);
    layout
        .segments(text)
        .map(|(number, segment)| DaySegment {
            number,
            date: None,
            text: segment.to_string(),
        })
        .collect()
}

/// Keep days `1..=max_days` (first occurrence each), drop chatter before the first day.
/// Text without day markers passes through unchanged.
pub fn clean_to_days(text: &str, max_days: u32) -> String {
    let layout = DayLayout::scan(text);
    if layout.markers.is_empty() {
        return text.to_string();
    }

    let mut seen = HashSet::new();
    let mut blocks: Vec<&str> = layout
        .segments(text)
        .filter(|&(number, _)| (1..=max_days).contains(&number) && seen.insert(number))
        .map(|(_, segment)| segment)
        .collect();
    if blocks.is_empty() {
        // e.g. a one-day request answered from "Day 2:" on
        return text.to_string();
    }

    if let Some(start) = layout.extra_start {
        blocks.push(text[start..].trim_end());
    }

    let mut cleaned = blocks.join("\n\n");
    cleaned.push('\n');
    cleaned
}

fn is_valid_link(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Unlink markdown links whose target is not an absolute http(s) URL and
/// drop "No link found" placeholders
pub fn validate_links(text: &str) -> String {
    let relinked = MD_LINK_RE.replace_all(text, |caps: &Captures| {
        if is_valid_link(&caps[2]) {
            caps[0].to_string()
        } else {
            caps[1].to_string()
        }
    });
    NO_LINK_RE.replace_all(&relinked, "").into_owned()
}

fn autolink_target<'t>(caps: &Captures<'t>) -> Option<regex::Match<'t>> {
    caps.get(1).or_else(|| caps.get(2))
}

/// URLs of all markdown links and autolinks, in order of appearance, deduplicated
pub fn markdown_links(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = MD_LINK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(2))
        .chain(AUTOLINK_RE.captures_iter(text).filter_map(|caps| autolink_target(&caps)))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    found.sort_by_key(|&(start, _)| start);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, url)| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Replace links to any of `urls` by their label. An appended ` (<url>)` is
/// dropped, a bare `<url>` becomes plain text.
pub fn unlink(text: &str, urls: &HashSet<String>) -> String {
    let text = MD_LINK_RE.replace_all(text, |caps: &Captures| {
        if urls.contains(&caps[2]) {
            caps[1].to_string()
        } else {
            caps[0].to_string()
        }
    });
    AUTOLINK_RE
        .replace_all(&text, |caps: &Captures| match (caps.get(1), caps.get(2)) {
            (Some(url), _) if urls.contains(url.as_str()) => String::new(),
            (_, Some(url)) if urls.contains(url.as_str()) => url.as_str().to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

pub fn google_maps_url(place: &str, destination: &str) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        plus_encode(&format!("{place} {destination}"))
    )
}

fn line_has_link(line: &str) -> bool {
    line.contains("](") || line.contains("http://") || line.contains("https://") || line.contains("www.")
}

fn link_phrase(phrase: &str, destination: &str) -> String {
    let mut rest = phrase;
    while let Some(word) = rest.split_whitespace().next() {
        if !(is_stopword(word) || is_connector(word)) {
            break;
        }
        rest = rest[word.len()..].trim_start();
    }

    let capitalized = rest
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();
    if capitalized < 2 || rest.eq_ignore_ascii_case(destination.trim()) {
        return phrase.to_string();
    }

    let prefix = &phrase[..phrase.len() - rest.len()];
    format!("{prefix}[{rest}]({})", google_maps_url(rest, destination))
}

/// Turn capitalized multi-word place names into Google Maps links.
/// Headings and lines that already carry a link are left alone.
pub fn add_google_maps_links(text: &str, destination: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.trim_start().starts_with('#') || line_has_link(line) {
                return line.to_string();
            }
            PHRASE_RE
                .replace_all(line, |caps: &Captures| link_phrase(&caps[0], destination))
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn extra_details_bullets(destination: &str) -> String {
    search_activities(destination)
        .into_iter()
        .map(|link| {
            let label = if link.source.is_blog() {
                format!("{} articles about {}", link.source.display_name(), link.destination)
            } else {
                format!("{} search results for {}", link.source.display_name(), link.destination)
            };
            format!("- [{label}]({})", link.url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append the Extra Details section when missing; backfill its links when it has none.
/// Only a heading after the last day counts as the section.
pub fn link_extra_details(text: &str, destination: &str) -> String {
    let bullets = extra_details_bullets(destination);
    let body = text.trim_end();

    match DayLayout::scan(text).extra_start {
        Some(start) => {
            let section = &text[start..];
            if MD_LINK_RE.is_match(section) || section.contains("http") {
                text.to_string()
            } else {
                format!("{body}\n\n{bullets}\n")
            }
        }
        None => format!(
            "{body}\n\n{EXTRA_DETAILS_HEADING}\n\nWant more ideas? These searches are a good place to start:\n\n{bullets}\n"
        ),
    }
}
