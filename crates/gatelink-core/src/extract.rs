//! Views over a markdown document.
//!
//! [`extract`] is pure: the same document and options always give the same
//! output. Extraction misses (no headings, unknown section, bad paragraph
//! range) produce literal diagnostic strings rather than errors so that the
//! caller can react to them in-band.
//!
//! Lengths and offsets count Unicode scalar values (`char`s).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Returned when heading extraction finds nothing.
pub const NO_HEADINGS_MESSAGE: &str = "No headings found in the content.";

#[allow(clippy::unwrap_used)]
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());

/// `N`, `N-` or `N-M`.
#[allow(clippy::unwrap_used)]
static PARAGRAPH_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)(?:-([0-9]*))?$").unwrap());

/// Which view of a document to return.
///
/// `read_headings` wins over everything else. Otherwise `section` wins over
/// `paragraph_range`, and the character window is applied to whatever the
/// structural filter produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationOptions {
    /// First character to return.
    pub start_char: Option<usize>,
    /// Maximum number of characters to return. Zero means no limit.
    pub max_length: Option<usize>,
    /// Heading text to extract the section under.
    pub section: Option<String>,
    /// `N`, `N-M` or `N-` (1-based).
    pub paragraph_range: Option<String>,
    /// Return only the heading lines.
    pub read_headings: bool,
}

impl PaginationOptions {
    /// Options returning the full document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the character window at `start`.
    #[must_use]
    pub const fn with_start_char(mut self, start: usize) -> Self {
        self.start_char = Some(start);
        self
    }

    /// Limit the character window to `len` characters.
    #[must_use]
    pub const fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Extract the section under the first heading containing `heading`.
    #[must_use]
    pub fn with_section(mut self, heading: impl Into<String>) -> Self {
        self.section = Some(heading.into());
        self
    }

    /// Extract a paragraph range such as `"2-4"`.
    #[must_use]
    pub fn with_paragraph_range(mut self, range: impl Into<String>) -> Self {
        self.paragraph_range = Some(range.into());
        self
    }

    /// Return only heading lines.
    #[must_use]
    pub const fn with_read_headings(mut self, read_headings: bool) -> Self {
        self.read_headings = read_headings;
        self
    }

    const fn has_window(&self) -> bool {
        self.start_char.is_some() || self.max_length.is_some()
    }
}

/// Message returned when `section` matches no heading.
pub fn section_not_found_message(section: &str) -> String {
    format!("Section \"{section}\" not found in the content.")
}

/// Message returned for an unusable paragraph range.
pub fn invalid_range_message(range: &str) -> String {
    format!("Paragraph range \"{range}\" is invalid or out of bounds.")
}

/// Derive the requested view of `markdown`.
///
/// ```rust
/// use gatelink_core::extract::{extract, PaginationOptions};
///
/// let doc = "# A\ntext1\n## B\ntext2\n# C\ntext3";
/// let options = PaginationOptions::new().with_section("b");
/// assert_eq!(extract(doc, &options), "## B\ntext2");
/// ```
pub fn extract(markdown: &str, options: &PaginationOptions) -> String {
    if options.read_headings {
        return extract_headings(markdown);
    }

    let body = if let Some(section) = options.section.as_deref().filter(|s| !s.is_empty()) {
        match extract_section(markdown, section) {
            Some(found) => found,
            None => return section_not_found_message(section),
        }
    } else if let Some(range) = options.paragraph_range.as_deref().filter(|r| !r.is_empty()) {
        match extract_paragraph_range(markdown, range) {
            Some(found) => found,
            None => return invalid_range_message(range),
        }
    } else {
        markdown.to_string()
    };

    if options.has_window() {
        char_window(&body, options.start_char.unwrap_or(0), options.max_length)
    } else {
        body
    }
}

/// Newline-joined heading lines, or [`NO_HEADINGS_MESSAGE`].
pub fn extract_headings(markdown: &str) -> String {
    let headings: Vec<&str> = markdown
        .split('\n')
        .filter(|line| HEADING_LINE.is_match(line))
        .collect();

    if headings.is_empty() {
        NO_HEADINGS_MESSAGE.to_string()
    } else {
        headings.join("\n")
    }
}

fn heading_level(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b'#').count()
}

/// The section under the first heading whose text contains `section`,
/// compared case-insensitively.
///
/// The section runs up to the next heading at the same or a shallower level.
pub fn extract_section(markdown: &str, section: &str) -> Option<String> {
    let needle = section.to_lowercase();
    let lines: Vec<&str> = markdown.split('\n').collect();

    let (start, level) = lines.iter().enumerate().find_map(|(i, line)| {
        let level = heading_level(line);
        ((1..=6).contains(&level) && line[level..].to_lowercase().contains(&needle))
            .then_some((i, level))
    })?;

    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| {
            let next = heading_level(line);
            next > 0 && next <= level
        })
        .map_or(lines.len(), |(i, _)| i);

    Some(lines[start..end].join("\n"))
}

/// Paragraphs selected by `range`, joined by blank lines.
///
/// Paragraphs are the non-blank pieces between `"\n\n"` separators. `N`
/// selects one paragraph, `N-` runs to the end and `N-M` takes the slice
/// `[N-1, M)`. Returns `None` when the range is malformed or selects nothing.
pub fn extract_paragraph_range(markdown: &str, range: &str) -> Option<String> {
    let paragraphs: Vec<&str> = markdown
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .collect();

    let caps = PARAGRAPH_RANGE.captures(range)?;
    let start = caps.get(1)?.as_str().parse::<usize>().ok()?.checked_sub(1)?;
    if start >= paragraphs.len() {
        return None;
    }

    let selected: &[&str] = match caps.get(2).map(|m| m.as_str()) {
        None => &paragraphs[start..=start],
        Some("") => &paragraphs[start..],
        Some(end) => {
            let end = end.parse::<usize>().ok()?.min(paragraphs.len());
            paragraphs.get(start..end).unwrap_or_default()
        },
    };

    if selected.is_empty() {
        None
    } else {
        Some(selected.join("\n\n"))
    }
}

/// Characters `[start, start + max_length)` of `text`, clipped to its length.
///
/// A start at or beyond the end yields `""`. A `max_length` of zero or `None`
/// runs to the end.
pub fn char_window(text: &str, start: usize, max_length: Option<usize>) -> String {
    let total = text.chars().count();
    if start >= total {
        return String::new();
    }
    let take = match max_length {
        Some(len) if len > 0 => len,
        _ => total,
    };
    text.chars().skip(start).take(take).collect()
}
