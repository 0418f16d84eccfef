//! Post-processing: deterministic cleanup of the two reply segments.
//!
//! Models follow the output format loosely. They leave a "Mind map:" heading
//! dangling at the end of the summary, emit CRLF line endings, sprinkle
//! zero-width characters or leave a stray fence behind. These rules fix such
//! quirks without touching content. Each rule is a pure `&str → String`
//! function and is tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean the essence-summary segment.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Trim trailing whitespace per line
/// 4. Drop lone fence lines left behind by a half-written code block
/// 5. Drop a trailing "mind map" section heading that belonged to the diagram
/// 6. Collapse 2+ consecutive blank lines down to 1
/// 7. Trim leading and trailing blank space
pub fn clean_summary(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = remove_lone_fences(&s);
    let s = remove_dangling_diagram_heading(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Clean a reply that carried no diagram delimiter.
///
/// The whole reply is the summary, so only whitespace is touched: rules 1,
/// 2, 3, 6 and 7 of [`clean_summary`]. No line is dropped.
pub fn clean_whole_reply(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Clean the Mermaid source extracted from the diagram segment.
///
/// Mermaid is indentation-sensitive, so leading whitespace on each line is
/// kept; only line endings, invisible characters, trailing whitespace and
/// surrounding blank lines are touched.
pub fn clean_diagram(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    s.trim_matches('\n').to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Remove lone fence lines ──────────────────────────────────────────
//
// The summary is everything before the diagram delimiter. When a model opens
// a plain ``` block before the Mermaid one, or the delimiter is a custom
// marker, a bare fence line can end up in the summary and swallow the rest
// of the panel when rendered as Markdown.

static RE_FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*```[\w-]*\s*$").unwrap());

fn remove_lone_fences(input: &str) -> String {
    let fence_count = input.lines().filter(|l| RE_FENCE_LINE.is_match(l)).count();
    if fence_count % 2 == 0 {
        // Balanced fences are real code blocks; leave them alone.
        return input.to_string();
    }
    input
        .lines()
        .filter(|l| !RE_FENCE_LINE.is_match(l))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Remove dangling diagram heading ─────────────────────────────────

static RE_DIAGRAM_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#{1,6}\s*)?(?:\d+[.)]\s*)?(?:\*\*)?\s*(?:mermaid\s+)?(?:mind\s*-?\s*map|diagram|logic\s+map)\s*(?:\*\*)?\s*:?\s*(?:\*\*)?\s*$",
    )
    .unwrap()
});

fn remove_dangling_diagram_heading(input: &str) -> String {
    let mut lines: Vec<&str> = input.lines().collect();
    while matches!(lines.last(), Some(l) if l.trim().is_empty()) {
        lines.pop();
    }
    if matches!(lines.last(), Some(l) if RE_DIAGRAM_HEADING.is_match(l)) {
        lines.pop();
    }
    lines.join("\n")
}

// ── Rule 6: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
