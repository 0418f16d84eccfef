//! Reply splitting: one model reply → essence summary + diagram source.
//!
//! The reply is cut at the **first** occurrence of the configured delimiter
//! and nowhere else. Everything before it is the summary; everything after
//! it is the raw diagram block, which may still carry fence markers. Models
//! do not always honour the format, so every malformed shape degrades to
//! [`DiagramSegment::NotProduced`] or to a best-effort body instead of an
//! error.

use crate::output::{DiagramSegment, SplitReply};
use crate::pipeline::postprocess::{clean_diagram, clean_summary, clean_whole_reply};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

const FENCE: &str = "```";

/// Split a reply into summary and diagram on the first `delimiter` only.
///
/// | Reply shape | Summary | Diagram |
/// |---|---|---|
/// | no delimiter | whole reply (whitespace cleanup only) | `NotProduced` |
/// | delimiter, fenced block | text before | block body |
/// | delimiter, fence never closed | text before | everything after the opener |
/// | delimiter, nothing after | text before | `NotProduced` |
pub fn split_reply(reply: &str, delimiter: &str) -> SplitReply {
    let split = if delimiter.is_empty() {
        None
    } else {
        reply.split_once(delimiter)
    };

    let Some((before, after)) = split else {
        warn!("Reply has no diagram delimiter; showing summary only");
        return SplitReply {
            summary: clean_whole_reply(reply),
            diagram: DiagramSegment::NotProduced,
        };
    };

    let body = clean_diagram(strip_fences(after));
    let diagram = if body.trim().is_empty() {
        warn!("Reply has a delimiter but no diagram body");
        DiagramSegment::NotProduced
    } else {
        debug!("Diagram segment: {} lines", body.lines().count());
        DiagramSegment::Diagram(body)
    };

    SplitReply {
        summary: clean_summary(before),
        diagram,
    }
}

static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*```[\w-]*[ \t]*(?:\n|$)").unwrap());

/// Remove a leading ```` ```lang ```` line and cut at the closing fence.
///
/// An opening fence with no closing fence keeps the rest of the segment as
/// the body.
pub fn strip_fences(segment: &str) -> &str {
    let body = RE_OPENING_FENCE
        .find(segment)
        .map_or(segment, |m| &segment[m.end()..]);
    match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}
