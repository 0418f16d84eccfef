//! Result types produced by the digest pipeline.

use serde::{Deserialize, Serialize};

/// The diagram half of a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "source", rename_all = "snake_case")]
pub enum DiagramSegment {
    /// Mermaid source with fence markers removed.
    Diagram(String),
    /// The reply carried no delimiter, or nothing usable after it.
    NotProduced,
}

impl DiagramSegment {
    /// The diagram source, if one was produced.
    pub fn source(&self) -> Option<&str> {
        match self {
            DiagramSegment::Diagram(s) => Some(s),
            DiagramSegment::NotProduced => None,
        }
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, DiagramSegment::Diagram(_))
    }
}

/// A reply split into its two display segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReply {
    /// Essence summary (Markdown).
    pub summary: String,
    pub diagram: DiagramSegment,
}

/// Counters for one submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestStats {
    /// Characters in the extracted text.
    pub input_chars: usize,
    /// Characters actually sent to the model.
    pub transmitted_chars: usize,
    /// True when the input was cut to the configured bound.
    pub truncated: bool,
    /// Model requested, when one was configured.
    pub model: Option<String>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    /// Wall-clock time of the remote call.
    pub llm_duration_ms: u64,
    /// Wall-clock time of the whole submission.
    pub total_duration_ms: u64,
}

/// Everything the display layer needs for one successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestOutput {
    pub summary: String,
    pub diagram: DiagramSegment,
    pub stats: DigestStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagram_serialises_with_state_tag() {
        let json = serde_json::to_string(&DiagramSegment::NotProduced).unwrap();
        assert_eq!(json, r#"{"state":"not_produced"}"#);

        let json = serde_json::to_string(&DiagramSegment::Diagram("mindmap".into())).unwrap();
        assert_eq!(json, r#"{"state":"diagram","source":"mindmap"}"#);
    }

    #[test]
    fn source_accessor() {
        assert_eq!(DiagramSegment::Diagram("x".into()).source(), Some("x"));
        assert_eq!(DiagramSegment::NotProduced.source(), None);
        assert!(!DiagramSegment::NotProduced.is_produced());
    }
}
