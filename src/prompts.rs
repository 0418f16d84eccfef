//! System prompt and the section delimiter the reply parser expects.
//!
//! The instruction tells the model where to put the diagram and the parser in
//! [`crate::pipeline::split`] looks for the same marker. Both are derived from
//! the constants below so changing one cannot silently break the other.
//!
//! Callers can override the prompt via
//! [`crate::config::DigestConfig::system_prompt`]; when they do, keeping the
//! delimiter in the custom text is their job.

/// Opening fence of a Mermaid code block.
pub const DIAGRAM_FENCE: &str = "```mermaid";

/// Default section delimiter: the reply is split at the first Mermaid fence.
pub const DEFAULT_DELIMITER: &str = DIAGRAM_FENCE;

const PROMPT_HEAD: &str = r#"You are a "dimensionality reduction" specialist. Your job is to take dense, jargon-heavy text (lecture notes, papers, reports) and knock it down to what it actually says.

Produce exactly two sections, in this order:

1. ESSENCE
   - Exactly three numbered points.
   - Write like a blunt, funny student explaining it to a friend: short, colloquial, no hedging.
   - Do NOT repeat the source's wording or terminology verbatim; translate every piece of jargon into the underlying logic.
   - Do not use code blocks in this section.

2. MIND MAP
"#;

const PROMPT_TAIL: &str = r#"   - Use Mermaid `mindmap` syntax: one root node, two or three levels of branches.
   - Node labels must be short plain phrases; avoid parentheses, quotes and brackets inside labels.
   - Close the block with ``` and write nothing after it.

Rules:
- Never parrot the original text.
- Output only the two sections, no preamble or closing remarks."#;

/// Build the default system instruction for the given section delimiter.
///
/// With the default delimiter the Mermaid fence itself is the split point;
/// any other delimiter is requested as a marker line just before the fence.
pub fn system_prompt_for(delimiter: &str) -> String {
    let placement = if delimiter == DIAGRAM_FENCE {
        format!("   - Output a single code block that opens with {DIAGRAM_FENCE} on its own line.\n")
    } else {
        format!(
            "   - Start the section with the exact marker line {delimiter} and nothing else on that line.\n\
             \x20  - Right after the marker, output a single code block that opens with {DIAGRAM_FENCE}.\n"
        )
    };
    format!("{PROMPT_HEAD}{placement}{PROMPT_TAIL}")
}
