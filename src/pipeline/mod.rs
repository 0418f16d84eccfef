//! Pipeline stages for one submission.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the ordering lives in one place ([`crate::digest`]).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ gate ──▶ llm ──▶ split ──▶ postprocess
//! (upload)   (pdfium)  (code)   (LLM)  (delimiter)  (cleanup)
//! ```
//!
//! 1. [`input`]: the submission and CLI input resolution (path/URL/stdin)
//! 2. [`extract`]: PDF page text via pdfium in `spawn_blocking`, or pasted text
//! 3. [`gate`]: shared-code check; must pass before anything is spent
//! 4. [`llm`]: the single metered completion call, with a timeout
//! 5. [`split`]: cut the reply at the first delimiter, strip fences
//! 6. [`postprocess`]: deterministic cleanup of both segments

pub mod extract;
pub mod gate;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod split;
