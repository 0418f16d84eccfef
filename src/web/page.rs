//! HTML rendering for the single-page tool.
//!
//! The page template has two slots: a notice banner and the results area.
//! The summary panel is Markdown rendered by `pulldown-cmark` with any raw
//! HTML from the model escaped. The diagram panel embeds the Mermaid source
//! verbatim (HTML-escaped) in a `<pre class="mermaid">` block for the
//! client-side Mermaid script to render.

use crate::error::EssenceError;
use crate::output::{DiagramSegment, DigestOutput};
use pulldown_cmark::{html, Event, Parser};

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const NOTICE_SLOT: &str = "{{ notice }}";
const RESULTS_SLOT: &str = "{{ results }}";

/// Mermaid v10 ESM build, initialised with the neutral theme.
const MERMAID_SCRIPT: &str = r#"<script type="module">
  import mermaid from 'https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs';
  mermaid.initialize({ startOnLoad: true, theme: 'neutral' });
</script>"#;

/// What the page should show.
pub enum View<'a> {
    /// First visit: just the form.
    Fresh,
    /// The form could not be read.
    BadRequest(&'a str),
    /// The submission failed; no panels are shown.
    Failed(&'a EssenceError),
    /// Both panels.
    Done(&'a DigestOutput),
}

/// Render the full page for `view`.
pub fn render_page(view: View<'_>) -> String {
    let (notice, results) = match view {
        View::Fresh => (
            notice("info", "Enter your access code, then upload a PDF or paste some text."),
            String::new(),
        ),
        View::BadRequest(msg) => (notice("error", msg), String::new()),
        View::Failed(err) => (error_notice(err), String::new()),
        View::Done(output) => (
            notice("success", "Access granted. Here is the short version."),
            render_results(output),
        ),
    };

    let (head, rest) = split_slot(INDEX_HTML, NOTICE_SLOT);
    let (middle, tail) = split_slot(rest, RESULTS_SLOT);

    let mut page =
        String::with_capacity(INDEX_HTML.len() + notice.len() + results.len());
    page.push_str(head);
    page.push_str(&notice);
    page.push_str(middle);
    page.push_str(&results);
    page.push_str(tail);
    page
}

fn split_slot<'a>(template: &'a str, slot: &str) -> (&'a str, &'a str) {
    template.split_once(slot).unwrap_or((template, ""))
}

fn notice(level: &str, message: &str) -> String {
    format!(
        r#"<div class="notice notice-{level}">{}</div>"#,
        escape_html(message)
    )
}

fn error_notice(err: &EssenceError) -> String {
    match err {
        EssenceError::MissingCode => notice(
            "info",
            "Ask the maintainer for an access code (and promise to send real feedback).",
        ),
        EssenceError::Unauthorized => {
            notice("error", "Access denied: the code is invalid or has expired.")
        }
        EssenceError::EmptyInput => notice(
            "warning",
            "There is nothing to digest. Are you trying to punch the air?",
        ),
        other => notice("error", &other.to_string()),
    }
}

fn render_results(output: &DigestOutput) -> String {
    let diagram_panel = match &output.diagram {
        DiagramSegment::Diagram(source) => format!(
            "<pre class=\"mermaid\">\n{}\n</pre>\n{}",
            escape_html(source),
            MERMAID_SCRIPT
        ),
        DiagramSegment::NotProduced => {
            notice("info", "No diagram was produced for this reply.")
        }
    };

    let truncation = if output.stats.truncated {
        format!(
            r#"<p class="meta">Only the first {} of {} characters were sent.</p>"#,
            output.stats.transmitted_chars, output.stats.input_chars
        )
    } else {
        String::new()
    };

    format!(
        r#"<section class="results">
  <div class="panel">
    <h2>📝 Essence</h2>
    {}
    {}
  </div>
  <div class="panel">
    <h2>🗺️ Logic map</h2>
    {}
  </div>
</section>"#,
        markdown_to_html(&output.summary),
        truncation,
        diagram_panel
    )
}

/// Render Markdown to HTML, escaping any raw HTML in the source.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
