//! CLI binary for essence-map.
//!
//! Two subcommands over the library: `digest` runs one document through the
//! pipeline and prints the result, `serve` runs the single-page web tool.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use essence_map::{
    pipeline::input::resolve_input, DiagramSegment, DigestConfig, DigestOutput, DigestPipeline,
    DocumentInput, Submission,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Digest a local PDF
  essence-map digest lecture.pdf --code SKKU2026

  # Digest pasted text from stdin
  pbpaste | essence-map digest - --code SKKU2026

  # Digest a PDF from a URL, JSON output
  essence-map digest https://arxiv.org/pdf/1706.03762 --json

  # Run the web tool on port 8501
  essence-map serve --addr 0.0.0.0:8501

ENVIRONMENT VARIABLES:
  ESSENCE_GATE_SECRET     Access code every submission must match (required)
  ESSENCE_CODE            Code sent by `digest`
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download

  A .env file in the working directory is loaded first.
"#;

/// Three blunt essence points and a Mermaid mind map from any document.
#[derive(Parser, Debug)]
#[command(
    name = "essence-map",
    version,
    about = "Three blunt essence points and a Mermaid mind map from any document",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ESSENCE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ESSENCE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Digest one document and print the summary and diagram.
    Digest(DigestArgs),
    /// Run the single-page web tool.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct DigestArgs {
    /// Local file (PDF or text), HTTP/HTTPS URL to a PDF, or `-` for stdin.
    input: String,

    /// Access code checked against the gate secret.
    #[arg(long, env = "ESSENCE_CODE", default_value = "")]
    code: String,

    /// Output the digest as JSON.
    #[arg(long, env = "ESSENCE_JSON")]
    json: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "ESSENCE_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "ESSENCE_ADDR", default_value = "0.0.0.0:8501")]
    addr: SocketAddr,

    /// Maximum upload size in MiB (1–4096).
    #[arg(
        long,
        env = "ESSENCE_BODY_LIMIT_MB",
        default_value_t = 32,
        value_parser = clap::value_parser!(u64).range(1..=4096)
    )]
    body_limit_mb: u64,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Shared access code submissions must match.
    #[arg(long, env = "ESSENCE_GATE_SECRET", hide_env_values = true)]
    gate_secret: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano, deepseek-chat).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature (0.0–1.0). Service default when unset.
    #[arg(long, env = "ESSENCE_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max tokens the model may generate.
    #[arg(long, env = "ESSENCE_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Characters of input sent to the model; the rest is cut.
    #[arg(long, env = "ESSENCE_MAX_INPUT_CHARS", default_value_t = 12_000)]
    max_input_chars: usize,

    /// Marker separating the summary from the diagram in the reply.
    #[arg(long, env = "ESSENCE_DELIMITER")]
    delimiter: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "ESSENCE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Remote call timeout in seconds.
    #[arg(long, env = "ESSENCE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if matches!(cli.command, Command::Digest(_)) {
        // The spinner carries progress for one-shot runs.
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Digest(ref args) => run_digest(args, cli.quiet).await,
        Command::Serve(ref args) => run_serve(args, cli.quiet).await,
    }
}

async fn run_digest(args: &DigestArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args.model).await?;
    let pipeline = DigestPipeline::from_config(config).context("Failed to set up LLM provider")?;
    tracing::debug!("Config: {:?}", pipeline.config());

    let input = resolve_input(&args.input, args.download_timeout)
        .await
        .context("Failed to read input")?;

    if matches!(input, DocumentInput::Pdf(_)) {
        ensure_pdf_engine(quiet)?;
    }

    let spinner = (!quiet && !args.json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Digesting");
        bar.set_message("taking the document apart…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let submission = Submission::new(args.code.clone()).with_input(input);
    let result = pipeline.digest(submission).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = result.context("Digest failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_digest(&output).context("Failed to write to stdout")?;
        if !quiet {
            let s = &output.stats;
            eprintln!(
                "{}  {} tokens in  /  {} tokens out  ·  {}ms",
                green("✔"),
                dim(&s.prompt_tokens.to_string()),
                dim(&s.completion_tokens.to_string()),
                s.total_duration_ms,
            );
            if s.truncated {
                eprintln!(
                    "   {} only the first {} of {} characters were sent",
                    cyan("⚠"),
                    s.transmitted_chars,
                    s.input_chars
                );
            }
        }
    }

    Ok(())
}

async fn run_serve(args: &ServeArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args.model).await?;
    let pipeline = DigestPipeline::from_config(config).context("Failed to set up LLM provider")?;
    tracing::info!("Config: {:?}", pipeline.config());

    // Fetch the PDF engine up front so the first upload does not stall.
    ensure_pdf_engine(quiet)?;

    if !quiet {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Essence Map on http://{}", args.addr))
        );
    }

    essence_map::web::serve(args.addr, pipeline, body_limit_bytes(args.body_limit_mb))
        .await
        .context("Web server failed")
}

/// MiB → bytes, saturating at `usize::MAX`.
fn body_limit_bytes(mb: u64) -> usize {
    usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
}

/// Print the two sections to stdout.
fn print_digest(output: &DigestOutput) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle, "{}", bold("📝 Essence"))?;
    writeln!(handle, "{}\n", output.summary)?;
    writeln!(handle, "{}", bold("🗺️  Logic map"))?;
    match &output.diagram {
        DiagramSegment::Diagram(source) => {
            writeln!(handle, "```mermaid\n{source}\n```")?;
        }
        DiagramSegment::NotProduced => {
            writeln!(handle, "{}", dim("(no diagram produced)"))?;
        }
    }
    Ok(())
}

/// Make sure a pdfium library is available, downloading it on first use.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `DigestConfig`.
async fn build_config(args: &ModelArgs) -> Result<DigestConfig> {
    let gate_secret = args
        .gate_secret
        .clone()
        .filter(|s| !s.is_empty())
        .context("No gate secret configured; set ESSENCE_GATE_SECRET or pass --gate-secret")?;

    let system_prompt = if let Some(ref path) = args.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = DigestConfig::builder()
        .gate_secret(gate_secret)
        .max_input_chars(args.max_input_chars)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = args.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref d) = args.delimiter {
        builder = builder.delimiter(d);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
