//! CLI binary for recipe-scribe.
//!
//! A thin shim over the library crate that maps CLI flags to `ScribeConfig`,
//! prints a results table and writes the requested exports.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use recipe_scribe::config::DEFAULT_SITE_NAME;
use recipe_scribe::{
    export, synthesize_site, transcribe_inputs, BatchOutput, BatchProgressCallback,
    ProgressCallback, ScribeConfig,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per photo.
/// Photos complete out of order, so start times are keyed by name.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us the batch size.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading photos…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} photos  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Transcribing");
        self.bar.reset_eta();
    }

    /// Remove the bar when the run ends before the batch starts.
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }

    fn elapsed_secs(&self, name: &str) -> f64 {
        self.start_times
            .lock()
            .map(|mut m| m.remove(name))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Transcribing {total_images} photos…"))
        ));
    }

    fn on_image_start(&self, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(name.to_string(), Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_image_complete(&self, name: &str, text_len: usize) {
        let secs = self.elapsed_secs(name);
        self.bar.println(format!(
            "  {} {:<32}  {:<8}  {}",
            green("✓"),
            name,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, name: &str, error: &str) {
        let secs = self.elapsed_secs(name);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_images: usize, success_count: usize) {
        let failed = total_images.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} photos transcribed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} photos transcribed  ({} failed)",
                if failed == total_images {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_images,
                red(&failed.to_string()),
            );
        }
    }

    fn on_synthesis_start(&self, recipe_count: usize) {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Building website from {recipe_count} recipes…"))
        );
    }

    fn on_synthesis_complete(&self, success: bool) {
        if success {
            eprintln!("{} website ready", green("✔"));
        } else {
            eprintln!("{} website synthesis failed", red("✘"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe a folder of recipe cards, print a summary table
  recipe-scribe cards/

  # Export a CSV of all transcriptions
  recipe-scribe cards/ --csv recipes.csv

  # Also build a single-file recipe website
  recipe-scribe cards/*.jpg --site recipes.html --site-name "Grandma's Kitchen"

  # Use a specific model and provider
  recipe-scribe --provider openai --model gpt-4o card.jpg

  # JSON output for scripting
  recipe-scribe --json cards/ > batch.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. recipe_scribe=debug)
"#;

/// Transcribe handwritten recipe photos with Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "recipe-scribe",
    version,
    about = "Transcribe handwritten recipe photos to markdown and build a recipe website",
    long_about = "Transcribe photos of handwritten recipes (files, directories or URLs) to \
markdown using Vision Language Models, export them as CSV, and optionally synthesize a \
standalone HTML recipe website. Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, \
and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files (png/jpg/jpeg/webp/gif), directories of images, or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write a CSV of (Image Name, Transcribed Text) to this file.
    #[arg(long, env = "RECIPE_SCRIBE_CSV")]
    csv: Option<PathBuf>,

    /// Synthesize a recipe website and write it to this file.
    #[arg(long, env = "RECIPE_SCRIBE_SITE")]
    site: Option<PathBuf>,

    /// Website title.
    #[arg(long, env = "RECIPE_SCRIBE_SITE_NAME", default_value = DEFAULT_SITE_NAME)]
    site_name: String,

    /// Print structured JSON (BatchOutput) to stdout instead of a table.
    #[arg(long, env = "RECIPE_SCRIBE_JSON")]
    json: bool,

    /// Vision model ID used for transcription (e.g. gpt-4o-mini, gpt-4o).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Text model ID used for website synthesis. Defaults to the transcription model.
    #[arg(long, env = "RECIPE_SCRIBE_SYNTHESIS_MODEL")]
    synthesis_model: Option<String>,

    /// Number of concurrent transcription calls.
    #[arg(short, long, env = "RECIPE_SCRIBE_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Max output tokens per transcription.
    #[arg(long, env = "RECIPE_SCRIBE_MAX_TOKENS", default_value_t = 1500)]
    max_tokens: usize,

    /// Max output tokens for the website.
    #[arg(long, env = "RECIPE_SCRIBE_SITE_MAX_TOKENS", default_value_t = 16000)]
    site_max_tokens: usize,

    /// Transcription temperature (0.0–2.0).
    #[arg(long, env = "RECIPE_SCRIBE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Per-photo LLM call timeout in seconds.
    #[arg(long, env = "RECIPE_SCRIBE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RECIPE_SCRIBE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to a text file containing a custom transcription prompt.
    #[arg(long, env = "RECIPE_SCRIBE_PROMPT")]
    prompt: Option<PathBuf>,

    /// Strip outer markdown fences from transcriptions.
    #[arg(long, env = "RECIPE_SCRIBE_CLEAN")]
    clean: bool,

    /// Exit with an error if any photo failed.
    #[arg(long, env = "RECIPE_SCRIBE_STRICT")]
    strict: bool,

    /// Disable progress bar.
    #[arg(long, env = "RECIPE_SCRIBE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RECIPE_SCRIBE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RECIPE_SCRIBE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let cli_cb = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb = cli_cb
        .clone()
        .map(|cb| cb as Arc<dyn BatchProgressCallback>);

    // The spinner runs until the batch starts; clear it on any early error.
    let clear_spinner = || {
        if let Some(ref cb) = cli_cb {
            cb.abandon();
        }
    };

    let config = build_config(&cli, progress_cb)
        .await
        .inspect_err(|_| clear_spinner())?;

    // ── Transcribe ───────────────────────────────────────────────────────
    let output = transcribe_inputs(cli.inputs.as_slice(), &config)
        .await
        .inspect_err(|_| clear_spinner())
        .context("Transcription failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_table(&output).context("Failed to write to stdout")?;
    }

    if let Some(ref path) = cli.csv {
        export::write_csv(path, &output.results).context("Failed to write CSV")?;
        if !cli.quiet {
            eprintln!("{}  CSV  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    // ── Website ──────────────────────────────────────────────────────────
    // Synthesis failure is reported but keeps the transcriptions and CSV.
    let mut site_failed = false;
    if let Some(ref path) = cli.site {
        match synthesize_site(&output.recipes, &cli.site_name, &config).await {
            Ok(site) => {
                for w in &site.warnings {
                    eprintln!("{} {}", cyan("⚠"), w);
                }
                export::write_html(path, &site).context("Failed to write website")?;
                if !cli.quiet {
                    eprintln!("{}  website  →  {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            Err(e) => {
                eprintln!("{} {}", red("✘"), e);
                site_failed = true;
            }
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.total_input_tokens.to_string()),
            dim(&output.stats.total_output_tokens.to_string()),
            output.stats.duration_ms,
        );
    }

    if cli.strict || output.stats.succeeded == 0 {
        output.into_result().context("Some photos failed")?;
    }
    if site_failed {
        anyhow::bail!("Website synthesis failed");
    }
    Ok(())
}

/// Print one row per photo: name, recipe title (or error), text length.
fn print_table(output: &BatchOutput) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut recipes = output.recipes.iter();

    writeln!(out, "{:<32}  {:<40}  {:>6}", "IMAGE", "RECIPE", "CHARS")?;
    for r in &output.results {
        match &r.error {
            None => {
                let title = recipes.next().map(|rc| rc.title.as_str()).unwrap_or("");
                writeln!(out, "{:<32}  {:<40}  {:>6}", r.source_name, title, r.text.len())?;
            }
            Some(e) => {
                writeln!(out, "{:<32}  {:<40}  {:>6}", r.source_name, red(&e.to_string()), "-")?;
            }
        }
    }
    Ok(())
}

/// Map CLI args to `ScribeConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ScribeConfig> {
    let mut builder = ScribeConfig::builder()
        .concurrency(cli.concurrency)
        .max_tokens(cli.max_tokens)
        .synthesis_max_tokens(cli.site_max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .clean_markdown(cli.clean);

    if let Some(ref path) = cli.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.transcription_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.synthesis_model {
        builder = builder.synthesis_model(model);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_name_defaults_to_library_constant() {
        let cli = Cli::try_parse_from(["recipe-scribe", "card.jpg"]).unwrap();
        assert_eq!(cli.site_name, DEFAULT_SITE_NAME);
        assert_eq!(cli.inputs, vec!["card.jpg".to_string()]);
    }

    #[test]
    fn abandoned_spinner_is_finished() {
        let cb = CliProgressCallback::new_dynamic();
        assert!(!cb.bar.is_finished());
        cb.abandon();
        assert!(cb.bar.is_finished());
    }
}
