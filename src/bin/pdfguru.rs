//! CLI binary for pdf-guru.
//!
//! A thin shim over the library crate: maps flags to `GuruConfig`, uploads
//! the PDF into a scratch directory, runs one operation and prints the
//! result as text or JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_guru::{
    ConceptMap, GuruConfig, Insights, LearningService, LearningSession, Performance, Question,
    SessionProgressCallback, Stage, UploadRecord,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Renders session stages as a four-step progress bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking Ollama…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl SessionProgressCallback for CliProgressCallback {
    fn on_session_start(&self, total_stages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos}/{len}  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total_stages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Generating");
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<10} {}",
            green("✓"),
            stage,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let first_line = error.lines().next().unwrap_or_default();
        self.bar
            .println(format!("  {} {:<10} {}", red("✗"), stage, red(first_line)));
        self.bar.finish_and_clear();
    }

    fn on_session_complete(&self, session_id: Uuid) {
        self.bar.finish_and_clear();
        eprintln!("{} session {}", green("✔"), bold(&session_id.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Is Ollama reachable?
  pdfguru health

  # Extraction only (no model needed)
  pdfguru inspect lecture.pdf

  # Individual artifacts
  pdfguru summary lecture.pdf
  pdfguru questions --num-questions 8 lecture.pdf
  pdfguru concepts --json lecture.pdf > graph.json
  pdfguru insights --performance '{"questions_answered":4,"correct_answers":3,"time_spent":25}' lecture.pdf

  # Full learning session
  pdfguru process lecture.pdf -o session.json

ENVIRONMENT VARIABLES:
  OLLAMA_BASE_URL         Ollama server (default http://localhost:11434)
  OLLAMA_MODEL            Model name (default llama2)
  UPLOAD_FOLDER           Keep uploaded copies here instead of a temp dir
  PDF_GURU_MAX_UPLOAD_BYTES  Largest accepted PDF (default 16777216)
  PDFIUM_LIB_PATH         Path to libpdfium
  RUST_LOG                Log filter, overrides --verbose/--quiet

A .env file in the working directory is loaded first.
"#;

/// Generate learning material from PDFs with a local Ollama model.
#[derive(Parser, Debug)]
#[command(
    name = "pdfguru",
    version,
    about = "Generate summaries, quizzes, concept maps and study insights from PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ollama base URL.
    #[arg(long, global = true, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434")]
    base_url: String,

    /// Ollama model name.
    #[arg(long, global = true, env = "OLLAMA_MODEL", default_value = "llama2")]
    model: String,

    /// Directory to store uploaded copies in (default: a temp dir removed on exit).
    #[arg(long, global = true, env = "UPLOAD_FOLDER")]
    upload_dir: Option<PathBuf>,

    /// Questions to generate.
    #[arg(long, global = true, env = "PDF_GURU_NUM_QUESTIONS", default_value_t = 5)]
    num_questions: usize,

    /// Concepts the model should focus on.
    #[arg(long, global = true, env = "PDF_GURU_MAX_CONCEPTS", default_value_t = 10)]
    max_concepts: usize,

    /// Largest accepted PDF, in bytes.
    #[arg(
        long,
        global = true,
        env = "PDF_GURU_MAX_UPLOAD_BYTES",
        default_value_t = 16 * 1024 * 1024
    )]
    max_upload_bytes: usize,

    /// Completion timeout in seconds.
    #[arg(long, global = true, env = "PDF_GURU_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print JSON instead of text.
    #[arg(long, global = true, env = "PDF_GURU_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF_GURU_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "PDF_GURU_QUIET")]
    quiet: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "PDF_GURU_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether Ollama is reachable.
    Health,
    /// Extract and clean a PDF without calling the model.
    Inspect { pdf: PathBuf },
    /// Summarise a PDF.
    Summary { pdf: PathBuf },
    /// Generate multiple-choice questions.
    Questions { pdf: PathBuf },
    /// Generate a concept map.
    Concepts { pdf: PathBuf },
    /// Generate study insights.
    Insights {
        pdf: PathBuf,
        /// Learner performance as JSON; malformed input is ignored.
        #[arg(long)]
        performance: Option<String>,
    },
    /// Generate a complete learning session.
    Process {
        pdf: PathBuf,
        /// Write the session JSON to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    // Holds the scratch upload dir until main returns.
    let scratch = match cli.upload_dir {
        Some(_) => None,
        None => Some(tempfile::tempdir().context("Failed to create scratch directory")?),
    };
    let upload_dir = cli
        .upload_dir
        .clone()
        .or_else(|| scratch.as_ref().map(|d| d.path().to_path_buf()))
        .context("No upload directory")?;

    let progress_cb = match cli.command {
        Command::Process { .. } if show_progress => Some(CliProgressCallback::new()),
        _ => None,
    };
    let config = build_config(&cli, upload_dir, progress_cb)?;
    let service = LearningService::new(config).context("Failed to start service")?;

    match &cli.command {
        Command::Health => {
            let health = service.health().await;
            if cli.json {
                print_json(&health)?;
            } else if health.ollama_connected {
                println!(
                    "{} Ollama reachable at {} (model {})",
                    green("✔"),
                    service.config().base_url,
                    bold(&health.ollama_model)
                );
            } else {
                println!(
                    "{} Ollama not reachable at {}\n  Start it with: ollama serve",
                    red("✘"),
                    service.config().base_url
                );
            }
            if !health.ollama_connected {
                anyhow::bail!("Ollama is not reachable");
            }
        }

        Command::Inspect { pdf } => {
            let doc = service
                .inspect(pdf)
                .await
                .with_context(|| format!("Failed to extract {}", pdf.display()))?;
            if cli.json {
                print_json(&doc)?;
            } else {
                println!("File:     {}", pdf.display());
                println!("Title:    {}", doc.title);
                println!("Author:   {}", doc.author);
                if !doc.subject.is_empty() {
                    println!("Subject:  {}", doc.subject);
                }
                if !doc.creator.is_empty() {
                    println!("Creator:  {}", doc.creator);
                }
                println!("Pages:    {}", doc.page_count);
                println!("Words:    {}", doc.word_count);
                println!("Chars:    {}", doc.full_text.chars().count());
            }
        }

        Command::Summary { pdf } => {
            let record = upload(&service, pdf, cli.quiet).await?;
            let report = service
                .summary(record.pdf_id)
                .await
                .context("Summary generation failed")?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!("{}", bold(&report.title));
                println!(
                    "{}",
                    dim(&format!(
                        "{} pages · {} words · ~{} min read",
                        report.page_count, report.word_count, report.reading_time
                    ))
                );
                println!();
                println!("{}", report.summary);
            }
        }

        Command::Questions { pdf } => {
            let record = upload(&service, pdf, cli.quiet).await?;
            let questions = service
                .questions(record.pdf_id)
                .await
                .context("Question generation failed")?;
            if cli.json {
                print_json(&questions)?;
            } else {
                print_questions(&questions);
            }
        }

        Command::Concepts { pdf } => {
            let record = upload(&service, pdf, cli.quiet).await?;
            let map = service
                .concepts(record.pdf_id)
                .await
                .context("Concept extraction failed")?;
            if cli.json {
                print_json(&map)?;
            } else {
                print_concepts(&map);
            }
        }

        Command::Insights { pdf, performance } => {
            let performance = performance.as_deref().and_then(Performance::from_json_lenient);
            let record = upload(&service, pdf, cli.quiet).await?;
            let insights = service
                .insights(record.pdf_id, performance)
                .await
                .context("Insight generation failed")?;
            if cli.json {
                print_json(&insights)?;
            } else {
                print_insights(&insights);
            }
        }

        Command::Process { pdf, output } => {
            let record = upload(&service, pdf, cli.quiet).await?;
            let session = service
                .process(record.pdf_id)
                .await
                .context("Learning session failed")?;

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&session)
                    .context("Failed to serialise session")?;
                tokio::fs::write(path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
                }
            } else if cli.json {
                print_json(&session)?;
            } else {
                print_session(&session);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `GuruConfig`.
fn build_config(
    cli: &Cli,
    upload_dir: PathBuf,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<GuruConfig> {
    let mut builder = GuruConfig::builder()
        .base_url(&cli.base_url)
        .model(&cli.model)
        .upload_dir(upload_dir)
        .num_questions(cli.num_questions)
        .max_concepts(cli.max_concepts)
        .max_upload_bytes(cli.max_upload_bytes)
        .request_timeout_secs(cli.timeout);

    // pdfium resolves PDFIUM_LIB_PATH itself when no explicit path is set.
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as Arc<dyn SessionProgressCallback>);
    }

    builder.build().context("Invalid configuration")
}

async fn upload(service: &LearningService, pdf: &Path, quiet: bool) -> Result<UploadRecord> {
    let record = service
        .upload_path(pdf)
        .await
        .with_context(|| format!("Failed to load {}", pdf.display()))?;
    if !quiet {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold(&record.document.title),
            dim(&format!(
                "{} pages, {} words",
                record.document.page_count, record.document.word_count
            ))
        );
    }
    Ok(record)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialise output")?
    );
    Ok(())
}

fn print_questions(questions: &[Question]) {
    for q in questions {
        println!("{} {}", bold(&format!("{}.", q.id)), q.question);
        for (i, opt) in q.options.iter().enumerate() {
            let letter = (b'A' + i as u8) as char;
            if *opt == q.answer {
                println!("   {} {}", green(&format!("{letter})")), green(opt));
            } else {
                println!("   {letter}) {opt}");
            }
        }
        if !q.explanation.is_empty() {
            println!("   {}", dim(&q.explanation));
        }
        println!();
    }
}

fn print_concepts(map: &ConceptMap) {
    for node in &map.nodes {
        let [x, y, z] = node.position;
        println!(
            "{:<12} {:<28} importance {:.2}  {}",
            node.id,
            node.label,
            node.importance,
            dim(&format!("({x:.2}, {y:.2}, {z:.2})"))
        );
    }
    if !map.edges.is_empty() {
        println!();
        for edge in &map.edges {
            println!("{} → {}  {}", edge.from, edge.to, dim(&format!("{:.2}", edge.strength)));
        }
    }
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}", bold(heading));
    for item in items {
        println!("  • {item}");
    }
}

fn print_insights(insights: &Insights) {
    println!(
        "Attention {}  Understanding {}  Time {} min  Completion {}%",
        insights.attention_score,
        insights.understanding_score,
        insights.time_spent,
        insights.completion_rate
    );
    print_list("Strengths", &insights.strengths);
    print_list("Areas for improvement", &insights.areas_for_improvement);
    print_list("Recommendations", &insights.recommendations);
}

fn print_session(session: &LearningSession) {
    println!("{}", bold(&session.title));
    println!("{}", dim(&format!("session {}", session.id)));
    println!();
    println!("{}", session.summary);
    println!();
    print_questions(&session.questions);
    print_concepts(&session.concept_map);
    println!();
    print_insights(&session.insights);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_flag_reaches_config() {
        let cli = Cli::try_parse_from([
            "pdfguru",
            "--max-upload-bytes",
            "50000000",
            "summary",
            "lecture.pdf",
        ])
        .unwrap();
        assert_eq!(cli.max_upload_bytes, 50_000_000);

        let dir = tempfile::tempdir().unwrap();
        let config = build_config(&cli, dir.path().to_path_buf(), None).unwrap();
        assert_eq!(config.max_upload_bytes, 50_000_000);
        assert!(config.pdfium_lib_path.is_none());
    }

    #[test]
    fn upload_limit_flag_is_global() {
        let cli = Cli::try_parse_from([
            "pdfguru",
            "inspect",
            "--max-upload-bytes",
            "1024",
            "lecture.pdf",
        ])
        .unwrap();
        assert_eq!(cli.max_upload_bytes, 1024);
    }
}
