use clap::{Parser, Subcommand};
use outline_site::compile::{self, Freshness};
use outline_site::fill::CommandFiller;
use outline_site::{config, output, queue};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "outline-site")]
#[command(about = "Generate a documentation site skeleton from a numbered outline")]
#[command(long_about = "\
Generate a documentation site skeleton from a numbered outline

Every numbered line of the outline becomes a section directory with a page.
Numbers define the tree; section labels and markdown decoration are removed
from titles.

Outline:

  # Тема 1: Вступ
  ## 1.1 Основи
  ### 1.1.1 Змінні
  2. Практика

Output:

  site/
  ├── index.md                      # Home page listing top-level sections
  ├── 1-vstup/
  │   ├── index.md
  │   └── 1_1-osnovy/
  │       ├── index.md
  │       └── 1_1_1-zminni/
  │           ├── index.md          # Links to qa.md
  │           └── qa.md             # Q&A page (level 3 and deeper)
  └── 2-praktyka/
      └── index.md

Pages start with placeholder text. 'build --enqueue' lists them in the queue
file and 'fill' replaces the placeholders using the configured command.

Run 'outline-site gen-config' to generate a documented outline-site.toml.")]
#[command(version)]
struct Cli {
    /// Outline file
    #[arg(long, default_value = "content.md", global = true)]
    outline: PathBuf,

    /// Output directory (site root)
    #[arg(long, default_value = ".", global = true)]
    output: PathBuf,

    /// Config file (optional; defaults apply when absent)
    #[arg(long, default_value = "outline-site.toml", global = true)]
    config: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG applies otherwise
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean previous output and write the page tree
    Build {
        /// Also write every generated page to the fill queue
        #[arg(long)]
        enqueue: bool,
    },
    /// Parse the outline and report problems without writing anything
    Check,
    /// Remove the previous build's output
    Clean,
    /// Report whether the output matches the current outline
    Status,
    /// Replace placeholder text for every page in the fill queue
    Fill,
    /// Print a stock outline-site.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let load_config = || config::load_config(&cli.config);

    match cli.command {
        Command::Build { enqueue } => {
            let site_config = load_config()?;
            println!(
                "==> Building {} \u{2192} {}",
                cli.outline.display(),
                cli.output.display()
            );
            let outcome = compile::build(&cli.outline, &cli.output, &site_config)?;
            print_warnings(&outcome.warnings);
            output::print_build_output(&outcome.written);
            if enqueue {
                let queue_file = cli.output.join(&site_config.filler.queue_file);
                let items = outcome.written.fill_queue();
                queue::enqueue(&queue_file, &items)?;
                println!("==> Queued {} pages in {}", items.len(), queue_file.display());
            }
        }
        Command::Check => {
            let site_config = load_config()?;
            let text = compile::read_outline(&cli.outline)?;
            let report = compile::parse_outline(&text, &site_config)?;
            output::print_check_output(
                &report.outline,
                &report.warnings,
                site_config.pages.numbered_titles,
            );
            if !report.warnings.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
            println!("==> Outline is valid");
        }
        Command::Clean => {
            let site_config = load_config()?;
            let report = compile::clean_output(&cli.outline, &cli.output, &site_config)?;
            output::print_clean_output(&report, &cli.output);
        }
        Command::Status => {
            let freshness = compile::status(&cli.outline, &cli.output)?;
            println!("{}", output::format_status(freshness, &cli.output));
            if freshness != Freshness::UpToDate {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Fill => {
            let site_config = load_config()?;
            let base = config_base(&cli.config);
            let filler = CommandFiller::from_config(&site_config.filler, base)?;
            let queue_file = cli.output.join(&site_config.filler.queue_file);
            let fail_log = cli.output.join(&site_config.filler.fail_log);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_queue_event(&event));
                }
            });
            let summary = queue::run_queue(
                &cli.output,
                &queue_file,
                &fail_log,
                &filler,
                &site_config,
                Some(tx),
            );
            let _ = printer.join();
            let summary = summary?;
            println!("{}", output::format_queue_summary(&summary));
            if !summary.failed.is_empty() {
                println!("==> Failed pages appended to {}", fail_log.display());
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Route tracing to stderr, leaving stdout for command output.
///
/// `-v` flags win over `RUST_LOG`; with neither, only warnings are shown.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_warnings(warnings: &[outline_site::outline::ParseWarning]) {
    for line in output::format_warnings(warnings) {
        println!("{}", line);
    }
    if !warnings.is_empty() {
        println!();
    }
}

/// Directory that relative config paths (like `prompts_dir`) resolve against.
fn config_base(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
