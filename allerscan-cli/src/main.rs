use allerscan::{
    config::{CliOverrides, ScanConfig},
    create_recognizer,
    interactive::{run_viewer, ViewerOptions},
    render::paint,
    Analysis, ImageHandle, JsonTermStore, RecognizerKind, ScanError, ScanSession, StyledRun,
    TermSet, TermStore,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, ScanError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Term list to use instead of the configured one
    #[arg(long, global = true)]
    terms_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CliScanArgs {
    /// Image of the ingredients list
    #[arg(short, long)]
    image: PathBuf,

    /// Recognizer to use (tesseract|sidecar)
    #[arg(short, long)]
    recognizer: Option<RecognizerKind>,

    /// Language passed to the recognizer
    #[arg(short, long)]
    lang: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand)]
enum TermsCommand {
    /// List terms in display order
    List,

    /// Add one or more terms
    Add {
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Remove one or more terms
    Remove {
        #[arg(required = true)]
        terms: Vec<String>,
    },
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the allergen term list
    Terms {
        #[command(subcommand)]
        action: TermsCommand,
    },

    /// Recognize an image and print its text with matches highlighted
    Scan {
        #[command(flatten)]
        args: CliScanArgs,

        /// Show only statistics, not the text
        #[arg(short, long)]
        stats: bool,
    },

    /// Recognize an image and step through its matches
    Interactive {
        #[command(flatten)]
        args: CliScanArgs,

        /// Lines of context around the current match
        #[arg(short = 'C', long)]
        context: Option<usize>,
    },
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (scan_args, context) = match &cli.command {
        Commands::Scan { args, .. } => (Some(args), None),
        Commands::Interactive { args, context } => (Some(args), *context),
        Commands::Terms { .. } => (None, None),
    };

    let config = ScanConfig::load_from(cli.config.as_deref())?.merge_with_cli(CliOverrides {
        terms_path: cli.terms_file.clone(),
        recognizer: scan_args.and_then(|a| a.recognizer),
        language: scan_args.and_then(|a| a.lang.clone()),
        no_color: scan_args.is_some_and(|a| a.no_color),
        context_lines: context,
        log_level: cli.log_level.clone(),
    });

    init_logging(&config.log_level);
    if config.no_color {
        colored::control::set_override(false);
    }

    debug!("Resolved configuration: {:?}", config);

    let store = JsonTermStore::new(&config.terms_path);
    debug!("Using term list at {}", store.path().display());

    match cli.command {
        Commands::Terms { action } => run_terms(&store, action),
        Commands::Scan { args, stats } => {
            let session = recognize_image(&store, &config, &args.image)?;
            print_scan_results(&session, stats, !config.no_color);
            Ok(())
        }
        Commands::Interactive { args, .. } => {
            let mut session = recognize_image(&store, &config, &args.image)?;
            run_viewer(
                &mut session,
                ViewerOptions {
                    context_lines: config.context_lines,
                    use_color: !config.no_color,
                },
            )?;
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_terms(store: &JsonTermStore, action: TermsCommand) -> Result<()> {
    let mut terms = store.load()?;
    match action {
        TermsCommand::List => {
            print_terms(&terms);
            return Ok(());
        }
        TermsCommand::Add { terms: added } => {
            for raw in &added {
                if terms.insert(raw) {
                    println!("Added '{}'", raw.trim());
                } else if raw.trim().is_empty() {
                    eprintln!("Skipping blank term");
                } else {
                    println!("'{}' is already in the list", raw.trim());
                }
            }
        }
        TermsCommand::Remove { terms: removed } => {
            for raw in &removed {
                if terms.remove(raw) {
                    println!("Removed '{}'", raw.trim());
                } else {
                    println!("'{}' is not in the list", raw.trim());
                }
            }
        }
    }
    store.save(&terms)
}

fn recognize_image(
    store: &JsonTermStore,
    config: &ScanConfig,
    image: &std::path::Path,
) -> Result<ScanSession> {
    let mut session = ScanSession::new(TermSet::new());
    session.attach_store(store)?;
    if session.terms().is_empty() {
        eprintln!(
            "No terms in {}; add some with `allerscan terms add`",
            store.path().display()
        );
    }

    info!(
        "Recognizing {} with {:?} ({} terms)",
        image.display(),
        config.recognizer,
        session.terms().len()
    );
    let recognizer = create_recognizer(config.recognizer, config.language.clone());
    let handle = ImageHandle::open(image)?;
    session.recognize(recognizer.as_ref(), &handle)?;
    Ok(session)
}

fn print_terms(terms: &TermSet) {
    if terms.is_empty() {
        println!("No terms");
        return;
    }
    for term in terms.iter() {
        println!("{}", term);
    }
}

fn print_scan_results(session: &ScanSession, stats_only: bool, use_color: bool) {
    let analysis = session.analysis();
    if !stats_only {
        let rendered = session.render();
        let width = rendered.len().to_string().len();
        for (number, runs) in rendered.iter().enumerate() {
            print_line(number, runs, width, analysis, use_color);
        }
    }

    let found = found_terms(analysis);
    if !found.is_empty() {
        println!("\nTerms found: {}", found.join(", "));
    }
    println!(
        "\nFound {} matches on {} lines",
        analysis.match_count(),
        analysis.lines_with_matches()
    );
}

fn print_line(number: usize, runs: &[StyledRun], width: usize, analysis: &Analysis, use_color: bool) {
    let label = format!("{:>width$}", number + 1, width = width);
    let label = if analysis.match_lines.binary_search(&number).is_ok() {
        label.green().to_string()
    } else {
        label
    };
    println!("{}: {}", label, paint(runs, use_color));
}

/// Distinct matched terms in display order
fn found_terms(analysis: &Analysis) -> Vec<String> {
    let found: TermSet = analysis.spans.iter().map(|m| m.term.as_str()).collect();
    found.iter().map(|t| t.to_string()).collect()
}
