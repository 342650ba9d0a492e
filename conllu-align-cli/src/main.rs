//! Command-line interface for conllu-align
//!
//! Usage:
//!   conllu-align text `<input>` [--offsets]                   - Print the raw text the oracle sees
//!   conllu-align annotate `<input>` --spans `<json>` [-o out]   - Write span markers into MISC
//!   conllu-align annotate `<input>` --proportional            - Annotate with the offline stand-in
//!   conllu-align report `<input>`                             - Summarise an annotated file
//!   conllu-align evaluate `<input>` --gold `<json>` --predicted `<json>`
//!                                                           - Character-level scores as JSON
//!
//! `<input>` may be `-` for stdin. Every command takes `--config <toml>`.

use clap::{ArgAction, Args, Parser, Subcommand};
use conllu_align::{
    format_report, load_spans, parse_document, AlignConfig, Aligner, Annotated, Oracle,
    ProportionalOracle, RandomIds, StaticOracle,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Align oracle character spans with CoNLL-U tokens
#[derive(Parser, Debug)]
#[command(name = "conllu-align", version, about, arg_required_else_help = true)]
struct Cli {
    /// TOML configuration file (defaults apply to missing keys)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the projected raw text of a CoNLL-U file
    Text(TextArgs),
    /// Merge labelled spans into a CoNLL-U file
    Annotate(AnnotateArgs),
    /// Summarise the markers of an annotated CoNLL-U file
    Report(ReportArgs),
    /// Score predicted spans against gold spans over the projected text
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
struct TextArgs {
    /// CoNLL-U file, or `-` for stdin
    input: PathBuf,

    /// Print the projection with its offset table as JSON
    #[arg(long)]
    offsets: bool,
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// CoNLL-U file, or `-` for stdin
    input: PathBuf,

    /// JSON span file (a bare array or an `annotations` envelope)
    #[arg(long, short = 's', required_unless_present = "proportional")]
    spans: Option<PathBuf>,

    /// Label the first 30% of the text with the first label and the rest
    /// with the third, instead of reading spans
    #[arg(long, conflicts_with = "spans")]
    proportional: bool,

    /// Write the annotated CoNLL-U here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Print diagnostics to stderr as JSON
    #[arg(long)]
    json: bool,

    /// Seed for span ids, for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Annotated CoNLL-U file, or `-` for stdin
    input: PathBuf,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// CoNLL-U file whose raw text both span files refer to, or `-` for stdin
    input: PathBuf,

    /// JSON span file with the gold standard
    #[arg(long, short = 'g')]
    gold: PathBuf,

    /// JSON span file with the predictions
    #[arg(long, short = 'p')]
    predicted: PathBuf,

    /// Write the evaluation here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn read_input(path: &Path) -> Result<String, String> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| format!("failed to read stdin: {}", e))?;
        Ok(content)
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))
    }
}

fn load_config(path: Option<&Path>) -> Result<AlignConfig, String> {
    match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            AlignConfig::load(path).map_err(|e| e.to_string())
        }
        None => Ok(AlignConfig::default()),
    }
}

fn run_text(args: TextArgs, config: AlignConfig) -> Result<(), String> {
    let conllu = read_input(&args.input)?;
    let (_, projection) = Aligner::new(config)
        .project_text(&conllu)
        .map_err(|e| e.to_string())?;

    if args.offsets {
        let json = serde_json::to_string_pretty(&projection).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        println!("{}", projection.raw_text);
    }
    Ok(())
}

fn print_diagnostics(annotated: &Annotated, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(&annotated.diagnostics).map_err(|e| e.to_string())?;
        eprintln!("{}", out);
    } else {
        eprintln!("{}", annotated.diagnostics);
    }
    Ok(())
}

fn run_annotate(args: AnnotateArgs, config: AlignConfig) -> Result<(), String> {
    let conllu = read_input(&args.input)?;
    let oracle: Box<dyn Oracle> = match &args.spans {
        Some(path) => Box::new(StaticOracle::new(
            load_spans(path).map_err(|e| e.to_string())?,
        )),
        None => Box::new(ProportionalOracle),
    };

    let mut ids = match args.seed {
        Some(seed) => RandomIds::seeded(seed),
        None => RandomIds::new(),
    };
    let annotated = Aligner::new(config)
        .annotate_with(&conllu, oracle.as_ref(), &mut ids)
        .map_err(|e| e.to_string())?;

    print_diagnostics(&annotated, args.json)?;

    let rendered = annotated.render();
    match &args.output {
        Some(path) => fs::write(path, rendered)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?,
        None => print!("{}", rendered),
    }
    Ok(())
}

fn run_report(args: ReportArgs, config: AlignConfig) -> Result<(), String> {
    let conllu = read_input(&args.input)?;
    let document = parse_document(&conllu).map_err(|e| e.to_string())?;
    print!(
        "{}",
        format_report(&document, &config.namespace, &config.labels)
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs, config: AlignConfig) -> Result<(), String> {
    let conllu = read_input(&args.input)?;
    let gold = load_spans(&args.gold).map_err(|e| e.to_string())?;
    let predicted = load_spans(&args.predicted).map_err(|e| e.to_string())?;

    let evaluation = Aligner::new(config)
        .evaluate_text(&conllu, &gold, &predicted)
        .map_err(|e| e.to_string())?;
    if !evaluation.label_check.consistent {
        eprintln!(
            "warning: label mismatch (gold only: {:?}, predicted only: {:?})",
            evaluation.label_check.gold_only, evaluation.label_check.predicted_only
        );
    }

    let json = serde_json::to_string_pretty(&evaluation).map_err(|e| e.to_string())?;
    match &args.output {
        Some(path) => fs::write(path, json + "\n")
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Text(args) => run_text(args, config),
        Commands::Annotate(args) => run_annotate(args, config),
        Commands::Report(args) => run_report(args, config),
        Commands::Evaluate(args) => run_evaluate(args, config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
