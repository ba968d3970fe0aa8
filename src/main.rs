use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use preflight::authority::{load_or_default, StaticAuthority};
use preflight::config::DEFAULT_COLLECTION_TYPE;
use preflight::graph::Graph;
use preflight::models::Record;
use preflight::store;
use preflight::{PreflightConfig, PreflightContext};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "preflight")]
#[command(about = "Check a bulk-ingest manifest and preview the graph it would create")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a manifest, print a summary and optionally save the graph
    Check(CheckArgs),
    /// Print a previously saved graph
    Show(ShowArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Path to the manifest (CSV)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory that relative file names resolve against
    #[arg(long)]
    import_root: PathBuf,

    /// CSV of licenses (id,label[,active]); built-in list if omitted
    #[arg(long)]
    licenses: Option<PathBuf>,

    /// CSV of rights statements (id,label[,active]); built-in list if omitted
    #[arg(long)]
    rights: Option<PathBuf>,

    /// CSV of resource types (id,label[,active]); built-in list if omitted
    #[arg(long)]
    resource_types: Option<PathBuf>,

    /// Collection type assigned to collections that do not name one
    #[arg(long, default_value = DEFAULT_COLLECTION_TYPE)]
    collection_type: String,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Where to save the assembled graph (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Path to a graph saved by `check -o`
    #[arg(short, long)]
    graph: PathBuf,
}

fn build_context(args: &CheckArgs) -> Result<PreflightContext> {
    if !args.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got {:?}", args.delimiter);
    }
    let config = PreflightConfig::new(&args.import_root)
        .with_collection_type(&args.collection_type)
        .with_delimiter(args.delimiter as u8);

    let resource_types = load_or_default(
        "resource type",
        args.resource_types.as_deref(),
        StaticAuthority::resource_types,
    );
    let licenses = load_or_default("license", args.licenses.as_deref(), StaticAuthority::licenses);
    let rights = load_or_default(
        "rights statement",
        args.rights.as_deref(),
        StaticAuthority::rights_statements,
    );

    PreflightContext::from_authorities(config, &*resource_types, &*licenses, &*rights)
        .context("Failed to load authorities")
}

fn run_check(args: CheckArgs) -> Result<bool> {
    let ctx = build_context(&args)?;

    let start = Instant::now();
    let graph = preflight::run(&args.input, &ctx);
    let duration = start.elapsed();

    if let Some(ref output) = args.output {
        store::save_graph(&graph, output)
            .with_context(|| format!("Failed to save graph to {:?}", output))?;
    }

    let summary = graph.summary();
    let stats = &graph.report.stats;

    println!();
    println!("=== Summary ===");
    println!("Check time:         {:.2}s", duration.as_secs_f64());
    println!();
    println!("Rows read:          {}", stats.rows_read);
    println!("Rows skipped:       {}", stats.skipped());
    println!("Collections:        {}", summary.collections);
    println!("Works:              {}", summary.works);
    println!("Files:              {}", summary.files);
    println!("Invalid records:    {}", summary.invalid);
    println!("Warnings:           {}", summary.warnings);

    if !graph.report.fatal_errors.is_empty() {
        println!();
        println!("=== Fatal errors ===");
        for message in &graph.report.fatal_errors {
            println!("{}", message);
        }
    }
    if !graph.report.warnings.is_empty() {
        println!();
        println!("=== Warnings ===");
        for message in &graph.report.warnings {
            println!("{}", message);
        }
    }
    if !graph.report.invalid.is_empty() {
        println!();
        println!("=== Invalid records ===");
        for invalid in &graph.report.invalid {
            println!("{}", invalid.message);
        }
    }

    Ok(!summary.fatal)
}

fn run_show(args: ShowArgs) -> Result<bool> {
    let graph = store::load_graph(&args.graph)?;
    print_tree(&graph);
    Ok(!graph.report.is_fatal())
}

fn print_tree(graph: &Graph) {
    println!("root");
    let mut stack: Vec<(&Record, usize)> = graph.children.iter().rev().map(|r| (r, 1)).collect();
    while let Some((record, depth)) = stack.pop() {
        let source = record
            .file
            .as_ref()
            .map(|f| format!(" [{}]", f.name()))
            .unwrap_or_default();
        println!(
            "{}{} {} (line {}){}",
            "  ".repeat(depth),
            record.kind,
            record.display_name(),
            record.line_number,
            source
        );
        stack.extend(record.children.iter().rev().map(|c| (c, depth + 1)));
    }
    if !graph.report.invalid.is_empty() {
        println!();
        println!("{} invalid record(s) not attached", graph.report.invalid.len());
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Show(args) => run_show(args),
    };

    match result {
        Ok(true) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            error!("Manifest rejected");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
