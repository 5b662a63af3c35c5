use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;

use model_lineage::{EdgeKind, Engine, EngineConfig, Selection, parse_records};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with `dependencies` and `relationships` record lists
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    tension: Option<f64>,

    #[arg(long)]
    hover: Option<String>,

    #[arg(long)]
    focus: Option<String>,

    #[arg(long, value_delimiter = ',')]
    kinds: Vec<EdgeKind>,

    #[arg(long, value_delimiter = ',')]
    containers: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    objects: Vec<String>,

    /// Print the matching detail rows instead of the dataset
    #[arg(long)]
    details: bool,

    /// Print fuzzy name matches instead of the dataset
    #[arg(long)]
    search: Option<String>,

    #[arg(long, default_value_t = 20)]
    limit: usize,

    #[arg(long)]
    pretty: bool,

    #[arg(long, short)]
    verbose: bool,
}

fn selection<T: Ord>(values: Vec<T>) -> Selection<T> {
    if values.is_empty() {
        Selection::All
    } else {
        Selection::only(values)
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(tension) = args.tension {
        config.tension = tension;
    }

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let records = parse_records(&raw)?;

    let mut engine = Engine::new(config)?;
    engine
        .ingest(&records)
        .with_context(|| format!("failed to build a tree from {}", args.input.display()))?;

    engine.set_category_selection(
        selection(args.kinds),
        selection(args.containers),
        selection(args.objects),
    );
    engine.set_hover(args.hover.as_deref());
    engine.set_focused_node(args.focus.as_deref());

    if let Some(query) = args.search.as_deref() {
        return print_json(&engine.search(query, args.limit), args.pretty);
    }
    if args.details {
        return print_json(&engine.matching_detail_rows(), args.pretty);
    }

    let dataset = engine
        .dataset()
        .ok_or_else(|| anyhow!("no tree available for {}", args.input.display()))?;
    print_json(&dataset, args.pretty)
}
