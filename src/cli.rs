use crate::demo::run_demo;
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tax_filing::config::AppConfig;
use tax_filing::error::AppError;
use tax_filing::filing::{EntityId, FactImporter, FactStore, FilingEngine, FilingReport};
use tax_filing::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "tax-filing",
    about = "Classify taxpayer filing obligations from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Classify entities loaded from a CSV or JSON fact file
    Check(CheckArgs),
    /// Print the filing rule catalog
    Rules(RulesArgs),
    /// Classify the built-in example entities
    Demo,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Fact file (.csv with a header row of fact keys, or .json array of entities)
    path: PathBuf,
    /// Only report this entity
    #[arg(long)]
    entity: Option<String>,
    /// Emit JSON reports instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RulesArgs {
    /// Emit the catalog as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Check(args) => run_check(&config, args),
        Command::Rules(args) => run_rules(&config, args),
        Command::Demo => run_demo(&config),
    }
}

fn run_check(config: &AppConfig, args: CheckArgs) -> Result<(), AppError> {
    let CheckArgs { path, entity, json } = args;

    let mut store = FactStore::new();
    for row in FactImporter::from_path(&path)? {
        store.set_facts(row)?;
    }

    let engine = FilingEngine::with_thresholds(&config.filing.thresholds);
    let ids = match entity {
        Some(id) => vec![EntityId(id)],
        None => store.entity_ids(),
    };

    let mut reports = Vec::with_capacity(ids.len());
    for id in &ids {
        reports.push(engine.classify(&store, id)?.report());
    }

    print_reports(&reports, json)
}

fn run_rules(config: &AppConfig, args: RulesArgs) -> Result<(), AppError> {
    let engine = FilingEngine::with_thresholds(&config.filing.thresholds);
    let catalog = engine.rules().catalog();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("Filing rules (evaluated in order)");
    for rule in &catalog {
        println!(
            "- [{}] {} -> {} / {}",
            rule.tier_label, rule.name, rule.tag, rule.obligation
        );
        match rule.subject {
            Some(category) => println!("    when {} ({} only)", rule.condition, category.label()),
            None => println!("    when {}", rule.condition),
        }
        println!("    {}", rule.description);
    }
    Ok(())
}

pub(crate) fn print_reports(reports: &[FilingReport], json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        println!("{}\n", report.render_text());
    }
    Ok(())
}
