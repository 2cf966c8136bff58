mod config;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use table_like_core::{ObjectIdentifier, resolve_strategies};
use table_like_parser::output::{OutputFormat, explain_like, format_table};
use table_like_parser::resolve::TableRegistry;
use table_like_parser::{CreateTableStatement, parse_script};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::LikeConfig;

#[derive(Debug, Parser)]
#[command(name = "table-like")]
#[command(about = "Validate and resolve CREATE TABLE ... LIKE statements")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse SQL files and validate every LIKE clause.
    Validate(ValidateArgs),
    /// Resolve a script in order and print the schema of one table.
    Merge(MergeArgs),
    /// Show the effective strategy of every feature for each LIKE clause.
    Explain(ExplainArgs),
    /// Write a configuration file with the default settings.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// SQL files and/or directories containing `*.sql` files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// SQL script to resolve (`-` reads stdin).
    #[arg(long)]
    input: PathBuf,
    /// Directory of `<table>.json` schemas available as LIKE sources.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Table to print (default: the last statement of the script).
    #[arg(long)]
    table: Option<String>,
    /// Output format (default: from config, else json).
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Write the result to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    /// SQL script to explain (`-` reads stdin).
    #[arg(long)]
    input: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Path of the YAML file to write.
    #[arg(long, default_value = "table-like.yaml")]
    output: PathBuf,
    /// Output format recorded in the file.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Replace an existing file.
    #[arg(long)]
    force: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Merge(args) => run_merge(args),
        Command::Explain(args) => run_explain(args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let paths = collect_sql_paths(&args.inputs)?;
    let counts: Vec<Result<usize, String>> =
        paths.par_iter().map(|path| validate_file(path)).collect();

    let mut statements = 0;
    for count in counts {
        statements += count?;
    }

    println!(
        "Validated {statements} statement(s) in {} file(s).",
        paths.len()
    );
    Ok(())
}

fn validate_file(path: &Path) -> Result<usize, String> {
    let statements = load_script(path)?;
    for statement in &statements {
        statement
            .validate()
            .map_err(|e| format!("{}: {}: {e}", path.display(), statement.name))?;
    }
    debug!(path = %path.display(), statements = statements.len(), "Validated file");
    Ok(statements.len())
}

fn run_merge(args: MergeArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let statements = load_script(&args.input)?;

    let mut registry = match args.catalog {
        Some(ref dir) => TableRegistry::from_dir(dir).map_err(|e| e.to_string())?,
        None => TableRegistry::new(),
    };
    for statement in &statements {
        let resolved = registry
            .apply(statement, &config.defaults)
            .map_err(|e| e.to_string())?;
        info!(table = %resolved.name, created = resolved.created, "Resolved table");
    }

    let name = match args.table {
        Some(ref table) => ObjectIdentifier::new(table.split('.')),
        None => statements
            .last()
            .map(|statement| statement.name.clone())
            .ok_or_else(|| format!("no CREATE TABLE statement in {}", args.input.display()))?,
    };
    let schema = registry
        .get(&name.key())
        .ok_or_else(|| format!("table '{name}' not found"))?;

    let format = args.format.unwrap_or(config.output.format);
    let mut rendered = format_table(&name, schema, format)?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match args.output {
        Some(ref path) => {
            fs::write(path, rendered)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            println!("Wrote table {name} to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn run_explain(args: ExplainArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let statements = load_script(&args.input)?;

    let mut explained = 0;
    for statement in &statements {
        let Some(clause) = statement.like_clause() else {
            continue;
        };
        clause
            .validate()
            .map_err(|e| format!("{}: {e}", statement.name))?;
        let strategies = resolve_strategies(clause.options(), &config.defaults);
        print!("{}", explain_like(&statement.name, clause, &strategies));
        explained += 1;
    }

    if explained == 0 {
        println!("No LIKE clauses in {}.", args.input.display());
    }
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to replace it)",
            args.output.display()
        ));
    }

    let mut config = LikeConfig::default();
    if let Some(format) = args.format {
        config.output.format = format;
    }
    config
        .save(&args.output)
        .map_err(|e| format!("Failed to save config '{}': {e}", args.output.display()))?;

    println!("Wrote config to {}", args.output.display());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<LikeConfig, String> {
    match path {
        Some(path) => LikeConfig::load(path).map_err(|e| format!("{}: {e}", path.display())),
        None => Ok(LikeConfig::default()),
    }
}

fn load_script(path: &Path) -> Result<Vec<CreateTableStatement>, String> {
    let sql = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?
    };
    parse_script(&sql).map_err(|e| format!("{}: {e}", path.display()))
}

/// Expands directories into their `*.sql` files, sorted by path.
fn collect_sql_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            let entries = fs::read_dir(input)
                .map_err(|e| format!("failed to read {}: {e}", input.display()))?;
            for entry in entries {
                let path = entry.map_err(|e| e.to_string())?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("sql") {
                    found.push(path);
                }
            }
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }

    if paths.is_empty() {
        return Err("no SQL files found".to_string());
    }
    Ok(paths)
}
