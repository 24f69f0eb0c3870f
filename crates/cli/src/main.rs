mod schema;
mod table;

use anyhow::{Context, Result};
use argtable::{HelpOptions, ParseError, Theme};
use clap::{Parser, Subcommand, ValueEnum};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};
use tracing_subscriber::{EnvFilter, fmt};

use crate::schema::{DEFAULT_SCHEMA_NAME, Schema};

#[derive(Parser)]
#[command(name = "argtable")]
#[command(
    version,
    about = "Resolve command-line tokens against a declared argument table",
    long_about = None,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter argtable.json schema
    Init(InitArgs),

    /// Parse tokens against a schema and print the resolved table
    Parse(ParseArgs),

    /// Print the help text described by a schema
    Help(HelpArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Directory to write the schema into (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Program name recorded in the schema (default: directory name)
    #[arg(short, long)]
    program: Option<String>,

    /// Overwrite an existing schema
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the schema file
    #[arg(short, long, default_value = DEFAULT_SCHEMA_NAME, value_name = "FILE")]
    schema: PathBuf,

    /// Output format for the resolved table
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Forward bare tokens to stdout as they are scanned
    #[arg(long)]
    echo: bool,

    /// Tokens to parse, after `--`
    #[arg(last = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to the schema file
    #[arg(short, long, default_value = DEFAULT_SCHEMA_NAME, value_name = "FILE")]
    schema: PathBuf,

    /// Render without colour escapes
    #[arg(long)]
    no_color: bool,

    /// Omit the description
    #[arg(long)]
    no_description: bool,

    /// Omit the usage line
    #[arg(long)]
    no_usage: bool,

    /// Omit the epilog
    #[arg(long)]
    no_epilog: bool,

    /// Group arguments by kind (accepted for compatibility; no effect)
    #[arg(long)]
    group: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Shell,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args).map(|()| ExitCode::SUCCESS),
        Commands::Parse(args) => parse(args),
        Commands::Help(args) => help(args).map(|()| ExitCode::SUCCESS),
    }
}

fn init(args: InitArgs) -> Result<()> {
    tracing::debug!("executing init command");

    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let path = schema::write_default_schema(&dir, args.program.as_deref(), args.force)?;

    eprintln!("Created: {}", path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {DEFAULT_SCHEMA_NAME} to declare your arguments");
    eprintln!("  2. Run: argtable parse -- input=data.csv -v");

    Ok(())
}

fn parse(args: ParseArgs) -> Result<ExitCode> {
    tracing::debug!("executing parse command");

    let schema = Schema::from_file(&args.schema)?;
    let mut parser = schema.build_parser();

    let mut echoed = Vec::new();
    let result = parser.parse_with_echo(&args.tokens, &mut echoed);

    let mut stdout = io::stdout().lock();
    if args.echo && !echoed.is_empty() {
        stdout.write_all(&echoed).context("failed to write to stdout")?;
        writeln!(stdout).context("failed to write to stdout")?;
    }

    // Help wins over a missing required argument.
    if schema.auto_help && parser.flag("help") {
        let text = parser.render_help(&HelpOptions::all(), &Theme::default());
        stdout
            .write_all(text.as_bytes())
            .context("failed to write to stdout")?;
        return Ok(ExitCode::SUCCESS);
    }

    match result {
        Ok(()) => {}
        Err(err @ ParseError::MissingRequired { .. }) => {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    }

    let rendered = match args.format {
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&table::resolved_json(&parser))?;
            json.push('\n');
            json
        }
        Format::Shell => table::shell_assignments(&parser),
    };
    stdout
        .write_all(rendered.as_bytes())
        .context("failed to write to stdout")?;

    Ok(ExitCode::SUCCESS)
}

fn help(args: HelpArgs) -> Result<()> {
    tracing::debug!("executing help command");

    let schema = Schema::from_file(&args.schema)?;
    let parser = schema.build_parser();
    let options = HelpOptions {
        description: !args.no_description,
        usage: !args.no_usage,
        epilog: !args.no_epilog,
        group_by_kind: args.group,
    };
    let theme = if args.no_color {
        Theme::plain()
    } else {
        Theme::default()
    };

    print!("{}", parser.render_help(&options, &theme));
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
