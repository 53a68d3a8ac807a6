//! cmdbind - declarative command-line tokenizing and typed argument binding.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cmdbind::logger::config_logger;
use cmdbind::{
    generate_error_string, generate_json_string, generate_output_string, merge, parse_command,
    tokenize, CommandLineSerializer, Config,
};
use std::path::PathBuf;

/// Bind command-line arguments to a declarative JSON config.
#[derive(Parser, Debug)]
#[command(name = "cmdbind", version, about, disable_help_subcommand = true)]
struct Cli {
    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// How bound values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Shell export statements, suitable for `eval`
    Shell,
    /// A JSON document
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bind arguments to a config and print the values
    Parse {
        /// JSON configuration describing the command
        #[arg(long, conflicts_with = "config_file")]
        config: Option<String>,

        /// File holding the JSON configuration
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Shell)]
        format: Format,

        /// Environment variable prefix (overrides config)
        #[arg(long)]
        prefix: Option<String>,

        /// Raw command line to split instead of ARGS
        #[arg(long, conflicts_with = "args")]
        line: Option<String>,

        /// Arguments to bind
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Split a raw command line into tokens, printed as a JSON array
    Split {
        /// The command line to split
        #[arg(long)]
        line: String,
    },

    /// Join tokens into a single command line
    Merge {
        /// Tokens to join
        #[arg(last = true)]
        tokens: Vec<String>,
    },
}

fn load_config(config: Option<String>, config_file: Option<PathBuf>) -> Result<Config> {
    let cfg = match (config, config_file) {
        (Some(json), _) => Config::from_json(&json).context("failed to parse config JSON")?,
        (None, Some(path)) => Config::from_file(&path).context("failed to load config file")?,
        (None, None) => bail!("either --config or --config-file is required"),
    };
    cfg.validate().context("invalid config")?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    config_logger(cli.verbose)?;

    match cli.command {
        Commands::Parse {
            config,
            config_file,
            format,
            prefix,
            line,
            args,
        } => {
            let cfg = load_config(config, config_file)?;
            let effective_prefix = prefix.as_deref().unwrap_or_else(|| cfg.effective_prefix());

            let args = match line {
                Some(line) => tokenize(&line).context("failed to split command line")?,
                None => args,
            };

            let serializer = CommandLineSerializer::default();
            match format {
                Format::Json => {
                    let parsed = parse_command(&cfg, &serializer, &args)
                        .context("failed to parse arguments")?;
                    println!("{}", generate_json_string(&parsed)?);
                }
                Format::Shell => match parse_command(&cfg, &serializer, &args) {
                    Ok(parsed) => print!("{}", generate_output_string(&parsed, effective_prefix)),
                    Err(err) => {
                        print!("{}", generate_error_string(&err.to_string()));
                        std::process::exit(1);
                    }
                },
            }
        }
        Commands::Split { line } => {
            let tokens = tokenize(&line).context("failed to split command line")?;
            println!("{}", serde_json::to_string(&tokens)?);
        }
        Commands::Merge { tokens } => {
            println!("{}", merge(&tokens));
        }
    }

    Ok(())
}
