//! Command-line inspector for the Move highlighter.
//!
//! Usage:
//!   move-hl tokens `<file>` [--json]       - Tokens of every line, or JSON with end states
//!   move-hl semantic `<file>` [--legend]   - Semantic overlay as the flat LSP array
//!   move-hl highlight `<file>`             - The file, coloured through the configured theme
//!   move-hl language                     - Editor language configuration (comments, pairs, folding)
//!
//! Global options: `--config <file>` layers a TOML file over the built-in defaults and
//! `--grammar <file>` swaps the Move grammar for a JSON or YAML one.

mod render;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use move_config::{Loader, MoveConfig};
use move_lexer::{grammar, move_lang, LineDriver, RuleTable, Tokenizer};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let file = || {
        Arg::new("file")
            .help("Path to the Move source file")
            .value_name("FILE")
            .index(1)
    };

    Command::new("move-hl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect how Move sources are tokenized and coloured")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("grammar")
                .long("grammar")
                .short('g')
                .global(true)
                .value_name("FILE")
                .help("Grammar definition (.json, .yaml) to use instead of the Move grammar"),
        )
        .subcommand(
            Command::new("tokens")
                .about("Print the tokens of every line")
                .arg(file().required(true))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit JSON, including the state each line ends in")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("semantic")
                .about("Print the semantic tokens of a file, delta-encoded")
                .arg(file().required_unless_present("legend"))
                .arg(
                    Arg::new("legend")
                        .long("legend")
                        .help("Print the token type and modifier legend instead")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("highlight")
                .about("Print the file with ANSI colours from the theme")
                .arg(file().required(true)),
        )
        .subcommand(
            Command::new("language")
                .about("Print the editor language configuration as JSON"),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run(&cli().get_matches()) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let Some((command, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    let config = load_config(args)?;

    let output = match command {
        "tokens" => {
            let source = read_source(args)?;
            let lines = split_lines(&source);
            let driver = lex(load_table(args)?, &config, &lines);
            if args.get_flag("json") {
                render::token_json(&lines, &driver)?
            } else {
                render::token_listing(&lines, &driver)
            }
        }
        "semantic" if args.get_flag("legend") => {
            serde_json::to_string_pretty(&move_analysis::legend())?
        }
        "semantic" => {
            let source = read_source(args)?;
            if config.semantic.enabled {
                serde_json::to_string(&move_analysis::encode_flat(&move_analysis::scan(&source)))?
            } else {
                tracing::debug!("semantic overlay disabled by configuration");
                "[]".to_string()
            }
        }
        "highlight" => {
            let source = read_source(args)?;
            let lines = split_lines(&source);
            let theme = config.theme.compile().context("compiling theme")?;
            let driver = lex(load_table(args)?, &config, &lines);
            render::highlight(&lines, &driver, &theme)
        }
        "language" => serde_json::to_string_pretty(config.language.compile()?.config())?,
        other => bail!("unknown command {other}"),
    };

    println!("{}", output.trim_end_matches('\n'));
    Ok(())
}

fn load_config(args: &ArgMatches) -> Result<MoveConfig> {
    let mut loader = Loader::new();
    if let Some(path) = args.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader.build().context("cannot load configuration")
}

fn load_table(args: &ArgMatches) -> Result<Arc<RuleTable>> {
    match args.get_one::<String>("grammar") {
        Some(path) => {
            let table = grammar::load_file(Path::new(path))
                .with_context(|| format!("cannot load grammar {path}"))?;
            Ok(Arc::new(table))
        }
        None => Ok(move_lang::rule_table()),
    }
}

fn read_source(args: &ArgMatches) -> Result<String> {
    let path = args
        .get_one::<String>("file")
        .context("missing file argument")?;
    std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))
}

fn split_lines(source: &str) -> Vec<&str> {
    source.lines().collect()
}

fn lex(table: Arc<RuleTable>, config: &MoveConfig, lines: &[&str]) -> LineDriver {
    let tokenizer = Tokenizer::new(table).with_max_stack_depth(config.lexer.max_stack_depth);
    let mut driver = LineDriver::new(tokenizer);
    let report = driver.load(lines);
    tracing::debug!(lines = lines.len(), relexed = report.lines_relexed, "lexed document");
    driver
}
