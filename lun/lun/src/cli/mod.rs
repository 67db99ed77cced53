#![cfg(not(target_family = "wasm"))]

use std::env;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::exit;

use anstream::eprintln;
use anyhow::bail;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_verbosity_flag::LogLevel;
use clio::has_extension;
use clio::Output;
use is_terminal::IsTerminal;
use itertools::Itertools;
use schemars::schema_for;
use serde::Serialize;

use lun::{ast, lr, ErrorMessages, Options, SourceTree};

/// Entrypoint called by [`crate::main`]
pub fn main() -> color_eyre::eyre::Result<()> {
    let mut cli = Cli::parse();

    env_logger::builder()
        .format_timestamp(None)
        .filter_level(cli.verbose.log_level_filter())
        .init();

    color_eyre::install()?;
    cli.color.write_global();

    if let Err(error) = cli.command.run() {
        eprintln!("{error}");
        // Copied from
        // https://doc.rust-lang.org/src/std/backtrace.rs.html#1-504, since it's private
        fn backtrace_enabled() -> bool {
            match env::var("RUST_LIB_BACKTRACE") {
                Ok(s) => s != "0",
                Err(_) => match env::var("RUST_BACKTRACE") {
                    Ok(s) => s != "0",
                    Err(_) => false,
                },
            }
        }
        if backtrace_enabled() {
            eprintln!("{:#}", error.backtrace());
        }

        exit(1)
    }

    Ok(())
}

#[derive(Parser, Debug, Clone)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    color: colorchoice_clap::Color,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<LoggingHelp>,
}

#[derive(Subcommand, Debug, Clone)]
#[command(name = env!("CARGO_PKG_NAME"), about, version)]
enum Command {
    /// Lex into tokens, including comments
    Lex {
        #[command(flatten)]
        io_args: IoArgs,
        #[arg(value_enum, long, default_value = "yaml", env = "LUN_FORMAT")]
        format: Format,
    },

    /// Parse into the AST
    Parse {
        #[command(flatten)]
        io_args: IoArgs,
        #[arg(value_enum, long, default_value = "yaml", env = "LUN_FORMAT")]
        format: Format,
    },

    /// Parse & print the syntax tree as an S-expression
    Tree(IoArgs),

    /// Parse every `.lun` file of a path & report errors
    Check {
        #[arg(value_parser, default_value = "-", value_hint(ValueHint::AnyPath))]
        input: clio::ClioPath,
    },

    /// Show the node kinds & fields of the grammar
    Language {
        #[arg(value_enum, long, default_value = "yaml", env = "LUN_FORMAT")]
        format: Format,
    },

    #[command(subcommand)]
    Debug(DebugCommand),

    /// Print a shell completion for supported shells
    #[command(name = "shell-completion")]
    ShellCompletion {
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

/// Commands for meant for debugging, prone to change
#[derive(Subcommand, Debug, Clone)]
enum DebugCommand {
    /// Print JSON Schema
    JsonSchema {
        #[arg(value_enum, long)]
        schema_type: SchemaType,
    },
}

#[derive(clap::Args, Default, Debug, Clone)]
pub struct IoArgs {
    #[arg(value_parser, default_value = "-", value_hint(ValueHint::AnyPath))]
    input: clio::ClioPath,

    #[arg(value_parser, default_value = "-", value_hint(ValueHint::FilePath))]
    output: Output,
}

#[derive(Copy, Clone, Debug, Default)]
struct LoggingHelp;

impl LogLevel for LoggingHelp {
    /// By default, this will only report errors.
    fn default() -> Option<log::Level> {
        Some(log::Level::Error)
    }
    fn verbose_help() -> Option<&'static str> {
        Some("Increase logging verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        Some(
            r#"More `v`s, More vebose logging:
-v shows warnings
-vv shows info
-vvv shows debug
-vvvv shows trace"#,
        )
    }

    fn quiet_help() -> Option<&'static str> {
        Some("Silences logging output")
    }

    fn quiet_long_help() -> Option<&'static str> {
        Some("Silences logging output")
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn serialize<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        Ok(match self {
            Format::Json => serde_json::to_string_pretty(value)?.into_bytes(),
            Format::Yaml => serde_yaml::to_string(value)?.into_bytes(),
        })
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SchemaType {
    Ast,
    Tokens,
}

/// What `lun language` prints.
#[derive(Serialize)]
struct LanguageInfo {
    name: &'static str,
    version: String,
    abi_version: usize,
    node_kinds: Vec<NodeKindInfo>,
    fields: Vec<FieldInfo>,
}

#[derive(Serialize)]
struct NodeKindInfo {
    id: u16,
    name: &'static str,
    named: bool,
}

#[derive(Serialize)]
struct FieldInfo {
    id: u16,
    name: &'static str,
}

impl LanguageInfo {
    fn new(language: &lun::Language) -> Self {
        LanguageInfo {
            name: language.name(),
            version: language.version().to_string(),
            abi_version: language.abi_version(),
            node_kinds: language
                .node_kinds()
                .map(|k| NodeKindInfo {
                    id: k.id(),
                    name: k.name(),
                    named: k.is_named(),
                })
                .collect(),
            fields: language
                .fields()
                .map(|f| FieldInfo {
                    id: f.id(),
                    name: f.name(),
                })
                .collect(),
        }
    }
}

impl Command {
    /// Entrypoint called by [`main`]
    pub fn run(&mut self) -> Result<()> {
        match self {
            Command::ShellCompletion { shell } => {
                shell.generate(&mut Cli::command(), &mut std::io::stdout());
                Ok(())
            }
            Command::Language { format } => {
                let info = LanguageInfo::new(&lun::language());
                io::stdout().write_all(&format.serialize(&info)?)?;
                Ok(())
            }
            Command::Debug(DebugCommand::JsonSchema { schema_type }) => {
                let schema = match schema_type {
                    SchemaType::Ast => schema_for!(ast::SourceFile),
                    SchemaType::Tokens => schema_for!(lr::Tokens),
                };
                io::stdout().write_all(&serde_json::to_string_pretty(&schema)?.into_bytes())?;
                Ok(())
            }
            Command::Check { input } => {
                let sources = read_files(input)?;
                let message = check(&sources)?;
                anstream::println!("{message}");
                Ok(())
            }
            _ => self.run_io_command(),
        }
    }

    fn run_io_command(&mut self) -> Result<()> {
        let mut sources = self.read_input()?;

        self.execute(&mut sources)
            .and_then(|buf| Ok(self.write_output(&buf)?))
    }

    fn execute(&self, sources: &mut SourceTree) -> Result<Vec<u8>> {
        Ok(match self {
            Command::Lex { format, .. } => {
                let source = single_source(sources, "lex")?;
                let tokens = lun::lex(source)?;
                format.serialize(&tokens)?
            }
            Command::Parse { format, .. } => {
                let (source_id, _) = single_source_id(sources, "parse")?;
                let ast = lun::parse_tree(sources, source_id)?;
                format.serialize(&ast)?
            }
            Command::Tree(_) => {
                let (source_id, source) = single_source_id(sources, "tree")?;

                let mut parser = lun::Parser::new().with_options(
                    Options::default().with_source_id(source_id),
                );
                parser.set_language(&lun::language())?;
                let tree = parser
                    .parse(source)
                    .ok_or_else(|| anyhow::anyhow!("no language set on the parser"))?;

                if tree.has_error() {
                    eprintln!("{}", tree.error_messages());
                }
                (tree.to_sexp() + "\n").into_bytes()
            }
            _ => unreachable!("Other commands shouldn't reach `execute`"),
        })
    }

    fn read_input(&mut self) -> Result<SourceTree> {
        use Command::*;
        let io_args = match self {
            Lex { io_args, .. } | Parse { io_args, .. } | Tree(io_args) => io_args,
            _ => unreachable!(),
        };
        read_files(&mut io_args.input)
    }

    fn write_output(&mut self, data: &[u8]) -> std::io::Result<()> {
        use Command::*;
        let mut output = match self {
            Lex { io_args, .. } | Parse { io_args, .. } | Tree(io_args) => io_args.output.clone(),
            _ => unreachable!(),
        };
        output.write_all(data)
    }
}

/// Parses every source of the tree, failing with all their errors.
fn check(sources: &SourceTree) -> Result<String> {
    let mut errors = Vec::new();
    let mut count = 0;
    for (source_id, path) in sources.source_ids() {
        log::debug!("checking {}", path.display());
        if let Err(e) = lun::parse_tree(sources, source_id) {
            errors.extend(e.inner);
        }
        count += 1;
    }

    if !errors.is_empty() {
        return Err(ErrorMessages::from(errors).into());
    }
    Ok(format!("{count} file(s) parsed without errors"))
}

fn single_source<'a>(sources: &'a SourceTree, command: &str) -> Result<&'a str> {
    single_source_id(sources, command).map(|(_, source)| source)
}

fn single_source_id<'a>(sources: &'a SourceTree, command: &str) -> Result<(u16, &'a str)> {
    let ids = sources.source_ids().collect_vec();
    let Ok((source_id, path)) = ids.into_iter().exactly_one() else {
        bail!(
            "Currently `{command}` only works with a single source, but found {}: {}",
            sources.sources.len(),
            sources
                .sources
                .keys()
                .map(|x| format!("`{}`", x.display()))
                .sorted()
                .join(", ")
        )
    };
    match sources.sources.get(path) {
        Some(source) => Ok((source_id, source)),
        None => bail!("source `{}` is missing from the tree", path.display()),
    }
}

fn read_files(input: &mut clio::ClioPath) -> Result<SourceTree> {
    // Don't wait without a prompt when reading from a terminal; it's confusing
    // whether it's waiting for input or not.
    if input.path() == Path::new("-") && std::io::stdin().is_terminal() {
        #[cfg(unix)]
        eprintln!("Enter Lun, then press ctrl-d to parse:\n");
        #[cfg(windows)]
        eprintln!("Enter Lun, then press ctrl-z to parse:\n");
    }

    let root = input.path();

    let mut sources = Vec::new();
    for file in input.clone().files(has_extension("lun"))? {
        let path = file.path().strip_prefix(root)?.to_owned();

        let mut file_contents = String::new();
        file.open()?.read_to_string(&mut file_contents)?;

        sources.push((path, file_contents));
    }
    // sorted, so that source ids are stable
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(SourceTree::new(sources, Some(root.to_path_buf())))
}
