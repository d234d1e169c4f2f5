//! Apacheconf - inspect and edit Apache httpd configuration
//!
//! This is the main entry point for the apacheconf CLI.

use anyhow::Context;
use apacheconf_core::{ConfigLoader, TreeConfig};
use apacheconf_parser::LoadError;
use apacheconf_tree::{BlockNode, ConfigWriter, FsWriter, MemoryWriter, Node, ParserNode};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Apacheconf - query and edit httpd configuration without losing formatting
#[derive(Parser)]
#[command(name = "apacheconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Activation policy file (TOML or JSON)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Treat a module as loaded (repeatable)
    #[arg(long = "module", global = true)]
    modules: Vec<String>,

    /// Treat a parameter as defined (repeatable)
    #[arg(long = "define", global = true)]
    defines: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a configuration file and report syntax errors
    Check {
        /// Path to the configuration file
        file: PathBuf,
    },

    /// List blocks with the given name
    Blocks {
        file: PathBuf,
        name: String,

        /// Include blocks inside inactive conditional sections
        #[arg(long)]
        all: bool,
    },

    /// List directives with the given name
    Directives {
        file: PathBuf,
        name: String,

        /// Include directives inside inactive conditional sections
        #[arg(long)]
        all: bool,
    },

    /// List comments containing the given text
    Comments {
        file: PathBuf,
        text: String,

        /// Match the whole comment instead of a substring
        #[arg(long)]
        exact: bool,
    },

    /// Set a directive's parameters, adding the directive if it is missing
    Set {
        file: PathBuf,
        name: String,
        parameters: Vec<String>,

        /// Only look inside the first active block with this name
        #[arg(long)]
        block: Option<String>,

        /// Checkpoint message
        #[arg(long, default_value = "apacheconf set")]
        message: String,

        /// Print the changed files instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the parsed fragments as JSON
    Dump {
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = Arc::new(tree_config(&cli)?);

    match cli.command {
        Commands::Check { file } => match apacheconf_parser::parse_file(&file) {
            Ok(document) => {
                println!(
                    "{}: ok ({} top-level nodes)",
                    file.display(),
                    document.root.children.len()
                );
            }
            Err(LoadError::Parse(e)) => {
                let source = std::fs::read_to_string(&file).unwrap_or_default();
                eprint!("{}", e.report(&file, &source));
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },

        Commands::Blocks { file, name, all } => {
            let root = load_tree(&file, config)?;
            for block in root.find_blocks(&name, !all) {
                println!("{}", describe(&Node::from(block)));
            }
        }

        Commands::Directives { file, name, all } => {
            let root = load_tree(&file, config)?;
            for directive in root.find_directives(&name, !all) {
                println!("{}", describe(&Node::from(directive)));
            }
        }

        Commands::Comments { file, text, exact } => {
            let root = load_tree(&file, config)?;
            for comment in root.find_comments(&text, exact) {
                println!("{}", describe(&Node::from(comment)));
            }
        }

        Commands::Set {
            file,
            name,
            parameters,
            block,
            message,
            dry_run,
        } => {
            let root = load_tree(&file, config)?;
            let parameters: Vec<&str> = parameters.iter().map(String::as_str).collect();

            let scope = match &block {
                Some(block) => root
                    .find_blocks(block, true)
                    .into_iter()
                    .next()
                    .with_context(|| format!("no active <{}> block in {}", block, file.display()))?,
                None => root.clone(),
            };

            set_directive(&scope, &name, &parameters)?;

            if root.save(&message).is_none() {
                println!("{}: already up to date", file.display());
                return Ok(());
            }

            if dry_run {
                let writer = MemoryWriter::default();
                write(&root, &writer)?;
                for (path, text) in writer.files() {
                    println!("==> {} <==", path.display());
                    print!("{}", text);
                }
            } else {
                for path in write(&root, &FsWriter)? {
                    println!("Wrote {}", path.display());
                }
            }
        }

        Commands::Dump { file } => {
            let document = apacheconf_parser::parse_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&*document.root)?);
        }
    }

    Ok(())
}

/// Policy file first, then command-line modules and defines on top
fn tree_config(cli: &Cli) -> anyhow::Result<TreeConfig> {
    let mut config = match &cli.policy {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("failed to load policy {}", path.display()))?,
        None => TreeConfig::default(),
    };

    for module in &cli.modules {
        config.activation = config.activation.with_module(module);
    }
    for define in &cli.defines {
        config.activation = config.activation.with_define(define);
    }

    tracing::debug!("Activation policy: {:?}", config.activation);
    Ok(config)
}

fn load_tree(file: &Path, config: Arc<TreeConfig>) -> anyhow::Result<BlockNode> {
    let document = apacheconf_parser::parse_file(file)?;
    Ok(BlockNode::from_document(&document, config)?)
}

/// Update every matching directive under `scope`, or append one
fn set_directive(scope: &BlockNode, name: &str, parameters: &[&str]) -> anyhow::Result<()> {
    let existing = scope.find_directives(name, true);
    if existing.is_empty() {
        tracing::debug!("Appending {} to <{}>", name, scope.name());
        scope.add_child_directive(name, parameters, None)?;
        return Ok(());
    }

    let wanted: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
    for directive in existing {
        if directive.parameters() != wanted {
            directive.set_parameters(parameters)?;
        }
    }
    Ok(())
}

fn write(root: &BlockNode, writer: &dyn ConfigWriter) -> anyhow::Result<Vec<PathBuf>> {
    let written = root.write_unsaved(writer)?;
    Ok(written.into_iter().collect())
}

/// One line per match: `path: <chain> statement`
fn describe(node: &Node) -> String {
    let mut chain = Vec::new();
    let mut current = node.ancestor();
    while let Some(block) = current {
        if !block.name().is_empty() {
            chain.push(block.name().to_string());
        }
        current = block.ancestor();
    }
    chain.reverse();

    let statement = match node {
        Node::Comment(comment) => format!("# {}", comment.comment()),
        Node::Directive(directive) => {
            let mut line = directive.name().to_string();
            for parameter in directive.parameters() {
                line.push(' ');
                line.push_str(&parameter);
            }
            if !directive.enabled() {
                line.push_str("  (inactive)");
            }
            line
        }
        Node::Block(block) => {
            let mut line = format!("<{}", block.name());
            for parameter in block.parameters() {
                line.push(' ');
                line.push_str(&parameter);
            }
            line.push('>');
            if !block.enabled() || !block.is_active() {
                line.push_str("  (inactive)");
            }
            line
        }
    };

    let path = node.filepath().display().to_string();
    if chain.is_empty() {
        format!("{}: {}", path, statement)
    } else {
        format!("{}: {} > {}", path, chain.join(" > "), statement)
    }
}
