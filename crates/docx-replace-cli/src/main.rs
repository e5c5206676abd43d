mod config;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use docx_replace::{scan, DocxHandler, DocxPackage, PartRole};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Command, Config, PlanArgs, ReplaceArgs};

#[derive(Serialize)]
struct PartSummary<'a> {
    name: &'a str,
    role: PartRole,
    size: usize,
}

fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize logging
    let filter = match &config.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting docx-replace v{}", env!("CARGO_PKG_VERSION"));

    match config.command {
        Command::Replace(args) => replace(&args),
        Command::Plan(args) => print_plan(&args),
        Command::Fragments { input } => {
            let package = DocxPackage::open(&input)?;
            print_json(&scan(package.content()).collect::<Vec<_>>())
        }
        Command::Parts { input } => {
            let package = DocxPackage::open(&input)?;
            let parts: Vec<_> = package
                .parts()
                .iter()
                .map(|part| PartSummary {
                    name: &part.name,
                    role: part.role(),
                    size: part.data.len(),
                })
                .collect();
            print_json(&parts)
        }
    }
}

fn replace(args: &ReplaceArgs) -> Result<()> {
    let package = DocxPackage::open(&args.input)?;
    let mut handler = package.editable();

    if let Some(find) = &args.find {
        let replaced = replace_text(&mut handler, args, find)?;
        if replaced == 0 {
            warn!("No occurrence of {:?} was replaced", find);
        }
    }

    for (slot, path) in &args.images {
        let bytes = read_image(path)?;
        handler.replace_image(*slot, bytes);
    }

    handler.write_to_file(&args.output)
}

fn replace_text(handler: &mut DocxHandler<'_>, args: &ReplaceArgs, find: &str) -> Result<usize> {
    let replacement = args.replacement.as_str();
    let limit = args.selection.limit();
    let replaced = if args.scope.header {
        handler.replace_header(find, replacement)?
    } else if args.scope.footer {
        handler.replace_footer(find, replacement)?
    } else if args.scope.link {
        handler.replace_link(find, replacement, limit)?
    } else if args.raw {
        match args.selection.index {
            Some(n) => handler.replace_raw_index_n(find, replacement, n),
            None => handler.replace_raw(find, replacement, limit),
        }
    } else {
        handler.replace(find, replacement, args.selection.policy())
    };
    Ok(replaced)
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read image {:?}", path))
}

fn print_plan(args: &PlanArgs) -> Result<()> {
    let package = DocxPackage::open(&args.input)?;
    let occurrences = package.editable().plan(&args.find, args.selection.policy());
    info!("Planned {} occurrence(s)", occurrences.len());
    print_json(&occurrences)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
