//! UI5 cache buster binary entry point.
//!
//! This is a thin wrapper around the ui5-cache-buster library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Loads configuration
//! 4. Busts the resource roots of the given document and writes it back
//!
//! For library usage, see the ui5-cache-buster crate documentation.

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use ui5_cache_buster::{AppRename, CacheBuster, CliArgs, HtmlDocument, OutputFormat};

fn main() -> Result<()> {
    // Logs go to stderr so the summary on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::from_args();
    let options = args
        .bust_options()
        .context("Failed to load configuration")?;

    let cwd = match &args.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };

    let document = HtmlDocument::load(args.html.clone(), cwd.clone())?;
    let buster = CacheBuster::new(options)?;

    if args.dry_run {
        let plan = buster.plan(&document)?;
        tracing::info!("Dry run: no directories renamed, document left untouched");
        print_summary(args.format, plan.renames(), &plan.resource_roots(), true)?;
        return Ok(());
    }

    let outcome = buster.bust(document)?;

    let written = match &args.output {
        Some(output) => outcome.document.write_to(&cwd.join(output)),
        None => outcome.document.write(),
    };
    written.context("Directories were renamed but the document could not be written")?;

    print_summary(
        args.format,
        &outcome.renames,
        &outcome.resource_roots,
        false,
    )?;

    Ok(())
}

fn print_summary(
    format: OutputFormat,
    renames: &[AppRename],
    resource_roots: &Map<String, Value>,
    dry_run: bool,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let verb = if dry_run { "would rename" } else { "renamed" };
            for rename in renames {
                if rename.is_noop() {
                    println!("{}: {} (unchanged)", rename.name, rename.source.display());
                } else {
                    println!(
                        "{}: {verb} {} -> {}",
                        rename.name,
                        rename.source.display(),
                        rename.destination.display()
                    );
                }
            }
            println!("resource roots: {}", serde_json::to_string(resource_roots)?);
        }
        OutputFormat::Json => {
            let summary = json!({
                "dry_run": dry_run,
                "resource_roots": resource_roots,
                "renames": serde_json::to_value(renames)?,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
