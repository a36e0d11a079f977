use std::path::{Path, PathBuf};

use crate::prelude::{eprintln, println, *};
use resolver::{Resolver, ResolverConfig, Severity, TokenArtifact, TokenStore};

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Resolve a token artifact into the structured report record
    Extract {
        /// Path to the token artifact JSON produced by the OCR step
        tokens: PathBuf,
        /// Resolver configuration (defaults to the built-in valuation-report profile)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the record to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
        /// Include per-field provenance and diagnostics in the output
        #[arg(long)]
        provenance: bool,
    },
    /// Show every anchor match without resolving values
    Anchors {
        /// Path to the token artifact JSON
        tokens: PathBuf,
        /// Resolver configuration (defaults to the built-in valuation-report profile)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a token artifact and summarize it per page
    Tokens {
        /// Path to the token artifact JSON
        tokens: PathBuf,
    },
    /// Print the built-in valuation-report configuration as JSON
    Config,
}

pub async fn run(command: Commands, global: crate::Global) -> Result<()> {
    match command {
        Commands::Extract {
            tokens,
            config,
            output,
            compact,
            provenance,
        } => {
            let config = load_config(config.as_deref())?;
            let store = load_store(&tokens)?;
            let resolver = Resolver::new(config).map_err(|e| eyre!(e))?;
            let doc = resolver.resolve(&store).map_err(|e| eyre!(e))?;

            for diagnostic in &doc.diagnostics {
                let label = match diagnostic.severity {
                    Severity::Warning => "warning",
                    Severity::Error => "error",
                };
                eprintln!("{label}: {}: {}", diagnostic.path, diagnostic.message);
            }
            if global.verbose {
                let resolved = doc
                    .fields
                    .iter()
                    .filter(|f| f.provenance.method != resolver::Method::DefaultEmpty)
                    .count();
                eprintln!("{resolved}/{} fields resolved", doc.fields.len());
            }

            let payload = if provenance {
                serde_json::to_value(&doc)?
            } else {
                doc.record.clone()
            };
            let rendered = if compact {
                serde_json::to_string(&payload)?
            } else {
                serde_json::to_string_pretty(&payload)?
            };
            match output {
                Some(path) => std::fs::write(path, rendered)?,
                None => println!("{rendered}"),
            }
            Ok(())
        }
        Commands::Anchors { tokens, config } => {
            let config = load_config(config.as_deref())?;
            let store = load_store(&tokens)?;
            let resolver = Resolver::new(config).map_err(|e| eyre!(e))?;

            let mut table = new_table();
            table.add_row(prettytable::row!["Field", "Page", "Score", "Matched text"]);
            for report in resolver.survey_anchors(&store) {
                table.add_row(prettytable::row![
                    report.path,
                    report.page,
                    f!("{:.2}", report.score),
                    report.text,
                ]);
            }
            table.printstd();
            Ok(())
        }
        Commands::Tokens { tokens } => {
            let json = std::fs::read_to_string(&tokens)
                .map_err(|e| eyre!(Error::Ingestion(e.to_string())))?;
            let artifact = TokenArtifact::from_json(&json)
                .map_err(|e| eyre!(Error::Ingestion(e.to_string())))?;
            let version = artifact.version;
            let store = artifact
                .into_store()
                .map_err(|e| eyre!(Error::Ingestion(e.to_string())))?;

            println!("artifact version {version}, {} tokens", store.len());
            let mut table = new_table();
            table.add_row(prettytable::row!["Page", "Tokens"]);
            for (page, page_tokens) in store.pages() {
                table.add_row(prettytable::row![page, page_tokens.len()]);
            }
            table.printstd();
            Ok(())
        }
        Commands::Config => {
            let config = crate::profile::valuation_report();
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Load a configuration override, or fall back to the built-in profile.
fn load_config(path: Option<&Path>) -> Result<ResolverConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .wrap_err_with(|| f!("reading config {}", path.display()))?;
            ResolverConfig::from_json(&json).map_err(|e| eyre!(e))
        }
        None => Ok(crate::profile::valuation_report()),
    }
}

/// Ingest a token artifact. Structural problems -- unreadable file, bad
/// JSON, malformed boxes, or an empty token set -- are fatal here: the
/// resolver never produces a partial record from invalid input.
fn load_store(path: &Path) -> Result<TokenStore> {
    let json =
        std::fs::read_to_string(path).map_err(|e| eyre!(Error::Ingestion(e.to_string())))?;
    let store = TokenArtifact::from_json(&json)
        .map_err(|e| eyre!(Error::Ingestion(e.to_string())))?
        .into_store()
        .map_err(|e| eyre!(Error::Ingestion(e.to_string())))?;
    if store.is_empty() {
        return Err(eyre!(Error::EmptyDocument));
    }
    log::debug!(
        "ingested {} tokens across {} pages",
        store.len(),
        store.page_numbers().len()
    );
    Ok(store)
}
