//! vidmark CLI
//!
//! Inspect, export and preview numbering of saved overlay documents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use vidmark_lib::core::{
    document::OverlayDocument,
    drawings::{MarkerRecord, MarkerSet},
    export::TextExporter,
    settings::{OverlaySettings, SettingsManager},
};

#[derive(Debug, Parser)]
#[command(name = "vidmark-cli", version, about = "Numbered video marker overlays")]
struct Cli {
    /// Directory holding settings.json (defaults to the user config dir)
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the markers of a document as JSON
    Inspect {
        document: PathBuf,
    },
    /// Write the tab-separated text export of a document
    Export {
        document: PathBuf,
        output: PathBuf,
        /// Omit the column header line
        #[arg(long)]
        no_header: bool,
        /// Decimal places for coordinates
        #[arg(long)]
        decimals: Option<usize>,
    },
    /// Print the value the next placed marker would receive
    RenumberPreview {
        document: PathBuf,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectReport<'a> {
    version: u32,
    saved_at: &'a str,
    count: usize,
    next_value: u32,
    markers: Vec<&'a MarkerRecord>,
}

fn load_settings(dir: Option<&Path>) -> OverlaySettings {
    match dir {
        Some(dir) => SettingsManager::new(dir.to_path_buf()).load(),
        None => SettingsManager::for_user()
            .map(|manager| manager.load())
            .unwrap_or_default(),
    }
}

fn load_document(path: &Path) -> Result<OverlayDocument> {
    OverlayDocument::load(path)
        .with_context(|| format!("Failed to load overlay document {}", path.display()))
}

fn restored_markers(document: &OverlayDocument, settings: &OverlaySettings) -> MarkerSet {
    let mut markers = MarkerSet::new(settings.markers.style(), settings.fading.profile());
    document.apply_to(&mut markers);
    markers
}

fn inspect(path: &Path, settings: &OverlaySettings) -> Result<()> {
    let document = load_document(path)?;
    let markers = restored_markers(&document, settings);
    let report = InspectReport {
        version: document.version,
        saved_at: &document.saved_at,
        count: markers.count(),
        next_value: markers.next_value(),
        markers: document.marker_records().collect(),
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to render report")?;
    println!("{json}");
    Ok(())
}

fn export(
    path: &Path,
    output: &Path,
    mut settings: OverlaySettings,
    no_header: bool,
    decimals: Option<usize>,
) -> Result<()> {
    let document = load_document(path)?;
    if no_header {
        settings.export.include_header = false;
    }
    if let Some(decimals) = decimals {
        settings.export.decimal_places = decimals;
    }
    settings.normalize();

    TextExporter::new(settings.export)
        .write(output, &document)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    println!(
        "Exported {} markers to {}",
        document.numbered_markers.len(),
        output.display()
    );
    Ok(())
}

fn renumber_preview(path: &Path, settings: &OverlaySettings) -> Result<()> {
    let document = load_document(path)?;
    let markers = restored_markers(&document, settings);
    debug!(values = ?markers.values(), "Restored marker values");
    println!("{}", markers.next_value());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    vidmark_lib::init_logging(cli.log_dir.as_deref());

    let settings = load_settings(cli.settings_dir.as_deref());

    match cli.command {
        Command::Inspect { document } => inspect(&document, &settings),
        Command::Export {
            document,
            output,
            no_header,
            decimals,
        } => export(&document, &output, settings, no_header, decimals),
        Command::RenumberPreview { document } => renumber_preview(&document, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_flags() {
        let cli = Cli::try_parse_from([
            "vidmark-cli",
            "export",
            "doc.json",
            "out.txt",
            "--no-header",
            "--decimals",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Export {
                no_header,
                decimals,
                ..
            } => {
                assert!(no_header);
                assert_eq!(decimals, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_renumber_preview() {
        let cli = Cli::try_parse_from(["vidmark-cli", "renumber-preview", "doc.json"]).unwrap();
        assert!(matches!(cli.command, Command::RenumberPreview { .. }));
    }
}
