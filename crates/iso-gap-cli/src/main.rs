use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use iso_gap_core::{
    load_implementation, render_report, write_reports, CatalogRepository, FileCatalogRepository,
    GapAnalyzer, GapSettings, OutputFormat,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "iso-gap", author, version, about = "ISO 27001 Gap Analyzer")]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// JSON/YAML file containing the ISO 27001 control catalog.
    /// Defaults to `iso_27001_controls.json` in the working directory; the
    /// bundled Annex A catalog lives at `catalogs/iso_27001_controls.json`.
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    controls: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare implementation data against the control catalog
    Analyze {
        /// File mapping control IDs to implemented status
        implementation: PathBuf,

        /// Format printed to stdout
        #[arg(long, value_enum, default_value_t = FormatArg::Human)]
        format: FormatArg,

        /// Also write report files (formats from settings) into this directory
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// File name stem for written reports
        #[arg(long, value_name = "NAME")]
        report_stem: Option<String>,
    },
    /// List all controls in the catalog
    ListControls {
        /// Emit controls as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Show a single control by identifier
    ShowControl {
        /// Control identifier, e.g. A.6.1
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Human,
    Markdown,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut settings = GapSettings::load(cli.config.as_deref())?;
    if let Some(controls) = cli.controls {
        settings.controls = controls;
    }

    match cli.command {
        Commands::Analyze {
            implementation,
            format,
            output_dir,
            report_stem,
        } => {
            if output_dir.is_some() {
                settings.output_dir = output_dir;
            }
            if let Some(stem) = report_stem {
                settings.report_stem = stem;
            }
            settings.validate()?;
            analyze(&settings, &implementation, format.into())?
        }
        Commands::ListControls { json } => list_controls(&settings.controls, json)?,
        Commands::ShowControl { id } => show_control(&settings.controls, &id)?,
    }
    Ok(())
}

fn analyze(settings: &GapSettings, implementation: &Path, format: OutputFormat) -> Result<()> {
    let repo = Arc::new(FileCatalogRepository::new(&settings.controls));
    let record = load_implementation(implementation).with_context(|| {
        format!(
            "failed to load implementation data from {}",
            implementation.display()
        )
    })?;
    let result = GapAnalyzer::new(repo)
        .analyze(&record)
        .with_context(|| {
            format!(
                "failed to load controls from {}",
                settings.controls.display()
            )
        })?;

    print!("{}", render_report(&result, format)?);

    if let Some(dir) = &settings.output_dir {
        let written = write_reports(&result, dir, &settings.report_stem, &settings.formats)?;
        for path in written {
            info!(path = %path.display(), "wrote gap report");
        }
    }
    Ok(())
}

fn list_controls(controls: &Path, json: bool) -> Result<()> {
    let repo = FileCatalogRepository::new(controls);
    let catalog = repo
        .load_catalog()
        .with_context(|| format!("failed to load controls from {}", controls.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!(
        "{} control(s) loaded from {}",
        catalog.len(),
        repo.path().display()
    );
    for control in catalog.iter() {
        println!("- {id:<8} {title}", id = control.id, title = control.title);
    }
    Ok(())
}

fn show_control(controls: &Path, id: &str) -> Result<()> {
    let repo = FileCatalogRepository::new(controls);
    let control = repo
        .get_control(id)
        .with_context(|| format!("failed to load controls from {}", controls.display()))?
        .with_context(|| format!("control `{id}` is not in the catalog"))?;
    println!("{}: {}", control.id, control.title);
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
