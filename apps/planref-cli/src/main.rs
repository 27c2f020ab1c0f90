use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use planref_core::config::Config;
use planref_core::plan_folder::list_page_images;
use planref_core::traits::PdfRasterizer;
use planref_core::BBox;
use planref_index::{GraphicRegistrations, PlanIndex, PlanSnapshot};
use planref_ingest::{Ingestor, PlanService};
use planref_provider::{AzureOcr, FsImageStore, Pdftoppm, RetryPolicy, Retrying};

/// Construction-plan reference lookup.
///
/// Bounding boxes are written `left,top,right,bottom` in page pixels.
#[derive(Parser)]
#[command(name = "planref", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a plan PDF into one PNG per page inside the plan folder.
    Rasterize { pdf: PathBuf },
    /// OCR every page not yet in the snapshot, then save the snapshot.
    Ingest,
    /// List pages with the page number found on each.
    Pages,
    /// Print the text boxes strictly inside a region.
    Text { file: String, bbox: BBox },
    /// Resolve a detail tag to its page number and detail number.
    Tag { file: String, bbox: BBox },
    /// Register a detail graphic and the box holding its number.
    Register { file: String, graphic: BBox, number: BBox },
    /// Crop the graphic a tag points at.
    Graphic {
        file: String,
        bbox: BBox,
        /// Defaults to `<page>-<detail>.png`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<planref_core::Error>() {
            Some(err) if err.is_client_error() => {
                eprintln!("{}: {err}", err.kind());
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let config = Config::load().context("loading config")?;
    let plan = config.plan()?;
    let plan_dir = config.path(&plan.dir);
    let snapshot_path = config.path(&plan.snapshot);
    let registry_path = config.path(&plan.registry);

    match command {
        Command::Rasterize { pdf } => {
            let settings = config.rasterize()?;
            let pages = Pdftoppm::new(&settings.binary).rasterize(&pdf, &plan_dir, settings.long_edge_px)?;
            println!("{} pages written to {}", pages.len(), plan_dir.display());
        }
        Command::Ingest => {
            let pages = list_page_images(&plan_dir)?;
            let mut snapshot = PlanSnapshot::load_or_default(&snapshot_path)?;
            let ocr = Retrying::new(AzureOcr::new(&config.ocr()?)?, RetryPolicy::from_settings(&config.retry()?));
            let ingestor = Ingestor::new(ocr, config.ingest()?.concurrency);
            let outcome = ingestor.ingest(&pages, &mut snapshot).await;
            // Saved even on failure so the next run only redoes what is missing.
            snapshot.save(&snapshot_path)?;
            let report = outcome?;
            info!(snapshot = %snapshot_path.display(), "snapshot saved");
            println!("{} pages recognized, {} reused", report.recognized, report.reused);
        }
        Command::Pages => {
            let index = load_index(&snapshot_path, &registry_path, plan.page_number_region)?;
            for filename in index.list_pages() {
                let number = index.page_number_of(filename)?.unwrap_or("-");
                println!("{filename}\t{number}");
            }
        }
        Command::Text { file, bbox } => {
            let index = load_index(&snapshot_path, &registry_path, plan.page_number_region)?;
            for tb in index.text_in_bbox(&file, &bbox)? {
                println!("{}\t{}", tb.bbox, tb.text);
            }
        }
        Command::Tag { file, bbox } => {
            let index = load_index(&snapshot_path, &registry_path, plan.page_number_region)?;
            let detail = index.resolve_tag(&file, &bbox)?;
            println!("page {}\tdetail {}", detail.page_num, detail.detail_num);
        }
        Command::Register { file, graphic, number } => {
            let index = load_index(&snapshot_path, &registry_path, plan.page_number_region)?;
            index.register_graphic(&file, graphic, number)?;
            index.registrations().save(&registry_path)?;
            println!("registered {graphic} on {file}");
        }
        Command::Graphic { file, bbox, out } => {
            let index = load_index(&snapshot_path, &registry_path, plan.page_number_region)?;
            let store = Retrying::new(FsImageStore::new(&plan_dir), RetryPolicy::from_settings(&config.retry()?));
            let service = PlanService::new(index, store);
            let detail = service.resolve_tag(&file, &bbox)?;
            let cropped = service.graphic_for_tag(&file, &bbox).await?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{}-{}.png", detail.page_num, detail.detail_num)));
            std::fs::write(&out, &cropped.png).with_context(|| format!("writing {}", out.display()))?;
            println!("{} {} -> {}", cropped.location.filename, cropped.location.bbox, out.display());
        }
    }
    Ok(())
}

/// Query commands run from the saved snapshot; no OCR calls.
fn load_index(snapshot_path: &Path, registry_path: &Path, region: BBox) -> anyhow::Result<PlanIndex> {
    let snapshot = PlanSnapshot::load(snapshot_path)
        .with_context(|| format!("reading snapshot {} (run `planref ingest` first)", snapshot_path.display()))?;
    let index = PlanIndex::from_snapshot(&snapshot, region);
    index.apply_registrations(&GraphicRegistrations::load_or_default(registry_path)?)?;
    Ok(index)
}
