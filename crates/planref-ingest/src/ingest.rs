use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use tracing::info;

use planref_core::plan_folder::PageImage;
use planref_core::traits::OcrProvider;
use planref_core::{BBox, Result};
use planref_index::{PlanIndex, PlanSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Pages taken from the snapshot as-is.
    pub reused: usize,
    /// Pages sent to the OCR provider.
    pub recognized: usize,
}

/// Runs OCR over plan pages, at most `concurrency` pages in flight.
pub struct Ingestor<P> {
    ocr: P,
    concurrency: usize,
}

impl<P: OcrProvider> Ingestor<P> {
    pub fn new(ocr: P, concurrency: usize) -> Self { Self { ocr, concurrency: concurrency.max(1) } }

    pub fn provider(&self) -> &P { &self.ocr }

    /// Fills `snapshot` with text boxes for every page in `pages`.
    ///
    /// Pages already in the snapshot are not recognized again, and snapshot
    /// entries for pages no longer in the plan are dropped. On error the
    /// snapshot keeps every page finished so far, so a rerun resumes.
    pub async fn ingest(&self, pages: &[PageImage], snapshot: &mut PlanSnapshot) -> Result<IngestReport> {
        let wanted: HashSet<&str> = pages.iter().map(|p| p.filename.as_str()).collect();
        snapshot.pages.retain(|f, _| wanted.contains(f.as_str()));

        let pending: Vec<&PageImage> = pages.iter().filter(|p| !snapshot.contains(&p.filename)).collect();
        let mut report = IngestReport { reused: pages.len() - pending.len(), recognized: 0 };
        info!(provider = self.ocr.provider_id(), pages = pages.len(), reused = report.reused, pending = pending.len(), "ingesting plan");
        if pending.is_empty() {
            return Ok(report);
        }

        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut results = stream::iter(pending)
            .map(|page| async move { (page, self.ocr.recognize(&page.path).await) })
            .buffer_unordered(self.concurrency);
        while let Some((page, boxes)) = results.next().await {
            let boxes = match boxes {
                Ok(boxes) => boxes,
                Err(e) => {
                    pb.abandon_with_message(format!("failed on {}", page.filename));
                    return Err(e);
                }
            };
            pb.set_message(page.filename.clone());
            snapshot.insert(page.filename.clone(), boxes);
            report.recognized += 1;
            pb.inc(1);
        }
        pb.finish_with_message("done");
        info!(recognized = report.recognized, "ingestion complete");
        Ok(report)
    }

    /// Ingests, then builds the index; queries can only start once every page is in.
    pub async fn build_index(&self, pages: &[PageImage], snapshot: &mut PlanSnapshot, page_number_region: BBox) -> Result<PlanIndex> {
        self.ingest(pages, snapshot).await?;
        Ok(PlanIndex::from_snapshot(snapshot, page_number_region))
    }
}
