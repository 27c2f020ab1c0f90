use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use planref_core::plan_folder::PageImage;
use planref_core::traits::{ImageStore, OcrProvider};
use planref_core::{BBox, Error, Result, TextBox};
use planref_index::PlanSnapshot;
use planref_ingest::{Ingestor, PlanService};

const REGION: BBox = BBox::new(1000, 1000, 1400, 1200);

fn tb(l: i32, t: i32, r: i32, b: i32, text: &str) -> TextBox { TextBox::new(BBox::new(l, t, r, b), text) }

/// Canned OCR output keyed by file name.
struct FakeOcr {
    pages: HashMap<String, Vec<TextBox>>,
    calls: AtomicUsize,
}

impl FakeOcr {
    fn plan() -> Self {
        let mut pages = HashMap::new();
        pages.insert(
            "A101.png".to_string(),
            vec![tb(1010, 1010, 1200, 1100, "A1O1"), tb(100, 100, 120, 110, "12")],
        );
        pages.insert(
            "B3.png".to_string(),
            vec![tb(1010, 1010, 1100, 1060, "B 3"), tb(45, 50, 60, 60, "12"), tb(65, 50, 95, 60, "A101")],
        );
        Self { pages, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl OcrProvider for FakeOcr {
    fn provider_id(&self) -> &str { "fake" }

    async fn recognize(&self, page_image: &Path) -> Result<Vec<TextBox>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = page_image.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.pages
            .get(name)
            .cloned()
            .ok_or_else(|| Error::PermanentProvider(format!("no such image {name}")))
    }
}

/// Records every crop and answers with the bbox as bytes.
#[derive(Default)]
struct RecordingStore {
    crops: Mutex<Vec<(String, BBox)>>,
}

#[async_trait]
impl ImageStore for RecordingStore {
    async fn crop(&self, filename: &str, bbox: BBox) -> Result<Vec<u8>> {
        self.crops.lock().unwrap().push((filename.to_string(), bbox));
        Ok(bbox.to_string().into_bytes())
    }
}

fn pages(names: &[&str]) -> Vec<PageImage> {
    names
        .iter()
        .map(|n| PageImage { filename: n.to_string(), path: PathBuf::from("plan").join(n) })
        .collect()
}

#[tokio::test]
async fn ingest_then_crop_graphic_for_tag() {
    let ingestor = Ingestor::new(FakeOcr::plan(), 2);
    let mut snapshot = PlanSnapshot::default();
    let index = ingestor
        .build_index(&pages(&["A101.png", "B3.png"]), &mut snapshot, REGION)
        .await
        .expect("ingest");
    assert_eq!(snapshot.pages.len(), 2);

    let graphic = BBox::new(0, 120, 200, 400);
    index.register_graphic("A101.png", graphic, BBox::new(90, 90, 130, 115)).unwrap();

    let service = PlanService::new(index, RecordingStore::default());
    assert_eq!(service.list_pages(), vec!["A101.png", "B3.png"]);

    let tag = BBox::new(40, 40, 100, 80);
    let detail = service.resolve_tag("B3.png", &tag).unwrap();
    assert_eq!((detail.page_num.as_str(), detail.detail_num.as_str()), ("A101", "12"));

    let cropped = service.graphic_for_tag("B3.png", &tag).await.expect("graphic");
    assert_eq!(cropped.location.filename, "A101.png");
    assert_eq!(cropped.location.bbox, graphic);
    assert_eq!(cropped.png, b"0,120,200,400".to_vec());
    assert_eq!(*service.store().crops.lock().unwrap(), vec![("A101.png".to_string(), graphic)]);
}

#[tokio::test]
async fn snapshot_pages_are_not_recognized_again() {
    let ocr = FakeOcr::plan();
    let mut snapshot = PlanSnapshot::default();
    snapshot.insert("A101.png", vec![tb(1010, 1010, 1200, 1100, "A1O1")]);
    snapshot.insert("gone.png", vec![]);

    let ingestor = Ingestor::new(ocr, 4);
    let report = ingestor.ingest(&pages(&["A101.png", "B3.png"]), &mut snapshot).await.unwrap();
    assert_eq!(report.reused, 1);
    assert_eq!(report.recognized, 1);
    assert!(!snapshot.contains("gone.png"), "pages no longer in the plan are dropped");
    assert_eq!(snapshot.pages["A101.png"].len(), 1, "snapshot copy kept verbatim");
    assert_eq!(ingestor.provider().calls.load(Ordering::SeqCst), 1);

    let again = ingestor.ingest(&pages(&["A101.png", "B3.png"]), &mut snapshot).await.unwrap();
    assert_eq!(again.recognized, 0);
    assert_eq!(ingestor.provider().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ocr_failure_keeps_finished_pages() {
    let ingestor = Ingestor::new(FakeOcr::plan(), 1);
    let mut snapshot = PlanSnapshot::default();
    let err = ingestor
        .ingest(&pages(&["A101.png", "missing.png"]), &mut snapshot)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "permanent_provider");
    assert!(snapshot.contains("A101.png"));
    assert!(!snapshot.contains("missing.png"));
}

#[tokio::test]
async fn resolution_errors_reach_the_caller_before_any_crop() {
    let ingestor = Ingestor::new(FakeOcr::plan(), 2);
    let mut snapshot = PlanSnapshot::default();
    let index = ingestor.build_index(&pages(&["A101.png", "B3.png"]), &mut snapshot, REGION).await.unwrap();
    let service = PlanService::new(index, RecordingStore::default());

    let err = service.graphic_for_tag("B3.png", &BBox::new(40, 40, 100, 80)).await.unwrap_err();
    assert!(matches!(err, Error::NoRegistry(_)));
    assert!(service.store().crops.lock().unwrap().is_empty());
}
