pub mod ingest;
pub mod service;

pub use ingest::{IngestReport, Ingestor};
pub use service::{CroppedGraphic, PlanService};
