//! Adapters for the services around the plan index: OCR, page images, PDF
//! rasterization, and the retry policy that guards the network-facing ones.

pub mod azure;
pub mod image_store;
pub mod rasterize;
pub mod retry;

pub use azure::AzureOcr;
pub use image_store::FsImageStore;
pub use rasterize::Pdftoppm;
pub use retry::{RetryPolicy, Retrying};
