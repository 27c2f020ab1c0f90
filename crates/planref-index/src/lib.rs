pub mod page_index;
pub mod page_number;
pub mod plan;
pub mod registry;
pub mod snapshot;
pub mod tag;

pub use page_index::PageIndex;
pub use page_number::{normalize, NormalizedPageNumber, PageNumberTable};
pub use plan::PlanIndex;
pub use registry::{DetailGraphic, DetailGraphicRegistry};
pub use snapshot::{GraphicRegistrations, PlanSnapshot};
