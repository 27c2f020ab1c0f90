pub mod config;
pub mod error;
pub mod plan_folder;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{BBox, TextBox};
