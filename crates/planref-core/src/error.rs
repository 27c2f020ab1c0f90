use thiserror::Error;

/// Everything that can go wrong between ingesting OCR output and cropping a graphic.
///
/// Provider failures are split by whether a retry can help. The resolution
/// variants describe the state of the plan data and are never retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Transient provider failure: {0}")]
    TransientProvider(String),

    #[error("Provider rejected the request: {0}")]
    PermanentProvider(String),

    #[error("Detail tag must contain exactly two text fragments, found {found}")]
    MalformedTag { found: usize },

    #[error("Cannot tell page number from detail number in tag fragments {first:?} and {second:?}")]
    IndeterminateTagRoles { first: String, second: String },

    #[error("Unknown page number: {0}")]
    UnknownPage(String),

    #[error("Unknown page image: {0}")]
    UnknownFile(String),

    #[error("No detail graphics registered for {0}")]
    NoRegistry(String),

    #[error("Detail number region on {filename} holds {found} text fragments")]
    AmbiguousNumber { filename: String, found: usize },

    #[error("No detail graphic {detail_num} on page {page_num}")]
    GraphicNotFound { page_num: String, detail_num: String },

    #[error("Invalid bounding box: {0}")]
    InvalidBBox(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    /// Stable code for front ends to map onto distinct responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::TransientProvider(_) => "transient_provider",
            Error::PermanentProvider(_) => "permanent_provider",
            Error::MalformedTag { .. } => "malformed_tag",
            Error::IndeterminateTagRoles { .. } => "indeterminate_tag_roles",
            Error::UnknownPage(_) => "unknown_page",
            Error::UnknownFile(_) => "unknown_file",
            Error::NoRegistry(_) => "no_registry",
            Error::AmbiguousNumber { .. } => "ambiguous_number",
            Error::GraphicNotFound { .. } => "graphic_not_found",
            Error::InvalidBBox(_) => "invalid_bbox",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Io(_) => "io",
            Error::Snapshot(_) => "snapshot",
        }
    }

    pub fn is_transient(&self) -> bool { matches!(self, Error::TransientProvider(_)) }

    /// Failures caused by the request or the plan data rather than infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedTag { .. }
                | Error::IndeterminateTagRoles { .. }
                | Error::UnknownPage(_)
                | Error::UnknownFile(_)
                | Error::NoRegistry(_)
                | Error::AmbiguousNumber { .. }
                | Error::GraphicNotFound { .. }
                | Error::InvalidBBox(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
