use thiserror::Error;

/// Main error type for Ownergraph
#[derive(Error, Debug)]
pub enum OwnergraphError {
    /// Relationship endpoint is not a registered entity
    #[error("Malformed entity reference: {source_id} -> {target_id}")]
    MalformedEntityReference {
        source_id: String,
        target_id: String,
    },

    /// Percentage text that does not parse as a number
    #[error("Non-numeric percentage: {0:?}")]
    NonNumericPercentage(String),

    /// Percentage outside [0, 100] or not finite
    #[error("Percentage out of range: {0}")]
    PercentageOutOfRange(f64),

    /// Failure while walking ownership paths for one owner/entity pair
    #[error("Path enumeration failed for {source_id} -> {target_id}: {reason}")]
    PathEnumeration {
        source_id: String,
        target_id: String,
        reason: String,
    },

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTML / text parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Remote page fetch errors
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Export (GraphML, manifest) errors
    #[error("Export error: {0}")]
    Export(String),
}

/// Convenient Result type using OwnergraphError
pub type Result<T> = std::result::Result<T, OwnergraphError>;
