// Error types module
pub mod error;

// Router credential records
pub mod router;

// Mirrored resource kinds
pub mod resource;

// Scalar and unit conversions
pub mod convert;

// IP / CIDR format checks
pub mod validate;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use resource::{Record, ResourceKind, WritePolicy, DEVICE_ID_FIELD};
pub use router::{ApiDialect, Router, RouterStatus};
