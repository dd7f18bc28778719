// Library exports for routersync-api
pub use crate::api::create_router;
pub use crate::error::ApiError;
pub use crate::operations::{dispatch, Operation, OperationRequest, Outcome, Payload};
pub use crate::state::AppState;

pub mod api;
pub mod error;
pub mod operations;
pub mod state;
