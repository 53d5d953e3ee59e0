//! Return requests and their lifecycle.

pub mod item;
pub mod request;
pub mod status;

pub use item::{ItemId, ReturnItem};
pub use request::{NewReturnRequest, RequestId, ReturnRequest};
pub use status::{RequestStatus, TransitionError};
