//! Return policies and return-window evaluation.

pub mod policy;
pub mod window;

pub use policy::{PolicyId, ReturnPolicy, WindowStart};
pub use window::{remaining, window_deadline, RemainingWindow};
