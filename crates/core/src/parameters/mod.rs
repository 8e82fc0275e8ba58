//! Parameter management types
//!
//! Named parameters with change notification, and the land detector's
//! parameter set on top of them.

pub mod error;
pub mod land_detector;
pub mod storage;

pub use error::ParameterError;
pub use land_detector::LandDetectorParams;
pub use storage::{
    Notification, ParamFlags, ParamValue, ParameterStore, MAX_PARAMS, PARAM_NAME_LEN,
};
