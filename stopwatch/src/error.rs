use thiserror::Error;

use crate::{InstanceId, surface::ElementId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopwatchError {
    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("No stopwatch instance with id {0}")]
    NotFound(InstanceId),
    #[error("Element {0} already has a stopwatch attached")]
    AlreadyAttached(ElementId),
    #[error("Element {0} is not on the page")]
    NoSuchElement(ElementId),
    #[error("Element {0} has no stopwatch attached")]
    NotAttached(ElementId),
    #[error("Stopwatch service is no longer running")]
    ServiceClosed,
}
