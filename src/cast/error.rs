//! Cast failure type. Every cast function returns this rather than
//! panicking; callers either propagate it as `Error::Conversion` or route it
//! through the CSV error handler (§4.I) when `IGNORE_ERRORS` is set.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Conversion exception: Cast failed. Could not convert \"{input}\" to {target_type}.")]
pub struct ConversionError {
    pub input: String,
    pub target_type: String,
}

impl ConversionError {
    pub fn new(input: impl Into<String>, target_type: impl Into<String>) -> Self {
        ConversionError { input: input.into(), target_type: target_type.into() }
    }
}
