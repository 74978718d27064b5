//! Field constraints of the wire schema
//!
//! Messages mirror the wording of the proto validation rules so that an
//! operator sees the same text whichever component rejected the resource.

use std::fmt;

use konvoy_common::config::duration_seconds;

/// A message that can check its own field constraints
pub trait Validate {
    /// Check field constraints, reporting the first violation
    fn validate(&self) -> Result<(), ValidationError>;
}

/// First field constraint a message violated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message_type: &'static str,
    field: String,
    reason: String,
}

impl ValidationError {
    /// A violation of `field` in `message_type`
    pub fn new(message_type: &'static str, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            message_type,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Message containing the invalid field
    pub fn message_type(&self) -> &str {
        self.message_type
    }

    /// Name of the invalid field
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}.{}: {}", self.message_type, self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn min_len(message_type: &'static str, field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(
            message_type,
            field,
            "value length must be at least 1 bytes",
        ));
    }
    Ok(())
}

pub(crate) fn required<'a, T>(
    message_type: &'static str,
    field: &str,
    value: &'a Option<T>,
) -> Result<&'a T, ValidationError> {
    value
        .as_ref()
        .ok_or_else(|| ValidationError::new(message_type, field, "value is required"))
}

pub(crate) fn embedded<T: Validate>(
    message_type: &'static str,
    field: &str,
    value: &T,
) -> Result<(), ValidationError> {
    value.validate().map_err(|cause| {
        ValidationError::new(
            message_type,
            field,
            format!("embedded message failed validation | caused by: {}", cause),
        )
    })
}

pub(crate) fn embedded_each<T: Validate>(
    message_type: &'static str,
    field: &str,
    values: &[T],
) -> Result<(), ValidationError> {
    values
        .iter()
        .enumerate()
        .try_for_each(|(i, value)| embedded(message_type, &format!("{}[{}]", field, i), value))
}

/// Proto3 JSON durations are decimal seconds with an `s` suffix.
pub(crate) fn positive_duration(
    message_type: &'static str,
    field: &str,
    value: &str,
) -> Result<(), ValidationError> {
    let seconds = duration_seconds(value).ok_or_else(|| {
        ValidationError::new(
            message_type,
            field,
            format!("value {:?} is not a duration", value),
        )
    })?;
    if seconds <= 0.0 {
        return Err(ValidationError::new(
            message_type,
            field,
            "value must be greater than 0s",
        ));
    }
    Ok(())
}
