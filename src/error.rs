use std::fmt;

use serde::{de, ser};

use crate::value::Value;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A value had the wrong runtime kind for its descriptor.
    TypeMismatch {
        name: String,
        expected: String,
        actual: &'static str,
        value: String,
    },
    /// A value had the right kind, but not the literal value the descriptor requires.
    ValueMismatch {
        name: String,
        expected: String,
        actual: &'static str,
        value: String,
    },
    /// A string was longer than its descriptor allows. Lengths are in characters.
    LengthExceeded {
        name: String,
        max_len: usize,
        actual_len: usize,
        value: String,
    },
    /// None of a union's variants accepted the value. The individual variant failures are not
    /// retained.
    UnionMismatch {
        name: String,
        actual: &'static str,
        value: String,
    },
    /// A backend failed to produce its encoded form.
    BadEncode(String),
    /// A backend failed to read its encoded form back into a structural value.
    BadDecode(String),
    /// Encoded data was greater than the maximum allowed size.
    LengthTooLong { max: usize, actual: usize },
    /// Encoded data ended too early.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Occurs when serde serialization or deserialization fails
    SerdeFail(String),
    /// Encoding or decoding hit some parsing limit.
    ParseLimit(String),
}

impl Error {
    pub(crate) fn type_mismatch(name: &str, expected: impl Into<String>, value: &Value) -> Self {
        Error::TypeMismatch {
            name: name.to_string(),
            expected: expected.into(),
            actual: value.type_name(),
            value: value.to_string(),
        }
    }

    pub(crate) fn value_mismatch(name: &str, expected: impl Into<String>, value: &Value) -> Self {
        Error::ValueMismatch {
            name: name.to_string(),
            expected: expected.into(),
            actual: value.type_name(),
            value: value.to_string(),
        }
    }

    pub(crate) fn length_exceeded(
        name: &str,
        max_len: usize,
        actual_len: usize,
        value: &Value,
    ) -> Self {
        Error::LengthExceeded {
            name: name.to_string(),
            max_len,
            actual_len,
            value: value.to_string(),
        }
    }

    pub(crate) fn union_mismatch(name: &str, value: &Value) -> Self {
        Error::UnionMismatch {
            name: name.to_string(),
            actual: value.type_name(),
            value: value.to_string(),
        }
    }

    /// True for the errors raised by descriptor validation, as opposed to encoding, decoding, or
    /// serde conversion failures. API boundaries use this to decide whether a failure is the
    /// caller's fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. }
                | Error::ValueMismatch { .. }
                | Error::LengthExceeded { .. }
                | Error::UnionMismatch { .. }
        )
    }

    /// The name of the descriptor that rejected the value, if this is a validation error.
    pub fn descriptor_name(&self) -> Option<&str> {
        match self {
            Error::TypeMismatch { name, .. }
            | Error::ValueMismatch { name, .. }
            | Error::LengthExceeded { name, .. }
            | Error::UnionMismatch { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn write_mismatch(
    f: &mut fmt::Formatter,
    name: &str,
    expected: &dyn fmt::Display,
    actual: &dyn fmt::Display,
    value: &str,
) -> fmt::Result {
    write!(
        f,
        "Expected {} to be {} but found type {} instead, with value {}",
        name, expected, actual, value
    )
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::TypeMismatch {
                ref name,
                ref expected,
                actual,
                ref value,
            }
            | Error::ValueMismatch {
                ref name,
                ref expected,
                actual,
                ref value,
            } => write_mismatch(f, name, expected, &actual, value),
            Error::LengthExceeded {
                ref name,
                max_len,
                actual_len,
                ref value,
            } => write_mismatch(
                f,
                name,
                &format_args!("string of at most {} characters", max_len),
                &format_args!("string of {} characters", actual_len),
                value,
            ),
            Error::UnionMismatch {
                ref name,
                actual,
                ref value,
            } => write_mismatch(f, name, &"union", &actual, value),
            Error::BadEncode(ref err) => write!(f, "Basic data encoding failure: {}", err),
            Error::BadDecode(ref err) => write!(f, "Basic data decoding failure: {}", err),
            Error::LengthTooLong { max, actual } => write!(
                f,
                "Data too long: was {} bytes, maximum allowed is {}",
                actual, max
            ),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::SerdeFail(ref msg) => f.write_str(msg),
            Error::ParseLimit(ref err) => write!(f, "Hit parsing limit: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}
