//! Registry error types

use thiserror::Error;

use crate::error_codes;
use crate::kind::ObjectKind;
use crate::object::Handle;

/// Lookup and removal failures
///
/// These are caller errors. They are logged at the registry boundary and
/// returned to the caller, which usually hands [`PoolError::error_code`] back
/// to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("bad handle {handle}")]
    BadHandle {
        handle: Handle,
        expected: Option<ObjectKind>,
    },

    #[error("handle {handle} is a {}, expected {}", found.name(), expected.name())]
    WrongKind {
        handle: Handle,
        expected: ObjectKind,
        found: ObjectKind,
    },
}

impl PoolError {
    /// Guest status code for this failure
    pub fn error_code(&self) -> u32 {
        match self {
            PoolError::BadHandle {
                expected: Some(kind),
                ..
            } => kind.missing_error_code(),
            PoolError::BadHandle { expected: None, .. } => error_codes::UNKNOWN_UID,
            PoolError::WrongKind { .. } => error_codes::UNMATCH_UID_TYPE,
        }
    }
}

pub type Result<T> = core::result::Result<T, PoolError>;
