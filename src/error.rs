//! Error types for pseudo console operations.

use std::io;
use thiserror::Error;

/// ConPTY error type
#[derive(Error, Debug)]
pub enum Error {
    /// The attribute list size probe misbehaved: the probing call against a
    /// null buffer is expected to fail with a required size, so a reported
    /// success (or a zero size) means the protocol was violated.
    #[error("attribute list size probe did not report a required size")]
    SizeProbe,

    /// Initializing the allocated attribute list buffer failed.
    #[error("failed to initialize attribute list: {0}")]
    AttributeListInit(#[source] io::Error),

    /// Writing an attribute into the initialized list failed.
    #[error("failed to set process thread attribute: {0}")]
    AttributeSet(#[source] io::Error),

    /// The OS rejected pseudo console device creation.
    #[error("failed to create pseudo console device (HRESULT {0:#010x})")]
    DeviceCreation(i32),

    /// Process creation failed with the given OS error code.
    #[error("failed to create process (OS error {0})")]
    Launch(u32),

    /// `start` was called on a session that already hosts a child.
    #[error("session already started")]
    AlreadyStarted,

    /// The inheritance flag array and the handle array differ in length.
    #[error("inheritance flag count {flags} does not match handle count {handles}")]
    MismatchedFlags { handles: usize, flags: usize },

    /// I/O error (pipe creation, handle duplication, wait registration)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for ConPTY operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_flags_message() {
        let err = Error::MismatchedFlags {
            handles: 3,
            flags: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('2'), "got: {}", msg);
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotConnected, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
