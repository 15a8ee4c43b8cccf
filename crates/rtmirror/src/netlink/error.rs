//! Error types for the route mirror.

use std::io;

use crate::object::ObjectFamily;

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the kernel or maintaining caches.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket syscall failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code in an `NLMSG_ERROR` reply.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// Positive errno.
        errno: i32,
        /// `strerror` text for `errno`.
        message: String,
    },

    /// [`Error::Kernel`] tagged with the request that provoked it.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        operation: String,
        errno: i32,
        message: String,
    },

    /// Buffer too short for a fixed-size header.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Framing failure: a netlink header declares an impossible length.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// An attribute walk ran past the bounds of its buffer.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A message decoded cleanly but lacks an attribute the object needs.
    #[error("{family} message is missing {attribute}")]
    MissingAttribute {
        /// Family being decoded.
        family: ObjectFamily,
        /// Name of the missing field.
        attribute: &'static str,
    },

    /// Lookup miss where an answer was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// Interface index could not be resolved to a name.
    #[error("interface not found: index {index}")]
    InterfaceNotFound { index: u32 },

    /// Operation on a manager that has been closed.
    #[error("cache manager is closed")]
    Closed,
}

impl Error {
    /// Build [`Error::Kernel`] from the negative errno of an `NLMSG_ERROR`.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Name the failed operation. Only kernel errors carry it; anything
    /// else passes through untouched.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Socket, framing or kernel-reported failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Kernel { .. }
                | Self::KernelWithContext { .. }
                | Self::Truncated { .. }
                | Self::InvalidMessage(_)
        )
    }

    /// Decode failure confined to a single message.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage(_) | Self::MissingAttribute { .. }
        )
    }

    /// ENOENT, ENODEV, ENETUNREACH, or a lookup that came back empty.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, 2 | 19 | 101) // ENOENT, ENODEV, ENETUNREACH
            }
            Self::NotFound(_) | Self::InterfaceNotFound { .. } => true,
            _ => false,
        }
    }

    /// EPERM or EACCES, from the kernel or the socket layer.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, 1 | 13)
            }
            Self::Io(e) => e.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Positive errno behind this error, when there is one.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            Self::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}
