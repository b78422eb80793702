use std::net::{IpAddr, SocketAddr};

/// All error types that can occur when discovering or controlling myStrom devices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An announcement datagram was too short to carry a MAC and a type code.
    #[error("malformed announcement: expected at least 7 bytes, got {len}")]
    MalformedAnnouncement { len: usize },

    /// The discovery socket could not be bound.
    #[error("failed to bind discovery socket to {addr}: {err:?}")]
    Bind { addr: SocketAddr, err: std::io::Error },

    /// The listener was closed before or during the operation.
    #[error("listener is closed")]
    ListenerClosed,

    /// A network socket operation failed while listening for announcements.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// A device could not be reached while resolving it by address.
    #[error("device at {ip} is unreachable: {err}")]
    UnreachableDevice { ip: IpAddr, err: reqwest::Error },

    /// A device answered but the reply lacked the fields needed to identify it.
    #[error("invalid device response: {0}")]
    InvalidDeviceResponse(String),

    /// A device answered with a non-2xx status or with a body that could not be understood.
    #[error("device communication error (status {status}): {body}")]
    DeviceCommunication { status: u16, body: String },

    /// The HTTP request itself failed (connection refused, timeout, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new bind error
    pub fn bind(addr: SocketAddr, err: std::io::Error) -> Self {
        Error::Bind { addr, err }
    }

    /// Create a new device communication error
    pub fn communication(status: u16, body: impl Into<String>) -> Self {
        Error::DeviceCommunication {
            status,
            body: body.into(),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
