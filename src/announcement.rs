//! Decoding of the UDP broadcast payload myStrom devices announce themselves with.

use std::fmt::Write;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Minimum payload length: six MAC bytes followed by the type code.
pub const MIN_LEN: usize = 7;

/// A decoded device announcement.
///
/// Bytes `0..6` of the payload carry the MAC address, byte `6` the
/// vendor-assigned device-type code. Anything after that is reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Lowercase hex MAC without separators, e.g. `"aabbccddeeff"`.
    pub mac: String,
    /// Raw device-type code.
    pub type_code: u8,
}

impl Announcement {
    /// Decode an announcement payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedAnnouncement`] if the payload is shorter than
    /// [`MIN_LEN`] bytes.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < MIN_LEN {
            return Err(Error::MalformedAnnouncement { len: payload.len() });
        }

        Ok(Announcement {
            mac: hex_mac(&payload[..6]),
            type_code: payload[6],
        })
    }
}

fn hex_mac(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(12), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Bring a MAC reported by a device (`"AA:BB:CC:DD:EE:FF"`, `"AABBCCDDEEFF"`, ...)
/// into the registry key form used by [`Announcement`].
pub(crate) fn normalize_mac(mac: &str) -> Option<String> {
    let hex: String = mac
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    (hex.len() == 12 && hex.chars().all(|c| c.is_ascii_hexdigit())).then_some(hex)
}
