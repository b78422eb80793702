//! Termination policy of a bounded scan, kept apart from socket I/O.

use std::collections::HashSet;
use std::net::IpAddr;

/// What the listener observed on one receive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// A datagram arrived from this address.
    Datagram(IpAddr),
    /// No datagram arrived within the receive timeout.
    Timeout,
}

/// What the listener should do about a [`ScanEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// First datagram from this address: decode, resolve and [`record`](BoundedScan::record) it.
    Record,
    /// The scan is complete.
    Stop,
}

/// State of one bounded scan.
///
/// Devices announce themselves periodically, so a second datagram from an
/// address already seen means the announcement cycle has come around and
/// every device has had its turn. A receive timeout means the network went
/// quiet. Either ends the scan.
///
/// Deduplication here is by source address, not by MAC: two MACs behind one
/// address end the scan, and one MAC seen from two addresses is recorded twice
/// (as the same registry handle).
#[derive(Debug)]
pub struct BoundedScan<T> {
    seen: HashSet<IpAddr>,
    found: Vec<T>,
}

impl<T> Default for BoundedScan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundedScan<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    pub fn step(&self, event: ScanEvent) -> ScanStep {
        match event {
            ScanEvent::Timeout => ScanStep::Stop,
            ScanEvent::Datagram(source) if self.seen.contains(&source) => ScanStep::Stop,
            ScanEvent::Datagram(_) => ScanStep::Record,
        }
    }

    pub fn record(&mut self, source: IpAddr, item: T) {
        self.seen.insert(source);
        self.found.push(item);
    }

    /// Items recorded so far, in discovery order.
    pub fn found(&self) -> &[T] {
        &self.found
    }

    pub fn finish(self) -> Vec<T> {
        self.found
    }
}
