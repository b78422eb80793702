//! Device discovery via UDP broadcast announcements.

use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, Either};
use futures::stream::{self, Stream};
use log::{debug, info, warn};

use crate::announcement::Announcement;
use crate::device::Device;
use crate::errors::Error;
use crate::registry::DeviceRegistry;
use crate::runtime::{self, AsyncUdpSocket, UdpSocket};
use crate::scan::{BoundedScan, ScanEvent, ScanStep};

type Result<T> = std::result::Result<T, Error>;

/// Port myStrom devices broadcast their announcements to.
pub const DISCOVERY_PORT: u16 = 7979;

/// Settings for a [`Listener`].
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Local address to bind. Defaults to all interfaces on [`DISCOVERY_PORT`].
    pub bind_addr: SocketAddr,
    /// How long one receive waits for a datagram.
    pub receive_timeout: Duration,
    /// Largest datagram accepted; longer ones are truncated.
    pub buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DISCOVERY_PORT)),
            receive_timeout: Duration::from_secs(5),
            buffer_size: 1024,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_receive_timeout(mut self, receive_timeout: Duration) -> Self {
        self.receive_timeout = receive_timeout;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

/// A datagram received by a [`Listener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub source: SocketAddr,
    pub payload: Vec<u8>,
}

impl Datagram {
    pub fn announcement(&self) -> Result<Announcement> {
        Announcement::decode(&self.payload)
    }
}

/// Listens for device announcements on a UDP socket it owns exclusively.
///
/// A listener is created bound ([`Listener::bind`]) and stays usable until
/// [`close`](Listener::close)d, after which every receive fails with
/// [`Error::ListenerClosed`]. It can run any number of bounded scans
/// ([`find_all`](Listener::find_all)) or a continuous one
/// ([`find_continuous`](Listener::find_continuous)); all of them resolve
/// devices through the same [`DeviceRegistry`].
///
/// # Example
///
/// ```no_run
/// use mystrom_rs::{DiscoveryConfig, Listener};
///
/// # async fn run() -> Result<(), mystrom_rs::Error> {
/// let mut listener = Listener::bind(DiscoveryConfig::default()).await?;
/// for device in listener.find_all().await? {
///     println!("{device}");
/// }
/// listener.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Listener<S: AsyncUdpSocket = UdpSocket> {
    socket: Option<S>,
    config: DiscoveryConfig,
    registry: Arc<DeviceRegistry>,
    buffer: Vec<u8>,
}

impl Listener<UdpSocket> {
    /// Binds a listener with a registry of its own.
    pub async fn bind(config: DiscoveryConfig) -> Result<Self> {
        let registry = Arc::new(DeviceRegistry::new()?);
        Self::bind_with_registry(config, registry).await
    }
}

impl<S: AsyncUdpSocket> Listener<S> {
    /// Binds a listener that resolves devices through a shared registry.
    ///
    /// # Errors
    ///
    /// [`Error::Bind`] if the address is invalid or already in use.
    pub async fn bind_with_registry(
        config: DiscoveryConfig,
        registry: Arc<DeviceRegistry>,
    ) -> Result<Self> {
        let socket = S::bind(config.bind_addr)
            .await
            .map_err(|e| Error::bind(config.bind_addr, e))?;
        debug!("Socket bound to {}", config.bind_addr);
        Ok(Self::from_socket(socket, config, registry))
    }

    /// Wraps an already bound socket.
    pub fn from_socket(socket: S, config: DiscoveryConfig, registry: Arc<DeviceRegistry>) -> Self {
        let buffer = vec![0u8; config.buffer_size];
        Listener {
            socket: Some(socket),
            config,
            registry,
            buffer,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        let socket = self.socket.as_ref().ok_or(Error::ListenerClosed)?;
        socket
            .local_addr()
            .map_err(|e| Error::socket("local_addr", e))
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Releases the socket. Closing a closed listener does nothing.
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("Socket closed");
        }
    }

    /// Waits up to the receive timeout for one datagram.
    ///
    /// Returns `Ok(None)` on timeout. Any other socket failure is an error.
    pub async fn receive(&mut self) -> Result<Option<Datagram>> {
        let socket = self.socket.as_ref().ok_or(Error::ListenerClosed)?;

        let received =
            runtime::timeout(self.config.receive_timeout, socket.recv_from(&mut self.buffer))
                .await;

        match received {
            Ok(Ok((size, source))) => {
                if size == self.buffer.len() {
                    warn!(
                        "Datagram from {} filled the {} byte buffer and may be truncated",
                        source, size
                    );
                }
                Ok(Some(Datagram {
                    source,
                    payload: self.buffer[..size].to_vec(),
                }))
            }
            Ok(Err(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                Ok(None)
            }
            Ok(Err(e)) => Err(Error::socket("recv_from", e)),
            Err(_) => Ok(None),
        }
    }

    /// Collects every device announcing itself until the announcement cycle repeats
    /// or the network stays quiet for one receive timeout.
    ///
    /// Devices come back in discovery order, one per source address. Finding
    /// nothing is not an error.
    pub async fn find_all(&mut self) -> Result<Vec<Arc<Device>>> {
        self.find_all_until(future::pending()).await
    }

    /// Like [`find_all`](Self::find_all), but also stops when `cancel` completes,
    /// returning what was found so far.
    pub async fn find_all_until<C>(&mut self, cancel: C) -> Result<Vec<Arc<Device>>>
    where
        C: Future<Output = ()>,
    {
        info!("Looking for devices...");

        let mut cancel = pin!(cancel);
        let mut scan = BoundedScan::new();

        loop {
            let received = {
                let receive = pin!(self.receive());
                match future::select(receive, cancel.as_mut()).await {
                    Either::Left((received, _)) => received?,
                    Either::Right(_) => {
                        info!("Scan cancelled");
                        break;
                    }
                }
            };

            let event = match &received {
                Some(datagram) => ScanEvent::Datagram(datagram.source.ip()),
                None => ScanEvent::Timeout,
            };

            match (scan.step(event), received) {
                (ScanStep::Record, Some(datagram)) => {
                    let device = self.resolve(&datagram)?;
                    scan.record(datagram.source.ip(), device);
                }
                _ => {
                    debug!("Scan complete on {:?}", event);
                    break;
                }
            }
        }

        let devices = scan.finish();
        info!("{} devices found!", devices.len());
        Ok(devices)
    }

    /// Reports every announcement until the stream is dropped.
    ///
    /// Repeated announcements are reported again (as the same handle) and
    /// receive timeouts are skipped. The stream ends after yielding its first
    /// error. Stop it from outside with e.g. `StreamExt::take_until`.
    ///
    /// ```no_run
    /// use futures::StreamExt;
    /// use mystrom_rs::{DiscoveryConfig, Listener};
    ///
    /// # async fn run() -> Result<(), mystrom_rs::Error> {
    /// let mut listener = Listener::bind(DiscoveryConfig::default()).await?;
    /// let stream = listener
    ///     .find_continuous()
    ///     .take_until(tokio::time::sleep(std::time::Duration::from_secs(60)));
    /// let mut stream = std::pin::pin!(stream);
    /// while let Some(device) = stream.next().await {
    ///     println!("{}", device?);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn find_continuous(&mut self) -> impl Stream<Item = Result<Arc<Device>>> + '_ {
        info!("Looking for devices... (Press Ctrl+C to exit!)");

        stream::unfold(Some(self), |listener| async move {
            let Some(listener) = listener else {
                return None;
            };
            loop {
                match listener.receive().await {
                    Ok(None) => continue,
                    Ok(Some(datagram)) => {
                        return match listener.resolve(&datagram) {
                            Ok(device) => Some((Ok(device), Some(listener))),
                            Err(e) => Some((Err(e), None)),
                        };
                    }
                    Err(e) => return Some((Err(e), None)),
                }
            }
        })
    }

    fn resolve(&self, datagram: &Datagram) -> Result<Arc<Device>> {
        let announcement = datagram.announcement()?;
        let device = self.registry.resolve(
            &announcement.mac,
            datagram.source.ip(),
            announcement.type_code,
        );
        info!("Found device: {}", device);
        Ok(device)
    }
}
