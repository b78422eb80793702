//! Discovery against real loopback sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use mystrom_rs::runtime::UdpSocket as DiscoverySocket;
use mystrom_rs::{DeviceKind, DeviceRegistry, DiscoveryConfig, Error, Listener};
use tokio::net::UdpSocket;

const SWITCH: [u8; 8] = [0x64, 0x00, 0x6a, 0x1f, 0xab, 0x09, 106, 0x81];

fn loopback_config() -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_bind_addr(SocketAddr::from(([127, 0, 0, 1], 0)))
        .with_receive_timeout(Duration::from_millis(300))
}

async fn announce(to: SocketAddr, payload: &[u8]) {
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(payload, to).await.unwrap();
}

#[tokio::test]
async fn test_find_all_over_loopback() {
    let mut listener = Listener::bind(loopback_config()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    announce(addr, &SWITCH).await;
    // Same source address again: ends the scan.
    announce(addr, &SWITCH).await;

    let devices = listener.find_all().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].mac(), "64006a1fab09");
    assert_eq!(devices[0].kind(), DeviceKind::Switch);
    assert_eq!(devices[0].ip(), addr.ip());
}

#[tokio::test]
async fn test_find_all_times_out_empty() {
    let mut listener = Listener::bind(loopback_config()).await.unwrap();
    let devices = listener.find_all().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_find_continuous_over_loopback() {
    let mut listener = Listener::bind(loopback_config()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    announce(addr, &SWITCH).await;
    announce(addr, &SWITCH).await;

    let devices: Vec<_> = listener
        .find_continuous()
        .take(2)
        .map(|d| d.unwrap())
        .collect()
        .await;
    assert!(Arc::ptr_eq(&devices[0], &devices[1]));
    assert_eq!(listener.registry().len(), 1);
}

#[tokio::test]
async fn test_bind_address_in_use() {
    let first = Listener::bind(loopback_config()).await.unwrap();
    let taken = first.local_addr().unwrap();

    let err = Listener::bind(loopback_config().with_bind_addr(taken))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Bind { addr, .. } if addr == taken));
}

#[tokio::test]
async fn test_bind_foreign_address() {
    // TEST-NET-1 is never assigned to a local interface.
    let foreign = SocketAddr::from(([192, 0, 2, 1], 0));
    let err = Listener::bind(loopback_config().with_bind_addr(foreign))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Bind { addr, .. } if addr == foreign));
}

#[tokio::test]
async fn test_close_twice_then_receive() {
    let mut listener = Listener::bind(loopback_config()).await.unwrap();
    listener.close();
    listener.close();
    assert!(matches!(listener.receive().await, Err(Error::ListenerClosed)));
}

#[tokio::test]
async fn test_listeners_share_registry() {
    let registry = Arc::new(DeviceRegistry::new().unwrap());
    let mut a = Listener::<DiscoverySocket>::bind_with_registry(loopback_config(), Arc::clone(&registry))
        .await
        .unwrap();
    let mut b = Listener::<DiscoverySocket>::bind_with_registry(loopback_config(), Arc::clone(&registry))
        .await
        .unwrap();

    announce(a.local_addr().unwrap(), &SWITCH).await;
    announce(b.local_addr().unwrap(), &SWITCH).await;

    let from_a = a.find_all().await.unwrap();
    let from_b = b.find_all().await.unwrap();
    assert!(Arc::ptr_eq(&from_a[0], &from_b[0]));
    assert_eq!(registry.len(), 1);
}
