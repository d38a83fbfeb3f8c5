//! Dialing real sockets on loopback

use redial_core::retry::{Backoff, BackoffPolicy};
use redial_transport::{ConnectError, Connector, Dialer, NetConnection, NetConnector};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;

fn fast_policy(max_failures: u32) -> BackoffPolicy {
    BackoffPolicy::builder()
        .minimum(Duration::from_millis(10))
        .max_failures(max_failures)
        .max_delay(Duration::from_millis(100))
        .build()
}

/// An address nothing is listening on
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn test_dial_tcp_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"hello").await.unwrap();
    });

    let dialer = Dialer::new(NetConnector::new(), fast_policy(5));
    let conn = dialer.dial("tcp", &addr.to_string()).await;

    assert_eq!(conn.peer_addr().unwrap(), addr);
    let mut stream = conn.into_tcp().expect("tcp connection");
    let mut buf = [0u8; 5];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");

    server.await.unwrap();
}

#[tokio::test]
async fn test_dial_waits_for_late_listener() {
    let addr = closed_addr().await;

    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let dialer = Dialer::new(NetConnector::new(), fast_policy(1));
    let conn = tokio::time::timeout(Duration::from_secs(5), dialer.dial("tcp", &addr.to_string()))
        .await
        .expect("dial should succeed once the listener is up");

    assert!(matches!(conn, NetConnection::Tcp(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_dial_bounded_refused() {
    let addr = closed_addr().await;
    let dialer = Dialer::new(NetConnector::new(), fast_policy(2));

    let err = dialer
        .dial_bounded("tcp", &addr.to_string())
        .await
        .unwrap_err();

    match err {
        ConnectError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionRefused),
        other => panic!("expected refused, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dial_until_cancelled_while_refused() {
    let addr = closed_addr().await;
    let dialer = Dialer::new(NetConnector::new(), fast_policy(5));
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        })
    };

    let err = dialer
        .dial_until("tcp", &addr.to_string(), &token)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(err.attempts >= 1);
    assert!(matches!(err.last_error, Some(ConnectError::Io(_))));
}

#[tokio::test]
async fn test_dial_with_stateful_backoff_resets() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        for _ in 0..2 {
            let _ = listener.accept().await.unwrap();
        }
    });

    let dialer = Dialer::new(NetConnector::new(), fast_policy(5));
    let mut backoff = Backoff::new(fast_policy(5));

    for _ in 0..2 {
        backoff.reset();
        let conn = dialer.dial_with(&mut backoff, "tcp4", &addr.to_string()).await;
        assert_eq!(conn.peer_addr().unwrap(), addr);
        assert_eq!(backoff.failures(), 0);
    }

    server.await.unwrap();
}

#[tokio::test]
async fn test_dial_udp() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let conn = NetConnector::new()
        .connect("udp4", &addr.to_string())
        .await
        .unwrap();
    let socket = conn.into_udp().expect("udp connection");
    socket.send(b"ping").await.unwrap();

    let mut buf = [0u8; 4];
    let (n, from) = server.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"ping");
    assert_eq!(from.port(), socket.local_addr().unwrap().port());
}

#[tokio::test]
async fn test_connect_timeout_applies_per_attempt() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let connector = NetConnector::new().with_connect_timeout(Duration::from_secs(2));
    let conn = connector.connect("tcp", &addr.to_string()).await.unwrap();

    assert_eq!(conn.peer_addr().unwrap(), addr);
    assert!(conn.into_udp().is_none());
}
