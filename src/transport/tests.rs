use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::{Endpoint, FrameSink, serve};
use crate::broker::liveness::drain_queues;
use crate::broker::{Broker, BrokerOptions};
use crate::codec::{Message, ReturnCode, decode};
use crate::store::MemoryStore;
use crate::utils::{Clock, SystemClock};

#[test]
fn test_endpoint_key_is_ip_and_port() {
    let endpoint: Endpoint = "192.168.1.20:5000".parse().unwrap();
    assert_eq!(endpoint.key(), "192.168.1.20:5000");
    assert_eq!(endpoint.addr().port(), 5000);
}

#[test]
fn test_ipv6_endpoint_key_parses_back() {
    let endpoint: Endpoint = "[::1]:1885".parse().unwrap();
    assert_eq!(endpoint.to_string(), "[::1]:1885");
    assert_eq!(endpoint.key().parse::<Endpoint>().unwrap(), endpoint);
}

#[test]
fn test_invalid_endpoint_key() {
    assert!("not-an-endpoint".parse::<Endpoint>().is_err());
    assert!("10.0.0.1".parse::<Endpoint>().is_err());
}

#[tokio::test]
async fn test_udp_socket_sends_frame() {
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let destination = Endpoint::from(receiver.local_addr().unwrap());

    sender.send_frame(&[0x02, 0x16], &destination).await.unwrap();

    let mut buf = [0u8; 16];
    let (len, from) = timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..len], &[0x02, 0x16]);
    assert_eq!(from, sender.local_addr().unwrap());
}

#[tokio::test]
async fn test_gateway_answers_connect_over_udp() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let broker = Arc::new(Broker::new(
        store,
        clock,
        BrokerOptions {
            broker_id: "broker:udp-test:1".to_string(),
            gateway_id: 1,
            keep_alive_secs: 30,
        },
    ));

    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let gateway_addr = socket.local_addr().unwrap();
    let sink: Arc<dyn FrameSink> = socket.clone();
    let server = tokio::spawn(serve(socket, broker.clone()));
    let drain = tokio::spawn(drain_queues(broker, sink, Duration::from_millis(5)));

    let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut connect = vec![0x0A, 0x04, 0x04, 0x01, 0x00, 0x1E];
    connect.extend_from_slice(b"dev1");
    device.send_to(&connect, gateway_addr).await.unwrap();

    let mut buf = [0u8; 64];
    let (len, _) = timeout(Duration::from_secs(2), device.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        decode(&buf[..len]).unwrap(),
        Message::ConnAck {
            return_code: ReturnCode::Accepted
        }
    );

    server.abort();
    drain.abort();
}
