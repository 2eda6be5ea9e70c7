//! End-to-end scenarios over localhost UDP sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use plp::{Client, Config, Control, Host, Packet, SERIALIZED_PACKET_SIZE};

/// Timings shrunk so a full announce/stream/report cycle fits in test time.
fn fast_config() -> Config {
    Config {
        pace_interval_ms: 10,
        report_interval_ms: 100,
        silence_threshold_ms: 400,
        recv_timeout_ms: 20,
        window: 2,
    }
}

fn any_addr() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn spawn_host(config: Config) -> (Arc<Host>, SocketAddr) {
    let socket = UdpSocket::bind(any_addr()).await.unwrap();
    let addr = socket.local_addr().unwrap();
    let host = Arc::new(Host::new(config));
    let runner = host.clone();
    tokio::spawn(async move {
        let _ = runner.run_socket(socket).await;
    });
    (host, addr)
}

#[tokio::test]
async fn host_streams_after_announce_and_measures_clean_acks() {
    let (host, host_addr) = spawn_host(fast_config()).await;

    let probe_socket = UdpSocket::bind(any_addr()).await.unwrap();
    probe_socket
        .send_to(&Control::Restart.encode(), host_addr)
        .await
        .unwrap();

    // probes arrive with consecutive sequence ids starting at 1
    let mut buf = vec![0u8; SERIALIZED_PACKET_SIZE];
    for expected_seq in 1..=10u32 {
        let (len, from) = timeout(Duration::from_secs(2), probe_socket.recv_from(&mut buf))
            .await
            .expect("no probe within deadline")
            .unwrap();
        assert_eq!(from, host_addr);

        let packet = Packet::decode(&buf[..len]).unwrap();
        assert!(!packet.is_control());
        assert_eq!(packet.sequence_id, expected_seq);

        probe_socket
            .send_to(&Control::Ack(packet.sequence_id).encode(), host_addr)
            .await
            .unwrap();
    }

    // let the acked ids clear the window and a report fire
    tokio::time::sleep(Duration::from_millis(400)).await;

    let stats = host.stats();
    assert_eq!(stats.restarts, 1);
    assert!(stats.acks >= 10);
    assert_eq!(stats.confirmed_drops, 0);

    host.stop();
}

#[tokio::test]
async fn host_confirms_gap_in_ack_stream() {
    let (host, host_addr) = spawn_host(fast_config()).await;

    let probe_socket = UdpSocket::bind(any_addr()).await.unwrap();
    probe_socket
        .send_to(&Control::Restart.encode(), host_addr)
        .await
        .unwrap();

    let mut buf = vec![0u8; SERIALIZED_PACKET_SIZE];
    for _ in 1..=10u32 {
        let (len, _) = timeout(Duration::from_secs(2), probe_socket.recv_from(&mut buf))
            .await
            .expect("no probe within deadline")
            .unwrap();
        let packet = Packet::decode(&buf[..len]).unwrap();

        // pretend probe 3 never reached us
        if packet.sequence_id != 3 {
            probe_socket
                .send_to(&Control::Ack(packet.sequence_id).encode(), host_addr)
                .await
                .unwrap();
        }
    }

    tokio::time::sleep(Duration::from_millis(400)).await;

    let stats = host.stats();
    assert_eq!(stats.confirmed_drops, 1);

    host.stop();
}

#[tokio::test]
async fn second_announce_retargets_the_stream() {
    let (host, host_addr) = spawn_host(fast_config()).await;

    let first = UdpSocket::bind(any_addr()).await.unwrap();
    first
        .send_to(&Control::Restart.encode(), host_addr)
        .await
        .unwrap();

    let mut buf = vec![0u8; SERIALIZED_PACKET_SIZE];
    timeout(Duration::from_secs(2), first.recv_from(&mut buf))
        .await
        .expect("first client never got a probe")
        .unwrap();

    // same handshake from a different address takes over the stream
    let second = UdpSocket::bind(any_addr()).await.unwrap();
    second
        .send_to(&Control::Restart.encode(), host_addr)
        .await
        .unwrap();

    let (len, from) = timeout(Duration::from_secs(2), second.recv_from(&mut buf))
        .await
        .expect("second client never got a probe")
        .unwrap();
    assert_eq!(from, host_addr);
    assert!(Packet::decode(&buf[..len]).is_ok());

    assert_eq!(host.stats().restarts, 2);

    host.stop();
}

#[tokio::test]
async fn client_announces_acks_data_and_reannounces_on_silence() {
    let host_socket = UdpSocket::bind(any_addr()).await.unwrap();
    let host_addr = host_socket.local_addr().unwrap();

    let client = Arc::new(Client::new(fast_config()));
    let runner = client.clone();
    tokio::spawn(async move {
        let _ = runner.run(any_addr(), host_addr).await;
    });

    // first contact is the zero-sequence-id sentinel
    let mut buf = vec![0u8; 2048];
    let (len, client_addr) = timeout(Duration::from_secs(2), host_socket.recv_from(&mut buf))
        .await
        .expect("no announcement")
        .unwrap();
    assert_eq!(Control::decode(&buf[..len]).unwrap(), Control::Restart);

    // stream 1..=10 with id 5 missing; every delivered packet gets an ack
    for seq in (1..=10u32).filter(|&s| s != 5) {
        let packet = Packet::data(0, 1, seq, b"probe payload").unwrap();
        host_socket
            .send_to(&packet.encode(), client_addr)
            .await
            .unwrap();
    }

    let mut acked = Vec::new();
    while acked.len() < 9 {
        let (len, _) = timeout(Duration::from_secs(2), host_socket.recv_from(&mut buf))
            .await
            .expect("missing acks")
            .unwrap();
        if let Ok(Control::Ack(seq)) = Control::decode(&buf[..len]) {
            acked.push(seq);
        }
    }
    acked.sort_unstable();
    assert_eq!(acked, vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);

    // a control packet is observed but never acked
    host_socket
        .send_to(&Packet::control(11).encode(), client_addr)
        .await
        .unwrap();
    let quiet = timeout(Duration::from_millis(200), host_socket.recv_from(&mut buf)).await;
    assert!(quiet.is_err(), "control packets must not be acked");

    // silence past the threshold triggers a re-announcement
    let mut reannounced = false;
    for _ in 0..10 {
        if let Ok(Ok((len, _))) =
            timeout(Duration::from_millis(300), host_socket.recv_from(&mut buf)).await
        {
            if matches!(Control::decode(&buf[..len]), Ok(Control::Restart)) {
                reannounced = true;
                break;
            }
        }
    }
    assert!(reannounced, "client never re-announced after silence");
    assert!(client.stats().restarts >= 2);

    client.stop();
}
