//! Player integration tests against the in-process mock receiver

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use raop_client::audio::AlacEncoder;
use raop_client::protocol::rtsp::Method;
use raop_client::testing::{MockReceiver, MockReceiverConfig};
use raop_client::{ChannelObserver, ErrorCategory, Player, PlayerEvent};

mod common;

const WAIT: Duration = Duration::from_secs(2);

fn player_for(receiver: &MockReceiver) -> (Player, Receiver<PlayerEvent>) {
    common::init_logging();
    let (observer, events) = ChannelObserver::new();
    (Player::new(receiver.client_config(), Arc::new(observer)), events)
}

#[test]
fn test_start_stream_stop() {
    let receiver = MockReceiver::start().unwrap();
    let (player, events) = player_for(&receiver);

    player.start().unwrap();
    assert!(player.is_running());
    assert!(player.is_jack_connected());
    match events.recv_timeout(WAIT).unwrap() {
        PlayerEvent::Connected { jack } => assert!(jack.is_connected()),
        other => panic!("unexpected event: {other:?}"),
    }

    let pcm = common::pcm_ramp(4096);
    player.on_audio(&pcm).unwrap();
    player.on_audio(&pcm).unwrap();

    let mut encoder = AlacEncoder::new();
    let frame = encoder.encode(&pcm).unwrap().to_vec();
    receiver.wait_until(WAIT, |s| s.audio.len() >= 2 * (frame.len() + 16));
    assert_eq!(receiver.decrypted_payloads(), vec![frame.clone(), frame]);

    player.stop();
    assert!(!player.is_running());
    assert_eq!(events.recv_timeout(WAIT).unwrap(), PlayerEvent::Disconnected);

    let state = receiver.wait_until(WAIT, |s| s.last(Method::Teardown).is_some());
    assert!(state.last(Method::Teardown).is_some());
}

#[test]
fn test_volume_applied_live_and_on_restart() {
    let receiver = MockReceiver::start().unwrap();
    let (player, _events) = player_for(&receiver);

    player.start().unwrap();
    assert!(player.set_volume(-7.25).unwrap());
    assert_eq!(
        receiver.state().last(Method::SetParameter).unwrap().body,
        b"volume: -7.250000\r\n"
    );

    assert!(!player.set_volume(3.0).unwrap());

    // Restart: the handshake uses the stored volume
    player.start().unwrap();
    let state = receiver.state();
    let set_parameters: Vec<_> = state
        .requests
        .iter()
        .filter(|r| r.method == Method::SetParameter)
        .map(|r| r.body.clone())
        .collect();
    assert_eq!(
        set_parameters,
        vec![
            b"volume: -30.000000\r\n".to_vec(),
            b"volume: -7.250000\r\n".to_vec(),
            b"volume: -7.250000\r\n".to_vec(),
        ]
    );
}

#[test]
fn test_restart_emits_disconnect_then_connect() {
    let receiver = MockReceiver::start().unwrap();
    let (player, events) = player_for(&receiver);

    player.start().unwrap();
    player.start().unwrap();

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert!(matches!(received[0], PlayerEvent::Connected { .. }));
    assert_eq!(received[1], PlayerEvent::Disconnected);
    assert!(matches!(received[2], PlayerEvent::Connected { .. }));
}

#[test]
fn test_flush_while_running() {
    let receiver = MockReceiver::start().unwrap();
    let (player, _events) = player_for(&receiver);

    player.start().unwrap();
    player.flush().unwrap();
    assert!(receiver.methods().contains(&Method::Flush));
}

#[test]
fn test_control_failure_reports_recording_error() {
    let config = MockReceiverConfig::default().reject(Method::Flush, 500, "Internal Server Error");
    let receiver = MockReceiver::with_config(config).unwrap();
    let (player, events) = player_for(&receiver);

    player.start().unwrap();
    let _ = events.recv_timeout(WAIT).unwrap();

    assert!(player.flush().is_err());
    match events.recv_timeout(WAIT).unwrap() {
        PlayerEvent::Error { category, message } => {
            assert_eq!(category, ErrorCategory::Recording);
            assert!(message.contains("500"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    // Control errors leave the stream running
    assert!(player.is_running());
}

#[test]
fn test_send_failure_stops_player() {
    let config = MockReceiverConfig {
        drop_data: true,
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();
    let (player, events) = player_for(&receiver);

    player.start().unwrap();
    let _ = events.recv_timeout(WAIT).unwrap();
    receiver.wait_until(WAIT, |s| s.data_connections == 1);

    let pcm = common::pcm_ramp(4096);
    let mut failed = false;
    for _ in 0..100 {
        if player.on_audio(&pcm).is_err() {
            failed = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(failed, "writes to a closed data channel never failed");
    assert!(!player.is_running());

    match events.recv_timeout(WAIT).unwrap() {
        PlayerEvent::Error { category, .. } => assert_eq!(category, ErrorCategory::Sending),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(events.recv_timeout(WAIT).unwrap(), PlayerEvent::Disconnected);

    // Later audio is dropped quietly
    player.on_audio(&pcm).unwrap();
}

#[test]
fn test_start_failure_reports_connecting_error() {
    let config = MockReceiverConfig::default().reject(Method::Announce, 403, "Forbidden");
    let receiver = MockReceiver::with_config(config).unwrap();
    let (player, events) = player_for(&receiver);

    assert!(player.start().is_err());
    assert!(!player.is_running());
    match events.recv_timeout(WAIT).unwrap() {
        PlayerEvent::Error { category, message } => {
            assert_eq!(category, ErrorCategory::Connecting);
            assert!(message.contains("403 Forbidden"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
