//! RAOP session integration tests against the in-process mock receiver

use std::time::Duration;

use raop_client::audio::AlacEncoder;
use raop_client::error::ErrorKind;
use raop_client::protocol::crypto::KeyWrapPadding;
use raop_client::protocol::raop::{JackConnection, JackType};
use raop_client::protocol::rtsp::Method;
use raop_client::protocol::sdp::SdpParser;
use raop_client::testing::{MOCK_SESSION, MockReceiver, MockReceiverConfig};
use raop_client::{RaopError, RaopSession, RaopSessionState};

mod common;

const WAIT: Duration = Duration::from_secs(2);

fn connected(receiver: &MockReceiver) -> RaopSession {
    common::init_logging();
    let mut session = RaopSession::new(receiver.client_config());
    session.connect().expect("handshake failed");
    session
}

#[test]
fn test_handshake_request_sequence() {
    let receiver = MockReceiver::start().unwrap();
    let session = connected(&receiver);

    assert_eq!(session.state(), RaopSessionState::Recording);
    assert!(session.is_recording());
    assert_eq!(session.server_port(), receiver.data_port());
    assert_eq!(session.cseq(), 4);

    assert_eq!(
        receiver.methods(),
        vec![
            Method::Announce,
            Method::Setup,
            Method::Record,
            Method::SetParameter
        ]
    );

    let state = receiver.wait_until(WAIT, |s| s.data_connections == 1);
    assert_eq!(state.control_connections, 1);
    assert_eq!(state.data_connections, 1);
}

#[test]
fn test_cseq_and_session_headers() {
    let receiver = MockReceiver::start().unwrap();
    let session = connected(&receiver);
    let identity = session.identity().unwrap().clone();

    let state = receiver.state();
    for (i, request) in state.requests.iter().enumerate() {
        assert_eq!(request.headers.cseq(), Some(u32::try_from(i + 1).unwrap()));
        assert_eq!(request.uri, identity.url());
        assert_eq!(
            request.headers.get("User-Agent"),
            Some("iTunes/4.6 (Macintosh; U; PPC Mac OS X 10.3)")
        );
        assert_eq!(
            request.headers.get("Client-Instance"),
            Some(identity.client_instance.as_str())
        );

        let expected_session = match request.method {
            Method::Announce | Method::Setup => None,
            _ => Some(MOCK_SESSION),
        };
        assert_eq!(request.headers.session(), expected_session);
    }

    // Challenge only on ANNOUNCE
    let announce = state.last(Method::Announce).unwrap();
    assert_eq!(
        announce.headers.get("Apple-Challenge"),
        Some(identity.challenge.as_str())
    );
    for method in [Method::Setup, Method::Record, Method::SetParameter] {
        assert!(!state.last(method).unwrap().headers.contains("Apple-Challenge"));
    }

    let setup = state.last(Method::Setup).unwrap();
    assert_eq!(
        setup.headers.get("Transport"),
        Some("RTP/AVP/TCP;unicast;interleaved=0-1;mode=record")
    );

    let record = state.last(Method::Record).unwrap();
    assert_eq!(record.headers.get("Range"), Some("npt=0-"));
    assert_eq!(record.headers.get("RTP-Info"), Some("seq=0;rtptime=0"));
}

#[test]
fn test_announce_describes_stream() {
    let receiver = MockReceiver::start().unwrap();
    let session = connected(&receiver);
    let identity = session.identity().unwrap();

    let state = receiver.state();
    let announce = state.last(Method::Announce).unwrap();
    assert_eq!(announce.headers.content_type(), Some("application/sdp"));
    assert_eq!(announce.headers.content_length(), Some(announce.body.len()));

    let text = String::from_utf8(announce.body.clone()).unwrap();
    assert!(text.ends_with("\r\n"));

    let sdp = SdpParser::parse(&text).unwrap();
    let origin = sdp.origin.as_ref().unwrap();
    assert_eq!(origin.username, "iTunes");
    assert_eq!(origin.session_id, identity.session_id);
    assert_eq!(origin.unicast_address, identity.local_address);
    assert_eq!(sdp.session_name, "iTunes");
    assert_eq!(sdp.connection.as_ref().unwrap().address, "127.0.0.1");
    assert_eq!(sdp.rtpmap(), Some("96 AppleLossless"));
    assert_eq!(sdp.fmtp(), Some("96 4096 0 16 40 10 14 2 255 0 0 44100"));

    // The mock could unwrap the session key
    assert!(state.aes_key.is_some());
    assert!(state.aes_iv.is_some());
}

#[test]
fn test_initial_volume_sent_after_record() {
    let receiver = MockReceiver::start().unwrap();
    let _session = connected(&receiver);

    let state = receiver.state();
    let request = state.last(Method::SetParameter).unwrap();
    assert_eq!(request.headers.content_type(), Some("text/parameters"));
    assert_eq!(request.body, b"volume: -30.000000\r\n");
}

#[test]
fn test_set_volume() {
    let receiver = MockReceiver::start().unwrap();
    let mut session = connected(&receiver);

    assert!(session.set_volume(-15.5).unwrap());
    assert!((session.volume().as_db() - -15.5).abs() < f64::EPSILON);
    assert_eq!(session.cseq(), 5);

    let state = receiver.state();
    assert_eq!(
        state.last(Method::SetParameter).unwrap().body,
        b"volume: -15.500000\r\n"
    );

    // Out of range: nothing sent, nothing changed
    assert!(!session.set_volume(0.5).unwrap());
    assert!(!session.set_volume(-200.0).unwrap());
    assert_eq!(session.cseq(), 5);
    assert!((session.volume().as_db() - -15.5).abs() < f64::EPSILON);
}

#[test]
fn test_streaming_decrypts_to_alac_frames() {
    let receiver = MockReceiver::start().unwrap();
    let session = connected(&receiver);

    let mut encoder = AlacEncoder::new();
    let mut expected = Vec::new();
    for frames in [4096, 1000, 3] {
        let pcm = common::pcm_ramp(frames);
        let frame = encoder.encode(&pcm).unwrap();
        session.send_sample(frame, 0, frame.len()).unwrap();
        expected.push(frame.to_vec());
    }

    let total: usize = expected.iter().map(|f| f.len() + 16).sum();
    let state = receiver.wait_until(WAIT, |s| s.audio.len() >= total);
    assert_eq!(state.audio.len(), total);

    // First packet header: 24 00 | len+12 | F0 FF | zeros
    let len = u16::try_from(expected[0].len() + 12).unwrap().to_be_bytes();
    assert_eq!(
        &state.audio[..16],
        &[
            0x24, 0x00, len[0], len[1], 0xF0, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0
        ]
    );
    // Ciphertext differs from the plaintext frame
    assert_ne!(&state.audio[16..32], &expected[0][..16]);

    assert_eq!(receiver.decrypted_payloads(), expected);
}

#[test]
fn test_send_sample_uses_offset_and_count() {
    let receiver = MockReceiver::start().unwrap();
    let session = connected(&receiver);

    let buffer: Vec<u8> = (0..100u8).collect();
    session.send_sample(&buffer, 10, 40).unwrap();

    receiver.wait_until(WAIT, |s| s.audio.len() >= 56);
    assert_eq!(receiver.decrypted_payloads(), vec![buffer[10..50].to_vec()]);

    let err = session.send_sample(&buffer, 90, 11).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn test_concurrent_senders_do_not_interleave() {
    let receiver = MockReceiver::start().unwrap();
    let session = connected(&receiver);

    std::thread::scope(|scope| {
        for fill in 1..=4u8 {
            let session = &session;
            scope.spawn(move || {
                let payload = vec![fill; 1003];
                for _ in 0..10 {
                    session.send_sample(&payload, 0, payload.len()).unwrap();
                }
            });
        }
    });

    receiver.wait_until(WAIT, |s| s.audio.len() >= 40 * (1003 + 16));
    let payloads = receiver.decrypted_payloads();
    assert_eq!(payloads.len(), 40);
    for payload in payloads {
        assert_eq!(payload.len(), 1003);
        assert!(payload.iter().all(|&b| b == payload[0]));
    }
}

#[test]
fn test_oaep_key_wrap() {
    let config = MockReceiverConfig {
        key_wrap: KeyWrapPadding::Oaep,
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();
    let session = connected(&receiver);
    assert_eq!(session.config().key_wrap, KeyWrapPadding::Oaep);

    let payload = [0x5Au8; 48];
    session.send_sample(&payload, 0, payload.len()).unwrap();

    receiver.wait_until(WAIT, |s| s.audio.len() >= 64);
    assert_eq!(receiver.decrypted_payloads(), vec![payload.to_vec()]);
}

#[test]
fn test_flush() {
    let receiver = MockReceiver::start().unwrap();
    let mut session = connected(&receiver);

    session.flush().unwrap();

    let state = receiver.state();
    let flush = state.last(Method::Flush).unwrap();
    assert_eq!(flush.headers.get("RTP-Info"), Some("seq=0;rtptime=0"));
    assert_eq!(flush.headers.session(), Some(MOCK_SESSION));
    assert!(session.is_recording());
}

#[test]
fn test_disconnect_sends_teardown() {
    let receiver = MockReceiver::start().unwrap();
    let mut session = connected(&receiver);

    session.disconnect();
    assert_eq!(session.state(), RaopSessionState::Disconnected);

    let state = receiver.wait_until(WAIT, |s| s.last(Method::Teardown).is_some());
    let teardown = state.last(Method::Teardown).unwrap();
    assert_eq!(teardown.headers.cseq(), Some(5));
    assert_eq!(teardown.headers.session(), Some(MOCK_SESSION));

    let err = session.send_sample(&[0u8; 4], 0, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);

    // Second disconnect sends nothing
    session.disconnect();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(receiver.methods().len(), 5);
}

#[test]
fn test_disconnect_after_receiver_hangs_up() {
    let config = MockReceiverConfig {
        hang_up_on: Some(Method::Flush),
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();
    let mut session = connected(&receiver);

    let err = session.flush().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.to_string(), "protocol error: read error");

    session.disconnect();
    assert_eq!(session.state(), RaopSessionState::Disconnected);
}

#[test]
fn test_reconnect_after_disconnect() {
    let receiver = MockReceiver::start().unwrap();
    let mut session = connected(&receiver);
    let first = session.identity().unwrap().session_id.clone();

    session.disconnect();
    session.connect().unwrap();

    assert!(session.is_recording());
    assert_eq!(session.cseq(), 4);
    assert_ne!(session.identity().unwrap().session_id, first);

    let state = receiver.wait_until(WAIT, |s| s.data_connections == 2);
    assert_eq!(state.control_connections, 2);
}

#[test]
fn test_connect_while_recording_rejected() {
    let receiver = MockReceiver::start().unwrap();
    let mut session = connected(&receiver);

    let err = session.connect().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(session.is_recording());
}

#[test]
fn test_setup_rejected_cleans_up() {
    let config = MockReceiverConfig::default().reject(Method::Setup, 453, "Not Enough Bandwidth");
    let receiver = MockReceiver::with_config(config).unwrap();
    common::init_logging();

    let mut session = RaopSession::new(receiver.client_config());
    let err = session.connect().unwrap_err();

    match err {
        RaopError::UnexpectedStatus { ref status_line } => {
            assert_eq!(status_line, "RTSP/1.0 453 Not Enough Bandwidth");
        }
        ref other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(session.state(), RaopSessionState::Idle);
    assert_eq!(session.cseq(), 0);
    assert_eq!(receiver.methods(), vec![Method::Announce, Method::Setup]);

    let state = receiver.wait_until(WAIT, |s| s.control_closed == 1);
    assert_eq!(state.control_closed, state.control_connections);
    assert_eq!(state.data_connections, 0);
}

#[test]
fn test_unreachable_data_port_cleans_up() {
    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = MockReceiverConfig {
        transport: Some(format!(
            "RTP/AVP/TCP;unicast;interleaved=0-1;mode=record;server_port={closed_port}"
        )),
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();
    common::init_logging();

    let mut session = RaopSession::new(receiver.client_config());
    let err = session.connect().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(session.state(), RaopSessionState::Idle);
    assert!(!session.is_recording());
    assert_eq!(
        receiver.methods(),
        vec![
            Method::Announce,
            Method::Setup,
            Method::Record,
            Method::SetParameter
        ]
    );

    let state = receiver.wait_until(WAIT, |s| s.control_closed == 1);
    assert_eq!(state.control_connections, 1);
    assert_eq!(state.control_closed, 1);
}

#[test]
fn test_missing_jack_status_fails_by_default() {
    let config = MockReceiverConfig {
        jack_status: None,
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();

    let mut session = RaopSession::new(receiver.client_config());
    let err = session.connect().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(session.state(), RaopSessionState::Idle);
    assert_eq!(receiver.methods(), vec![Method::Announce, Method::Setup]);
}

#[test]
fn test_missing_jack_status_tolerated_when_configured() {
    let config = MockReceiverConfig {
        jack_status: None,
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();

    let mut client = receiver.client_config();
    client.require_jack_status = false;
    let mut session = RaopSession::new(client);
    session.connect().unwrap();

    assert_eq!(session.jack_status().connection, JackConnection::Disconnected);
    assert_eq!(session.jack_status().jack_type, JackType::Analog);
}

#[test]
fn test_folded_jack_status_header() {
    let config = MockReceiverConfig {
        jack_status: None,
        setup_lines: vec![
            "Audio-Jack-Status: connected;".to_string(),
            " type=digital".to_string(),
        ],
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();
    let session = connected(&receiver);

    let jack = session.jack_status();
    assert!(jack.is_connected());
    assert_eq!(jack.jack_type, JackType::Digital);
}

#[test]
fn test_missing_session_fails() {
    let config = MockReceiverConfig {
        session: None,
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();

    let mut session = RaopSession::new(receiver.client_config());
    let err = session.connect().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(!receiver.methods().contains(&Method::Record));
}

#[test]
fn test_missing_server_port_fails() {
    let config = MockReceiverConfig {
        transport: Some("RTP/AVP/TCP;unicast;interleaved=0-1;mode=record".to_string()),
        ..Default::default()
    };
    let receiver = MockReceiver::with_config(config).unwrap();

    let mut session = RaopSession::new(receiver.client_config());
    let err = session.connect().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(session.server_port(), 0);
}

#[test]
fn test_bad_header_in_response() {
    let config = MockReceiverConfig::default().script(
        Method::Announce,
        "RTSP/1.0 200 OK\r\nCSeq: 1\r\nthis line has no colon\r\n\r\n",
    );
    let receiver = MockReceiver::with_config(config).unwrap();

    let mut session = RaopSession::new(receiver.client_config());
    let err = session.connect().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.to_string().contains("bad header"));
    assert_eq!(receiver.methods(), vec![Method::Announce]);
}

#[test]
fn test_response_body_is_skipped() {
    let config = MockReceiverConfig::default().script(
        Method::Record,
        "RTSP/1.0 200 OK\r\nCSeq: 3\r\nContent-Length: 5\r\n\r\nhello",
    );
    let receiver = MockReceiver::with_config(config).unwrap();
    let mut session = connected(&receiver);

    // SET_PARAMETER's response was read from the right place
    assert!(session.set_volume(-10.0).unwrap());
    assert_eq!(session.cseq(), 5);
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = raop_client::RaopConfig::builder()
        .host("127.0.0.1")
        .control_port(port)
        .build();

    let mut session = RaopSession::new(config);
    let err = session.connect().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(session.state(), RaopSessionState::Idle);
}
