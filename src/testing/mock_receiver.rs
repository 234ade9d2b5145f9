//! Mock RAOP receiver for testing
//!
//! Runs on blocking sockets in background threads: one listener for the
//! RTSP control channel and one for the audio data channel. Every request is
//! recorded, the session key is unwrapped from the ANNOUNCE body and data
//! channel bytes are captured so tests can decrypt what was streamed.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use aes::Aes128;
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD as BASE64};
use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey};
use sha1::Sha1;
use thiserror::Error;

use crate::protocol::crypto::{AppleRsaPublicKey, KeyWrapPadding};
use crate::protocol::raop::packet::{self, HEADER_SIZE};
use crate::protocol::rtsp::headers::{names, raop};
use crate::protocol::rtsp::{HeaderParser, Headers, Method, RtspRequest};
use crate::protocol::sdp::SdpParser;
use crate::types::RaopConfig;

/// Session token handed out in the SETUP response
pub const MOCK_SESSION: &str = "DEADBEEF";

/// Default `Audio-Jack-Status` value
pub const MOCK_JACK_STATUS: &str = "connected; type=analog";

/// Errors starting the mock receiver
#[derive(Debug, Error)]
pub enum MockReceiverError {
    /// Could not bind a listener
    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    /// Could not generate the receiver key
    #[error("key generation failed: {0}")]
    Key(#[from] rsa::Error),
}

/// What the mock answers to SETUP
#[derive(Debug, Clone)]
pub struct MockReceiverConfig {
    /// `Session` header (`None` omits it)
    pub session: Option<String>,
    /// `Audio-Jack-Status` header (`None` omits it)
    pub jack_status: Option<String>,
    /// `Transport` header; `None` advertises the data listener's port
    pub transport: Option<String>,
    /// Padding the client is expected to wrap the AES key with
    pub key_wrap: KeyWrapPadding,
    /// Raw responses sent instead of the normal one, per method
    ///
    /// Sent verbatim, so they must include the status line and the
    /// terminating blank line.
    pub scripted: HashMap<Method, String>,
    /// Raw header lines appended to the SETUP response
    pub setup_lines: Vec<String>,
    /// Close the control connection instead of answering this method
    pub hang_up_on: Option<Method>,
    /// Close data connections as soon as they are accepted
    pub drop_data: bool,
}

impl Default for MockReceiverConfig {
    fn default() -> Self {
        Self {
            session: Some(MOCK_SESSION.to_string()),
            jack_status: Some(MOCK_JACK_STATUS.to_string()),
            transport: None,
            key_wrap: KeyWrapPadding::Pkcs1v15,
            scripted: HashMap::new(),
            setup_lines: Vec::new(),
            hang_up_on: None,
            drop_data: false,
        }
    }
}

impl MockReceiverConfig {
    /// Answer `method` with a bare status line
    #[must_use]
    pub fn reject(mut self, method: Method, code: u16, reason: &str) -> Self {
        self.scripted
            .insert(method, format!("RTSP/1.0 {code} {reason}\r\nCSeq: 0\r\n\r\n"));
        self
    }

    /// Answer `method` with `raw`
    #[must_use]
    pub fn script(mut self, method: Method, raw: impl Into<String>) -> Self {
        self.scripted.insert(method, raw.into());
        self
    }
}

/// Everything the mock has observed
#[derive(Debug, Clone, Default)]
pub struct MockReceiverState {
    /// Control requests in arrival order
    pub requests: Vec<RtspRequest>,
    /// AES key unwrapped from the ANNOUNCE body
    pub aes_key: Option<[u8; 16]>,
    /// AES IV from the ANNOUNCE body
    pub aes_iv: Option<[u8; 16]>,
    /// Raw bytes received on the data channel
    pub audio: Vec<u8>,
    /// Number of control connections accepted
    pub control_connections: usize,
    /// Number of control connections the client closed
    pub control_closed: usize,
    /// Number of data connections accepted
    pub data_connections: usize,
}

impl MockReceiverState {
    /// Methods received, in order
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.requests.iter().map(|r| r.method).collect()
    }

    /// Most recent request for `method`
    #[must_use]
    pub fn last(&self, method: Method) -> Option<&RtspRequest> {
        self.requests.iter().rev().find(|r| r.method == method)
    }
}

struct Shared {
    config: MockReceiverConfig,
    key: RsaPrivateKey,
    data_port: u16,
    state: Mutex<MockReceiverState>,
    shutdown: AtomicBool,
}

impl Shared {
    fn state(&self) -> std::sync::MutexGuard<'_, MockReceiverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock RAOP receiver
pub struct MockReceiver {
    shared: Arc<Shared>,
    control_addr: SocketAddr,
    data_addr: SocketAddr,
    threads: Vec<JoinHandle<()>>,
}

impl MockReceiver {
    /// Start a receiver on loopback with the default answers
    pub fn start() -> Result<Self, MockReceiverError> {
        Self::with_config(MockReceiverConfig::default())
    }

    /// Start a receiver on loopback
    pub fn with_config(config: MockReceiverConfig) -> Result<Self, MockReceiverError> {
        let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024)?;

        let control = TcpListener::bind("127.0.0.1:0").map_err(MockReceiverError::Bind)?;
        let data = TcpListener::bind("127.0.0.1:0").map_err(MockReceiverError::Bind)?;
        let control_addr = control.local_addr().map_err(MockReceiverError::Bind)?;
        let data_addr = data.local_addr().map_err(MockReceiverError::Bind)?;

        let shared = Arc::new(Shared {
            config,
            key,
            data_port: data_addr.port(),
            state: Mutex::new(MockReceiverState::default()),
            shutdown: AtomicBool::new(false),
        });

        let control_shared = Arc::clone(&shared);
        let data_shared = Arc::clone(&shared);
        let threads = vec![
            thread::spawn(move || accept_loop(&control, &control_shared, handle_control)),
            thread::spawn(move || accept_loop(&data, &data_shared, handle_data)),
        ];

        tracing::debug!(%control_addr, %data_addr, "mock receiver listening");
        Ok(Self {
            shared,
            control_addr,
            data_addr,
            threads,
        })
    }

    /// Control (RTSP) port
    #[must_use]
    pub fn control_port(&self) -> u16 {
        self.control_addr.port()
    }

    /// Audio data port
    #[must_use]
    pub fn data_port(&self) -> u16 {
        self.data_addr.port()
    }

    /// Public half of the receiver key
    #[must_use]
    pub fn public_key(&self) -> AppleRsaPublicKey {
        AppleRsaPublicKey::from_public_key(self.shared.key.to_public_key())
    }

    /// Session config pointed at this receiver
    ///
    /// Uses the receiver's key and short timeouts.
    #[must_use]
    pub fn client_config(&self) -> RaopConfig {
        RaopConfig::builder()
            .host("127.0.0.1")
            .control_port(self.control_port())
            .public_key(self.public_key())
            .key_wrap(self.shared.config.key_wrap)
            .connect_timeout(Some(Duration::from_secs(2)))
            .read_timeout(Some(Duration::from_secs(2)))
            .write_timeout(Some(Duration::from_secs(2)))
            .build()
    }

    /// Snapshot of the observed state
    #[must_use]
    pub fn state(&self) -> MockReceiverState {
        self.shared.state().clone()
    }

    /// Methods received so far
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.shared.state().methods()
    }

    /// Wait until `done` holds for the state, or `timeout` passes
    ///
    /// Returns the last snapshot either way.
    pub fn wait_until<F>(&self, timeout: Duration, mut done: F) -> MockReceiverState
    where
        F: FnMut(&MockReceiverState) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.state();
            if done(&state) || Instant::now() >= deadline {
                return state;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Split captured data channel bytes into packets and decrypt them
    ///
    /// Returns the plaintext payloads. A trailing incomplete packet is
    /// ignored. Panics if ANNOUNCE never delivered a key.
    #[must_use]
    pub fn decrypted_payloads(&self) -> Vec<Vec<u8>> {
        let state = self.state();
        let key = state.aes_key.expect("no AES key received");
        let iv = state.aes_iv.expect("no AES IV received");

        let mut payloads = Vec::new();
        let mut rest = state.audio.as_slice();
        while rest.len() >= HEADER_SIZE {
            let mut header = [0u8; HEADER_SIZE];
            header.copy_from_slice(&rest[..HEADER_SIZE]);
            let len = packet::payload_len(&header).expect("bad packet header");
            if rest.len() < HEADER_SIZE + len {
                break;
            }

            let mut payload = rest[HEADER_SIZE..HEADER_SIZE + len].to_vec();
            decrypt_packet(&key, &iv, &mut payload);
            payloads.push(payload);
            rest = &rest[HEADER_SIZE + len..];
        }
        payloads
    }

    /// Stop accepting and join the listener threads
    pub fn stop(&mut self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        // Wake the blocking accepts
        let _ = TcpStream::connect(self.control_addr);
        let _ = TcpStream::connect(self.data_addr);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for MockReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MockReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockReceiver")
            .field("control_addr", &self.control_addr)
            .field("data_addr", &self.data_addr)
            .finish_non_exhaustive()
    }
}

/// Decrypt the block-aligned prefix of one packet payload
pub fn decrypt_packet(key: &[u8; 16], iv: &[u8; 16], payload: &mut [u8]) {
    let aligned = payload.len() / 16 * 16;
    if aligned == 0 {
        return;
    }
    let decryptor = cbc::Decryptor::<Aes128>::new(&(*key).into(), &(*iv).into());
    let _ = decryptor.decrypt_padded_mut::<NoPadding>(&mut payload[..aligned]);
}

fn accept_loop(listener: &TcpListener, shared: &Arc<Shared>, handler: fn(TcpStream, &Shared)) {
    for stream in listener.incoming() {
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let shared = Arc::clone(shared);
                thread::spawn(move || handler(stream, &shared));
            }
            Err(e) => tracing::error!("accept error: {}", e),
        }
    }
}

fn handle_data(mut stream: TcpStream, shared: &Shared) {
    shared.state().data_connections += 1;
    if shared.config.drop_data {
        let _ = stream.shutdown(Shutdown::Both);
        return;
    }

    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => shared.state().audio.extend_from_slice(&buf[..n]),
        }
    }
}

fn handle_control(stream: TcpStream, shared: &Shared) {
    shared.state().control_connections += 1;

    let Ok(mut writer) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(stream);

    while let Some(request) = read_request(&mut reader) {
        let method = request.method;
        let cseq = request.headers.cseq().unwrap_or(0);
        record_request(shared, request);

        if shared.config.hang_up_on == Some(method) {
            let _ = writer.shutdown(Shutdown::Both);
            return;
        }

        let response = match shared.config.scripted.get(&method) {
            Some(raw) => raw.clone(),
            None => default_response(shared, method, cseq),
        };
        if writer.write_all(response.as_bytes()).is_err() {
            return;
        }
    }

    shared.state().control_closed += 1;
}

fn read_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn read_request<R: BufRead>(reader: &mut R) -> Option<RtspRequest> {
    let request_line = read_line(reader)?;
    let mut parts = request_line.split_whitespace();
    let method = Method::from_str(parts.next()?).ok()?;
    let uri = parts.next()?.to_string();

    let mut parser = HeaderParser::new();
    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            break;
        }
        parser.feed_line(&line).ok()?;
    }
    let headers = parser.finish();

    let mut body = vec![0u8; headers.content_length().unwrap_or(0)];
    reader.read_exact(&mut body).ok()?;

    Some(RtspRequest {
        method,
        uri,
        headers,
        body,
    })
}

fn record_request(shared: &Shared, request: RtspRequest) {
    let keys = if request.method == Method::Announce
        && request.headers.content_type() == Some("application/sdp")
    {
        unwrap_session_keys(shared, &request.body)
    } else {
        None
    };

    let mut state = shared.state();
    if let Some((key, iv)) = keys {
        state.aes_key = Some(key);
        state.aes_iv = Some(iv);
    }
    state.requests.push(request);
}

fn unwrap_session_keys(shared: &Shared, body: &[u8]) -> Option<([u8; 16], [u8; 16])> {
    let sdp = SdpParser::parse(&String::from_utf8_lossy(body)).ok()?;
    let wrapped = BASE64.decode(sdp.rsaaeskey()?).ok()?;
    let iv = BASE64.decode(sdp.aesiv()?).ok()?;

    let key = match shared.config.key_wrap {
        KeyWrapPadding::Pkcs1v15 => shared.key.decrypt(Pkcs1v15Encrypt, &wrapped),
        KeyWrapPadding::Oaep => shared.key.decrypt(Oaep::new::<Sha1>(), &wrapped),
    }
    .ok()?;

    Some((key.try_into().ok()?, iv.try_into().ok()?))
}

fn default_response(shared: &Shared, method: Method, cseq: u32) -> String {
    let mut headers = Headers::new();
    headers.insert(names::CSEQ, cseq.to_string());

    match method {
        Method::Setup => {
            if let Some(ref session) = shared.config.session {
                headers.insert(names::SESSION, session.as_str());
            }
            let transport = shared.config.transport.clone().unwrap_or_else(|| {
                format!(
                    "RTP/AVP/TCP;unicast;interleaved=0-1;mode=record;server_port={}",
                    shared.data_port
                )
            });
            headers.insert(names::TRANSPORT, transport);
            if let Some(ref jack) = shared.config.jack_status {
                headers.insert(raop::AUDIO_JACK_STATUS, jack.as_str());
            }
        }
        Method::Record => headers.insert("Audio-Latency", "11025"),
        _ => {}
    }

    let mut response = String::from("RTSP/1.0 200 OK\r\n");
    for (name, value) in headers.iter() {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    if method == Method::Setup {
        for line in &shared.config.setup_lines {
            response.push_str(line);
            response.push_str("\r\n");
        }
    }
    response.push_str("\r\n");
    response
}
