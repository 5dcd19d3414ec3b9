use bytes::BytesMut;
use clipdeck_io::frame::{encode_frame, read_frame, EXTENDED_LEN_MARKER};
use clipdeck_io::request::{NAME_FIELD_LEN, REQUEST_LEN};
use clipdeck_io::{
    ConsoleError, ConsoleSession, ControlRequest, FrameError, Opcode, RequestOp, SessionState,
    ShellVersion,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

fn framed(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(opcode, payload, &mut buf).unwrap();
    buf.to_vec()
}

/// A fresh session plus the device end of the pipe. Frame reads do not
/// care whether the upgrade happened, so these tests skip it.
fn framed_session() -> (ConsoleSession<DuplexStream>, DuplexStream) {
    let (client, device) = tokio::io::duplex(1 << 18);
    (ConsoleSession::new(client), device)
}

async fn read_http_request(device: &mut DuplexStream) -> String {
    let mut req = Vec::new();
    let mut b = [0u8; 1];
    while !req.ends_with(b"\r\n\r\n") {
        device.read_exact(&mut b).await.unwrap();
        req.push(b[0]);
    }
    String::from_utf8(req).unwrap()
}

// ============================================================================
// Opcode Tests
// ============================================================================

#[test]
fn test_opcode_from_byte() {
    assert_eq!(Opcode::from_byte(0x81), Opcode::Text);
    assert_eq!(Opcode::from_byte(0x82), Opcode::Binary);
    assert_eq!(Opcode::from_byte(0x88), Opcode::Other(0x88));
    assert_eq!(Opcode::Other(0x88).as_byte(), 0x88);
}

#[test]
fn test_opcode_acceptance() {
    assert!(Opcode::Binary.is_accepted(false));
    assert!(Opcode::Binary.is_accepted(true));
    assert!(!Opcode::Text.is_accepted(false));
    assert!(Opcode::Text.is_accepted(true));
    assert!(!Opcode::Other(0x89).is_accepted(true));
}

// ============================================================================
// Frame Encoding Tests
// ============================================================================

#[test]
fn test_encode_short_header() {
    let bytes = framed(Opcode::Binary, b"abc");
    assert_eq!(bytes, vec![0x82, 3, b'a', b'b', b'c']);
}

#[test]
fn test_encode_125_stays_short() {
    let bytes = framed(Opcode::Text, &[7u8; 125]);
    assert_eq!(bytes[0], 0x81);
    assert_eq!(bytes[1], 125);
    assert_eq!(bytes.len(), 127);
}

#[test]
fn test_encode_126_uses_extended_length() {
    let bytes = framed(Opcode::Binary, &[0u8; 126]);
    assert_eq!(bytes[1], EXTENDED_LEN_MARKER);
    assert_eq!(&bytes[2..4], &[0x00, 0x7e]);
    assert_eq!(bytes.len(), 4 + 126);
}

#[test]
fn test_encode_rejects_oversized_payload() {
    let mut buf = BytesMut::new();
    let err = encode_frame(Opcode::Binary, &vec![0u8; 65536], &mut buf).unwrap_err();
    assert!(matches!(err, FrameError::PayloadTooLarge(65536)));
    assert!(buf.is_empty());
}

// ============================================================================
// Frame Decoding Tests
// ============================================================================

#[tokio::test]
async fn test_frame_round_trip_boundary_lengths() {
    for len in [0usize, 1, 125, 126, 65535] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let bytes = framed(Opcode::Binary, &payload);

        let mut reader: &[u8] = &bytes;
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.opcode, Opcode::Binary, "len {len}");
        assert_eq!(&frame.payload[..], &payload[..], "len {len}");
        assert!(reader.is_empty(), "len {len} left bytes behind");
    }
}

#[tokio::test]
async fn test_read_frame_rejects_64bit_length_marker() {
    let bytes = [0x82u8, 127, 0, 0, 0, 0, 0, 0, 0, 1, 0];
    let mut reader: &[u8] = &bytes;
    let err = read_frame(&mut reader).await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Frame(FrameError::BadLengthMarker(127))
    ));
}

#[tokio::test]
async fn test_read_frame_truncated_payload() {
    let bytes = [0x82u8, 5, b'a', b'b'];
    let mut reader: &[u8] = &bytes;
    let err = read_frame(&mut reader).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Frame(FrameError::Truncated)));
}

#[tokio::test]
async fn test_read_frame_truncated_extended_header() {
    let bytes = [0x82u8, 126, 0x01];
    let mut reader: &[u8] = &bytes;
    let err = read_frame(&mut reader).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Frame(FrameError::Truncated)));
}

#[tokio::test]
async fn test_read_frame_clean_eof_is_closed() {
    let mut reader: &[u8] = &[];
    let err = read_frame(&mut reader).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Closed));
}

// ============================================================================
// ControlRequest Tests
// ============================================================================

#[test]
fn test_version_request_layout() {
    let rec = ControlRequest::get_version().encode();
    assert_eq!(rec.len(), REQUEST_LEN);
    assert_eq!(rec.len(), 82);
    assert_eq!(&rec[0..2], b"WA");
    assert_eq!(rec[2], 3);
    assert_eq!(rec[3], 0);
    assert!(rec[4..].iter().all(|&b| b == 0));
}

#[test]
fn test_named_request_layout() {
    let rec = ControlRequest::new(RequestOp::GetFile, b"keypresses.dat")
        .unwrap()
        .with_size(0x0102_0304)
        .encode();
    assert_eq!(rec[2], 2);
    assert_eq!(&rec[4..12], &[0u8; 8]);
    assert_eq!(&rec[12..16], &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!(&rec[16..18], &[14, 0]);
    assert_eq!(&rec[18..32], b"keypresses.dat");
    assert!(rec[32..].iter().all(|&b| b == 0));
}

#[test]
fn test_request_name_too_long() {
    let name = vec![b'x'; NAME_FIELD_LEN + 1];
    let err = ControlRequest::new(RequestOp::PutFile, &name).unwrap_err();
    assert!(matches!(err, ConsoleError::NameTooLong(65)));
    assert!(ControlRequest::new(RequestOp::PutFile, &name[..NAME_FIELD_LEN]).is_ok());
}

#[test]
fn test_shell_version_display() {
    let v = ShellVersion::from_bytes([1, 19, 1]);
    assert_eq!(v.to_string(), "1.19.1");
}

// ============================================================================
// ConsoleSession Tests
// ============================================================================

#[tokio::test]
async fn test_handshake_and_login() {
    let (client, mut device) = tokio::io::duplex(4096);
    let mut session = ConsoleSession::new(client);
    assert_eq!(session.state(), SessionState::Connected);

    device
        .write_all(b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n")
        .await
        .unwrap();
    device
        .write_all(&framed(Opcode::Text, b"Password: "))
        .await
        .unwrap();

    session.handshake("192.168.4.1", false).await.unwrap();
    assert_eq!(session.state(), SessionState::FrameMode);
    session.login("repl").await.unwrap();
    assert_eq!(session.state(), SessionState::Authenticated);

    let req = read_http_request(&mut device).await;
    assert!(req.starts_with("GET / HTTP/1.1\r\n"));
    assert!(req.contains("Host: 192.168.4.1\r\n"));
    assert!(req.contains("Connection: Upgrade\r\n"));
    assert!(req.contains("Upgrade: websocket\r\n"));
    assert!(req.contains("Sec-WebSocket-Key: foo\r\n"));

    let answer = read_frame(&mut device).await.unwrap();
    assert_eq!(answer.opcode, Opcode::Binary);
    assert_eq!(&answer.payload[..], b"repl\r");
}

#[tokio::test]
async fn test_lenient_handshake_accepts_any_reply() {
    let (client, mut device) = tokio::io::duplex(4096);
    let mut session = ConsoleSession::new(client);
    device
        .write_all(b"HTTP/1.0 500 Nope\r\n\r\n")
        .await
        .unwrap();
    session.handshake("dev", false).await.unwrap();
    assert_eq!(session.state(), SessionState::FrameMode);
}

#[tokio::test]
async fn test_strict_handshake_rejects_non_101() {
    let (client, mut device) = tokio::io::duplex(4096);
    let mut session = ConsoleSession::new(client);
    device
        .write_all(b"HTTP/1.0 500 Nope\r\n\r\n")
        .await
        .unwrap();
    let err = session.handshake("dev", true).await.unwrap_err();
    assert!(matches!(err, ConsoleError::HandshakeRejected(s) if s.contains("500")));
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_handshake_eof_is_closed() {
    let (client, mut device) = tokio::io::duplex(4096);
    let mut session = ConsoleSession::new(client);
    device.write_all(b"HTTP/1.1 101 OK\r\n").await.unwrap();
    drop(device);
    let err = session.handshake("dev", false).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Closed));
}

#[tokio::test]
async fn test_login_rejects_unexpected_prompt() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Text, b"Password:x"))
        .await
        .unwrap();
    let err = session.login("repl").await.unwrap_err();
    assert!(matches!(err, ConsoleError::UnexpectedPrompt(b'x')));
}

#[tokio::test]
async fn test_text_frame_discarded_in_binary_mode() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Text, b"ignored shell chatter"))
        .await
        .unwrap();
    device
        .write_all(&framed(Opcode::Binary, &[1, 19, 1]))
        .await
        .unwrap();

    let got = session.read(3, false).await.unwrap();
    assert_eq!(&got[..], &[1, 19, 1]);
}

#[tokio::test]
async fn test_unknown_opcode_discarded_even_in_text_mode() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Other(0x89), b"ping"))
        .await
        .unwrap();
    device
        .write_all(&framed(Opcode::Text, b"ok"))
        .await
        .unwrap();

    let got = session.read(2, true).await.unwrap();
    assert_eq!(&got[..], b"ok");
}

#[tokio::test]
async fn test_read_buffers_remainder() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Text, b"abc"))
        .await
        .unwrap();
    device
        .write_all(&framed(Opcode::Text, b"d"))
        .await
        .unwrap();

    assert_eq!(&session.read(1, true).await.unwrap()[..], b"a");
    assert_eq!(&session.read(2, true).await.unwrap()[..], b"bc");
    assert_eq!(&session.read(1, true).await.unwrap()[..], b"d");
}

#[tokio::test]
async fn test_read_chunk_returns_remainder_first() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Text, b"hello"))
        .await
        .unwrap();
    device
        .write_all(&framed(Opcode::Text, b"world"))
        .await
        .unwrap();

    assert_eq!(&session.read(2, true).await.unwrap()[..], b"he");
    assert_eq!(&session.read_chunk(true).await.unwrap()[..], b"llo");
    assert_eq!(&session.read_chunk(true).await.unwrap()[..], b"world");
}

#[tokio::test]
async fn test_short_frame_is_fatal() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Binary, &[1, 2]))
        .await
        .unwrap();

    let err = session.read(3, false).await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Frame(FrameError::ShortPayload { wanted: 3, got: 2 })
    ));
    assert_eq!(session.state(), SessionState::Closed);

    let again = session.read(1, false).await.unwrap_err();
    assert!(matches!(again, ConsoleError::Closed));
}

#[tokio::test]
async fn test_device_hangup_closes_session() {
    let (mut session, device) = framed_session();
    drop(device);
    let err = session.read(1, true).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Closed));
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_get_version() {
    let (mut session, mut device) = framed_session();
    device
        .write_all(&framed(Opcode::Binary, &[1, 22, 0]))
        .await
        .unwrap();

    let version = session.get_version().await.unwrap();
    assert_eq!(version, ShellVersion::from_bytes([1, 22, 0]));

    let req = read_frame(&mut device).await.unwrap();
    assert_eq!(req.opcode, Opcode::Binary);
    assert_eq!(req.payload.len(), REQUEST_LEN);
    assert_eq!(&req.payload[0..3], &[b'W', b'A', 3]);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (mut session, _device) = framed_session();
    session.close().await.unwrap();
    session.close().await.unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    let err = session.write(b"x", Opcode::Binary).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Closed));
}

#[test]
fn test_session_debug_hides_stream() {
    let (session, _device) = framed_session();
    let debug = format!("{:?}", session);
    assert!(debug.contains("ConsoleSession"));
    assert!(debug.contains("<stream>"));
}
