use reqbench_client::wire::{encode_request, read_response, MAX_HEADERS, MAX_HEAD_BYTES};
use reqbench_common::ReqBenchError;
use std::io::{BufReader, Cursor};

fn reader(bytes: &[u8]) -> BufReader<Cursor<Vec<u8>>> {
    BufReader::new(Cursor::new(bytes.to_vec()))
}

#[test]
fn test_encode_request() {
    assert_eq!(
        encode_request("example.com", "/a/b?x=1"),
        b"GET /a/b?x=1 HTTP/1.1\r\nHost: example.com\r\n\r\n"
    );
}

#[test]
fn test_content_length_body() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\nContent-Length: 21\r\n\r\n<h1>Hello, Axum!</h1>");
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"<h1>Hello, Axum!</h1>");
    assert!(response.keep_alive());
}

#[test]
fn test_back_to_back_responses_on_one_stream() {
    let mut r = reader(
        b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\naHTTP/1.1 201 Created\r\nContent-Length: 1\r\n\r\nb",
    );
    let first = read_response(&mut r).unwrap();
    let second = read_response(&mut r).unwrap();
    assert_eq!((first.status, first.body), (200, b"a".to_vec()));
    assert_eq!((second.status, second.body), (201, b"b".to_vec()));
}

#[test]
fn test_chunked_body_with_trailer() {
    let mut r = reader(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6;ext=1\r\n world\r\n0\r\nX-Trailer: t\r\n\r\n",
    );
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.body, b"hello world");
    assert!(response.keep_alive());
}

#[test]
fn test_no_body_for_204_and_304() {
    let mut r = reader(b"HTTP/1.1 204 No Content\r\n\r\nHTTP/1.1 304 Not Modified\r\nContent-Length: 99\r\n\r\n");
    assert!(read_response(&mut r).unwrap().body.is_empty());
    assert!(read_response(&mut r).unwrap().body.is_empty());
}

#[test]
fn test_interim_response_is_skipped() {
    let mut r = reader(b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"ok");
}

#[test]
fn test_body_until_close_is_not_keep_alive() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\n\r\nstreamed until eof");
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.body, b"streamed until eof");
    assert!(!response.keep_alive());
}

#[test]
fn test_connection_close_header() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\nConnection: Close\r\nContent-Length: 0\r\n\r\n");
    assert!(!read_response(&mut r).unwrap().keep_alive());
}

#[test]
fn test_http10_keep_alive_rules() {
    let mut r = reader(b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n");
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.version, 0);
    assert!(!response.keep_alive());

    let mut r = reader(b"HTTP/1.0 200 OK\r\nConnection: keep-alive\r\nContent-Length: 0\r\n\r\n");
    assert!(read_response(&mut r).unwrap().keep_alive());
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\nX-Server: axum\r\nContent-Length: 0\r\n\r\n");
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.header("x-server"), Some("axum"));
    assert_eq!(response.header("X-SERVER"), Some("axum"));
    assert_eq!(response.header("missing"), None);
}

#[test]
fn test_eof_before_response_is_network_error() {
    let mut r = reader(b"");
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::NetworkError(_))));
}

#[test]
fn test_truncated_head_is_network_error() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\nContent-Len");
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::NetworkError(_))));
}

#[test]
fn test_garbage_status_line_is_malformed() {
    let mut r = reader(b"SMTP ready\r\n\r\n");
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::MalformedResponse(_))));
}

#[test]
fn test_invalid_content_length_is_malformed() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\nContent-Length: lots\r\n\r\n");
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::MalformedResponse(_))));
}

#[test]
fn test_invalid_chunk_size_is_malformed() {
    let mut r = reader(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n");
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::MalformedResponse(_))));
}

#[test]
fn test_oversized_head_is_malformed() {
    let mut bytes = b"HTTP/1.1 200 OK\r\n".to_vec();
    let filler = format!("X-Filler: {}\r\n", "a".repeat(1000));
    while bytes.len() <= MAX_HEAD_BYTES {
        bytes.extend_from_slice(filler.as_bytes());
    }
    bytes.extend_from_slice(b"\r\n");
    let mut r = reader(&bytes);
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::MalformedResponse(_))));
}

fn response_with_headers(count: usize) -> Vec<u8> {
    let mut raw = b"HTTP/1.1 200 OK\r\n".to_vec();
    for i in 0..count - 1 {
        raw.extend_from_slice(format!("X-Extra-{i}: v\r\n").as_bytes());
    }
    raw.extend_from_slice(b"Content-Length: 2\r\n\r\nok");
    raw
}

#[test]
fn test_header_count_at_limit_is_accepted() {
    let mut r = reader(&response_with_headers(MAX_HEADERS));
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.headers.len(), MAX_HEADERS);
    assert_eq!(response.body, b"ok");
}

#[test]
fn test_too_many_headers_is_malformed() {
    let mut r = reader(&response_with_headers(MAX_HEADERS + 1));
    assert!(matches!(read_response(&mut r), Err(ReqBenchError::MalformedResponse(_))));
}

#[test]
fn test_switching_protocols_is_not_keep_alive() {
    let mut r = reader(b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n");
    let response = read_response(&mut r).unwrap();
    assert_eq!(response.status, 101);
    assert!(response.body.is_empty());
    assert!(!response.keep_alive());
}
