//! HTTP/1.1 framing for a single GET exchange.
//!
//! Status line and headers are parsed by `httparse`; this module only decides
//! where the head and body end and whether the connection may be reused.

use reqbench_common::{ReqBenchError, Result};
use std::io::{self, BufRead, Read, Write};

/// Upper bound on the response head (status line plus headers).
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Upper bound on the number of response headers.
pub const MAX_HEADERS: usize = 64;

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Minor HTTP version: 1 for HTTP/1.1, 0 for HTTP/1.0.
    pub version: u8,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    keep_alive: bool,
}

impl Response {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the connection that carried this response may carry another request.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyLength {
    Empty,
    Fixed(u64),
    Chunked,
    UntilClose,
}

/// Serialize `GET <target> HTTP/1.1` with a single `Host` header and no body.
pub fn encode_request(host: &str, target: &str) -> Vec<u8> {
    format!("GET {target} HTTP/1.1\r\nHost: {host}\r\n\r\n").into_bytes()
}

/// Write one request and block until its full response has been read.
pub fn exchange<S: Read + Write>(
    stream: &mut io::BufReader<S>,
    host: &str,
    target: &str,
) -> Result<Response> {
    let request = encode_request(host, target);
    let writer = stream.get_mut();
    writer.write_all(&request).map_err(network_error)?;
    writer.flush().map_err(network_error)?;
    read_response(stream)
}

/// Read one final (non-1xx) response from `reader`.
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    loop {
        let head = read_head(reader)?;
        let (status, version, headers) = parse_head(&head)?;

        // Interim responses (100 Continue, 103 Early Hints) precede the real one.
        if (100..200).contains(&status) && status != 101 {
            continue;
        }

        let length = body_length(status, &headers)?;
        let body = match length {
            BodyLength::Empty => Vec::new(),
            BodyLength::Fixed(len) => read_fixed(reader, len)?,
            BodyLength::Chunked => read_chunked(reader)?,
            BodyLength::UntilClose => read_until_close(reader)?,
        };

        // After 101 the stream speaks another protocol.
        let keep_alive = status != 101
            && length != BodyLength::UntilClose
            && wants_keep_alive(version, &headers);
        return Ok(Response { status, version, headers, body, keep_alive });
    }
}

fn network_error(e: io::Error) -> ReqBenchError {
    ReqBenchError::NetworkError(e.to_string())
}

/// Read one line including its terminator. EOF before any byte is an error:
/// every caller is mid-response.
fn read_line<R: BufRead>(reader: &mut R, limit: usize) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(limit as u64)
        .read_until(b'\n', &mut line)
        .map_err(network_error)?;
    if n == 0 {
        return Err(ReqBenchError::NetworkError("connection closed mid-response".to_string()));
    }
    if line.last() != Some(&b'\n') {
        if n >= limit {
            return Err(ReqBenchError::MalformedResponse("line exceeds size limit".to_string()));
        }
        return Err(ReqBenchError::NetworkError("connection closed mid-line".to_string()));
    }
    Ok(line)
}

fn is_blank(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

fn read_head<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut head = Vec::new();
    loop {
        let remaining = MAX_HEAD_BYTES.saturating_sub(head.len());
        if remaining == 0 {
            return Err(ReqBenchError::MalformedResponse(format!(
                "response head exceeds {MAX_HEAD_BYTES} bytes"
            )));
        }
        let line = match read_line(reader, remaining) {
            Err(ReqBenchError::NetworkError(_)) if head.is_empty() => {
                return Err(ReqBenchError::NetworkError(
                    "connection closed before response".to_string(),
                ))
            }
            other => other?,
        };
        let done = is_blank(&line) && !head.is_empty();
        // Tolerate stray blank lines ahead of the status line.
        if !(is_blank(&line) && head.is_empty()) {
            head.extend_from_slice(&line);
        }
        if done {
            return Ok(head);
        }
    }
}

fn parse_head(head: &[u8]) -> Result<(u16, u8, Vec<(String, String)>)> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    match response.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(ReqBenchError::MalformedResponse("incomplete response head".to_string()))
        }
        Err(e) => return Err(ReqBenchError::MalformedResponse(e.to_string())),
    }

    let status = response
        .code
        .ok_or_else(|| ReqBenchError::MalformedResponse("missing status code".to_string()))?;
    let version = response.version.unwrap_or(1);
    let headers = response
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();
    Ok((status, version, headers))
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn has_token(value: Option<&str>, token: &str) -> bool {
    value
        .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
        .unwrap_or(false)
}

fn body_length(status: u16, headers: &[(String, String)]) -> Result<BodyLength> {
    if (100..200).contains(&status) || status == 204 || status == 304 {
        return Ok(BodyLength::Empty);
    }

    if let Some(encoding) = header(headers, "transfer-encoding") {
        let last = encoding.rsplit(',').next().map(str::trim).unwrap_or("");
        return Ok(if last.eq_ignore_ascii_case("chunked") {
            BodyLength::Chunked
        } else {
            BodyLength::UntilClose
        });
    }

    match header(headers, "content-length") {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(BodyLength::Fixed)
            .map_err(|_| ReqBenchError::MalformedResponse(format!("invalid Content-Length {value:?}"))),
        None => Ok(BodyLength::UntilClose),
    }
}

fn wants_keep_alive(version: u8, headers: &[(String, String)]) -> bool {
    let connection = header(headers, "connection");
    if version >= 1 {
        !has_token(connection, "close")
    } else {
        has_token(connection, "keep-alive")
    }
}

fn read_fixed<R: BufRead>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let read = reader.by_ref().take(len).read_to_end(&mut body).map_err(network_error)?;
    if read as u64 != len {
        return Err(ReqBenchError::NetworkError(format!(
            "truncated body: expected {len} bytes, got {read}"
        )));
    }
    Ok(body)
}

fn read_chunked<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let line = read_line(reader, MAX_HEAD_BYTES)?;
        let size = match httparse::parse_chunk_size(&line) {
            Ok(httparse::Status::Complete((_, size))) => size,
            _ => return Err(ReqBenchError::MalformedResponse("invalid chunk size".to_string())),
        };

        if size == 0 {
            // Trailer section, terminated by a blank line.
            loop {
                if is_blank(&read_line(reader, MAX_HEAD_BYTES)?) {
                    return Ok(body);
                }
            }
        }

        let read = reader.by_ref().take(size).read_to_end(&mut body).map_err(network_error)?;
        if read as u64 != size {
            return Err(ReqBenchError::NetworkError("truncated chunk".to_string()));
        }
        if !is_blank(&read_line(reader, 2)?) {
            return Err(ReqBenchError::MalformedResponse("chunk not terminated by CRLF".to_string()));
        }
    }
}

fn read_until_close<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.read_to_end(&mut body).map_err(network_error)?;
    Ok(body)
}
