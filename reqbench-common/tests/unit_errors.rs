use reqbench_common::ReqBenchError;

#[test]
fn test_error_display() {
    let err = ReqBenchError::InvalidUrl("\"not-a-url\" has no scheme separator".to_string());
    assert_eq!(err.to_string(), "Invalid URL: \"not-a-url\" has no scheme separator");
}

#[test]
fn test_error_equality() {
    let err1 = ReqBenchError::NetworkError("reset".to_string());
    let err2 = ReqBenchError::NetworkError("reset".to_string());
    let err3 = ReqBenchError::NetworkError("eof".to_string());

    assert_eq!(err1, err2);
    assert_ne!(err1, err3);
}

#[test]
fn test_connection_error() {
    let err = ReqBenchError::ConnectionError("connection refused".to_string());
    assert_eq!(err.to_string(), "Connection error: connection refused");
}

#[test]
fn test_malformed_response() {
    let err = ReqBenchError::MalformedResponse("invalid status line".to_string());
    assert_eq!(err.to_string(), "Malformed response: invalid status line");
}

#[test]
fn test_error_roundtrip_json() {
    let original = ReqBenchError::ConnectionError("timed out".to_string());
    let json = serde_json::to_string(&original).unwrap();
    let decoded: ReqBenchError = serde_json::from_str(&json).unwrap();
    assert_eq!(original, decoded);
}
