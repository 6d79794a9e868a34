use warden::http::response::{Response, ResponseBuilder, StatusCode};
use warden::http::writer::{ResponseWriter, parse_response, serialize_response};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Unauthorized.as_u16(), 401);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_status_code_from_u16() {
    assert_eq!(StatusCode::from_u16(403), Some(StatusCode::Forbidden));
    assert_eq!(StatusCode::from_u16(418), None);
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    assert_eq!(response.header("Content-Length"), Some("16"));
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("Content-Length"), Some("999"));
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::NotFound).build();

    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_error_helpers_are_html() {
    let cases = [
        (Response::bad_request(), StatusCode::BadRequest),
        (Response::forbidden(), StatusCode::Forbidden),
        (Response::not_found(), StatusCode::NotFound),
        (Response::method_not_allowed(), StatusCode::MethodNotAllowed),
        (Response::internal_error(), StatusCode::InternalServerError),
    ];

    for (response, status) in cases {
        assert_eq!(response.status, status);
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        let body = String::from_utf8(response.body.clone()).unwrap();
        assert!(body.contains(&status.as_u16().to_string()));
        assert_eq!(
            response.header("Content-Length"),
            Some(response.body.len().to_string().as_str())
        );
    }
}

#[test]
fn test_standard_headers() {
    let response = Response::ok("text/plain", b"x".to_vec()).with_standard_headers("warden-test");

    assert_eq!(response.header("Server"), Some("warden-test"));
    assert_eq!(response.header("Connection"), Some("close"));
    let date = response.header("Date").unwrap();
    assert!(date.ends_with(" GMT"));
    assert_eq!(date.len(), "Thu, 05 Mar 2025 15:04:05 GMT".len());
}

#[test]
fn test_serialized_status_line_and_separator() {
    let response = Response::not_found();
    let raw = serialize_response(&response);
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(text.contains("\r\n\r\n<html>"));
}

#[test]
fn test_serialize_then_parse_yields_same_response() {
    let responses = vec![
        Response::ok("application/octet-stream", vec![0u8, 1, 2, 255, b'\r', b'\n']),
        Response::forbidden().with_standard_headers("warden"),
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/html")
            .header("X-Extra", "a: b")
            .body(b"<p>hi</p>".to_vec())
            .build(),
    ];

    for response in responses {
        let parsed = parse_response(&serialize_response(&response)).unwrap();
        assert_eq!(parsed, response);
    }
}

#[test]
fn test_head_response_keeps_headers() {
    let full = Response::ok("text/plain", b"hello world".to_vec());
    let head = full.clone().strip_body();

    assert_eq!(head.headers, full.headers);
    assert!(head.body.is_empty());

    let raw = serialize_response(&head);
    assert!(raw.ends_with(b"\r\n\r\n"));
}

#[tokio::test]
async fn test_writer_writes_whole_response() {
    let response = Response::ok("text/plain", vec![b'z'; 100_000]);
    let (mut client, mut server) = tokio::io::duplex(1024);

    let write = tokio::spawn(async move {
        let mut writer = ResponseWriter::new(&response);
        writer.write_to_stream(&mut server).await.unwrap();
        response
    });

    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut client, &mut received)
        .await
        .unwrap();
    let response = write.await.unwrap();

    assert_eq!(received, serialize_response(&response));
}

#[tokio::test]
async fn test_writer_fails_when_peer_gone() {
    let (client, mut server) = tokio::io::duplex(16);
    drop(client);

    let mut writer = ResponseWriter::new(&Response::ok("text/plain", vec![b'z'; 1024]));

    assert!(writer.write_to_stream(&mut server).await.is_err());
    assert!(writer.write_to_stream(&mut server).await.is_err());
}
