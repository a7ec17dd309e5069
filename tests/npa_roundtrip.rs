use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use netro_client::models::{ErrorCode, ResponseStatus};
use netro_client::{BlockingNetroClient, ClientError, NetroClient, WaterRequest};
use serde_json::Value;

const KEY: &str = "abcdef012345";

const META: &str = r#"{"tid":"1684742830_KpQDt","time":"2023-05-22T08:07:10","token_limit":2000,"token_remaining":1999,"token_reset":"2023-05-23T00:00:00","version":"1.0"}"#;

struct Recorded {
    request_line: String,
    body: String,
}

/// Accepts one connection, records the request and answers with `status` and `body`.
fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let base_url = format!(
        "http://{}/npa/v1",
        listener.local_addr().expect("local addr")
    );

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).expect("header line");
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().expect("numeric length");
                }
            }
        }

        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).expect("request body");

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush response");

        Recorded {
            request_line: request_line.trim_end().to_owned(),
            body: String::from_utf8(request_body).expect("utf-8 body"),
        }
    });

    (base_url, handle)
}

fn blocking_client(base_url: &str) -> BlockingNetroClient {
    let http = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    BlockingNetroClient::new(KEY)
        .and_then(|client| client.with_base_url(base_url))
        .expect("valid client")
        .with_http_client(http)
}

fn async_client(base_url: &str) -> NetroClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    NetroClient::new(KEY)
        .and_then(|client| client.with_base_url(base_url))
        .expect("valid client")
        .with_http_client(http)
}

#[test]
fn info_sends_key_in_query_and_decodes_device() {
    let body = format!(
        r#"{{"status":"OK","meta":{META},"data":{{"device":{{"name":"Backyard","serial":"{KEY}","status":"WATERING","version":"1.2","sw_version":"1.1.1","last_active":"2023-05-22T08:06:55","zone_num":2,"zones":[{{"ith":1,"name":"Lawn","enabled":true,"smart":"SMART"}},{{"ith":2,"name":"Beds","enabled":false,"smart":"TIMER"}}]}}}}}}"#
    );
    let (base_url, server) = serve_once("200 OK", body);

    let response = blocking_client(&base_url).info().expect("info succeeds");
    let recorded = server.join().expect("server thread");

    assert_eq!(
        recorded.request_line,
        format!("GET /npa/v1/info.json?key={KEY} HTTP/1.1")
    );
    assert_eq!(response.status, ResponseStatus::Ok);
    let device = response.data.device.expect("controller info");
    assert_eq!(device.serial, KEY);
    assert_eq!(device.zones(true).len(), 1);
}

#[tokio::test]
async fn water_posts_key_and_params_in_body() {
    let body = format!(
        r#"{{"status":"OK","meta":{META},"data":{{"schedules":[{{"id":77,"zone":2,"source":"MANUAL","status":"VALID","start_time":"2023-05-22T08:10:00","end_time":"2023-05-22T08:15:00","local_date":"2023-05-22","local_start_time":"10:10:00","local_end_time":"10:15:00"}}]}}}}"#
    );
    let (base_url, server) = serve_once("200 OK", body);

    let response = async_client(&base_url)
        .water(&WaterRequest::new(5).zones(vec![2]))
        .await
        .expect("water succeeds");
    let recorded = server.join().expect("server thread");

    assert_eq!(recorded.request_line, "POST /npa/v1/water.json HTTP/1.1");
    let sent: Value = serde_json::from_str(&recorded.body).expect("json body");
    assert_eq!(sent["key"], KEY);
    assert_eq!(sent["duration"], 5);
    assert_eq!(sent["zones"], serde_json::json!([2]));
    assert_eq!(response.data.for_zone(2)[0].duration().num_minutes(), 5);
}

#[test]
fn error_envelope_with_ok_status_is_reported() {
    let body = format!(
        r#"{{"status":"ERROR","meta":{META},"errors":[{{"code":1,"message":"Invalid key : {KEY}"}}]}}"#
    );
    let (base_url, server) = serve_once("200 OK", body);

    let error = blocking_client(&base_url)
        .stop_water()
        .expect_err("error envelope");
    server.join().expect("server thread");

    match &error {
        ClientError::Api { status, code, .. } => {
            assert!(status.is_none());
            assert_eq!(*code, ErrorCode::InvalidKey);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.is_authentication());
}

#[tokio::test]
async fn server_failure_surfaces_as_http_status() {
    let (base_url, server) = serve_once("503 Service Unavailable", "maintenance".to_owned());

    let error = async_client(&base_url)
        .info_raw()
        .await
        .expect_err("non-success status");
    server.join().expect("server thread");

    match error {
        ClientError::HttpStatus { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_ok_response_is_malformed() {
    let (base_url, server) = serve_once("200 OK", String::new());

    let error = blocking_client(&base_url)
        .stop_water_raw()
        .expect_err("empty body");
    server.join().expect("server thread");

    assert!(
        matches!(error, ClientError::MalformedResponse(_)),
        "unexpected error: {error}"
    );
}

#[test]
fn unreachable_host_is_a_network_error_without_key() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let base_url = format!("http://{}/npa/v1", listener.local_addr().expect("addr"));
    drop(listener);

    let error = blocking_client(&base_url)
        .info_raw()
        .expect_err("connection refused");

    assert!(error.is_network(), "unexpected error: {error}");
    assert!(!error.to_string().contains(KEY));
}
