//! Request shaping shared by the async and blocking transports.
//!
//! NPA endpoints live at `{base}/{name}.json`. The access token travels as
//! the `key` query parameter on reads and as the `key` body field on writes.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::ClientError;
use crate::models::{ErrorCode, ErrorData, ErrorResponse};

/// Root of the NPA v1 endpoints.
pub const DEFAULT_BASE_URL: &str = "https://api.netrohome.com/npa/v1/";

const KEY_PARAM: &str = "key";

pub(crate) fn validate_access_token(token: &str) -> Result<(), ClientError> {
    if token.trim().is_empty() {
        return Err(ClientError::EmptyAccessToken);
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ClientError::InvalidAccessToken);
    }
    Ok(())
}

/// Parses an absolute base URL and normalizes it to end with a slash, so
/// endpoint names join below it instead of replacing its last segment.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(raw).map_err(|_| ClientError::InvalidBaseUrl(raw.to_owned()))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl(raw.to_owned()));
    }
    if !url.path().ends_with('/') {
        let mut path = url.path().to_owned();
        path.push('/');
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolves an endpoint name such as `info` (or `info.json`) against the base URL.
pub(crate) fn endpoint_url(base_url: &Url, endpoint: &str) -> Result<Url, ClientError> {
    let name = endpoint.trim_matches('/');
    let name = name.strip_suffix(".json").unwrap_or(name);
    if name.is_empty() || name.contains(['?', '#']) {
        return Err(ClientError::InvalidPath(endpoint.to_owned()));
    }
    base_url
        .join(&format!("{name}.json"))
        .map_err(|_| ClientError::InvalidPath(endpoint.to_owned()))
}

/// Whether the token and params go into a JSON body rather than the query string.
pub(crate) fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

/// Renders params as query pairs, with the access token first.
///
/// Strings are sent verbatim, everything else as compact JSON (so zone lists
/// become `[1,2]`). Null values are dropped and a caller-supplied `key` never
/// replaces the stored token.
pub(crate) fn query_pairs(
    access_token: &str,
    params: &Value,
) -> Result<Vec<(String, String)>, ClientError> {
    let mut pairs = vec![(KEY_PARAM.to_owned(), access_token.to_owned())];
    for (name, value) in param_entries(params)? {
        let rendered = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        pairs.push((name.clone(), rendered));
    }
    Ok(pairs)
}

/// Builds the JSON body for write endpoints: params plus the access token.
pub(crate) fn json_body(access_token: &str, params: &Value) -> Result<Value, ClientError> {
    let mut body = Map::new();
    for (name, value) in param_entries(params)? {
        body.insert(name.clone(), value.clone());
    }
    body.insert(KEY_PARAM.to_owned(), Value::String(access_token.to_owned()));
    Ok(Value::Object(body))
}

fn param_entries(params: &Value) -> Result<Vec<(&String, &Value)>, ClientError> {
    match params {
        Value::Null => Ok(Vec::new()),
        Value::Object(object) => Ok(object
            .iter()
            .filter(|(name, value)| name.as_str() != KEY_PARAM && !value.is_null())
            .collect()),
        _ => Err(ClientError::invalid_parameter(
            "params",
            "expected a JSON object",
        )),
    }
}

/// Turns a status and body into a JSON document or an error.
///
/// NPA error envelopes win over the bare HTTP status, and are reported even
/// when they arrive with `200 OK`. A successful status must carry an
/// envelope with `"status": "OK"`; anything else, including an empty body,
/// is [`ClientError::MalformedResponse`].
pub(crate) fn decode_response(status: StatusCode, payload: &str) -> Result<Value, ClientError> {
    if payload.trim().is_empty() {
        if status.is_success() {
            return Err(ClientError::MalformedResponse("empty body".to_owned()));
        }
        return Err(ClientError::HttpStatus {
            status,
            body: String::new(),
        });
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(document) => {
            if let Some(error) = npa_error(status, &document) {
                return Err(error);
            }
            if !status.is_success() {
                return Err(ClientError::HttpStatus {
                    status,
                    body: payload.to_owned(),
                });
            }
            if document.get("status").and_then(Value::as_str) != Some("OK") {
                return Err(ClientError::MalformedResponse(format!(
                    "expected an OK envelope, got {payload}"
                )));
            }
            Ok(document)
        }
        Err(_) if !status.is_success() => Err(ClientError::HttpStatus {
            status,
            body: payload.to_owned(),
        }),
        Err(error) => Err(error.into()),
    }
}

fn npa_error(status: StatusCode, document: &Value) -> Option<ClientError> {
    let flagged = document.get("status").and_then(Value::as_str) == Some("ERROR");
    if document.get("errors").is_none() && !flagged {
        return None;
    }

    let status = (!status.is_success()).then_some(status);
    let first = ErrorResponse::deserialize(document)
        .ok()
        .and_then(|response| response.errors.into_iter().next());
    Some(match first {
        Some(ErrorData { code, message }) => ClientError::Api {
            status,
            code,
            message,
        },
        None => ClientError::Api {
            status,
            code: ErrorCode::Unknown,
            message: document.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::{Value, json};

    use super::{
        carries_body, decode_response, endpoint_url, json_body, parse_base_url, query_pairs,
        validate_access_token,
    };
    use crate::ClientError;
    use crate::models::ErrorCode;

    #[test]
    fn endpoint_names_resolve_below_nested_base() {
        let base = parse_base_url("https://example.com/npa/v1").expect("valid url");
        let url = endpoint_url(&base, "/schedules").expect("valid endpoint");
        assert_eq!(url.as_str(), "https://example.com/npa/v1/schedules.json");

        let url = endpoint_url(&base, "info.json").expect("valid endpoint");
        assert_eq!(url.as_str(), "https://example.com/npa/v1/info.json");

        assert!(matches!(
            endpoint_url(&base, "/"),
            Err(ClientError::InvalidPath(_))
        ));
    }

    #[test]
    fn relative_base_url_is_rejected() {
        assert!(matches!(
            parse_base_url("api.netrohome.com/npa/v1"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn tokens_must_be_non_empty_and_unbroken() {
        assert!(validate_access_token("abcdef012345").is_ok());
        assert!(matches!(
            validate_access_token("   "),
            Err(ClientError::EmptyAccessToken)
        ));
        assert!(matches!(
            validate_access_token("abc def"),
            Err(ClientError::InvalidAccessToken)
        ));
    }

    #[test]
    fn query_pairs_keep_stored_key_and_drop_nulls() {
        let params = json!({
            "key": "someone-else",
            "zones": [1, 2],
            "start_date": "2023-05-01",
            "event": 3,
            "end_date": null
        });
        let pairs = query_pairs("abcdef", &params).expect("object params");

        assert_eq!(pairs[0], ("key".to_owned(), "abcdef".to_owned()));
        assert_eq!(pairs.iter().filter(|(name, _)| name == "key").count(), 1);
        assert!(pairs.contains(&("zones".to_owned(), "[1,2]".to_owned())));
        assert!(pairs.contains(&("start_date".to_owned(), "2023-05-01".to_owned())));
        assert!(pairs.contains(&("event".to_owned(), "3".to_owned())));
        assert!(!pairs.iter().any(|(name, _)| name == "end_date"));
    }

    #[test]
    fn json_body_carries_key_and_rejects_non_objects() {
        let body = json_body("abcdef", &json!({"duration": 5, "key": "x"})).expect("object");
        assert_eq!(body, json!({"duration": 5, "key": "abcdef"}));

        let body = json_body("abcdef", &Value::Null).expect("null params");
        assert_eq!(body, json!({"key": "abcdef"}));

        assert!(matches!(
            json_body("abcdef", &json!([1, 2])),
            Err(ClientError::InvalidParameter { name: "params", .. })
        ));
    }

    #[test]
    fn reads_use_query_and_writes_use_body() {
        assert!(!carries_body(&Method::GET));
        assert!(carries_body(&Method::POST));
    }

    #[test]
    fn error_envelope_on_ok_status_is_an_error() {
        let payload = r#"{"status":"ERROR","errors":[{"code":1,"message":"Invalid key"}]}"#;
        match decode_response(StatusCode::OK, payload) {
            Err(ClientError::Api {
                status,
                code,
                message,
            }) => {
                assert_eq!(status, None);
                assert_eq!(code, ErrorCode::InvalidKey);
                assert_eq!(message, "Invalid key");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_success_status_without_envelope_keeps_body() {
        match decode_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") {
            Err(ClientError::HttpStatus { status, body }) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert!(body.contains("bad gateway"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_success_body_is_a_json_error() {
        assert!(matches!(
            decode_response(StatusCode::OK, "{not json"),
            Err(ClientError::Json(_))
        ));
    }

    #[test]
    fn success_without_ok_envelope_is_malformed() {
        for payload in ["", "  ", "[]", "null", r#"{"data":{}}"#, r#"{"status":"PENDING"}"#] {
            assert!(
                matches!(
                    decode_response(StatusCode::OK, payload),
                    Err(ClientError::MalformedResponse(_))
                ),
                "accepted {payload:?}"
            );
        }

        let payload = r#"{"status":"OK","meta":{"tid":"t"}}"#;
        let document = decode_response(StatusCode::OK, payload).expect("ok envelope");
        assert_eq!(document["status"], "OK");
    }
}
