//! Blocking HTTP client for the execution backend.
//!
//! One attempt per call; the configured timeout bounds it. The backend
//! answers `{message?, response?, error?}` and reports failures as an `error`
//! string, often with status 200.

use crate::dispatch::{DispatchRequest, RequestBody};
use crate::error::DispatchError;
use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_MESSAGE: &str = "Workflow executed successfully";

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub pattern_id: String,
    pub message: String,
    pub response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BackendReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "result")]
    response: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Runs one execution call. Implemented by [`ExecutionClient`]; the
/// controller only sees this trait.
pub trait Execute: Send + Sync + 'static {
    fn execute(&self, request: &DispatchRequest) -> Result<ExecutionResult, DispatchError>;
}

pub struct ExecutionClient {
    http: Client,
    base_url: String,
}

impl ExecutionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DispatchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(http, base_url))
    }

    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn multipart_form(
        fields: &[(String, String)],
        file: Option<&crate::dispatch::request::FilePart>,
    ) -> Result<multipart::Form, DispatchError> {
        let mut form = fields
            .iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });
        if let Some(part) = file {
            form = form
                .file(part.field.clone(), &part.path)
                .map_err(|source| DispatchError::File {
                    path: part.path.clone(),
                    source,
                })?;
        }
        Ok(form)
    }
}

impl Execute for ExecutionClient {
    fn execute(&self, request: &DispatchRequest) -> Result<ExecutionResult, DispatchError> {
        let url = self.url(&request.endpoint);
        let builder = self.http.post(&url);
        let builder = match &request.body {
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart { fields, file } => {
                builder.multipart(Self::multipart_form(fields, file.as_ref())?)
            }
            RequestBody::Empty => builder,
        };

        log::debug!("POST {}", url);
        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_reply(&request.pattern_id, &body)
    }
}

/// Interprets a successful HTTP reply body.
pub fn parse_reply(pattern_id: &str, body: &str) -> Result<ExecutionResult, DispatchError> {
    let reply: BackendReply = if body.trim().is_empty() {
        BackendReply {
            message: None,
            response: None,
            error: None,
        }
    } else {
        serde_json::from_str(body)
            .map_err(|e| DispatchError::Backend(format!("Malformed backend reply: {e}")))?
    };
    if let Some(error) = reply.error {
        return Err(DispatchError::Backend(error));
    }
    Ok(ExecutionResult {
        pattern_id: pattern_id.to_string(),
        message: reply.message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        response: reply.response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::request::FilePart;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Answers exactly one request and hands back what it received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
            request
        });
        (format!("http://{addr}/"), handle)
    }

    fn local_client(url: &str) -> ExecutionClient {
        let http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        ExecutionClient::with_http(http, url)
    }

    fn text_request() -> DispatchRequest {
        DispatchRequest {
            pattern_id: "text-agent".into(),
            endpoint: "/text_agent".into(),
            body: RequestBody::Json(json!({ "model": "gemini", "query": "hi", "instructions": "" })),
        }
    }

    #[test]
    fn posts_json_and_reads_response() {
        let (url, server) = serve_once("200 OK", r#"{"response": "hello back"}"#);
        let client = local_client(&url);
        let result = client.execute(&text_request()).unwrap();
        assert_eq!(result.message, DEFAULT_MESSAGE);
        assert_eq!(result.response, Some(json!("hello back")));

        let seen = server.join().unwrap();
        assert!(seen.starts_with("POST /text_agent HTTP/1.1"));
        assert!(seen.contains(r#""query":"hi""#));
    }

    #[test]
    fn error_field_is_a_failure() {
        let (url, server) = serve_once("200 OK", r#"{"error": "model unavailable"}"#);
        let client = local_client(&url);
        match client.execute(&text_request()) {
            Err(DispatchError::Backend(msg)) => assert_eq!(msg, "model unavailable"),
            other => panic!("unexpected: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn non_success_status_is_reported() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"detail": "boom"}"#);
        let client = local_client(&url);
        match client.execute(&text_request()) {
            Err(DispatchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn missing_upload_fails_before_sending() {
        let client = ExecutionClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let request = DispatchRequest {
            pattern_id: "csv-agent".into(),
            endpoint: "/csv_agent".into(),
            body: RequestBody::Multipart {
                fields: vec![("model".into(), "gemini".into())],
                file: Some(FilePart {
                    field: "file".into(),
                    path: "/definitely/not/here.csv".into(),
                }),
            },
        };
        assert!(matches!(
            client.execute(&request),
            Err(DispatchError::File { .. })
        ));
    }

    #[test]
    fn reply_parsing() {
        let ok = parse_reply("generic", r#"{"message": "done", "result": {"n": 1}}"#).unwrap();
        assert_eq!(ok.message, "done");
        assert_eq!(ok.response, Some(json!({"n": 1})));
        assert_eq!(parse_reply("voice-agent", "").unwrap().message, DEFAULT_MESSAGE);
        assert!(matches!(
            parse_reply("generic", "<html>"),
            Err(DispatchError::Backend(_))
        ));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = ExecutionClient::new("http://host:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/csv_agent"), "http://host:8000/csv_agent");
    }
}
