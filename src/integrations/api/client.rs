// src/integrations/api/client.rs
//
// Mirror PK REST API Client
//
// ARCHITECTURE:
// - POST {base}/scores   multipart: image, is_public
// - POST {base}/matches  JSON: { opponent_id, score_id }
// - Bearer token taken from the session store when present
// - Maps transport errors into the workflow error taxonomy
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Returns raw service responses; normalization happens in services
// - Never retries

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Body, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::services::match_orchestrator::{MatchRequest, MatchResponse, MatchService};
use crate::services::scoring_orchestrator::{
    ProgressReporter, ScoreResponse, ScoreUpload, ScoringService,
};
use crate::services::session::SessionStore;

/// HTTP client for the scoring and match endpoints
pub struct ApiClient {
    base_url: String,
    http_client: Client,
    session: Arc<dyn SessionStore>,
    chunk_bytes: usize,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionStore>) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http_client,
            session,
            chunk_bytes: config.upload_chunk_bytes.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    fn image_part(&self, upload: &ScoreUpload, progress: ProgressReporter) -> AppResult<Part> {
        let length = upload.bytes.len() as u64;
        let body = Body::wrap_stream(chunked_upload(
            Arc::clone(&upload.bytes),
            self.chunk_bytes,
            progress,
        ));

        Part::stream_with_length(body, length)
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime.as_str())
            .map_err(|e| AppError::Other(format!("Invalid upload MIME type: {}", e)))
    }
}

#[async_trait]
impl ScoringService for ApiClient {
    async fn submit_score(
        &self,
        upload: ScoreUpload,
        progress: ProgressReporter,
    ) -> AppResult<ScoreResponse> {
        let form = Form::new()
            .part("image", self.image_part(&upload, progress)?)
            .text("is_public", upload.is_public.to_string());

        let response = self
            .authorize(self.http_client.post(self.endpoint("scores")))
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ScoringUnavailable(describe_transport_error(&e)))?;

        if !response.status().is_success() {
            return Err(AppError::ScoringUnavailable(error_message(response).await));
        }

        response
            .json::<ScoreResponse>()
            .await
            .map_err(|e| AppError::IncompleteScoreResponse(format!("Unreadable response: {}", e)))
    }
}

#[async_trait]
impl MatchService for ApiClient {
    async fn create_match(&self, request: MatchRequest) -> AppResult<MatchResponse> {
        let response = self
            .authorize(self.http_client.post(self.endpoint("matches")))
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::MatchCreationFailed(describe_transport_error(&e)))?;

        if !response.status().is_success() {
            return Err(AppError::MatchCreationFailed(error_message(response).await));
        }

        response
            .json::<MatchResponse>()
            .await
            .map_err(|e| AppError::MatchCreationFailed(format!("Unreadable response: {}", e)))
    }
}

// ============================================================================
// INTERNAL: Upload progress and error mapping
// ============================================================================

/// Split `bytes` into chunks, reporting the share handed to the transport
/// as each chunk is pulled.
fn chunked_upload(
    bytes: Arc<[u8]>,
    chunk_bytes: usize,
    progress: ProgressReporter,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
    let total = bytes.len();
    let chunk_bytes = chunk_bytes.max(1);

    stream::iter((0..total).step_by(chunk_bytes).map(move |start| {
        let end = (start + chunk_bytes).min(total);
        let percent = (end as u64 * 100 / total as u64) as u8;
        progress.report(percent);
        Ok(bytes[start..end].to_vec())
    }))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_connect() {
        format!("Cannot reach server: {}", error)
    } else {
        format!("Request failed: {}", error)
    }
}

/// Best message for a non-2xx response.
///
/// 401 means the session token is missing or expired. Otherwise the
/// service's `error` or `detail` field is used when present.
async fn error_message(response: Response) -> String {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return "Authentication required".to_string();
    }

    let body = response.text().await.unwrap_or_default();
    message_from_body(status, &body)
}

fn message_from_body(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .or_else(|| json.get("detail"))
                .map(detail_text)
        })
        .filter(|message| !message.trim().is_empty());

    match detail {
        Some(message) => message,
        None => format!("Server returned {}", status),
    }
}

fn detail_text(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        // Validation errors arrive as a list of { msg, ... }
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| item.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageMime, OpponentId, ScoreId};
    use crate::error::ErrorKind;
    use crate::services::session::{Identity, InMemorySession};
    use futures_util::StreamExt;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        (base, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = text[..split].to_ascii_lowercase();
                let body_len = raw.len() - (split + 4);
                let complete = match head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                {
                    Some(len) => body_len >= len.trim().parse::<usize>().unwrap(),
                    None if head.contains("transfer-encoding: chunked") => {
                        text.ends_with("0\r\n\r\n")
                    }
                    None => true,
                };
                if complete {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    fn client(base: String, token: Option<&str>) -> ApiClient {
        let session = InMemorySession::signed_in(
            Identity {
                user_id: 1,
                display_name: "me".into(),
            },
            token.map(str::to_string),
        );
        let config = ClientConfig {
            api_base_url: base,
            ..ClientConfig::default()
        };
        ApiClient::new(&config, Arc::new(session)).unwrap()
    }

    fn upload(len: usize) -> ScoreUpload {
        ScoreUpload {
            file_name: "me.jpg".into(),
            mime: ImageMime::Jpeg,
            bytes: Arc::from(vec![7u8; len]),
            is_public: false,
        }
    }

    #[tokio::test]
    async fn test_chunked_upload_reports_progress() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = ProgressReporter::new(move |p| sink.lock().unwrap().push(p));

        let chunks: Vec<_> = chunked_upload(Arc::from(vec![1u8; 10]), 4, progress)
            .collect()
            .await;

        let sizes: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(*seen.lock().unwrap(), vec![40, 80, 100]);
    }

    #[test]
    fn test_error_message_prefers_service_detail() {
        assert_eq!(
            message_from_body(StatusCode::BAD_REQUEST, r#"{"detail":"No face detected"}"#),
            "No face detected"
        );
        assert_eq!(
            message_from_body(StatusCode::BAD_REQUEST, r#"{"error":"Image too large"}"#),
            "Image too large"
        );
        assert_eq!(
            message_from_body(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"msg":"field required"},{"msg":"value is not a valid integer"}]}"#
            ),
            "field required; value is not a valid integer"
        );
        assert_eq!(
            message_from_body(StatusCode::BAD_GATEWAY, "<html>"),
            "Server returned 502 Bad Gateway"
        );
    }

    #[tokio::test]
    async fn test_submit_score_sends_multipart_with_token() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"success":true,"score_id":42,"face_score":91.5,"image_url":"/uploads/me.jpg"}"#,
        )
        .await;

        let response = client(base, Some("secret"))
            .submit_score(upload(1024), ProgressReporter::silent())
            .await
            .unwrap();

        assert_eq!(response.score_id, Some(42));
        assert_eq!(response.face_score, Some(91.5));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/scores "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains("name=\"image\"; filename=\"me.jpg\""));
        assert!(request.contains("name=\"is_public\""));
    }

    #[tokio::test]
    async fn test_create_match_posts_json() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"match_id":3,"result":"Win","points_change":15,"new_rating":1200,"success":true}"#,
        )
        .await;

        let response = client(base, None)
            .create_match(MatchRequest {
                opponent_id: OpponentId(7),
                score_id: ScoreId(42),
            })
            .await
            .unwrap();

        assert_eq!(response.result.as_deref(), Some("Win"));
        assert_eq!(response.new_rating, Some(1200));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v1/matches "));
        assert!(request.contains(r#""opponent_id":7"#));
        assert!(request.contains(r#""score_id":42"#));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_http_errors_map_to_taxonomy() {
        let (base, _server) = serve_once("401 Unauthorized", r#"{"detail":"Not authenticated"}"#).await;
        let err = client(base, None)
            .submit_score(upload(16), ProgressReporter::silent())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ScoringUnavailable));
        assert!(err.to_string().contains("Authentication required"));

        let (base, _server) = serve_once("404 Not Found", r#"{"detail":"Opponent not found"}"#).await;
        let err = client(base, None)
            .create_match(MatchRequest {
                opponent_id: OpponentId(9),
                score_id: ScoreId(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MatchCreationFailed(ref m) if m == "Opponent not found"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_scoring_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api/v1", listener.local_addr().unwrap());
        drop(listener);

        let err = client(base, None)
            .submit_score(upload(16), ProgressReporter::silent())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::ScoringUnavailable));
    }
}
