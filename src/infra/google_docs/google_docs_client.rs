// =============================================================================
// GOOGLE DOCS REST CLIENT
// =============================================================================
//
// Implements the core `DocsApi` trait against docs.googleapis.com/v1.
//
// Every call fetches a bearer token from the configured
// `AccessTokenProvider` (an OAuth session or a service account) and maps
// non-2xx responses onto `DocsError::RequestRejected`, using the structured
// error body when Google sends one.
//
// **Endpoints used:**
// - `POST /v1/documents`                         create
// - `GET  /v1/documents/{id}`                    get
// - `POST /v1/documents/{id}:batchUpdate`        batch update

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::auth::AccessTokenProvider;
use crate::core::docs::{
    BatchUpdateResponse, DocRequest, DocsApi, DocsError, Document, DocumentHandle,
};

const DEFAULT_BASE_URL: &str = "https://docs.googleapis.com/v1";

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateDocumentBody<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchUpdateBody {
    requests: Vec<DocRequest>,
}

/// Google's standard error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Authenticated client for the Google Docs API.
pub struct GoogleDocsClient {
    client: Client,
    base_url: String,
    auth: Box<dyn AccessTokenProvider>,
}

impl GoogleDocsClient {
    pub fn new(auth: Box<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(auth, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API root.
    pub fn with_base_url(auth: Box<dyn AccessTokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Document ID from either a bare ID or a docs.google.com link
    /// (`/document/d/{id}/...`, with any query or fragment ignored).
    pub fn extract_doc_id(url_or_id: &str) -> Option<String> {
        let input = url_or_id.trim();

        let id = match Url::parse(input) {
            Ok(url) => {
                if url.host_str() != Some("docs.google.com") {
                    return None;
                }
                let mut segments = url.path_segments()?;
                segments.find(|segment| *segment == "d")?;
                segments.next()?.to_string()
            }
            Err(_) => input.to_string(),
        };

        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then_some(id)
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, DocsError> {
        let token = self.auth.access_token().await?;
        Ok(builder.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, DocsError> {
        let response = self
            .authorized(builder)
            .await?
            .send()
            .await
            .map_err(|e| DocsError::Transport(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| DocsError::Decode(e.to_string()))
    }

    async fn check_status(response: Response) -> Result<Response, DocsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .map_err(|e| DocsError::Transport(e.to_string()))?;

        Err(DocsError::RequestRejected {
            status: status.as_u16(),
            message: Self::error_message(&text),
        })
    }

    /// Pull the human-readable message out of an error body, falling back to
    /// the raw text.
    fn error_message(body: &str) -> String {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => match parsed.error.status {
                Some(status) => format!("{} ({})", parsed.error.message, status),
                None => parsed.error.message,
            },
            Err(_) => body.trim().to_string(),
        }
    }
}

#[async_trait]
impl DocsApi for GoogleDocsClient {
    async fn create_document(&self, title: &str) -> Result<Document, DocsError> {
        let url = format!("{}/documents", self.base_url);
        tracing::debug!("Creating Google Doc '{}'", title);

        self.send(self.client.post(&url).json(&CreateDocumentBody { title }))
            .await
    }

    async fn get_document(&self, document_id: &DocumentHandle) -> Result<Document, DocsError> {
        let url = format!("{}/documents/{}", self.base_url, document_id);
        tracing::debug!("Fetching Google Doc via API: {}", document_id);

        self.send(self.client.get(&url)).await
    }

    async fn batch_update(
        &self,
        document_id: &DocumentHandle,
        requests: Vec<DocRequest>,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let url = format!("{}/documents/{}:batchUpdate", self.base_url, document_id);

        self.send(self.client.post(&url).json(&BatchUpdateBody { requests }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AuthenticationError;
    use crate::core::docs::{batch_builder, Cursor};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    struct StaticToken;

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn access_token(&self) -> Result<String, AuthenticationError> {
            Ok("test-token".to_string())
        }
    }

    /// Answer one HTTP request with `status` and `body`. The handle yields the
    /// request as received (head and body).
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(&mut stream);

            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                if line.trim_end().is_empty() {
                    break;
                }
                request.push_str(&line);
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).await.unwrap();
            request.push_str(&String::from_utf8(payload).unwrap());

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            request
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn test_create_document_against_local_server() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"documentId": "new-doc", "title": "Report"}"#).await;
        let client = GoogleDocsClient::with_base_url(Box::new(StaticToken), base_url);

        let document = client.create_document("Report").await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(document.document_id, DocumentHandle::new("new-doc"));
        assert!(request.starts_with("POST /v1/documents HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer test-token"));
        assert!(request.ends_with(r#"{"title":"Report"}"#));
    }

    #[tokio::test]
    async fn test_rejected_batch_update_against_local_server() {
        let (base_url, server) = serve_once(
            "400 Bad Request",
            r#"{"error": {"code": 400, "message": "Invalid requests[0].insertText: Index 99 must be less than the end index of the referenced segment, 12.", "status": "INVALID_ARGUMENT"}}"#,
        )
        .await;
        let client = GoogleDocsClient::with_base_url(Box::new(StaticToken), base_url);

        let result = client
            .batch_update(
                &DocumentHandle::new("doc-1"),
                vec![batch_builder::insert_text(Cursor::at(99), "x")],
            )
            .await;
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /v1/documents/doc-1:batchUpdate HTTP/1.1"));
        match result {
            Err(DocsError::RequestRejected { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.ends_with("(INVALID_ARGUMENT)"));
            }
            other => panic!("expected RequestRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_doc_id_from_url() {
        let url = "https://docs.google.com/document/d/1abc123xyz/edit";
        assert_eq!(
            GoogleDocsClient::extract_doc_id(url),
            Some("1abc123xyz".to_string())
        );
    }

    #[test]
    fn test_extract_doc_id_from_id() {
        let id = "1abc123xyz";
        assert_eq!(
            GoogleDocsClient::extract_doc_id(id),
            Some("1abc123xyz".to_string())
        );
    }

    #[test]
    fn test_extract_doc_id_stops_at_query_and_fragment() {
        for url in [
            "https://docs.google.com/document/d/1abc-123_xyz?usp=sharing",
            "https://docs.google.com/document/d/1abc-123_xyz#heading=h.1",
            "https://docs.google.com/document/u/0/d/1abc-123_xyz/edit?tab=t.0",
        ] {
            assert_eq!(
                GoogleDocsClient::extract_doc_id(url),
                Some("1abc-123_xyz".to_string()),
                "{}",
                url
            );
        }
    }

    #[test]
    fn test_extract_doc_id_rejects_other_urls() {
        assert_eq!(GoogleDocsClient::extract_doc_id("https://example.com/x"), None);
        assert_eq!(GoogleDocsClient::extract_doc_id("https://docs.google.com/document/"), None);
        assert_eq!(GoogleDocsClient::extract_doc_id("not an id"), None);
        assert_eq!(GoogleDocsClient::extract_doc_id(""), None);
    }

    #[test]
    fn test_error_message_from_google_envelope() {
        let body = r#"{"error": {"code": 400, "message": "Invalid requests[0].insertText: Index 99 must be less than the end index of the referenced segment, 12.", "status": "INVALID_ARGUMENT"}}"#;

        let message = GoogleDocsClient::error_message(body);

        assert!(message.starts_with("Invalid requests[0].insertText"));
        assert!(message.ends_with("(INVALID_ARGUMENT)"));
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(
            GoogleDocsClient::error_message("  upstream timeout \n"),
            "upstream timeout"
        );
    }

    #[test]
    fn test_batch_body_wire_shape() {
        let body = BatchUpdateBody {
            requests: vec![
                batch_builder::insert_text(Cursor::START, "Hi\n"),
                batch_builder::table(2, 3, Cursor::at(4)),
            ],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"requests": [
                {"insertText": {"location": {"index": 1}, "text": "Hi\n"}},
                {"insertTable": {"location": {"index": 4}, "rows": 2, "columns": 3}}
            ]})
        );
    }
}
