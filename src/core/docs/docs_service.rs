// Document editing service.
//
// Translates high-level edits into one batch each and submits it through the
// `DocsApi` seam. No retries and no rollback: a rejected batch is returned to
// the caller as an error and the next operation is the caller's decision.

use async_trait::async_trait;
use thiserror::Error;

use super::batch_builder;
use super::content_extractor::ContentFragments;
use super::docs_models::{
    BatchUpdateResponse, BulletPreset, Cursor, DocRequest, Document, DocumentHandle, HeadingLevel,
    TextStyle,
};
use crate::core::auth::AuthenticationError;

/// Errors that can be raised while talking to the documents API.
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),
    #[error("Request rejected ({status}): {message}")]
    RequestRejected { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Could not decode response: {0}")]
    Decode(String),
    #[error("Style has no attributes set")]
    EmptyStyle,
    #[error("Nothing to submit")]
    EmptyBatch,
    #[error("Heading level {0} is outside 1..=6")]
    InvalidHeadingLevel(u8),
}

/// The three remote endpoints the service needs.
#[async_trait]
pub trait DocsApi: Send + Sync {
    async fn create_document(&self, title: &str) -> Result<Document, DocsError>;
    async fn get_document(&self, document_id: &DocumentHandle) -> Result<Document, DocsError>;
    async fn batch_update(
        &self,
        document_id: &DocumentHandle,
        requests: Vec<DocRequest>,
    ) -> Result<BatchUpdateResponse, DocsError>;
}

pub struct DocsService<A: DocsApi> {
    api: A,
}

impl<A: DocsApi> DocsService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn create_document(&self, title: &str) -> Result<Document, DocsError> {
        let document = self.api.create_document(title).await?;
        tracing::info!(
            "Created document '{}' with ID {}",
            document.title,
            document.document_id
        );
        Ok(document)
    }

    /// Insert `text` at `cursor` in a batch of its own.
    pub async fn insert_text(
        &self,
        document_id: &DocumentHandle,
        cursor: Cursor,
        text: &str,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let response = self
            .submit(document_id, vec![batch_builder::insert_text(cursor, text)])
            .await?;
        tracing::info!("Inserted text at {} in {}", cursor.index(), document_id);
        Ok(response)
    }

    pub async fn style_range(
        &self,
        document_id: &DocumentHandle,
        start: Cursor,
        end: Cursor,
        style: &TextStyle,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let request = batch_builder::style_range(start, end, style)?;
        let response = self.submit(document_id, vec![request]).await?;
        tracing::info!(
            "Applied {} to [{}, {}) in {}",
            style.field_mask(),
            start.index(),
            end.index(),
            document_id
        );
        Ok(response)
    }

    pub async fn add_heading(
        &self,
        document_id: &DocumentHandle,
        text: &str,
        level: u8,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let level = HeadingLevel::new(level).ok_or(DocsError::InvalidHeadingLevel(level))?;
        let response = self
            .submit(document_id, batch_builder::heading(text, level))
            .await?;
        tracing::info!("Heading added to {}", document_id);
        Ok(response)
    }

    /// Insert a bulleted list at the start of the document, all items in one
    /// batch, using `preset` glyphs.
    pub async fn insert_bullet_list<S: AsRef<str> + Sync>(
        &self,
        document_id: &DocumentHandle,
        items: &[S],
        preset: BulletPreset,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let (requests, cursor) = batch_builder::bullet_list(items, preset);
        let response = self.submit(document_id, requests).await?;
        tracing::info!(
            "Bullet list of {} item(s) created in {} (cursor now {})",
            items.len(),
            document_id,
            cursor.index()
        );
        Ok(response)
    }

    pub async fn create_table(
        &self,
        document_id: &DocumentHandle,
        rows: u32,
        columns: u32,
        position: Cursor,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let response = self
            .submit(
                document_id,
                vec![batch_builder::table(rows, columns, position)],
            )
            .await?;
        tracing::info!("{}x{} table created in {}", rows, columns, document_id);
        Ok(response)
    }

    /// Append `text` just before the document's final paragraph mark.
    ///
    /// Reads the document first, then writes in a separate call. An edit that
    /// lands in between can make the computed offset stale; that is not
    /// detected.
    pub async fn append_at_end(
        &self,
        document_id: &DocumentHandle,
        text: &str,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let document = self.api.get_document(document_id).await?;
        let cursor = batch_builder::append_position(&document);
        tracing::debug!("Appending at {} in {}", cursor.index(), document_id);

        self.submit(document_id, vec![batch_builder::insert_text(cursor, text)])
            .await
    }

    /// Fetch the document and return a lazy walk over its text fragments.
    pub async fn extract_content(
        &self,
        document_id: &DocumentHandle,
    ) -> Result<ContentFragments, DocsError> {
        let document = self.api.get_document(document_id).await?;
        Ok(ContentFragments::new(document))
    }

    async fn submit(
        &self,
        document_id: &DocumentHandle,
        requests: Vec<DocRequest>,
    ) -> Result<BatchUpdateResponse, DocsError> {
        if requests.is_empty() {
            return Err(DocsError::EmptyBatch);
        }

        tracing::debug!("Submitting {} request(s) to {}", requests.len(), document_id);
        self.api.batch_update(document_id, requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::docs::docs_models::{
        Body, Paragraph, ParagraphElement, RgbColor, StructuralElement, TextRun,
    };
    use std::sync::Mutex;

    /// In-memory stand-in for the remote service. Applies located inserts to a
    /// plain text buffer (ASCII only) and records every batch.
    struct FakeDocsApi {
        text: Mutex<String>,
        batches: Mutex<Vec<Vec<DocRequest>>>,
        reject: Option<(u16, String)>,
    }

    impl FakeDocsApi {
        fn new() -> Self {
            Self {
                // A new document holds a single empty paragraph.
                text: Mutex::new("\n".to_string()),
                batches: Mutex::new(Vec::new()),
                reject: None,
            }
        }

        fn rejecting(status: u16, message: &str) -> Self {
            Self {
                reject: Some((status, message.to_string())),
                ..Self::new()
            }
        }

        fn check(&self) -> Result<(), DocsError> {
            match &self.reject {
                Some((status, message)) => Err(DocsError::RequestRejected {
                    status: *status,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl DocsApi for FakeDocsApi {
        async fn create_document(&self, title: &str) -> Result<Document, DocsError> {
            self.check()?;
            Ok(Document {
                document_id: DocumentHandle::new("fake-doc"),
                title: title.to_string(),
                body: None,
            })
        }

        async fn get_document(&self, document_id: &DocumentHandle) -> Result<Document, DocsError> {
            self.check()?;
            let text = self.text.lock().unwrap().clone();

            // Leading section break, then one paragraph per line.
            let mut content = vec![StructuralElement {
                end_index: Some(1),
                ..Default::default()
            }];
            let mut start = 1;
            for line in text.split_inclusive('\n') {
                let end = start + line.len() as u32;
                content.push(StructuralElement {
                    start_index: Some(start),
                    end_index: Some(end),
                    paragraph: Some(Paragraph {
                        elements: vec![ParagraphElement {
                            text_run: Some(TextRun {
                                content: Some(line.to_string()),
                                text_style: None,
                            }),
                        }],
                        paragraph_style: None,
                    }),
                    table: None,
                });
                start = end;
            }

            Ok(Document {
                document_id: document_id.clone(),
                title: "Fake".to_string(),
                body: Some(Body { content }),
            })
        }

        async fn batch_update(
            &self,
            document_id: &DocumentHandle,
            requests: Vec<DocRequest>,
        ) -> Result<BatchUpdateResponse, DocsError> {
            self.check()?;
            {
                let mut text = self.text.lock().unwrap();
                for request in &requests {
                    if let DocRequest::InsertText(insert) = request {
                        if let Some(location) = insert.location {
                            text.insert_str(location.index as usize - 1, &insert.text);
                        }
                    }
                }
            }
            let replies = vec![serde_json::Value::Null; requests.len()];
            self.batches.lock().unwrap().push(requests);

            Ok(BatchUpdateResponse {
                document_id: document_id.to_string(),
                replies,
            })
        }
    }

    fn doc() -> DocumentHandle {
        DocumentHandle::new("fake-doc")
    }

    #[tokio::test]
    async fn test_same_offset_inserts_stack_in_reverse() {
        let service = DocsService::new(FakeDocsApi::new());

        service.insert_text(&doc(), Cursor::START, "A\n").await.unwrap();
        service.insert_text(&doc(), Cursor::START, "B\n").await.unwrap();

        assert!(service.api.text.lock().unwrap().starts_with("B\nA\n"));
    }

    #[tokio::test]
    async fn test_bullet_list_is_one_batch_and_lands_in_order() {
        let service = DocsService::new(FakeDocsApi::new());
        let items = vec!["first".to_string(), "second".to_string(), "third".to_string()];

        let response = service
            .insert_bullet_list(&doc(), &items, BulletPreset::default())
            .await
            .unwrap();

        assert_eq!(response.replies.len(), 6);
        assert_eq!(service.api.batches.lock().unwrap().len(), 1);
        assert_eq!(*service.api.text.lock().unwrap(), "first\nsecond\nthird\n\n");
    }

    #[tokio::test]
    async fn test_empty_bullet_list_is_not_submitted() {
        let service = DocsService::new(FakeDocsApi::new());
        let items: Vec<&str> = Vec::new();

        let result = service
            .insert_bullet_list(&doc(), &items, BulletPreset::default())
            .await;

        assert!(matches!(result, Err(DocsError::EmptyBatch)));
        assert!(service.api.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_heading_is_one_batch() {
        let service = DocsService::new(FakeDocsApi::new());

        service.add_heading(&doc(), "Title", 1).await.unwrap();

        let batches = service.api.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(*service.api.text.lock().unwrap(), "Title\n\n");
    }

    #[tokio::test]
    async fn test_invalid_heading_level_is_rejected_locally() {
        let service = DocsService::new(FakeDocsApi::new());

        let result = service.add_heading(&doc(), "Title", 9).await;

        assert!(matches!(result, Err(DocsError::InvalidHeadingLevel(9))));
        assert!(service.api.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_style_is_not_submitted() {
        let service = DocsService::new(FakeDocsApi::new());

        let result = service
            .style_range(&doc(), Cursor::at(1), Cursor::at(5), &TextStyle::new())
            .await;

        assert!(matches!(result, Err(DocsError::EmptyStyle)));
        assert!(service.api.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_style_range_submits_one_request() {
        let service = DocsService::new(FakeDocsApi::new());
        let style = TextStyle::new().bold(true).foreground(RgbColor::new(0.2, 0.4, 0.8));

        service
            .style_range(&doc(), Cursor::at(1), Cursor::at(25), &style)
            .await
            .unwrap();

        let batches = service.api.batches.lock().unwrap();
        match &batches[0][..] {
            [DocRequest::UpdateTextStyle(update)] => {
                assert_eq!(update.fields, "bold,foregroundColor")
            }
            other => panic!("unexpected batch {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_append_goes_before_final_newline() {
        let service = DocsService::new(FakeDocsApi::new());
        service.insert_text(&doc(), Cursor::START, "Hello").await.unwrap();

        service.append_at_end(&doc(), " world").await.unwrap();

        assert_eq!(*service.api.text.lock().unwrap(), "Hello world\n");
    }

    #[tokio::test]
    async fn test_create_table_location() {
        let service = DocsService::new(FakeDocsApi::new());

        service.create_table(&doc(), 3, 3, Cursor::START).await.unwrap();

        let batches = service.api.batches.lock().unwrap();
        let value = serde_json::to_value(&batches[0][0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"insertTable": {"location": {"index": 1}, "rows": 3, "columns": 3}})
        );
    }

    #[tokio::test]
    async fn test_rejected_create_is_reported_as_error() {
        let api = FakeDocsApi::rejecting(403, "The caller does not have permission");
        let service = DocsService::new(api);

        let result = service.create_document("Nope").await;

        match result {
            Err(DocsError::RequestRejected { status, message }) => {
                assert_eq!(status, 403);
                assert!(message.contains("permission"));
            }
            other => panic!("expected RequestRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_batch_surfaces_status() {
        let service = DocsService::new(FakeDocsApi::rejecting(400, "Invalid range"));

        let result = service.insert_text(&doc(), Cursor::at(999), "x").await;

        assert!(matches!(result, Err(DocsError::RequestRejected { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_extract_content_reads_document() {
        let service = DocsService::new(FakeDocsApi::new());
        service
            .insert_text(&doc(), Cursor::START, "Line one\n\nLine two\n")
            .await
            .unwrap();

        let texts: Vec<String> = service
            .extract_content(&doc())
            .await
            .unwrap()
            .map(|fragment| fragment.text)
            .collect();

        // The blank paragraph and the final empty paragraph are skipped.
        assert_eq!(texts, vec!["Line one\n", "Line two\n"]);
    }

    #[tokio::test]
    async fn test_extract_content_surfaces_rejection() {
        let api = FakeDocsApi::rejecting(404, "Requested entity was not found.");
        let service = DocsService::new(api);

        let result = service.extract_content(&doc()).await;

        assert!(matches!(result, Err(DocsError::RequestRejected { status: 404, .. })));
    }
}
