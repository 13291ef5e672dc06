// Batch composition.
//
// Everything in here is pure: it turns a high-level edit into the ordered
// list of low-level requests the remote service expects. The cursor is an
// explicit value threaded through each composition and handed back to the
// caller; nothing is read back from the service between items.
//
// Offsets assume every earlier request in the same batch has already been
// applied, so request order is significant.

use super::docs_models::{
    doc_len, BulletPreset, CreateParagraphBulletsRequest, Cursor, DocRequest, Document,
    EndOfSegmentLocation, HeadingLevel, InsertTableRequest, InsertTextRequest, ParagraphStyle,
    Range, TextStyle, UpdateParagraphStyleRequest, UpdateTextStyleRequest,
};
use super::docs_service::DocsError;

/// Insert `text` at `cursor`. The cursor is not advanced; chaining callers
/// must add `doc_len(text)` themselves.
pub fn insert_text(cursor: Cursor, text: impl Into<String>) -> DocRequest {
    DocRequest::InsertText(InsertTextRequest {
        location: Some(cursor.into()),
        end_of_segment_location: None,
        text: text.into(),
    })
}

/// Insert `text` at the end of the document body.
pub fn insert_at_end_of_body(text: impl Into<String>) -> DocRequest {
    DocRequest::InsertText(InsertTextRequest {
        location: None,
        end_of_segment_location: Some(EndOfSegmentLocation {
            segment_id: String::new(),
        }),
        text: text.into(),
    })
}

/// Style `[start, end)`. The field mask is derived from the same style value
/// that is sent, so it always names exactly the keys that are set.
pub fn style_range(start: Cursor, end: Cursor, style: &TextStyle) -> Result<DocRequest, DocsError> {
    if style.is_empty() {
        return Err(DocsError::EmptyStyle);
    }

    Ok(DocRequest::UpdateTextStyle(UpdateTextStyleRequest {
        range: Range::new(start, end),
        text_style: style.clone(),
        fields: style.field_mask(),
    }))
}

/// Insert `text` plus a newline at the start of the document and mark it as a
/// heading. The trailing newline is inserted but left out of the styled range.
pub fn heading(text: &str, level: HeadingLevel) -> Vec<DocRequest> {
    let start = Cursor::START;
    let end = start.advanced_by(doc_len(text));

    vec![
        insert_text(start, format!("{}\n", text)),
        DocRequest::UpdateParagraphStyle(UpdateParagraphStyleRequest {
            range: Range::new(start, end),
            paragraph_style: ParagraphStyle {
                named_style_type: Some(level.named_style()),
            },
            fields: "namedStyleType".to_string(),
        }),
    ]
}

/// One bulleted paragraph per item, starting at the beginning of the body.
///
/// Returns the requests (two per item: insert, then bullets) together with
/// the cursor positioned just after the last inserted newline.
pub fn bullet_list<S: AsRef<str>>(
    items: &[S],
    preset: BulletPreset,
) -> (Vec<DocRequest>, Cursor) {
    items.iter().fold(
        (Vec::with_capacity(items.len() * 2), Cursor::START),
        |(mut requests, cursor), item| {
            let item = item.as_ref();
            let len = doc_len(item);

            requests.push(insert_text(cursor, format!("{}\n", item)));
            requests.push(DocRequest::CreateParagraphBullets(
                CreateParagraphBulletsRequest {
                    range: Range::new(cursor, cursor.advanced_by(len)),
                    bullet_preset: preset,
                },
            ));

            (requests, cursor.advanced_by(len + 1))
        },
    )
}

pub fn table(rows: u32, columns: u32, position: Cursor) -> DocRequest {
    DocRequest::InsertTable(InsertTableRequest {
        location: position.into(),
        rows,
        columns,
    })
}

/// Where appended text should go: just before the body's final paragraph
/// mark. An empty body appends at the start.
pub fn append_position(document: &Document) -> Cursor {
    match document.end_index() {
        Some(end) if end > Cursor::START.index() => Cursor::at(end - 1),
        _ => Cursor::START,
    }
}
