// Demonstration sequences run by the binary.
//
// Every step reports its own failure and the sequence moves on; only steps
// that need a document handle are skipped when there is none.

use crate::core::docs::{
    BulletPreset, Cursor, DocsApi, DocsError, DocsService, DocumentHandle, RgbColor, TextStyle,
};

const HEADING: &str = "Welcome to My Document";
const INTRO: &str = "\nThis document was created using the Google Docs API and Rust. \
    Here's an example of what you can do with programmatic document creation!\n\n";
const BULLETS: [&str; 3] = [
    "This is the first bullet point",
    "This is the second bullet point with some details",
    "This is the third bullet point showing the power of the API",
];

/// What happened during a showcase run.
#[derive(Debug, Default)]
pub struct ShowcaseReport {
    pub document: Option<DocumentHandle>,
    pub failed_steps: Vec<&'static str>,
}

impl ShowcaseReport {
    fn record<T>(&mut self, step: &'static str, result: Result<T, DocsError>) {
        if let Err(e) = result {
            tracing::error!("{} failed: {}", step, e);
            self.failed_steps.push(step);
        }
    }
}

/// Create a document and fill it with a heading, styled intro, bullet list
/// and table.
pub async fn run_showcase<A: DocsApi>(
    docs: &DocsService<A>,
    title: &str,
    bullets: BulletPreset,
) -> ShowcaseReport {
    let mut report = ShowcaseReport::default();

    let document = match docs.create_document(title).await {
        Ok(document) => document.document_id,
        Err(e) => {
            tracing::error!("Could not create document: {}", e);
            report.failed_steps.push("create document");
            return report;
        }
    };

    report.record(
        "add heading",
        docs.add_heading(&document, HEADING, 1).await,
    );
    report.record(
        "insert text",
        docs.insert_text(&document, Cursor::START, INTRO).await,
    );

    let style = TextStyle::new()
        .bold(true)
        .foreground(RgbColor::new(0.2, 0.4, 0.8));
    report.record(
        "format text",
        docs.style_range(&document, Cursor::at(1), Cursor::at(25), &style)
            .await,
    );

    report.record(
        "insert bullet list",
        docs.insert_bullet_list(&document, &BULLETS, bullets).await,
    );
    report.record(
        "create table",
        docs.create_table(&document, 3, 3, Cursor::START).await,
    );

    println!("Document ID: {}", document);
    println!("Direct link: {}", document.edit_url());

    report.document = Some(document);
    report
}

pub async fn run_append<A: DocsApi>(
    docs: &DocsService<A>,
    document: &DocumentHandle,
    text: &str,
) -> Result<(), DocsError> {
    docs.append_at_end(document, text).await?;
    tracing::info!("Appended {} character(s) to {}", text.chars().count(), document);
    println!("Direct link: {}", document.edit_url());
    Ok(())
}

/// Print each fragment of the document on its own line. Returns how many
/// fragments were found.
pub async fn run_extract<A: DocsApi>(
    docs: &DocsService<A>,
    document: &DocumentHandle,
) -> Result<usize, DocsError> {
    let mut count = 0;
    for fragment in docs.extract_content(document).await? {
        let marker = fragment.paragraph_style.as_deref().unwrap_or("NORMAL_TEXT");
        println!("[{}] {:?}", marker, fragment.text);
        tracing::debug!("Copy request: {:?}", fragment.insert_request());
        count += 1;
    }
    Ok(count)
}
