// Walks a fetched document and yields its text runs, one fragment at a time.
//
// Paragraphs are read directly; tables are descended into cell by cell.
// Empty and newline-only runs are dropped. The style of each run is kept on
// the fragment but `insert_request` does not turn it into a style request yet.

use std::vec::IntoIter;

use super::batch_builder;
use super::docs_models::{DocRequest, Document, ParagraphElement, StructuralElement, TextStyle};

/// A non-empty run of text together with the formatting it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledFragment {
    pub text: String,
    pub style: TextStyle,
    /// Named paragraph style of the enclosing paragraph (e.g. `HEADING_1`).
    pub paragraph_style: Option<String>,
}

impl StyledFragment {
    /// Request that appends this fragment's text to the end of another
    /// document's body. Styling is not carried over.
    pub fn insert_request(&self) -> DocRequest {
        batch_builder::insert_at_end_of_body(self.text.clone())
    }
}

/// Lazy, single-pass iterator over a document's text fragments.
pub struct ContentFragments {
    /// One iterator per nesting level: the body, then any table being read.
    levels: Vec<IntoIter<StructuralElement>>,
    runs: IntoIter<ParagraphElement>,
    paragraph_style: Option<String>,
}

impl ContentFragments {
    pub fn new(document: Document) -> Self {
        let content = document.body.map(|body| body.content).unwrap_or_default();

        Self {
            levels: vec![content.into_iter()],
            runs: Vec::new().into_iter(),
            paragraph_style: None,
        }
    }

    fn enter(&mut self, element: StructuralElement) {
        // Elements without both indices (the leading section break, the
        // end-of-segment marker) carry no text.
        if element.start_index.is_none() || element.end_index.is_none() {
            return;
        }

        if let Some(paragraph) = element.paragraph {
            self.paragraph_style = paragraph
                .paragraph_style
                .and_then(|style| style.named_style_type);
            self.runs = paragraph.elements.into_iter();
        } else if let Some(table) = element.table {
            let cells: Vec<StructuralElement> = table
                .table_rows
                .into_iter()
                .flat_map(|row| row.table_cells)
                .flat_map(|cell| cell.content)
                .collect();
            self.levels.push(cells.into_iter());
        }
    }
}

impl Iterator for ContentFragments {
    type Item = StyledFragment;

    fn next(&mut self) -> Option<StyledFragment> {
        loop {
            if let Some(element) = self.runs.next() {
                let Some(run) = element.text_run else {
                    continue;
                };
                let text = run.content.unwrap_or_default();
                if text.is_empty() || text == "\n" {
                    continue;
                }

                return Some(StyledFragment {
                    text,
                    style: run.text_style.unwrap_or_default(),
                    paragraph_style: self.paragraph_style.clone(),
                });
            }

            let level = self.levels.last_mut()?;
            match level.next() {
                Some(element) => self.enter(element),
                None => {
                    self.levels.pop();
                }
            }
        }
    }
}
