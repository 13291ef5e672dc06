// Core docs module - batch composition and the editing service.
// Pure request building lives in `batch_builder`; everything that talks to
// the remote service goes through the `DocsApi` trait in `docs_service`.

pub mod batch_builder;
pub mod content_extractor;
pub mod docs_models;
pub mod docs_service;

pub use content_extractor::{ContentFragments, StyledFragment};
pub use docs_models::*;
pub use docs_service::{DocsApi, DocsError, DocsService};
