// =============================================================================
// GOOGLE DOCS MODULE
// =============================================================================
//
// Everything that talks to Google lives here; the core layer only sees the
// `DocsApi`, `CredentialCache`, `AuthorizationFlow` and `AccessTokenProvider`
// traits.
//
// **Authentication Options:**
// 1. **OAuth 2.0 installed app** (default): interactive consent once, then the
//    refresh token in `token.json` keeps the session alive
// 2. **Service Account**: headless; the document must be shared with the
//    service account email
//
// **Usage:**
// ```ignore
// let session = Session::new(
//     JsonCredentialCache::new("token.json"),
//     InstalledAppFlow::from_file("credentials.json").await?,
//     DOCUMENTS_SCOPE,
// );
// let docs = DocsService::new(GoogleDocsClient::new(Box::new(session)));
// let doc = docs.create_document("Notes").await?;
// ```

pub mod google_docs_client;
pub mod installed_app_flow;
pub mod service_account;
pub mod token_cache;

pub use google_docs_client::GoogleDocsClient;
pub use installed_app_flow::InstalledAppFlow;
pub use service_account::ServiceAccountAuth;
pub use token_cache::JsonCredentialCache;
