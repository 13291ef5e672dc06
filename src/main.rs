// This is the entry point of the docs writer.
//
// **Architecture Overview:**
// - `core/` = Business logic (batch composition, session rules)
// - `infra/` = Implementations of core traits (Google HTTP API, token file, OAuth)
// - `demo/` = The sequences the binary can run
//
// This file's job is to:
// 1. Load configuration and check the requested mode
// 2. Build the authenticated session (dependency injection)
// 3. Run the selected sequence

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "demo/demo_layer.rs"]
mod demo;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::{bail, Context};

use crate::core::auth::{AccessTokenProvider, Session, DOCUMENTS_SCOPE};
use crate::core::docs::{BulletPreset, DocsService, DocumentHandle};
use crate::demo::sequences;
use crate::infra::google_docs::{
    GoogleDocsClient, InstalledAppFlow, JsonCredentialCache, ServiceAccountAuth,
};

const DEFAULT_TITLE: &str = "My Rust Generated Document";

/// Settings read from the environment (and `.env`).
struct AppConfig {
    client_secrets: String,
    token_cache: String,
    document_id: Option<String>,
    title: String,
    bullet_preset: BulletPreset,
}

impl AppConfig {
    fn from_env() -> anyhow::Result<Self> {
        let bullet_preset = match std::env::var("DOCS_DEMO_BULLET_PRESET") {
            Ok(name) => name.parse().map_err(anyhow::Error::msg)?,
            Err(_) => BulletPreset::default(),
        };

        Ok(Self {
            client_secrets: std::env::var("GOOGLE_CLIENT_SECRETS")
                .unwrap_or_else(|_| "credentials.json".to_string()),
            token_cache: std::env::var("GOOGLE_TOKEN_CACHE")
                .unwrap_or_else(|_| "token.json".to_string()),
            document_id: std::env::var("GOOGLE_DOC_ID").ok(),
            title: std::env::var("DOCS_DEMO_TITLE").unwrap_or_else(|_| DEFAULT_TITLE.to_string()),
            bullet_preset,
        })
    }

    fn document(&self) -> anyhow::Result<DocumentHandle> {
        let raw = self
            .document_id
            .as_deref()
            .context("GOOGLE_DOC_ID must be set for this mode")?;
        let id = GoogleDocsClient::extract_doc_id(raw)
            .with_context(|| format!("Could not extract document ID from: {}", raw))?;
        Ok(DocumentHandle::new(id))
    }
}

/// What the binary was asked to do, checked before any authorization.
enum Mode {
    Showcase,
    Append { document: DocumentHandle, text: String },
    Extract { document: DocumentHandle },
}

impl Mode {
    fn from_args(
        mut args: impl Iterator<Item = String>,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        let mode = args.next().unwrap_or_else(|| "showcase".to_string());
        match mode.as_str() {
            "showcase" => Ok(Mode::Showcase),
            "append" => {
                let text: Vec<String> = args.collect();
                if text.is_empty() {
                    bail!("Usage: append <text>");
                }
                Ok(Mode::Append {
                    document: config.document()?,
                    text: text.join(" "),
                })
            }
            "extract" => Ok(Mode::Extract {
                document: config.document()?,
            }),
            other => bail!(
                "Unknown mode '{}'. Expected one of: showcase, append, extract",
                other
            ),
        }
    }
}

/// Prefer a service account when one is configured; otherwise use the cached
/// user credential, refreshing or re-authorizing as needed.
async fn build_auth(config: &AppConfig) -> anyhow::Result<Box<dyn AccessTokenProvider>> {
    if let Some(service_account) = ServiceAccountAuth::from_env().await {
        let auth = service_account?;
        tracing::info!("Using service account {}", auth.client_email());
        return Ok(Box::new(auth));
    }

    let flow = InstalledAppFlow::from_file(&config.client_secrets).await?;
    let session = Session::new(
        JsonCredentialCache::new(&config.token_cache),
        flow,
        DOCUMENTS_SCOPE,
    );

    // Acquire up front so an authentication failure stops the run here.
    session.access_token().await?;
    Ok(Box::new(session))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    let mode = Mode::from_args(std::env::args().skip(1), &config)?;

    let auth = build_auth(&config).await?;
    let docs = DocsService::new(GoogleDocsClient::new(auth));

    match mode {
        Mode::Showcase => {
            let report =
                sequences::run_showcase(&docs, &config.title, config.bullet_preset).await;
            if report.failed_steps.is_empty() {
                println!("\nDocument created successfully!");
            } else {
                println!("\nFinished with failed steps: {}", report.failed_steps.join(", "));
            }
        }
        Mode::Append { document, text } => {
            if let Err(e) = sequences::run_append(&docs, &document, &text).await {
                tracing::error!("Append failed: {}", e);
            }
        }
        Mode::Extract { document } => match sequences::run_extract(&docs, &document).await {
            Ok(count) => println!("\n{} fragment(s) read", count),
            Err(e) => tracing::error!("Extract failed: {}", e),
        },
    }

    println!("\nProgram Complete!");
    Ok(())
}
