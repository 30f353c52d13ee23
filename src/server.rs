use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::message::InboundMessage;
use crate::notion::NotionClient;
use crate::properties;
use crate::storage::BlobStore;

/// Shared application state
pub struct AppState {
    notion: NotionClient,
    blobs: BlobStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::new();
        Self {
            notion: NotionClient::new(client.clone(), config.notion),
            blobs: BlobStore::new(client, config.blob),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<()> {
    let app = Router::new()
        .route("/NotionAI", post(receive_message))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    info!("Listening on {bind_addr}");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// The whole pipeline for one notification, strictly sequential: upload
/// attachments, create the page, append the body. Partial side effects
/// (attachments already stored before a later failure) are not rolled back.
async fn receive_message(
    State(state): State<Arc<AppState>>,
    Json(msg): Json<InboundMessage>,
) -> Result<Json<Value>, Error> {
    info!("Processing notification from {}: {}", msg.from, msg.subject);

    let files = match &msg.attachments {
        Some(attachments) => {
            let mut refs = Vec::with_capacity(attachments.len());
            for attachment in attachments {
                refs.push(state.blobs.upload(attachment).await?);
            }
            Some(refs)
        }
        None => None,
    };

    let page_properties = properties::to_page_properties(&msg, files);
    info!(
        "Mapped page properties: {}",
        serde_json::to_string(&page_properties).unwrap_or_default()
    );

    let created = state.notion.create_page(&page_properties).await?;
    let page_id = created
        .get("id")
        .and_then(Value::as_str)
        .ok_or(Error::MissingPageId)?
        .to_string();

    state.notion.append_body(&page_id, &msg.body).await?;

    // The caller gets the create-page response verbatim.
    Ok(Json(created))
}
