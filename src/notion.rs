use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::blocks::{self, Block};
use crate::config::NotionConfig;
use crate::error::Error;
use crate::properties::PageProperties;

/// Maximum children the Notion API accepts in one append call.
const MAX_CHILDREN_PER_CALL: usize = 100;

#[derive(Serialize)]
struct CreatePageRequest<'a> {
    parent: Parent<'a>,
    properties: &'a PageProperties,
}

#[derive(Serialize)]
struct Parent<'a> {
    database_id: &'a str,
}

#[derive(Serialize)]
struct AppendChildrenRequest<'a> {
    children: &'a [Block],
}

/// Client for the Notion pages/blocks API. One long-lived instance per
/// process, sharing the process-wide `reqwest::Client`.
pub struct NotionClient {
    client: Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(client: Client, config: NotionConfig) -> Self {
        Self { client, config }
    }

    /// Creates a page under the configured database and returns the API
    /// response verbatim.
    pub async fn create_page(&self, properties: &PageProperties) -> Result<Value, Error> {
        let url = format!("{}/v1/pages", self.config.base_url);
        debug!("Creating Notion page: {url}");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.integration_token),
            )
            .header("Notion-Version", &self.config.api_version)
            .json(&CreatePageRequest {
                parent: Parent {
                    database_id: &self.config.database_id,
                },
                properties,
            })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    /// Converts the HTML body to paragraph blocks and appends them to the
    /// page. A body rendering to zero blocks appends nothing.
    pub async fn append_body(&self, page_id: &str, html: &str) -> Result<(), Error> {
        self.append_blocks(page_id, &blocks::to_blocks(html)).await
    }

    /// Appends blocks to the page's children, at most
    /// [`MAX_CHILDREN_PER_CALL`] per request, in order. The first failing
    /// chunk aborts the rest.
    async fn append_blocks(&self, page_id: &str, all_blocks: &[Block]) -> Result<(), Error> {
        if all_blocks.is_empty() {
            return Ok(());
        }

        let url = format!("{}/v1/blocks/{}/children", self.config.base_url, page_id);
        for chunk in all_blocks.chunks(MAX_CHILDREN_PER_CALL) {
            debug!("Appending {} block(s) to {url}", chunk.len());

            let response = self
                .client
                .patch(&url)
                .header(
                    "Authorization",
                    format!("Bearer {}", self.config.integration_token),
                )
                .header("Notion-Version", &self.config.api_version)
                .json(&AppendChildrenRequest { children: chunk })
                .send()
                .await?;

            check(response).await?;
        }
        Ok(())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    // The pages/blocks API signals success strictly with 200.
    if status == StatusCode::OK {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(Error::Api { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::{patch, post};
    use axum::Router;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    async fn spawn_server(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    fn client_for(addr: SocketAddr) -> NotionClient {
        NotionClient::new(
            reqwest::Client::new(),
            NotionConfig {
                database_id: "db-123".to_string(),
                integration_token: "secret".to_string(),
                base_url: format!("http://{addr}"),
                api_version: "2021-05-13".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_append_aborts_after_failed_chunk() {
        // Records the children count of each call; answers 200 for the
        // first and 500 for everything after it.
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/v1/blocks/{id}/children",
                patch(
                    |State(seen): State<Arc<Mutex<Vec<usize>>>>,
                     axum::Json(body): axum::Json<Value>| async move {
                        let children = body["children"].as_array().map(|c| c.len()).unwrap_or(0);
                        let mut seen = seen.lock().unwrap();
                        seen.push(children);
                        if seen.len() == 1 {
                            (StatusCode::OK, "{}")
                        } else {
                            (StatusCode::INTERNAL_SERVER_ERROR, "rate limited")
                        }
                    },
                ),
            )
            .with_state(seen.clone());
        let client = client_for(spawn_server(app).await);

        let all_blocks: Vec<Block> = (0..250)
            .map(|i| Block::paragraph(&format!("line {i}")))
            .collect();
        let err = client
            .append_blocks("page-1", &all_blocks)
            .await
            .unwrap_err();

        match err {
            Error::Api { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Two calls of 100 reached the API; the third chunk of 50 was
        // never sent.
        assert_eq!(*seen.lock().unwrap(), vec![100, 100]);
    }

    #[tokio::test]
    async fn test_create_page_rejects_non_200_success() {
        let app = Router::new().route(
            "/v1/pages",
            post(|| async { (StatusCode::ACCEPTED, "queued") }),
        );
        let client = client_for(spawn_server(app).await);

        let msg = serde_json::from_value(serde_json::json!({
            "DateTimeReceived": "2024-02-27T23:34:17+00:00",
            "BodyPreview": "hi",
            "From": "alice@example.com",
            "Subject": "hello",
            "Body": "<p>hi</p>"
        }))
        .unwrap();
        let properties = crate::properties::to_page_properties(&msg, None);

        let err = client.create_page(&properties).await.unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, StatusCode::ACCEPTED);
                assert_eq!(body, "queued");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_chunks_preserve_order_and_sizes() {
        let all_blocks: Vec<Block> = (0..250)
            .map(|i| Block::paragraph(&format!("line {i}")))
            .collect();

        let sizes: Vec<usize> = all_blocks
            .chunks(MAX_CHILDREN_PER_CALL)
            .map(|chunk| chunk.len())
            .collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        // Chunk boundaries are purely positional.
        let second = all_blocks.chunks(MAX_CHILDREN_PER_CALL).nth(1).unwrap();
        let value = serde_json::to_value(&second[0]).unwrap();
        assert_eq!(value["paragraph"]["text"][0]["text"]["content"], "line 100");
    }

    #[test]
    fn test_exact_multiple_has_no_empty_trailing_chunk() {
        let all_blocks: Vec<Block> = (0..200).map(|i| Block::paragraph(&i.to_string())).collect();
        assert_eq!(all_blocks.chunks(MAX_CHILDREN_PER_CALL).count(), 2);
    }

    #[test]
    fn test_create_page_request_shape() {
        let msg = serde_json::from_value(serde_json::json!({
            "DateTimeReceived": "2024-02-27T23:34:17+00:00",
            "BodyPreview": "hi",
            "From": "alice@example.com",
            "Subject": "hello",
            "Body": "<p>hi</p>"
        }))
        .unwrap();
        let properties = crate::properties::to_page_properties(&msg, None);

        let request = CreatePageRequest {
            parent: Parent {
                database_id: "db-123",
            },
            properties: &properties,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["parent"]["database_id"], "db-123");
        assert_eq!(
            value["properties"]["Subject"]["title"][0]["text"]["content"],
            "hello"
        );
    }

    #[test]
    fn test_append_request_shape() {
        let chunk = vec![Block::paragraph("hi")];
        let value = serde_json::to_value(AppendChildrenRequest { children: &chunk }).unwrap();
        assert_eq!(value["children"].as_array().unwrap().len(), 1);
        assert_eq!(value["children"][0]["type"], "paragraph");
    }
}
