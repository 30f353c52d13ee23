use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use tracing::debug;

use crate::config::BlobConfig;
use crate::error::Error;
use crate::message::AttachmentRecord;
use crate::properties::ExternalFileRef;

/// Uploads attachment bytes to Azure Blob Storage over the REST API,
/// authenticated with the configured SAS token.
pub struct BlobStore {
    client: Client,
    config: BlobConfig,
}

impl BlobStore {
    pub fn new(client: Client, config: BlobConfig) -> Self {
        Self { client, config }
    }

    /// Decodes one base64 attachment and stores it under a date-tagged key,
    /// overwriting any blob already at that key. Returns the file reference
    /// with the blob's public URL.
    pub async fn upload(&self, attachment: &AttachmentRecord) -> Result<ExternalFileRef, Error> {
        let bytes = STANDARD.decode(&attachment.content_bytes)?;
        let key = blob_key(&attachment.name, Utc::now().date_naive());
        let url = blob_url(&self.config.endpoint(), &self.config.container, &key);

        debug!("Uploading {} ({} bytes) to {url}", attachment.name, bytes.len());

        let sas = self.config.sas_token.trim_start_matches('?');
        let response = self
            .client
            .put(format!("{url}?{sas}"))
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", &attachment.content_type)
            .header(
                "x-ms-blob-content-disposition",
                format!("inline; filename=\"{}\"", attachment.name),
            )
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        // Put Blob answers 201 Created on success, so this cannot be a
        // strict-200 check.
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        Ok(ExternalFileRef::new(attachment.name.clone(), url))
    }
}

/// `{YYYY_MM_DD}_{name}`. Same name on the same day maps to the same key,
/// so a repeat upload overwrites (last write wins) — kept from the original
/// adapter, collisions and all.
fn blob_key(name: &str, date: NaiveDate) -> String {
    format!("{}_{name}", date.format("%Y_%m_%d"))
}

fn blob_url(endpoint: &str, container: &str, key: &str) -> String {
    format!("{endpoint}/{container}/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 27).unwrap()
    }

    #[test]
    fn test_blob_key_is_date_tagged() {
        assert_eq!(blob_key("simple.txt", day()), "2024_02_27_simple.txt");
    }

    #[test]
    fn test_same_name_same_day_collides() {
        assert_eq!(blob_key("report.pdf", day()), blob_key("report.pdf", day()));
    }

    #[test]
    fn test_month_and_day_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(blob_key("a.txt", date), "2024_03_05_a.txt");
    }

    #[test]
    fn test_public_url_pattern() {
        let url = blob_url(
            "https://mailfiles.blob.core.windows.net",
            "attachments",
            &blob_key("simple.txt", day()),
        );
        assert_eq!(
            url,
            "https://mailfiles.blob.core.windows.net/attachments/2024_02_27_simple.txt"
        );
    }

    #[test]
    fn test_decode_rejects_malformed_base64() {
        assert!(STANDARD.decode("not base64!!").is_err());
        assert_eq!(STANDARD.decode("c2ltcGxl").unwrap(), b"simple");
    }
}
