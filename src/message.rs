use serde::Deserialize;

/// Inbound email-notification payload, as posted by the relay.
///
/// Field names are PascalCase on the wire (Outlook notification schema).
/// The five non-attachment fields are required; a payload missing any of
/// them is rejected at deserialization, before any external call.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "DateTimeReceived")]
    pub date_time_received: String,
    #[serde(rename = "BodyPreview")]
    pub body_preview: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "Attachments")]
    pub attachments: Option<Vec<AttachmentRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ContentType")]
    pub content_type: String,
    /// Base64-encoded file content.
    #[serde(rename = "ContentBytes")]
    pub content_bytes: String,
    // Carried by the relay but not used here.
    #[serde(rename = "Size", default)]
    pub size: Option<u64>,
    #[serde(rename = "IsInline", default)]
    pub is_inline: Option<bool>,
    #[serde(rename = "ContentId", default)]
    pub content_id: Option<String>,
}
