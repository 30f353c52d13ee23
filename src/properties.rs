use serde::Serialize;

use crate::message::InboundMessage;

/// Fixed recipient stamped into every page (the mailbox this relay serves).
pub const RECIPIENT: &str = "eugene.r.w.12@gmail.com";

/// Notion property set for one created page. Built once per request by
/// [`to_page_properties`]; immutable afterwards.
#[derive(Debug, Serialize)]
pub struct PageProperties {
    #[serde(rename = "DateTimeReceived")]
    date_time_received: DateProperty,
    #[serde(rename = "BodyPreview")]
    body_preview: RichTextProperty,
    #[serde(rename = "From")]
    from: EmailProperty,
    #[serde(rename = "To")]
    to: EmailProperty,
    #[serde(rename = "Subject")]
    subject: TitleProperty,
    #[serde(rename = "Attachments", skip_serializing_if = "Option::is_none")]
    attachments: Option<FilesProperty>,
}

#[derive(Debug, Serialize)]
struct DateProperty {
    date: DateValue,
}

#[derive(Debug, Serialize)]
struct DateValue {
    start: String,
}

#[derive(Debug, Serialize)]
struct RichTextProperty {
    rich_text: Vec<TextFragment>,
}

#[derive(Debug, Serialize)]
struct TitleProperty {
    title: Vec<TextFragment>,
}

#[derive(Debug, Serialize)]
struct TextFragment {
    text: TextContent,
}

#[derive(Debug, Serialize)]
struct TextContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct EmailProperty {
    email: String,
}

#[derive(Debug, Serialize)]
struct FilesProperty {
    files: Vec<ExternalFileRef>,
}

/// One uploaded attachment, referenced by its public blob URL.
#[derive(Debug, Clone, Serialize)]
pub struct ExternalFileRef {
    #[serde(rename = "type")]
    ref_type: &'static str,
    pub name: String,
    external: ExternalUrl,
}

#[derive(Debug, Clone, Serialize)]
struct ExternalUrl {
    url: String,
}

impl ExternalFileRef {
    pub fn new(name: String, url: String) -> Self {
        Self {
            ref_type: "external",
            name,
            external: ExternalUrl { url },
        }
    }
}

/// Maps an inbound message (plus the already-uploaded attachment refs)
/// into the page property set. `files` is `Some` exactly when the payload
/// carried an `Attachments` field, so a page gets an Attachments property
/// only for messages that had one.
pub fn to_page_properties(
    msg: &InboundMessage,
    files: Option<Vec<ExternalFileRef>>,
) -> PageProperties {
    PageProperties {
        date_time_received: DateProperty {
            date: DateValue {
                start: msg.date_time_received.clone(),
            },
        },
        body_preview: RichTextProperty {
            rich_text: vec![TextFragment {
                text: TextContent {
                    content: msg.body_preview.clone(),
                },
            }],
        },
        from: EmailProperty {
            email: msg.from.clone(),
        },
        to: EmailProperty {
            email: RECIPIENT.to_string(),
        },
        subject: TitleProperty {
            title: vec![TextFragment {
                text: TextContent {
                    content: msg.subject.clone(),
                },
            }],
        },
        attachments: files.map(|files| FilesProperty { files }),
    }
}
