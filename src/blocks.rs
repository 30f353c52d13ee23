use serde::Serialize;

/// Hard cap on blocks produced from one email body.
pub const MAX_BLOCKS: usize = 100;

/// One paragraph of page body content, in the 2021-05-13 block shape
/// (paragraph text lives under `paragraph.text`).
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    object: &'static str,
    #[serde(rename = "type")]
    block_type: &'static str,
    paragraph: Paragraph,
}

#[derive(Debug, Clone, Serialize)]
struct Paragraph {
    text: Vec<BlockText>,
}

#[derive(Debug, Clone, Serialize)]
struct BlockText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
struct TextContent {
    content: String,
}

impl Block {
    pub(crate) fn paragraph(line: &str) -> Self {
        Self {
            object: "block",
            block_type: "paragraph",
            paragraph: Paragraph {
                text: vec![BlockText {
                    text_type: "text",
                    text: TextContent {
                        content: line.to_string(),
                    },
                }],
            },
        }
    }
}

/// Renders an HTML body to plain text and wraps each non-empty line as one
/// paragraph block, in document order, truncated to [`MAX_BLOCKS`].
///
/// Lines are kept verbatim: only exactly-empty lines are dropped, so
/// indentation and whitespace-only rendering (nested lists, preformatted
/// text) survive into the page body.
///
/// Pure, no I/O. An unrenderable body yields an empty sequence, which makes
/// the append step a no-op.
pub fn to_blocks(html: &str) -> Vec<Block> {
    let text = html2text::config::plain()
        .string_from_read(html.as_bytes(), usize::MAX)
        .unwrap_or_default();

    text.split('\n')
        .filter(|line| !line.is_empty())
        .take(MAX_BLOCKS)
        .map(Block::paragraph)
        .collect()
}
