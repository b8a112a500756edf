use anyhow::{Context, Result};
use lopdf::Document;

/// Text of every page in document order, pages joined by newlines.
pub fn pdf_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes).context("load pdf")?;

    // get_pages is keyed by page number, so iteration is already in order
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let mut texts = Vec::with_capacity(pages.len());
    for page in pages {
        let text = document
            .extract_text(&[page])
            .with_context(|| format!("extract text from page {}", page))?;
        texts.push(text);
    }

    Ok(texts.join("\n"))
}
