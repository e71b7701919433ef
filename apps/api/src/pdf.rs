//! PDF text extraction — the opaque `bytes -> text` primitive for CV/JD payloads.

use anyhow::{Context, Result};

/// Extracts plain text from an in-memory PDF and normalizes its whitespace.
pub fn extract_pdf_text(payload: &[u8]) -> Result<String> {
    let raw = pdf_extract::extract_text_from_mem(payload)
        .context("failed to extract text from PDF payload")?;
    Ok(normalize_whitespace(&raw))
}

/// Collapses a block of extracted text to trimmed, non-empty lines.
pub fn normalize_whitespace(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_blank_lines_and_trims() {
        let input = "  Skills  \r\n\r\n   Rust, Tokio\n\n\n  ";
        assert_eq!(normalize_whitespace(input), "Skills\nRust, Tokio");
    }

    #[test]
    fn test_normalize_handles_bare_carriage_returns() {
        assert_eq!(normalize_whitespace("a\rb"), "a\nb");
    }

    #[test]
    fn test_extract_rejects_garbage_bytes() {
        assert!(extract_pdf_text(b"definitely not a pdf").is_err());
    }
}
