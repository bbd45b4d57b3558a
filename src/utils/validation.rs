use anyhow::{Result, anyhow};
use std::path::Path;

/// `%PDF` header every accepted document must start with
const PDF_MAGIC: &[u8] = b"%PDF";

/// Content types a browser or client may attach to a PDF part
const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/x-pdf",
    "application/octet-stream",
];

const MAX_FILENAME_BYTES: usize = 255;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn reject(code: &'static str, message: String) -> anyhow::Error {
    anyhow!(ValidationError { code, message })
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size == 0 {
        return Err(reject("EMPTY_FILE", "Uploaded file is empty".to_string()));
    }
    if size > max_size {
        return Err(reject(
            "FILE_TOO_LARGE",
            format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        ));
    }
    Ok(())
}

/// Reduces a client-supplied name to a single safe path segment.
///
/// Directory components are dropped, so `../../etc/passwd` becomes `passwd`.
/// The result is used verbatim as the last segment of the storage key.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Normalise Windows separators so the last component is found either way
    let unified = filename.replace('\\', "/");
    let name = Path::new(&unified)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim();

    if name.is_empty() {
        return Err(reject(
            "INVALID_FILENAME",
            "Filename cannot be empty".to_string(),
        ));
    }

    if filename.contains("..") {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            c if c.is_control() => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';' | '#' | '%' => '_',
            c => c,
        })
        .collect();

    let sanitized = if sanitized.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(reject(
            "HIDDEN_FILE",
            "Hidden files (starting with '.') are not allowed".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Checks an uploaded part really is a PDF of acceptable size.
pub fn validate_pdf_upload(
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
    max_size: usize,
) -> Result<()> {
    validate_file_size(data.len(), max_size)?;
    let name = sanitize_filename(filename)?;

    let is_pdf_name = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        return Err(reject(
            "INVALID_EXTENSION",
            format!("'{}' is not a .pdf file", filename),
        ));
    }

    if let Some(content_type) = content_type {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        if !ACCEPTED_CONTENT_TYPES.contains(&normalized.as_str()) {
            return Err(reject(
                "INVALID_MIME_TYPE",
                format!("MIME type '{}' is not allowed for documents", content_type),
            ));
        }
    }

    if !data.starts_with(PDF_MAGIC) {
        return Err(reject(
            "MAGIC_BYTES_MISMATCH",
            "File content is not a PDF document".to_string(),
        ));
    }

    Ok(())
}
