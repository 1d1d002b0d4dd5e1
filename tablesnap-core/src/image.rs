//! Image type detection shared by the server and the CLI.

use std::io::Cursor;

use image::ImageReader;

/// Used when neither the upload nor the bytes say what the image is.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Default upload limit (20MB), the largest inline image the provider accepts.
pub const MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// Detect the MIME type of `data` from its magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    reader.format().map(|format| format.to_mime_type())
}

/// Pick the MIME type to send to the model.
///
/// A declared type wins unless it is missing or the generic
/// `application/octet-stream`; then the bytes are sniffed, and finally
/// [`DEFAULT_MIME_TYPE`] is used.
pub fn resolve_mime_type(declared: Option<&str>, data: &[u8]) -> String {
    match declared.map(str::trim) {
        Some(mime) if !mime.is_empty() && mime != "application/octet-stream" => mime.to_string(),
        _ => detect_mime_type(data)
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string(),
    }
}
