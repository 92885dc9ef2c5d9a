use std::path::Path;
use uuid::Uuid;

/// Builds a storage name `<stem>_<32 hex>.<ext>` from an uploaded filename.
///
/// The stem keeps everything before the final dot, so "a.b.jpg" becomes
/// "a.b_<token>.jpg". The extension is lowercased. The random token is a
/// v4 UUID in simple form; the directory is not consulted for collisions.
pub fn get_unique_filename(filename: &str) -> String {
    let path = Path::new(filename);
    let token = Uuid::new_v4().simple();

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, token, ext.to_lowercase()),
        None => format!("{}_{}", stem, token),
    }
}

/// Identifier of a stored file: its name without the final extension.
pub fn image_id(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}
