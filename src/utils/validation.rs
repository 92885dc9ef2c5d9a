use crate::config::GalleryConfig;
use std::path::Path;

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

/// Upload policy checks: extension allowlist and size limit.
#[derive(Debug, Clone)]
pub struct Validator {
    allowed_extensions: Vec<String>,
    max_file_size: usize,
}

impl Validator {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        }
    }

    /// True iff the final suffix of `filename`, lowercased, is in the allowlist.
    pub fn is_allowed_file(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) => self.allowed_extensions.iter().any(|allowed| *allowed == ext),
            None => false,
        }
    }

    pub fn is_file_size(&self, size: usize) -> bool {
        size <= self.max_file_size
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        if self.is_allowed_file(filename) {
            return Ok(());
        }
        Err(ValidationError {
            code: "INVALID_EXTENSION",
            message: format!(
                "Не правильный тип файла. Поддерживаются только {}.",
                self.allowed_list()
            ),
        })
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if self.is_file_size(size) {
            return Ok(());
        }
        Err(self.file_size_error())
    }

    pub fn file_size_error(&self) -> ValidationError {
        ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "Размер файла превышает лимит в {} МБ",
                self.max_file_size / 1024 / 1024
            ),
        }
    }

    /// Full validation pipeline for an uploaded file
    pub fn validate_upload(&self, filename: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_extension(filename)?;
        self.validate_file_size(size)
    }

    fn allowed_list(&self) -> String {
        match self.allowed_extensions.split_last() {
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} и {}", rest.join(", "), last),
            None => String::new(),
        }
    }
}

/// Lowercased final suffix with its leading dot, e.g. "Cat.JPG" -> ".jpg".
/// Dot-files such as ".png" have no extension.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Keeps only the final path component of a client supplied filename.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name != filename.trim() {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Недопустимое имя файла.".to_string(),
        });
    }

    Ok(name.to_string())
}
