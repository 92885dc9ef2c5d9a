use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Characters left as-is in a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A stored image as seen through the originals directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageRecord {
    /// File stem, used as the identifier in the API
    pub id: String,
    /// File name with extension
    pub name: String,
    /// Percent-encoded path under the static mounts
    pub url: String,
    pub thumbnail_url: String,
    /// Whether the thumbnail file was present when the record was built
    pub has_thumbnail: bool,
}

impl ImageRecord {
    pub fn new(name: &str, has_thumbnail: bool) -> Self {
        let segment = utf8_percent_encode(name, PATH_SEGMENT);
        Self {
            id: crate::utils::naming::image_id(name),
            name: name.to_string(),
            url: format!("/images/{}", segment),
            thumbnail_url: format!("/thumbnails/{}", segment),
            has_thumbnail,
        }
    }
}
