// Image provider: builds links to the public cat-picture service. Nothing
// here touches the network; the drive downloads the picture itself when
// it is handed the link, so a bad link only shows up as a failed upload.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::Url;

/// Default base URL of the image service.
pub const DEFAULT_IMAGE_URL: &str = "https://cataas.com";

/// Characters left as-is in the caption: RFC 3986 "unreserved". Everything
/// else, `/` included, is percent-encoded so the caption stays one segment.
const CAPTION: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image service URL {base:?} is not valid: {source}")]
    InvalidBase {
        base: String,
        #[source]
        source: url::ParseError,
    },
}

/// Builds `<base>/cat/says/<caption>` links.
#[derive(Debug, Clone)]
pub struct CatImageProvider {
    base_url: String,
}

impl Default for CatImageProvider {
    fn default() -> Self {
        CatImageProvider::new(DEFAULT_IMAGE_URL)
    }
}

impl CatImageProvider {
    pub fn new(base_url: &str) -> Self {
        CatImageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link to a cat picture with `text` drawn on it.
    ///
    /// Only the base is parsed. The link itself is kept as composed so a
    /// `.` or `..` caption is not resolved away as a dot segment.
    pub fn cat_with_text(&self, text: &str) -> Result<String, ImageError> {
        Url::parse(&self.base_url).map_err(|source| ImageError::InvalidBase {
            base: self.base_url.clone(),
            source,
        })?;
        let encoded = utf8_percent_encode(text, CAPTION);
        Ok(format!("{}/cat/says/{}", self.base_url, encoded))
    }
}
