use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DecodeError;

/// Where an input image comes from.
///
/// Serialized as `{"url": "https://..."}` or
/// `{"data_url": "data:image/png;base64,..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Remote image fetched over HTTP(S)
    Url(String),
    /// Locally supplied image, as produced by a browser file reader
    DataUrl(String),
}

impl ImageSource {
    /// Short description for logs (never the full payload)
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::DataUrl(data) => {
                let header = data.split(',').next().unwrap_or_default();
                format!("{header} ({} bytes)", data.len())
            }
        }
    }
}

/// Decoded `data:` URL
#[derive(Debug, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, e.g. `image/png` (empty when omitted)
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse `data:[<media type>][;base64],<data>`
    pub fn parse(input: &str) -> Result<Self, DecodeError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| DecodeError::DataUrl("missing 'data:' prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::DataUrl("missing ',' separator".to_string()))?;

        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            // Browsers never wrap, but pasted payloads sometimes contain whitespace
            let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| DecodeError::DataUrl(format!("invalid base64: {e}")))?
        } else {
            percent_encoding::percent_decode_str(payload).collect()
        };

        Ok(Self { media_type, bytes })
    }
}
