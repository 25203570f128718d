//! Input image acquisition: fetch or decode the payload, decode it with the
//! `image` crate, resample it to the pipeline's working resolution.

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use point_ops::{RasterImage, WorkingResolution};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DecodeError, PipelineError};
use crate::models::{DataUrl, FetchConfig, ImageSource};

/// Source of remote image bytes
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the raw bytes behind `url`
    async fn fetch(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>, DecodeError>;
}

/// Fetches remote images over HTTP(S) with reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, DecodeError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DecodeError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Client with an explicit timeout, used by tests
    pub fn with_timeout(timeout: Duration) -> Result<Self, DecodeError> {
        Self::new(&FetchConfig {
            timeout_secs: Some(timeout.as_secs().max(1)),
            ..FetchConfig::default()
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>, DecodeError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| DecodeError::Fetch(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(DecodeError::UnsupportedScheme(other.to_string())),
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DecodeError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DecodeError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            if length as usize > max_bytes {
                return Err(DecodeError::TooLarge {
                    size: length as usize,
                    max: max_bytes,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DecodeError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Loads input images for the pipelines
pub struct ImageLoader {
    fetcher: Arc<dyn SourceFetcher>,
    max_bytes: usize,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, max_bytes: usize) -> Self {
        Self { fetcher, max_bytes }
    }

    /// Loader backed by a reqwest client built from `config`
    pub fn from_config(config: &FetchConfig) -> Result<Self, DecodeError> {
        Ok(Self::new(Arc::new(HttpFetcher::new(config)?), config.max_bytes))
    }

    /// Read the encoded bytes of a source without decoding them
    pub async fn read_bytes(&self, source: &ImageSource) -> Result<Vec<u8>, DecodeError> {
        let bytes = match source {
            ImageSource::Url(url) => {
                tracing::debug!(url = %url, "Fetching image");
                self.fetcher.fetch(url, self.max_bytes).await?
            }
            ImageSource::DataUrl(data) => DataUrl::parse(data)?.bytes,
        };

        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(DecodeError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }
        Ok(bytes)
    }

    /// Read, decode and resample a source.
    ///
    /// Decoding and resampling run on the blocking pool.
    pub async fn load(
        &self,
        source: &ImageSource,
        resolution: WorkingResolution,
    ) -> Result<RasterImage, PipelineError> {
        let bytes = self.read_bytes(source).await?;

        let image = tokio::task::spawn_blocking(move || decode(&bytes, resolution))
            .await
            .map_err(|e| PipelineError::Task(format!("decode task failed: {e}")))??;
        Ok(image)
    }
}

/// Decode an encoded image and resample it to `resolution`.
///
/// Resampling is bilinear (`FilterType::Triangle`). Source alpha is
/// discarded; the result is always opaque.
pub fn decode(bytes: &[u8], resolution: WorkingResolution) -> Result<RasterImage, DecodeError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (src_width, src_height) = rgba.dimensions();
    let (width, height) = resolution.resolve(src_width, src_height)?;

    tracing::debug!(
        src_width,
        src_height,
        width,
        height,
        "Decoded image, resampling to working resolution"
    );

    let resized = if (width, height) == (src_width, src_height) {
        rgba
    } else {
        imageops::resize(&rgba, width, height, FilterType::Triangle)
    };

    Ok(RasterImage::from_rgba(width, height, resized.into_raw())?.force_opaque())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn data_url(bytes: &[u8]) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    fn loader() -> ImageLoader {
        ImageLoader::from_config(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_decode_fits_width() {
        let bytes = png_bytes(1000, 600, [10, 20, 30]);
        let image = decode(&bytes, WorkingResolution::FitWidth { max_width: 500 }).unwrap();

        assert_eq!(image.dimensions(), (500, 300));
        assert_eq!(image.pixel(250, 150), [10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_exact_stretches() {
        let bytes = png_bytes(30, 90, [200, 100, 50]);
        let image = decode(
            &bytes,
            WorkingResolution::Exact {
                width: 40,
                height: 30,
            },
        )
        .unwrap();

        assert_eq!(image.dimensions(), (40, 30));
        assert!(image.is_opaque());
    }

    #[test]
    fn test_decode_discards_alpha() {
        let img = image::RgbaImage::from_pixel(6, 4, image::Rgba([90, 80, 70, 0]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();

        let image = decode(
            buf.get_ref(),
            WorkingResolution::FitWidth { max_width: 500 },
        )
        .unwrap();
        assert_eq!(image.dimensions(), (6, 4));
        assert_eq!(image.pixel(3, 2), [90, 80, 70, 255]);
    }

    #[test]
    fn test_decode_upscales_solid_colour_exactly() {
        let bytes = png_bytes(37, 23, [200, 100, 50]);
        let image = decode(
            &bytes,
            WorkingResolution::Exact {
                width: 400,
                height: 300,
            },
        )
        .unwrap();
        assert_eq!(image.dimensions(), (400, 300));
        assert!(image.pixels().all(|px| px == [200, 100, 50, 255]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"not an image", WorkingResolution::FitWidth { max_width: 500 });
        assert!(matches!(result, Err(DecodeError::Image(_))));
    }

    #[tokio::test]
    async fn test_load_data_url() {
        let source = ImageSource::DataUrl(data_url(&png_bytes(8, 4, [1, 2, 3])));
        let image = loader()
            .load(&source, WorkingResolution::FitWidth { max_width: 500 })
            .await
            .unwrap();

        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.pixel(0, 0), [1, 2, 3, 255]);
    }

    #[tokio::test]
    async fn test_empty_data_url() {
        let source = ImageSource::DataUrl("data:image/png;base64,".to_string());
        let result = loader().read_bytes(&source).await;
        assert!(matches!(result, Err(DecodeError::Empty)));
    }

    #[tokio::test]
    async fn test_data_url_over_limit() {
        let bytes = png_bytes(8, 8, [0, 0, 0]);
        let loader = ImageLoader::new(
            Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap()),
            16,
        );
        let result = loader
            .read_bytes(&ImageSource::DataUrl(data_url(&bytes)))
            .await;
        assert!(matches!(result, Err(DecodeError::TooLarge { max: 16, .. })));
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes(600, 300, [40, 50, 60]))
                    .insert_header("content-type", "image/png"),
            )
            .mount(&server)
            .await;

        let source = ImageSource::Url(format!("{}/photo.png", server.uri()));
        let image = loader()
            .load(&source, WorkingResolution::FitWidth { max_width: 500 })
            .await
            .unwrap();

        assert_eq!(image.dimensions(), (500, 250));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes(64, 64, [1, 1, 1]))
                    .insert_header("content-type", "image/png"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let url = format!("{}/huge.png", server.uri());
        let result = fetcher.fetch(&url, 16).await;
        assert!(matches!(result, Err(DecodeError::TooLarge { max: 16, size }) if size > 16));
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing.png", server.uri());
        let result = loader().read_bytes(&ImageSource::Url(url)).await;
        assert!(matches!(
            result,
            Err(DecodeError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let result = loader()
            .read_bytes(&ImageSource::Url("ftp://example.com/a.png".to_string()))
            .await;
        assert!(matches!(result, Err(DecodeError::UnsupportedScheme(s)) if s == "ftp"));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/a.png", 1024).await;
        assert!(matches!(result, Err(DecodeError::Fetch(_))));
    }
}
