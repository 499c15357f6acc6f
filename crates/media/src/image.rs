//! Image normalization.
//!
//! Whatever arrives — a PNG screenshot, an oversized camera JPEG, a WebP
//! from a CDN — leaves as a single canonical encoding so downstream
//! consumers never branch on image type.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use tendero_core::config::MediaConfig;
use tendero_core::{Error, MediaReference, NormalizedImage, Result};

use crate::fetch::{body_sample, fetch_bytes};

/// Fixed re-encode quality; the byte budget is enforced after encoding,
/// never by lowering quality further.
const JPEG_QUALITY: u8 = 80;

/// Resolve a media reference into a canonical JPEG within the configured
/// width and byte budget.
pub async fn normalize_image(
    cfg: &MediaConfig,
    http: &reqwest::Client,
    source: &MediaReference,
) -> Result<NormalizedImage> {
    let bytes = match source {
        MediaReference::Url(url) => {
            if !cfg.allow_http_sources && !url.starts_with("https://") {
                return Err(Error::invalid_input(format!(
                    "image url must use https: {}",
                    url
                )));
            }
            let (bytes, content_type) = fetch_bytes(http, url, cfg.max_download_bytes).await?;
            if !content_type.starts_with("image/") {
                return Err(Error::NotAnImage {
                    content_type,
                    sample: body_sample(&bytes),
                });
            }
            bytes
        }
        MediaReference::Inline { data, .. } => decode_inline(data)?,
    };

    normalize_bytes(cfg, &bytes)
}

/// Decode raw base64 or a full `data:` URL into bytes.
pub(crate) fn decode_inline(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => data,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| Error::invalid_input(format!("invalid base64 payload: {}", e)))
}

/// Decode, downscale, and re-encode image bytes.
pub fn normalize_bytes(cfg: &MediaConfig, bytes: &[u8]) -> Result<NormalizedImage> {
    let mut img = image::load_from_memory(bytes)
        .map_err(|e| Error::ImageDecode(e.to_string()))?;

    let (width, height) = img.dimensions();
    if width > cfg.max_image_width {
        let new_height =
            ((height as u64 * cfg.max_image_width as u64) / width as u64).max(1) as u32;
        tracing::debug!(
            from_width = width,
            to_width = cfg.max_image_width,
            "Resizing image"
        );
        img = img.resize_exact(cfg.max_image_width, new_height, FilterType::Lanczos3);
    }

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(|e| Error::internal(format!("jpeg encode failed: {}", e)))?;

    if out.len() > cfg.max_image_bytes {
        return Err(Error::PayloadTooLarge {
            size: out.len(),
            limit: cfg.max_image_bytes,
        });
    }

    let (final_width, _) = rgb.dimensions();

    Ok(NormalizedImage {
        mime_type: "image/jpeg".into(),
        bytes: out,
        width: final_width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn test_cfg() -> MediaConfig {
        MediaConfig::default()
    }

    /// Gradient image so JPEG output has nontrivial size.
    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_small_image_keeps_width() {
        let png = sample_png(640, 480);
        let normalized = normalize_bytes(&test_cfg(), &png).unwrap();

        assert_eq!(normalized.width, 640);
        assert_eq!(normalized.mime_type, "image/jpeg");
        // Output decodes as JPEG.
        let round = image::load_from_memory(&normalized.bytes).unwrap();
        assert_eq!(round.width(), 640);
        assert_eq!(round.height(), 480);
    }

    #[test]
    fn test_wide_image_resized_to_max_width() {
        let png = sample_png(2000, 1000);
        let normalized = normalize_bytes(&test_cfg(), &png).unwrap();

        assert_eq!(normalized.width, 1024);
        let round = image::load_from_memory(&normalized.bytes).unwrap();
        // Aspect ratio preserved within rounding.
        assert_eq!(round.height(), 512);
    }

    #[test]
    fn test_byte_budget_exceeded_fails() {
        let cfg = MediaConfig {
            max_image_bytes: 64,
            ..MediaConfig::default()
        };
        let png = sample_png(800, 600);
        let err = normalize_bytes(&cfg, &png).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 64, .. }));
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = normalize_bytes(&test_cfg(), b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode(_)));
    }

    #[test]
    fn test_decode_inline_data_url() {
        let png = sample_png(4, 4);
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(&png));
        assert_eq!(decode_inline(&data_url).unwrap(), png);
        // Raw base64 without the prefix works too.
        assert_eq!(decode_inline(&BASE64.encode(&png)).unwrap(), png);
    }

    #[test]
    fn test_decode_inline_rejects_garbage() {
        let err = decode_inline("!!not-base64!!").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_plain_http_rejected_by_default() {
        let http = reqwest::Client::new();
        let source = MediaReference::Url("http://example.com/a.jpg".into());
        let err = normalize_image(&test_cfg(), &http, &source).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_inline_roundtrip_through_normalize() {
        let http = reqwest::Client::new();
        let png = sample_png(1200, 300);
        let source = MediaReference::Inline {
            data: BASE64.encode(&png),
            content_type: Some("image/png".into()),
        };
        let normalized = normalize_image(&test_cfg(), &http, &source).await.unwrap();
        assert_eq!(normalized.width, 1024);
    }
}
