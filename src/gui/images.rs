//! Button images: data URI → egui texture, cached by content

use std::collections::HashMap;
use std::io::Cursor;

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::sync::{Fingerprint, fingerprint};

/// Decode a base64 PNG, JPEG, GIF or WebP data URI into RGBA pixels
pub fn decode_data_uri(uri: &str) -> Result<egui::ColorImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("Not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("Data URI has no payload"))?;
    let mime = meta.split(';').next().unwrap_or_default();
    if !meta.ends_with(";base64") {
        bail!("Only base64 data URIs are supported");
    }
    let format = match mime {
        "image/png" => None,
        "image/jpeg" => Some(image::ImageFormat::Jpeg),
        "image/gif" => Some(image::ImageFormat::Gif),
        "image/webp" => Some(image::ImageFormat::WebP),
        _ => bail!("Unsupported image type {mime:?}"),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .context("Invalid base64 image payload")?;
    match format {
        None => decode_png(&bytes),
        Some(format) => decode_raster(&bytes, format),
    }
}

fn decode_raster(bytes: &[u8], format: image::ImageFormat) -> Result<egui::ColorImage> {
    let rgba = image::load_from_memory_with_format(bytes, format)
        .with_context(|| format!("Failed to decode {format:?} image"))?
        .to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

fn decode_png(bytes: &[u8]) -> Result<egui::ColorImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info().context("Failed to read PNG header")?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).context("Failed to decode PNG")?;
    let pixels = &buf[..info.buffer_size()];

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => pixels.to_vec(),
        png::ColorType::Rgb => pixels
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 0xFF])
            .collect(),
        png::ColorType::GrayscaleAlpha => pixels
            .chunks_exact(2)
            .flat_map(|c| [c[0], c[0], c[0], c[1]])
            .collect(),
        png::ColorType::Grayscale => pixels.iter().flat_map(|&g| [g, g, g, 0xFF]).collect(),
        other => bail!("Unsupported PNG color type {other:?}"),
    };

    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [info.width as usize, info.height as usize],
        &rgba,
    ))
}

/// Textures keyed by image content; failed decodes are remembered as `None`
#[derive(Default)]
pub struct ImageCache {
    textures: HashMap<Fingerprint, Option<egui::TextureHandle>>,
}

impl ImageCache {
    pub fn texture(&mut self, ctx: &egui::Context, uri: &str) -> Option<egui::TextureHandle> {
        let key = fingerprint(uri);
        self.textures
            .entry(key)
            .or_insert_with(|| match decode_data_uri(uri) {
                Ok(image) => Some(ctx.load_texture("button-image", image, egui::TextureOptions::LINEAR)),
                Err(err) => {
                    debug!(error = %err, "Button image not displayable, using icon");
                    None
                }
            })
            .clone()
    }

    /// Forget textures not used by the current document
    pub fn retain_uris<'a>(&mut self, uris: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<Fingerprint> = uris.into_iter().map(fingerprint).collect();
        self.textures.retain(|key, _| keep.contains(key));
    }
}
