use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;
use reqwest::blocking::Client;

use crate::engine::protocol::EngineResponse;

/// RGBA pixels ready to be uploaded as a texture.
pub struct DecodedImage {
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

/// Serve image downloads from their own channel, one thread per URL,
/// so a download never waits behind a generation on the engine thread.
pub fn run_image_worker(rx: Receiver<String>, tx: Sender<EngineResponse>, timeout: Duration) {
    while let Ok(url) = rx.recv() {
        let tx = tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(load_image(url, timeout));
        });
    }
}

fn load_image(url: String, timeout: Duration) -> EngineResponse {
    match fetch_image(&url, timeout) {
        Ok(image) => EngineResponse::Image { url, image },
        Err(e) => {
            warn!("image {url} failed: {e:#}");
            EngineResponse::ImageFailed {
                url,
                reason: format!("{e:#}"),
            }
        }
    }
}

pub fn fetch_image(url: &str, timeout: Duration) -> Result<DecodedImage> {
    let client = Client::builder().timeout(timeout).build()?;

    let bytes = client
        .get(url)
        .send()
        .with_context(|| format!("failed to download {url}"))?
        .error_for_status()?
        .bytes()?;

    decode_image(&bytes)
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let img = image::load_from_memory(bytes)
        .context("unsupported image data")?
        .to_rgba8();

    Ok(DecodedImage {
        size: [img.width() as usize, img.height() as usize],
        rgba: img.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn decodes_png_into_rgba() {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            3,
            2,
            image::Rgba([10, 20, 30, 255]),
        ))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

        let decoded = decode_image(&png).unwrap();
        assert_eq!(decoded.size, [3, 2]);
        assert_eq!(decoded.rgba.len(), 3 * 2 * 4);
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn worker_answers_without_the_engine() {
        let (url_tx, url_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        std::thread::spawn(move || run_image_worker(url_rx, resp_tx, Duration::from_secs(5)));

        url_tx.send("not a url".to_string()).unwrap();

        match resp_rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            EngineResponse::ImageFailed { url, reason } => {
                assert_eq!(url, "not a url");
                assert!(!reason.is_empty());
            }
            _ => panic!("expected ImageFailed"),
        }
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode_image(b"<html>not found</html>").is_err());
    }
}
