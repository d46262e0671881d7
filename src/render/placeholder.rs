//! Deterministic placeholder image for failed or disabled rendering.
//!
//! Produces a fixed-size gradient PNG with the prompt (truncated) and a few
//! caption lines as a text overlay. Same inputs always yield identical
//! bytes, which is what makes the silent image fallback testable.

use super::font;
use super::ImageRenderer;
use crate::error::Result;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use reqwest::Client;
use std::io::Cursor;

/// Placeholder image edge length in pixels.
pub const PLACEHOLDER_SIZE: u32 = 512;

/// Maximum prompt characters shown on the placeholder.
const PROMPT_PREVIEW_CHARS: usize = 40;

/// Overlay text color.
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Render the deterministic placeholder PNG for a prompt.
///
/// Gradient background from the brand purple toward cyan, caption lines in
/// white. This function cannot fail: encoding an in-memory RGB buffer to
/// PNG has no fallible inputs.
pub fn placeholder_png(prompt: &str) -> Vec<u8> {
    let mut img = RgbImage::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE);

    // Vertical gradient: green channel sweeps 102..=227.
    for y in 0..PLACEHOLDER_SIZE {
        let g = 102 + (126 * y / PLACEHOLDER_SIZE) as u8;
        for x in 0..PLACEHOLDER_SIZE {
            img.put_pixel(x, y, Rgb([102, g, 234]));
        }
    }

    let preview = truncate_prompt(prompt);
    let lines = [
        "AI Generated Image",
        "",
        "Prompt:",
        preview.as_str(),
        "",
        "Placeholder Image",
        "Real image generation in progress...",
    ];

    let mut y_offset = 150;
    for line in lines {
        draw_text(&mut img, line, 30, y_offset, 2);
        y_offset += 25;
    }

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("PNG encoding of in-memory buffer");
    buf
}

/// Truncate the prompt to the preview length, appending an ellipsis.
fn truncate_prompt(prompt: &str) -> String {
    let chars: Vec<char> = prompt.chars().collect();
    if chars.len() > PROMPT_PREVIEW_CHARS {
        let head: String = chars[..PROMPT_PREVIEW_CHARS].iter().collect();
        format!("{}...", head)
    } else {
        prompt.to_string()
    }
}

/// Blit a line of text onto the image with the built-in 5x7 font.
fn draw_text(img: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32) {
    let mut cursor_x = x;
    let advance = (font::GLYPH_WIDTH + 1) * scale;

    for c in text.chars() {
        if cursor_x + font::GLYPH_WIDTH * scale >= img.width() {
            break;
        }
        let columns = font::glyph(c);
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..font::GLYPH_HEIGHT {
                if bits >> row & 1 == 1 {
                    let px = cursor_x + col as u32 * scale;
                    let py = y + row * scale;
                    for dx in 0..scale {
                        for dy in 0..scale {
                            if px + dx < img.width() && py + dy < img.height() {
                                img.put_pixel(px + dx, py + dy, TEXT_COLOR);
                            }
                        }
                    }
                }
            }
        }
        cursor_x += advance;
    }
}

/// An [`ImageRenderer`] that always produces the placeholder.
///
/// Useful as the production renderer when no image API key is configured,
/// and in tests.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRenderer;

#[async_trait]
impl ImageRenderer for PlaceholderRenderer {
    async fn render(
        &self,
        _client: &Client,
        _base_url: &str,
        _model: &str,
        prompt: &str,
    ) -> Result<Vec<u8>> {
        Ok(placeholder_png(prompt))
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_valid_png_of_fixed_size() {
        let bytes = placeholder_png("A beautiful sunset over mountains");
        assert!(!bytes.is_empty());
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), PLACEHOLDER_SIZE);
        assert_eq!(decoded.height(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = placeholder_png("same prompt");
        let b = placeholder_png("same prompt");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_prompts_differ() {
        let a = placeholder_png("prompt one");
        let b = placeholder_png("prompt two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_truncate_prompt_long() {
        let long = "x".repeat(100);
        let preview = truncate_prompt(&long);
        assert_eq!(preview.chars().count(), PROMPT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_truncate_prompt_short() {
        assert_eq!(truncate_prompt("short"), "short");
    }

    #[tokio::test]
    async fn test_placeholder_renderer_never_fails() {
        let renderer = PlaceholderRenderer;
        let client = Client::new();
        let bytes = renderer
            .render(&client, "http://unused", "unused-model", "a prompt")
            .await
            .unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}
