//! Terminal QR codes for the access link.

use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use qrcode::types::QrError;
use thiserror::Error;

/// Errors raised while rendering a QR code.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The text does not fit in any QR version.
    #[error("failed to encode QR code: {0}")]
    Encode(#[from] QrError),
}

/// Turns text into something printable on a terminal.
pub trait QrRenderer {
    /// Renders `text` as a multi-line string.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when `text` cannot be encoded.
    fn render(&self, text: &str) -> Result<String, RenderError>;
}

/// Half-block Unicode renderer; two modules per character cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalQrRenderer;

impl QrRenderer for TerminalQrRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        let code = QrCode::new(text.as_bytes())?;
        // Inverted so the code scans on dark terminal backgrounds.
        Ok(code
            .render::<Dense1x2>()
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .quiet_zone(true)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_block_characters() {
        let art = TerminalQrRenderer
            .render("https://abc.ngrok-free.app?key=123456")
            .expect("render");
        assert!(art.lines().count() > 10);
        assert!(art.contains('█') || art.contains('▀') || art.contains('▄'));
    }

    #[test]
    fn oversized_payload_fails() {
        let huge = "x".repeat(8_000);
        assert!(matches!(
            TerminalQrRenderer.render(&huge),
            Err(RenderError::Encode(_))
        ));
    }
}
