//! # QR Rendering
//!
//! The core does not draw QR matrices itself; it depends on the narrow
//! [`QrEncoder`] capability. [`QrCodeEncoder`] is the stock adapter over the
//! `qrcode` crate, and tests or the app can inject any other encoder.
//!
//! ```text
//! payload ──► QrEncoder::encode ──► QrImage ──► to_pbm() ──► printer / screen
//! ```

use qrcode::{Color, EcLevel, QrCode};

use crate::error::{CoreError, CoreResult};

/// Modules of white border ISO/IEC 18004 requires around the symbol.
pub const QUIET_ZONE: usize = 4;

/// A square monochrome raster, one entry per module, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    width: usize,
    dark: Vec<bool>,
}

impl QrImage {
    /// Wraps a `width × width` module grid.
    pub fn new(width: usize, dark: Vec<bool>) -> CoreResult<Self> {
        if width == 0 || dark.len() != width * width {
            return Err(CoreError::EncodingFailure(format!(
                "expected {}x{} modules, got {}",
                width,
                width,
                dark.len()
            )));
        }
        Ok(QrImage { width, dark })
    }

    /// Side length in modules (quiet zone included when the encoder adds it).
    pub fn width(&self) -> usize {
        self.width
    }

    /// True when the module at (`x`, `y`) is dark. Out-of-range is light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark.get(y * self.width + x).copied().unwrap_or(false)
    }

    /// Encodes as binary netpbm (`P4`), each module drawn `scale × scale`.
    pub fn to_pbm(&self, scale: usize) -> Vec<u8> {
        let scale = scale.max(1);
        let side = self.width * scale;
        let row_bytes = side.div_ceil(8);

        let mut out = format!("P4\n{} {}\n", side, side).into_bytes();
        out.reserve(row_bytes * side);

        for y in 0..side {
            let mut row = vec![0u8; row_bytes];
            for x in 0..side {
                if self.is_dark(x / scale, y / scale) {
                    if let Some(byte) = row.get_mut(x / 8) {
                        *byte |= 0x80 >> (x % 8);
                    }
                }
            }
            out.extend_from_slice(&row);
        }

        out
    }

    /// Renders with Unicode half blocks for terminal previews.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for y in (0..self.width).step_by(2) {
            for x in 0..self.width {
                out.push(match (self.is_dark(x, y), self.is_dark(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}

/// Turns text into a QR raster.
pub trait QrEncoder {
    fn encode(&self, text: &str) -> CoreResult<QrImage>;
}

/// Renders a BR Code payload through `encoder`. Failures propagate as-is;
/// the core never retries.
pub fn generate_qr_image<E: QrEncoder + ?Sized>(encoder: &E, payload: &str) -> CoreResult<QrImage> {
    if payload.is_empty() {
        return Err(CoreError::EncodingFailure("empty payload".to_string()));
    }
    encoder.encode(payload)
}

/// [`QrEncoder`] backed by the `qrcode` crate, error-correction level M
/// (what Brazilian banks print) with the standard quiet zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeEncoder;

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, text: &str) -> CoreResult<QrImage> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
            .map_err(|e| CoreError::EncodingFailure(e.to_string()))?;

        let inner = code.width();
        let colors = code.to_colors();
        let width = inner + 2 * QUIET_ZONE;

        let mut dark = vec![false; width * width];
        for (i, color) in colors.iter().enumerate() {
            let (x, y) = (i % inner + QUIET_ZONE, i / inner + QUIET_ZONE);
            if let Some(cell) = dark.get_mut(y * width + x) {
                *cell = *color == Color::Dark;
            }
        }

        QrImage::new(width, dark)
    }
}
