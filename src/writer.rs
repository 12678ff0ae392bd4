//! Renders QR codes into pixel rasters of a requested size.

use core::fmt;

use tracing::debug;

use crate::bitmatrix::BitMatrix;
use crate::error::{ArgumentError, Error, Result};
use crate::hints::EncodeHints;
use crate::qrcode::{Encoder, QrCode, QrCodeEcc, QrEncoder};

/// Quiet zone width, in modules, used when the hints do not ask for a positive margin.
pub const QUIET_ZONE_SIZE: usize = 4;

/// Symbologies a caller can ask for. Only [`BarcodeFormat::QrCode`] is supported.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BarcodeFormat {
    Aztec,
    Code128,
    DataMatrix,
    Pdf417,
    QrCode,
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aztec => "AZTEC",
            Self::Code128 => "CODE_128",
            Self::DataMatrix => "DATA_MATRIX",
            Self::Pdf417 => "PDF_417",
            Self::QrCode => "QR_CODE",
        };
        f.write_str(name)
    }
}

/// Encodes text with an [`Encoder`] and renders the resulting symbol as a [`BitMatrix`].
///
/// The output is never smaller than the symbol plus its quiet zone. Each module becomes an
/// integer `multiple x multiple` block of pixels, the largest that fits both requested
/// dimensions, and the symbol is centered.
///
/// # Example
///
/// ```rust
/// use qirender::writer::{BarcodeFormat, QrCodeWriter};
///
/// let writer = QrCodeWriter::new();
/// let matrix = writer.encode_default("HELLO", BarcodeFormat::QrCode, 200, 160).unwrap();
/// assert_eq!((matrix.width(), matrix.height()), (200, 160));
/// ```
#[derive(Clone, Debug, Default)]
pub struct QrCodeWriter<E = QrEncoder> {
    encoder: E,
}

impl QrCodeWriter<QrEncoder> {
    /// A writer backed by the built-in [`QrEncoder`].
    pub fn new() -> Self {
        Self::with_encoder(QrEncoder)
    }
}

impl<E: Encoder> QrCodeWriter<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Same as [`encode`](QrCodeWriter::encode) without hints.
    pub fn encode_default(
        &self,
        contents: &str,
        format: BarcodeFormat,
        width: i32,
        height: i32
    ) -> Result<BitMatrix> {
        self.encode(contents, format, width, height, None)
    }

    /// Encodes `contents` and renders it at `width x height` pixels or larger.
    ///
    /// # Arguments
    ///
    /// * `contents` - The text to encode. Must not be empty.
    /// * `format` - Must be [`BarcodeFormat::QrCode`].
    /// * `width`, `height` - Requested size in pixels. Zero asks for the minimum size.
    /// * `hints` - Error correction level, margin and encoder options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] for empty contents, another format or a negative dimension,
    /// [`Error::Encode`] with the encoder's own error if encoding fails, and
    /// [`Error::InvalidState`] if the encoder returns a symbol without a module matrix.
    pub fn encode(
        &self,
        contents: &str,
        format: BarcodeFormat,
        width: i32,
        height: i32,
        hints: Option<&EncodeHints>
    ) -> Result<BitMatrix> {
        if contents.is_empty() {
            return Err(ArgumentError::EmptyContents.into());
        }
        if format != BarcodeFormat::QrCode {
            return Err(ArgumentError::UnsupportedFormat(format).into());
        }
        if width < 0 || height < 0 {
            return Err(ArgumentError::InvalidDimensions { width, height }.into());
        }

        let default_hints = EncodeHints::default();
        let hints = hints.unwrap_or(&default_hints);
        let ecl = hints.error_correction.unwrap_or(QrCodeEcc::Low);
        let quiet_zone = match hints.margin {
            Some(margin) if margin > 0 => margin as usize,
            _ => QUIET_ZONE_SIZE,
        };
        debug!(chars = contents.len(), ecl = ?ecl, quiet_zone, width, height, "encoding QR code");

        let code = self.encoder.encode(contents, ecl, hints)?;
        render_result(&code, width as usize, height as usize, quiet_zone)
    }
}

// The input matrix uses dark = set; so does the output, at `multiple` pixels per module.
fn render_result(code: &QrCode, width: usize, height: usize, quiet_zone: usize) -> Result<BitMatrix> {
    let input = code.matrix().ok_or(Error::InvalidState)?;
    let input_width = input.width();
    let input_height = input.height();
    let qr_width = input_width + (quiet_zone << 1);
    let qr_height = input_height + (quiet_zone << 1);
    let output_width = width.max(qr_width);
    let output_height = height.max(qr_height);

    let multiple = (output_width / qr_width).min(output_height / qr_height);
    // Padding includes both the quiet zone and the extra pixels needed to reach the requested
    // dimensions. A 25x25 input is 33x33 with its quiet zone; asked for 200x160 the multiple is
    // 4, giving a 100x100 symbol padded out to 200x160.
    let left_padding = (output_width - input_width * multiple) / 2;
    let top_padding = (output_height - input_height * multiple) / 2;
    debug!(output_width, output_height, multiple, left_padding, top_padding, "rendering QR code");

    let mut output = BitMatrix::new(output_width, output_height)?;
    for input_y in 0..input_height {
        let output_y = top_padding + input_y * multiple;
        for input_x in 0..input_width {
            if input.get(input_x, input_y) {
                let output_x = left_padding + input_x * multiple;
                output.set_region(output_x, output_y, multiple, multiple)?;
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::{EncodeError, Mask, ModuleMatrix, Version};
    use core::cell::Cell;
    use test_case::test_case;

    /// Hands back a fixed matrix and counts how often it was asked.
    struct FixedEncoder {
        matrix: Option<ModuleMatrix>,
        calls: Cell<usize>,
        seen_ecl: Cell<Option<QrCodeEcc>>,
    }

    impl FixedEncoder {
        fn new(matrix: Option<ModuleMatrix>) -> Self {
            Self {
                matrix,
                calls: Cell::new(0),
                seen_ecl: Cell::new(None),
            }
        }
    }

    impl Encoder for FixedEncoder {
        fn encode(
            &self,
            _contents: &str,
            ecl: QrCodeEcc,
            _hints: &EncodeHints
        ) -> core::result::Result<QrCode, EncodeError> {
            self.calls.set(self.calls.get() + 1);
            self.seen_ecl.set(Some(ecl));
            Ok(QrCode::new(Version::MIN, ecl, Mask::new(0), self.matrix.clone()))
        }
    }

    struct FailingEncoder;

    impl Encoder for FailingEncoder {
        fn encode(
            &self,
            _contents: &str,
            _ecl: QrCodeEcc,
            _hints: &EncodeHints
        ) -> core::result::Result<QrCode, EncodeError> {
            Err(EncodeError::DataOverCapacity(200, 152))
        }
    }

    /// A 3x2 matrix with the top-left and bottom-right modules dark.
    fn corner_matrix() -> ModuleMatrix {
        let mut matrix = ModuleMatrix::new(3, 2).unwrap();
        matrix.set(0, 0, true);
        matrix.set(2, 1, true);
        matrix
    }

    #[test]
    fn test_rejects_empty_contents() {
        let err = QrCodeWriter::new()
            .encode_default("", BarcodeFormat::QrCode, 100, 100)
            .unwrap_err();
        assert_eq!(err, Error::Argument(ArgumentError::EmptyContents));
    }

    #[test_case(BarcodeFormat::Aztec; "aztec")]
    #[test_case(BarcodeFormat::Code128; "code 128")]
    #[test_case(BarcodeFormat::DataMatrix; "data matrix")]
    #[test_case(BarcodeFormat::Pdf417; "pdf 417")]
    fn test_rejects_other_formats(format: BarcodeFormat) {
        let err = QrCodeWriter::new().encode_default("A", format, 100, 100).unwrap_err();
        assert_eq!(err, Error::Argument(ArgumentError::UnsupportedFormat(format)));
        assert!(err.to_string().contains(&format.to_string()));
    }

    #[test_case(-1, 100; "negative width")]
    #[test_case(100, -1; "negative height")]
    fn test_rejects_negative_dimensions(width: i32, height: i32) {
        let err = QrCodeWriter::new()
            .encode_default("A", BarcodeFormat::QrCode, width, height)
            .unwrap_err();
        assert_eq!(err, Error::Argument(ArgumentError::InvalidDimensions { width, height }));
    }

    #[test]
    fn test_validation_happens_before_encoding() {
        let writer = QrCodeWriter::with_encoder(FixedEncoder::new(Some(corner_matrix())));
        assert!(writer.encode_default("", BarcodeFormat::QrCode, 0, 0).is_err());
        assert!(writer.encode_default("A", BarcodeFormat::Aztec, 0, 0).is_err());
        assert!(writer.encode_default("A", BarcodeFormat::QrCode, -5, 0).is_err());
        assert_eq!(writer.encoder().calls.get(), 0);
    }

    #[test]
    fn test_missing_matrix_is_invalid_state() {
        let writer = QrCodeWriter::with_encoder(FixedEncoder::new(None));
        let err = writer.encode_default("A", BarcodeFormat::QrCode, 10, 10).unwrap_err();
        assert_eq!(err, Error::InvalidState);
        assert_eq!(writer.encoder().calls.get(), 1);
    }

    #[test]
    fn test_encoder_error_is_passed_through() {
        let writer = QrCodeWriter::with_encoder(FailingEncoder);
        let err = writer.encode_default("A", BarcodeFormat::QrCode, 10, 10).unwrap_err();
        assert_eq!(err, Error::Encode(EncodeError::DataOverCapacity(200, 152)));
        assert!(!err.is_argument_error());
    }

    #[test]
    fn test_minimum_size_uses_multiple_one() {
        let writer = QrCodeWriter::with_encoder(FixedEncoder::new(Some(corner_matrix())));
        let output = writer.encode_default("A", BarcodeFormat::QrCode, 0, 0).unwrap();
        assert_eq!((output.width(), output.height()), (11, 10));
        // left = (11 - 3) / 2, top = (10 - 2) / 2
        assert!(output.get(4, 4));
        assert!(output.get(6, 5));
        assert_eq!(output.count_set(), 2);
    }

    #[test]
    fn test_scaling_and_centering_arithmetic() {
        let writer = QrCodeWriter::with_encoder(FixedEncoder::new(Some(corner_matrix())));
        let output = writer.encode_default("A", BarcodeFormat::QrCode, 50, 31).unwrap();
        // qr = 11x10, multiple = min(50 / 11, 31 / 10) = 3
        // left = (50 - 9) / 2 = 20, top = (31 - 6) / 2 = 12
        assert_eq!((output.width(), output.height()), (50, 31));
        assert_eq!(output.count_set(), 2 * 9);
        assert!(output.row(12).is_range(20, 23, true).unwrap());
        assert!(output.row(14).is_range(20, 23, true).unwrap());
        assert!(!output.get(19, 12));
        assert!(!output.get(20, 15));
        assert!(output.row(15).is_range(26, 29, true).unwrap());
        assert!(output.row(17).is_range(26, 29, true).unwrap());
        assert_eq!(output.row(12).next_set(23), 50);
    }

    #[test]
    fn test_default_error_correction_is_low() {
        let writer = QrCodeWriter::with_encoder(FixedEncoder::new(Some(corner_matrix())));
        writer.encode_default("A", BarcodeFormat::QrCode, 0, 0).unwrap();
        assert_eq!(writer.encoder().seen_ecl.get(), Some(QrCodeEcc::Low));

        let hints = EncodeHints::default().with_error_correction(QrCodeEcc::Quartile);
        writer.encode("A", BarcodeFormat::QrCode, 0, 0, Some(&hints)).unwrap();
        assert_eq!(writer.encoder().seen_ecl.get(), Some(QrCodeEcc::Quartile));
        assert_eq!(writer.encoder().calls.get(), 2);
    }

    #[test_case(Some(1), 5, 4; "margin of one")]
    #[test_case(Some(10), 23, 22; "wide margin")]
    #[test_case(Some(0), 11, 10; "zero margin keeps default")]
    #[test_case(Some(-3), 11, 10; "negative margin keeps default")]
    #[test_case(None, 11, 10; "no margin keeps default")]
    fn test_margin(margin: Option<i32>, width: usize, height: usize) {
        let writer = QrCodeWriter::with_encoder(FixedEncoder::new(Some(corner_matrix())));
        let hints = EncodeHints { margin, ..EncodeHints::default() };
        let output = writer.encode("A", BarcodeFormat::QrCode, 0, 0, Some(&hints)).unwrap();
        assert_eq!((output.width(), output.height()), (width, height));
    }

    #[test]
    fn test_hello_at_zero_size() {
        let output = QrCodeWriter::new()
            .encode_default("HELLO", BarcodeFormat::QrCode, 0, 0)
            .unwrap();
        assert_eq!((output.width(), output.height()), (29, 29));
        // Top-left finder starts right after the quiet zone.
        assert!(output.row(4).is_range(4, 11, true).unwrap());
        assert!(output.row(3).is_range(0, 29, false).unwrap());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(BarcodeFormat::QrCode.to_string(), "QR_CODE");
        assert_eq!(
            ArgumentError::UnsupportedFormat(BarcodeFormat::Aztec).to_string(),
            "can only encode QR_CODE, but got AZTEC"
        );
    }
}
