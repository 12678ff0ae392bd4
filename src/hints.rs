//! Options accepted by the writer and forwarded to the encoder.

use crate::qrcode::{Mask, QrCodeEcc, Version};

/// Encoding and rendering options.
///
/// The writer reads `error_correction` and `margin`; everything else is passed through to the
/// [`Encoder`](crate::qrcode::Encoder) untouched.
///
/// # Example
///
/// ```rust
/// use qirender::hints::EncodeHints;
/// use qirender::qrcode::QrCodeEcc;
///
/// let hints = EncodeHints::default()
///     .with_error_correction(QrCodeEcc::High)
///     .with_margin(2);
/// assert_eq!(hints.margin, Some(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeHints {
    /// Error correction level. `None` means [`QrCodeEcc::Low`].
    pub error_correction: Option<QrCodeEcc>,
    /// Quiet zone width in modules. Only values greater than zero replace the default of 4.
    pub margin: Option<i32>,
    /// Smallest version the encoder may pick.
    pub min_version: Version,
    /// Largest version the encoder may pick.
    pub max_version: Version,
    /// Fixed mask pattern, or `None` to pick the one with the lowest penalty.
    pub mask: Option<Mask>,
    /// Raise the error correction level when it fits in the same version.
    pub boost_ecl: bool,
}

impl Default for EncodeHints {
    fn default() -> Self {
        Self {
            error_correction: None,
            margin: None,
            min_version: Version::MIN,
            max_version: Version::MAX,
            mask: None,
            boost_ecl: false,
        }
    }
}

impl EncodeHints {
    pub fn with_error_correction(mut self, ecl: QrCodeEcc) -> Self {
        self.error_correction = Some(ecl);
        self
    }

    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_version_range(mut self, min_version: Version, max_version: Version) -> Self {
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_boost_ecl(mut self, boost_ecl: bool) -> Self {
        self.boost_ecl = boost_ecl;
        self
    }
}
