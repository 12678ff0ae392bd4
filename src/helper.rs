use image::{ImageBuffer, Luma};

use crate::bitmatrix::BitMatrix;
use crate::error::Result;
use crate::hints::EncodeHints;
use crate::writer::{BarcodeFormat, QrCodeWriter};

/*---- Utilities ----*/

// Returns a string of SVG code for an image depicting the given raster, one unit per pixel.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(matrix: &BitMatrix) -> String {
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {} {}\" stroke=\"none\">\n",
        matrix.width(),
        matrix.height()
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..matrix.height() {
        let row = matrix.row(y);
        // One horizontal run per path segment.
        let mut x = row.next_set(0);
        while x < matrix.width() {
            let end = row.next_unset(x);
            if !first {
                result += " ";
            }
            first = false;
            result += &format!("M{},{}h{}v1h-{}z", x, y, end - x, end - x);
            x = row.next_set(end);
        }
    }
    result += "\" fill=\"#000000\"/>\n";
    result += "</svg>\n";
    result
}

/// Prints the given raster to the console, two characters per pixel.
pub fn print_qr(matrix: &BitMatrix) {
    for y in 0..matrix.height() {
        for x in 0..matrix.width() {
            let c: char = if matrix.get(x, y) { '█' } else { ' ' };
            print!("{0}{0}", c);
        }
        println!();
    }
    println!();
}

/// Generates a QR Code image buffer from the provided content.
///
/// # Arguments
///
/// * `content` - The content to encode into the QR Code.
/// * `width`, `height` - Requested size in pixels; `0` gives the smallest image.
/// * `hints` - Optional. Error correction level, margin and encoder options.
///
/// # Returns
///
/// An `ImageBuffer` with black modules on a white background.
///
/// # Example
///
/// ```
/// use qirender::helper::generate_image_buffer;
///
/// let img_buffer = generate_image_buffer("Hello, World!", 0, 0, None).unwrap();
/// assert_eq!(img_buffer.dimensions(), (29, 29));
/// ```
pub fn generate_image_buffer(
    content: &str,
    width: i32,
    height: i32,
    hints: Option<&EncodeHints>
) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let matrix = QrCodeWriter::new().encode(content, BarcodeFormat::QrCode, width, height, hints)?;
    Ok(matrix.to_image())
}

/// Generates a QR Code SVG from the provided content, one unit per module.
///
/// # Example
///
/// ```
/// use qirender::helper::generate_svg_string;
///
/// let svg_string = generate_svg_string("Hello, World!", None).unwrap();
/// assert!(svg_string.contains("viewBox=\"0 0 29 29\""));
/// ```
pub fn generate_svg_string(content: &str, hints: Option<&EncodeHints>) -> Result<String> {
    let matrix = QrCodeWriter::new().encode(content, BarcodeFormat::QrCode, 0, 0, hints)?;
    Ok(to_svg_string(&matrix))
}
