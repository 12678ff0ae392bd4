#![forbid(unsafe_code)]
//! QR code encoding functionality.
//!
//! The writer renders whatever an [`Encoder`] hands back. [`QrEncoder`] is the built-in QR Code
//! Model 2 implementation, versions 1 to 40 at any error correction level. Bit streams and module
//! grids are held in [`BitArray`]s.

use tracing::{debug, trace};

use crate::bitarray::BitArray;
use crate::error::ArgumentError;
use crate::hints::EncodeHints;

/// Turns text into a finished module matrix.
///
/// The writer only depends on this contract. Errors are surfaced to the writer's caller unchanged.
pub trait Encoder {
    /// Encodes `contents` at error correction level `ecl`.
    fn encode(
        &self,
        contents: &str,
        ecl: QrCodeEcc,
        hints: &EncodeHints
    ) -> Result<QrCode, EncodeError>;
}

/// The built-in QR Code Model 2 encoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrEncoder;

impl Encoder for QrEncoder {
    fn encode(
        &self,
        contents: &str,
        ecl: QrCodeEcc,
        hints: &EncodeHints
    ) -> Result<QrCode, EncodeError> {
        QrCode::encode_text(
            contents,
            ecl,
            hints.min_version,
            hints.max_version,
            hints.mask,
            hints.boost_ecl
        )
    }
}

/// A `width x height` grid of modules (`true` = dark), stored row-major in one [`BitArray`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModuleMatrix {
    width: usize,
    height: usize,
    modules: BitArray,
}

impl ModuleMatrix {
    /// Creates a grid of light modules.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidSize`] if the grid would be empty.
    pub fn new(width: usize, height: usize) -> Result<Self, ArgumentError> {
        Ok(Self {
            width,
            height,
            modules: BitArray::with_size(width * height)?,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` for a dark module.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.modules.get(self.index(x, y))
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    pub fn set(&mut self, x: usize, y: usize, isdark: bool) {
        let index = self.index(x, y);
        self.modules.set(index, isdark);
    }

    /// Number of dark modules.
    pub fn count_dark(&self) -> usize {
        let mut count = 0;
        let mut i = self.modules.next_set(0);
        while i < self.modules.size() {
            count += 1;
            i = self.modules.next_set(i + 1);
        }
        count
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height, "Module out of bounds");
        y * self.width + x
    }

    fn set_unbounded(&mut self, x: i32, y: i32, isdark: bool) {
        if (0..self.width as i32).contains(&x) && (0..self.height as i32).contains(&y) {
            self.set(x as usize, y as usize, isdark);
        }
    }

    fn fill_rectangle(
        &mut self,
        left: usize,
        top: usize,
        width: usize,
        height: usize
    ) -> Result<(), ArgumentError> {
        for y in top..top + height {
            let start = self.index(left, y);
            self.modules.set_range(start, start + width)?;
        }
        Ok(())
    }

    /// Marks every function module of `ver` dark and everything else light.
    fn function_modules_marked(ver: Version) -> Result<Self, ArgumentError> {
        let size = ver.size();
        let mut result = Self::new(size, size)?;
        // Timing patterns
        result.fill_rectangle(6, 0, 1, size)?;
        result.fill_rectangle(0, 6, size, 1)?;
        // Finder patterns with separators and format bits
        result.fill_rectangle(0, 0, 9, 9)?;
        result.fill_rectangle(size - 8, 0, 8, 9)?;
        result.fill_rectangle(0, size - 8, 9, 8)?;
        let alignpatpos = ver.alignment_pattern_positions();
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                if !is_finder_corner(i, j, alignpatpos.len()) {
                    result.fill_rectangle(pos0 - 2, pos1 - 2, 5, 5)?;
                }
            }
        }
        if ver.value() >= 7 {
            result.fill_rectangle(size - 11, 0, 3, 6)?;
            result.fill_rectangle(0, size - 11, 6, 3)?;
        }
        Ok(result)
    }

    fn draw_light_function_modules(&mut self, ver: Version) {
        let size = self.width;
        for i in (7..size - 7).step_by(2) {
            self.set(6, i, false);
            self.set(i, 6, false);
        }
        let far = size as i32 - 4;
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let dist: i32 = dx.abs().max(dy.abs());
                if dist == 2 || dist == 4 {
                    self.set_unbounded(3 + dx, 3 + dy, false);
                    self.set_unbounded(far + dx, 3 + dy, false);
                    self.set_unbounded(3 + dx, far + dy, false);
                }
            }
        }
        let alignpatpos = ver.alignment_pattern_positions();
        for (i, &pos0) in alignpatpos.iter().enumerate() {
            for (j, &pos1) in alignpatpos.iter().enumerate() {
                if is_finder_corner(i, j, alignpatpos.len()) {
                    continue;
                }
                for y in pos1 - 1..=pos1 + 1 {
                    for x in pos0 - 1..=pos0 + 1 {
                        self.set(x, y, x == pos0 && y == pos1);
                    }
                }
            }
        }
        let ver = u32::from(ver.value());
        if ver >= 7 {
            let bits: u32 = {
                let mut rem: u32 = ver;
                for _ in 0..12 {
                    rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
                }
                (ver << 12) | rem
            };
            for i in 0..18 {
                let bit = get_bit(bits, i);
                let a = size - 11 + (i % 3);
                let b = i / 3;
                self.set(a, b, bit);
                self.set(b, a, bit);
            }
        }
    }

    fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits = format_bits(ecl, mask);
        for i in 0..6 {
            self.set(8, i, get_bit(bits, i));
        }
        self.set(8, 7, get_bit(bits, 6));
        self.set(8, 8, get_bit(bits, 7));
        self.set(7, 8, get_bit(bits, 8));
        for i in 9..15 {
            self.set(14 - i, 8, get_bit(bits, i));
        }
        let size = self.width;
        for i in 0..8 {
            self.set(size - 1 - i, 8, get_bit(bits, i));
        }
        for i in 8..15 {
            self.set(8, size - 15 + i, get_bit(bits, i));
        }
        self.set(8, size - 8, true);
    }

    /// Places the codeword bits in the zig-zag order, skipping modules already marked dark.
    fn draw_codewords(&mut self, codewords: &BitArray) {
        let size = self.width as i32;
        let mut i: usize = 0;
        let mut right: i32 = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                for j in 0..2 {
                    let x = (right - j) as usize;
                    let y = (if upward { size - 1 - vert } else { vert }) as usize;
                    if !self.get(x, y) && i < codewords.size() {
                        self.set(x, y, codewords.get(i));
                        i += 1;
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, codewords.size());
    }

    /// The bits `mask` inverts, for a grid whose dark modules are the function modules.
    fn mask_pattern(&self, mask: Mask) -> Result<BitArray, ArgumentError> {
        let mut pattern = BitArray::with_size(self.width * self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get(x, y) && mask.inverts(x, y) {
                    pattern.set(self.index(x, y), true);
                }
            }
        }
        Ok(pattern)
    }

    /// XORs a mask pattern in. Applying the same pattern twice undoes it.
    fn apply_mask(&mut self, pattern: &BitArray) -> Result<(), ArgumentError> {
        self.modules.xor(pattern)
    }

    fn penalty_score(&self) -> i32 {
        let mut result: i32 = 0;
        let size = self.width;
        for y in 0..size {
            result += self.line_penalty(|i| self.get(i, y));
        }
        for x in 0..size {
            result += self.line_penalty(|i| self.get(x, i));
        }
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.get(x, y);
                if
                    color == self.get(x + 1, y) &&
                    color == self.get(x, y + 1) &&
                    color == self.get(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }
        let dark = self.count_dark() as i32;
        let total = (size * size) as i32;
        let k: i32 = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k * PENALTY_N4;
        result
    }

    /// Run-length and finder-like penalties along one row or column.
    fn line_penalty(&self, module: impl Fn(usize) -> bool) -> i32 {
        let mut result: i32 = 0;
        let mut runcolor = false;
        let mut runlen: i32 = 0;
        let mut runhistory = FinderPenalty::new(self.width);
        for i in 0..self.width {
            if module(i) == runcolor {
                runlen += 1;
                if runlen == 5 {
                    result += PENALTY_N1;
                } else if runlen > 5 {
                    result += 1;
                }
            } else {
                runhistory.add_history(runlen);
                if !runcolor {
                    result += runhistory.count_patterns() * PENALTY_N3;
                }
                runcolor = module(i);
                runlen = 1;
            }
        }
        result + runhistory.terminate_and_count(runcolor, runlen) * PENALTY_N3
    }
}

/// The three alignment pattern slots that would overlap a finder pattern.
fn is_finder_corner(i: usize, j: usize, count: usize) -> bool {
    let last = count - 1;
    (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0)
}

fn format_bits(ecl: QrCodeEcc, mask: Mask) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem: u32 = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

/// A QR Code symbol: its version, error correction level, mask and module matrix.
///
/// Symbols built by [`QrEncoder`] always carry a matrix. Other [`Encoder`] implementations may
/// hand back a symbol without one, which the writer reports as an invalid state.
///
/// # Example
///
/// ```rust
/// use qirender::qrcode::{QrCode, QrCodeEcc, Version};
///
/// let qr = QrCode::encode_text(
///     "Hello, World!",
///     QrCodeEcc::Low,
///     Version::MIN,
///     Version::MAX,
///     None,
///     true,
/// ).unwrap();
///
/// println!("Version: {}", qr.version().value());
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    ecl: QrCodeEcc,
    mask: Mask,
    matrix: Option<ModuleMatrix>,
}

impl QrCode {
    /// Assembles a symbol from already computed parts.
    pub fn new(version: Version, ecl: QrCodeEcc, mask: Mask, matrix: Option<ModuleMatrix>) -> Self {
        Self {
            version,
            ecl,
            mask,
            matrix,
        }
    }

    /// Encodes `text` as a single segment.
    ///
    /// The text becomes a single numeric, alphanumeric or byte segment, whichever is the most
    /// compact mode that can represent all of it. The smallest version within the given range
    /// that can hold the data is chosen. If `boostecl` is `true`, the error correction level may
    /// be increased if it doesn't increase the version. The `mask` can be `None` for automatic
    /// selection (slower) or a fixed pattern.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::SegmentTooLong`] or [`EncodeError::DataOverCapacity`] if the text
    /// does not fit in `maxversion`.
    pub fn encode_text(
        text: &str,
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool
    ) -> Result<Self, EncodeError> {
        if text.is_empty() {
            return Self::encode_segments(&[], ecl, minversion, maxversion, mask, boostecl);
        }
        let seg = if QrSegment::is_numeric(text) {
            QrSegment::make_numeric(text)?
        } else if QrSegment::is_alphanumeric(text) {
            QrSegment::make_alphanumeric(text)?
        } else {
            QrSegment::make_bytes(text.as_bytes())?
        };
        debug!(mode = ?seg.mode(), chars = seg.num_chars(), "selected segment mode");
        Self::encode_segments(&[seg], ecl, minversion, maxversion, mask, boostecl)
    }

    /// Encodes binary data into a QR code as a single byte-mode segment.
    ///
    /// # Errors
    ///
    /// Same as [`encode_text`](QrCode::encode_text).
    pub fn encode_binary(
        data: &[u8],
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool
    ) -> Result<Self, EncodeError> {
        let seg = QrSegment::make_bytes(data)?;
        Self::encode_segments(&[seg], ecl, minversion, maxversion, mask, boostecl)
    }

    /// Encodes the given segments, in order, into a QR code.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InvalidVersionRange`] if `minversion > maxversion`, and the
    /// capacity errors of [`encode_text`](QrCode::encode_text).
    pub fn encode_segments(
        segs: &[QrSegment],
        ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        mask: Option<Mask>,
        boostecl: bool
    ) -> Result<Self, EncodeError> {
        let (datacodewords, ecl, version) = Self::encode_segments_to_codewords(
            segs,
            ecl,
            minversion,
            maxversion,
            boostecl
        )?;
        Self::encode_codewords(&datacodewords, ecl, version, mask)
    }

    /// Picks the version and level, then returns the padded data codewords.
    fn encode_segments_to_codewords(
        segs: &[QrSegment],
        mut ecl: QrCodeEcc,
        minversion: Version,
        maxversion: Version,
        boostecl: bool
    ) -> Result<(Vec<u8>, QrCodeEcc, Version), EncodeError> {
        if minversion > maxversion {
            return Err(EncodeError::InvalidVersionRange {
                min: minversion.value(),
                max: maxversion.value(),
            });
        }

        // Smallest version that holds the data
        let mut version: Version = minversion;
        let datausedbits: usize = loop {
            let datacapacitybits: usize = version.num_data_codewords(ecl) * 8;
            let dataused: Option<usize> = QrSegment::get_total_bits(segs, version);
            match dataused {
                Some(n) if n <= datacapacitybits => {
                    break n;
                }
                None if version >= maxversion => {
                    return Err(EncodeError::SegmentTooLong);
                }
                Some(n) if version >= maxversion => {
                    return Err(EncodeError::DataOverCapacity(n, datacapacitybits));
                }
                _ => {
                    version = Version::new(version.value() + 1);
                }
            }
        };

        // Boost the level when the chosen version still has room
        for &newecl in &[QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            if boostecl && datausedbits <= version.num_data_codewords(newecl) * 8 {
                ecl = newecl;
            }
        }

        // Mode indicator, character count and payload for each segment
        let datacapacitybits: usize = version.num_data_codewords(ecl) * 8;
        let mut bb = BitArray::new();
        for seg in segs {
            bb.append_bits(seg.mode.mode_bits(), 4)?;
            bb.append_bits(seg.numchars as u32, seg.mode.num_char_count_bits(version))?;
            bb.append_bit_array(&seg.data);
        }
        debug_assert_eq!(bb.size(), datausedbits);

        // Terminator, then zero bits up to a byte boundary
        let numzerobits: usize = core::cmp::min(4, datacapacitybits - bb.size());
        bb.append_bits(0, numzerobits)?;
        let numzerobits: usize = bb.size().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits)?;
        debug_assert_eq!(bb.size() % 8, 0);

        // Fill the remaining capacity with the pad codewords
        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.size() >= datacapacitybits {
                break;
            }
            bb.append_bits(padbyte, 8)?;
        }

        let numbytes = bb.size_in_bytes();
        let mut datacodewords = vec![0u8; numbytes];
        bb.to_bytes(0, &mut datacodewords, 0, numbytes);
        Ok((datacodewords, ecl, version))
    }

    /// Adds error correction, draws the modules and applies the mask.
    fn encode_codewords(
        datacodewords: &[u8],
        ecl: QrCodeEcc,
        version: Version,
        msk: Option<Mask>
    ) -> Result<Self, EncodeError> {
        let allcodewords = add_ecc_and_interleave(datacodewords, version, ecl);
        let mut codewordbits = BitArray::new();
        for &b in &allcodewords {
            codewordbits.append_bits(b.into(), 8)?;
        }

        // Draw modules
        let mut result = ModuleMatrix::function_modules_marked(version)?;
        result.draw_codewords(&codewordbits);
        result.draw_light_function_modules(version);
        let funcmods = ModuleMatrix::function_modules_marked(version)?;

        // Do masking
        let msk: Mask = match msk {
            Some(msk) => msk,
            None => {
                let mut best: Option<(i32, Mask)> = None;
                for i in 0u8..8 {
                    let candidate = Mask::new(i);
                    let pattern = funcmods.mask_pattern(candidate)?;
                    result.apply_mask(&pattern)?;
                    result.draw_format_bits(ecl, candidate);
                    let penalty: i32 = result.penalty_score();
                    trace!(mask = i, penalty, "scored mask");
                    if best.map_or(true, |(minpenalty, _)| penalty < minpenalty) {
                        best = Some((penalty, candidate));
                    }
                    result.apply_mask(&pattern)?; // Undoes the mask due to XOR
                }
                best.map_or(Mask::new(0), |(_, msk)| msk)
            }
        };
        result.apply_mask(&funcmods.mask_pattern(msk)?)?;
        result.draw_format_bits(ecl, msk);

        debug!(
            version = version.value(),
            ecl = ?ecl,
            mask = msk.value(),
            "encoded QR code"
        );
        Ok(Self::new(version, ecl, msk, Some(result)))
    }

    /// Version picked by the encoder.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Side length in modules, 21 to 177.
    pub fn size(&self) -> i32 {
        self.matrix.as_ref().map_or(self.version.size(), ModuleMatrix::width) as i32
    }

    /// Error correction level actually used, after any boost.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Mask pattern applied to the data modules.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// The module matrix, if the encoder produced one.
    pub fn matrix(&self) -> Option<&ModuleMatrix> {
        self.matrix.as_ref()
    }

    /// Whether the module at `(x, y)` is dark.
    ///
    /// Out-of-range coordinates, and symbols without a matrix, read as light.
    ///
    /// # Arguments
    ///
    /// * `x` - Column, counted from the left edge.
    /// * `y` - Row, counted from the top edge.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        self.matrix.as_ref().map_or(false, |m| {
            (0..m.width() as i32).contains(&x) &&
                (0..m.height() as i32).contains(&y) &&
                m.get(x as usize, y as usize)
        })
    }
}

/// Splits the data into blocks, appends each block's ECC and interleaves the result.
fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
    assert_eq!(data.len(), ver.num_data_codewords(ecl));
    let numblocks: usize = ver.table_get(&NUM_ERROR_CORRECTION_BLOCKS, ecl);
    let blockecclen: usize = ver.table_get(&ECC_CODEWORDS_PER_BLOCK, ecl);
    let rawcodewords: usize = ver.num_raw_data_modules() / 8;
    let numshortblocks: usize = numblocks - (rawcodewords % numblocks);
    let shortblockdatalen: usize = rawcodewords / numblocks - blockecclen;
    let mut result = vec![0u8; rawcodewords];
    let rs = ReedSolomonGenerator::new(blockecclen);
    let mut dat: &[u8] = data;
    for i in 0..numblocks {
        let datlen: usize = shortblockdatalen + usize::from(i >= numshortblocks);
        let ecc = rs.compute_remainder(&dat[..datlen]);
        let mut k: usize = i;
        for (j, &b) in dat[..datlen].iter().enumerate() {
            if j == shortblockdatalen {
                k -= numshortblocks;
            }
            result[k] = b;
            k += numblocks;
        }
        let mut k: usize = data.len() + i;
        for &b in &ecc {
            result[k] = b;
            k += numblocks;
        }
        dat = &dat[datlen..];
    }
    debug_assert_eq!(dat.len(), 0);
    result
}

/// Reed-Solomon ECC generator over GF(2^8/0x11D).
struct ReedSolomonGenerator {
    divisor: Vec<u8>,
}

impl ReedSolomonGenerator {
    fn new(degree: usize) -> Self {
        assert!((1..=30).contains(&degree), "Degree out of range");
        let mut divisor = vec![0u8; degree];
        divisor[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = Self::multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = Self::multiply(root, 0x02);
        }
        Self { divisor }
    }

    fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.divisor.len()];
        for b in data {
            let factor: u8 = b ^ result[0];
            result.rotate_left(1);
            let last = result.len() - 1;
            result[last] = 0;
            for (x, &y) in result.iter_mut().zip(&self.divisor) {
                *x ^= Self::multiply(y, factor);
            }
        }
        result
    }

    fn multiply(x: u8, y: u8) -> u8 {
        let mut z: u8 = 0;
        for i in (0..8).rev() {
            z = (z << 1) ^ ((z >> 7) * 0x1d);
            z ^= ((y >> i) & 1) * x;
        }
        z
    }
}

/// History of the last seven run lengths, for spotting finder-like 1:1:3:1:1 patterns.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: usize) -> Self {
        Self {
            qr_size: size as i32,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size; // Add light border to initial run
        }
        self.run_history.copy_within(0..6, 1);
        self.run_history[0] = currentrunlength;
    }

    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        i32::from(
            n > 0 &&
                rh[2] == n &&
                rh[3] == n * 3 &&
                rh[4] == n &&
                rh[5] == n &&
                (rh[0] >= n * 4 || rh[6] >= n * 4)
        )
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> i32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// How much of the symbol is spent on error correction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QrCodeEcc {
    /// About 7% of codewords recoverable.
    Low,
    /// About 15% of codewords recoverable.
    Medium,
    /// About 25% of codewords recoverable.
    Quartile,
    /// About 30% of codewords recoverable.
    High,
}

impl QrCodeEcc {
    /// Row index into the per-level tables.
    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// The two level bits of the format information.
    fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

/// A run of text encoded in a single mode.
///
/// Holds the segment's mode, its character count and its payload bits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: BitArray,
}

impl QrSegment {
    /// Byte-mode segment holding `data` verbatim.
    ///
    /// # Errors
    ///
    /// Only fails if the bit buffer rejects a write, which does not happen for byte input.
    pub fn make_bytes(data: &[u8]) -> Result<Self, EncodeError> {
        let mut bb = BitArray::new();
        for &b in data {
            bb.append_bits(b.into(), 8)?;
        }
        Ok(QrSegment::new(QrSegmentMode::Byte, data.len(), bb))
    }

    /// Numeric-mode segment: digits packed three to ten bits.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnencodableCharacter`] if `text` contains non-digit characters.
    pub fn make_numeric(text: &str) -> Result<Self, EncodeError> {
        let mut bb = BitArray::new();
        let mut accumdata: u32 = 0;
        let mut accumcount: usize = 0;
        for c in text.chars() {
            let digit = c.to_digit(10).ok_or(EncodeError::UnencodableCharacter {
                character: c,
                mode: QrSegmentMode::Numeric,
            })?;
            accumdata = accumdata * 10 + digit;
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10)?;
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1)?;
        }
        Ok(QrSegment::new(QrSegmentMode::Numeric, text.len(), bb))
    }

    /// Alphanumeric-mode segment: character pairs packed into eleven bits.
    ///
    /// The charset is digits, uppercase letters, space and `$%*+-./:`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnencodableCharacter`] for any other character.
    pub fn make_alphanumeric(text: &str) -> Result<Self, EncodeError> {
        let mut bb = BitArray::new();
        let mut accumdata: u32 = 0;
        let mut accumcount: usize = 0;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET.find(c).ok_or(EncodeError::UnencodableCharacter {
                character: c,
                mode: QrSegmentMode::Alphanumeric,
            })?;
            accumdata = accumdata * 45 + i as u32;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11)?;
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6)?;
        }
        Ok(QrSegment::new(QrSegmentMode::Alphanumeric, text.len(), bb))
    }

    pub fn new(mode: QrSegmentMode, numchars: usize, data: BitArray) -> Self {
        Self {
            mode,
            numchars,
            data,
        }
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    /// The payload bits, without mode indicator or character count.
    pub fn data(&self) -> &BitArray {
        &self.data
    }

    fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits = seg.mode.num_char_count_bits(version);
            if seg.numchars >= 1usize << ccbits {
                return None;
            }
            result = result.checked_add(4 + ccbits)?;
            result = result.checked_add(seg.data.size())?;
        }
        Some(result)
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Describes how a segment's data bits are interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
}

impl QrSegmentMode {
    fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
        }
    }

    fn num_char_count_bits(self, ver: Version) -> usize {
        use QrSegmentMode::*;
        (
            match self {
                Numeric => [10, 12, 14],
                Alphanumeric => [9, 11, 13],
                Byte => [8, 16, 16],
            }
        )[usize::from((ver.value() + 7) / 17)]
    }
}

/// Errors from the QR encoder.
///
/// A capacity error can usually be fixed by lowering the error correction level or raising
/// the maximum version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// A segment's character count does not fit its count field.
    #[error("Segment too long")]
    SegmentTooLong,
    /// Encoded bits, and the capacity of the largest allowed version.
    #[error("Data length = {0} bits, Max capacity = {1} bits")]
    DataOverCapacity(usize, usize),
    /// The text holds a character the requested mode cannot represent.
    #[error("{character:?} cannot be encoded in {mode:?} mode")]
    UnencodableCharacter {
        /// The offending character.
        character: char,
        /// The mode that rejected it.
        mode: QrSegmentMode,
    },
    /// The minimum version is above the maximum version.
    #[error("minimum version {min} is greater than maximum version {max}")]
    InvalidVersionRange {
        /// Requested minimum version.
        min: u8,
        /// Requested maximum version.
        max: u8,
    },
    /// A bit buffer operation failed.
    #[error(transparent)]
    BitBuffer(#[from] ArgumentError),
}

/// Symbol version, 1 through 40. Version `v` is `4v + 17` modules wide.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// Smallest symbol, 21x21.
    pub const MIN: Version = Version(1);

    /// Largest symbol, 177x177.
    pub const MAX: Version = Version(40);

    /// Wraps a version number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Like [`new`](Version::new), but returns `None` outside [1, 40].
    pub const fn try_new(ver: u8) -> Option<Self> {
        if Version::MIN.value() <= ver && ver <= Version::MAX.value() {
            Some(Self(ver))
        } else {
            None
        }
    }

    /// The version number.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules, `version * 4 + 17`.
    pub const fn size(self) -> usize {
        (self.0 as usize) * 4 + 17
    }

    /// Number of modules available for data and ECC, including remainder bits.
    fn num_raw_data_modules(self) -> usize {
        let ver = usize::from(self.0);
        let mut result: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            result -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    fn num_data_codewords(self, ecl: QrCodeEcc) -> usize {
        self.num_raw_data_modules() / 8 -
            self.table_get(&ECC_CODEWORDS_PER_BLOCK, ecl) *
                self.table_get(&NUM_ERROR_CORRECTION_BLOCKS, ecl)
    }

    fn table_get(self, table: &'static [[i8; 41]; 4], ecl: QrCodeEcc) -> usize {
        table[ecl.ordinal()][usize::from(self.0)] as usize
    }

    /// Center coordinates of the alignment patterns along either axis, ascending.
    fn alignment_pattern_positions(self) -> Vec<usize> {
        let ver = usize::from(self.0);
        if ver == 1 {
            return Vec::new();
        }
        let numalign = ver / 7 + 2;
        let step = if ver == 32 {
            26
        } else {
            ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
        };
        let size = self.size();
        let mut result: Vec<usize> = (0..numalign - 1).map(|i| size - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }
}

/// One of the eight data mask patterns.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Wraps a mask number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Like [`new`](Mask::new), but returns `None` above 7.
    pub const fn try_new(mask: u8) -> Option<Self> {
        if mask <= 7 { Some(Self(mask)) } else { None }
    }

    /// The mask number.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this mask inverts the module at `(x, y)`.
    fn inverts(self, x: usize, y: usize) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => ((x * y) % 2) + ((x * y) % 3) == 0,
            6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
            7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

fn get_bit(x: u32, i: usize) -> bool {
    ((x >> i) & 1) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn encode(text: &str, ecl: QrCodeEcc, mask: Option<Mask>) -> QrCode {
        QrCode::encode_text(text, ecl, Version::MIN, Version::MAX, mask, false).unwrap()
    }

    #[test]
    fn test_is_numeric() {
        assert!(QrSegment::is_numeric("0042"));
        assert!(!QrSegment::is_numeric("42a"));
        assert!(!QrSegment::is_numeric("4 2"));
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(QrSegment::is_alphanumeric("HELLO WORLD $%*+-./:"));
        assert!(!QrSegment::is_alphanumeric("Hello World"));
    }

    #[test]
    fn test_make_numeric_bits() {
        let seg = QrSegment::make_numeric("01234567").unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::Numeric);
        assert_eq!(seg.num_chars(), 8);
        // 012 -> 10 bits, 345 -> 10 bits, 67 -> 7 bits
        assert_eq!(seg.data().size(), 27);
    }

    #[test]
    fn test_make_alphanumeric_rejects_lowercase() {
        assert_eq!(
            QrSegment::make_alphanumeric("Hello").unwrap_err(),
            EncodeError::UnencodableCharacter {
                character: 'e',
                mode: QrSegmentMode::Alphanumeric,
            }
        );
    }

    #[test]
    fn test_data_codewords_hello_world() {
        let seg = QrSegment::make_alphanumeric("HELLO WORLD").unwrap();
        let version = Version::new(1);
        let (data, ecl, ver) = QrCode::encode_segments_to_codewords(
            &[seg],
            QrCodeEcc::Medium,
            version,
            version,
            false
        ).unwrap();
        assert_eq!(ecl, QrCodeEcc::Medium);
        assert_eq!(ver, version);
        assert_eq!(
            data,
            vec![32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17]
        );
    }

    #[test]
    fn test_reed_solomon_remainder() {
        let data = [32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236, 17, 236, 17];
        let rs = ReedSolomonGenerator::new(10);
        assert_eq!(
            rs.compute_remainder(&data),
            vec![196, 35, 39, 119, 235, 215, 231, 226, 93, 23]
        );
    }

    #[test_case("HELLO", 1; "short alphanumeric")]
    #[test_case("Hello, world!", 1; "short bytes")]
    #[test_case("12345678901234567890123456789012345678901", 1; "41 digits fit version 1")]
    #[test_case("12345678901234567890123456789012345678901234", 2; "44 digits need version 2")]
    fn test_picks_smallest_version(text: &str, expected: u8) {
        let qr = encode(text, QrCodeEcc::Low, None);
        assert_eq!(qr.version().value(), expected);
        assert_eq!(qr.size(), i32::from(expected) * 4 + 17);
    }

    #[test]
    fn test_boost_ecl() {
        let qr = QrCode::encode_text(
            "HELLO",
            QrCodeEcc::Low,
            Version::MIN,
            Version::MAX,
            None,
            true
        ).unwrap();
        assert_eq!(qr.version().value(), 1);
        assert_eq!(qr.error_correction_level(), QrCodeEcc::High);
    }

    #[test]
    fn test_data_over_capacity() {
        let data = vec![b'a'; 3000];
        let err = QrCode::encode_binary(
            &data,
            QrCodeEcc::Low,
            Version::MIN,
            Version::MAX,
            None,
            false
        ).unwrap_err();
        assert_eq!(err, EncodeError::DataOverCapacity(4 + 16 + 3000 * 8, 2956 * 8));
    }

    #[test]
    fn test_invalid_version_range() {
        let err = QrCode::encode_text(
            "HELLO",
            QrCodeEcc::Low,
            Version::new(5),
            Version::new(2),
            None,
            false
        ).unwrap_err();
        assert_eq!(err, EncodeError::InvalidVersionRange { min: 5, max: 2 });
    }

    #[test_case(1; "version 1")]
    #[test_case(7; "version 7 with version info")]
    fn test_function_patterns(ver: u8) {
        let version = Version::new(ver);
        let qr = QrCode::encode_text(
            "HELLO",
            QrCodeEcc::Medium,
            version,
            version,
            None,
            false
        ).unwrap();
        let size = qr.size();
        for (cx, cy) in [(3, 3), (size - 4, 3), (3, size - 4)] {
            for dy in -4..=4i32 {
                for dx in -4..=4i32 {
                    let dist = dx.abs().max(dy.abs());
                    let expected = dist != 2 && dist != 4;
                    let (x, y) = (cx + dx, cy + dy);
                    if (0..size).contains(&x) && (0..size).contains(&y) {
                        assert_eq!(qr.get_module(x, y), expected, "finder module ({}, {})", x, y);
                    }
                }
            }
        }
        for i in 8..size - 8 {
            assert_eq!(qr.get_module(i, 6), i % 2 == 0, "horizontal timing {}", i);
            assert_eq!(qr.get_module(6, i), i % 2 == 0, "vertical timing {}", i);
        }
        assert!(qr.get_module(8, size - 8));
        assert!(!qr.get_module(-1, 0));
        assert!(!qr.get_module(0, size));
    }

    #[test]
    fn test_format_bits_low_mask_0() {
        let qr = encode("HELLO", QrCodeEcc::Low, Some(Mask::new(0)));
        let mut bits: u32 = 0;
        for i in 0..6 {
            bits |= u32::from(qr.get_module(8, i)) << i;
        }
        bits |= u32::from(qr.get_module(8, 7)) << 6;
        bits |= u32::from(qr.get_module(8, 8)) << 7;
        bits |= u32::from(qr.get_module(7, 8)) << 8;
        for i in 9..15 {
            bits |= u32::from(qr.get_module(14 - i, 8)) << i;
        }
        assert_eq!(bits, 0x77C4);
        assert_eq!(format_bits(QrCodeEcc::Low, Mask::new(0)), 0x77C4);
    }

    #[test]
    fn test_auto_mask_matches_fixed_mask() {
        let auto = encode("https://example.com", QrCodeEcc::Quartile, None);
        let fixed = encode("https://example.com", QrCodeEcc::Quartile, Some(auto.mask()));
        assert_eq!(auto, fixed);
    }

    #[test]
    fn test_masks_differ_only_outside_function_modules() {
        let a = encode("HELLO", QrCodeEcc::Low, Some(Mask::new(1)));
        let b = encode("HELLO", QrCodeEcc::Low, Some(Mask::new(1)));
        let c = encode("HELLO", QrCodeEcc::Low, Some(Mask::new(2)));
        assert_eq!(a, b);
        assert_ne!(a.matrix(), c.matrix());
        // Finder patterns are never masked.
        for i in 0..7 {
            assert_eq!(a.get_module(i, 0), c.get_module(i, 0));
        }
    }

    #[test]
    fn test_alignment_pattern_positions() {
        assert!(Version::new(1).alignment_pattern_positions().is_empty());
        assert_eq!(Version::new(2).alignment_pattern_positions(), vec![6, 18]);
        assert_eq!(Version::new(7).alignment_pattern_positions(), vec![6, 22, 38]);
        assert_eq!(Version::new(32).alignment_pattern_positions(), vec![6, 34, 60, 86, 112, 138]);
    }

    #[test]
    fn test_num_data_codewords() {
        assert_eq!(Version::new(1).num_data_codewords(QrCodeEcc::Low), 19);
        assert_eq!(Version::new(1).num_data_codewords(QrCodeEcc::High), 9);
        assert_eq!(Version::new(40).num_data_codewords(QrCodeEcc::Low), 2956);
    }

    #[test]
    fn test_module_matrix() {
        let mut matrix = ModuleMatrix::new(5, 3).unwrap();
        matrix.set(4, 2, true);
        matrix.set(0, 1, true);
        assert!(matrix.get(4, 2));
        assert!(!matrix.get(3, 2));
        assert_eq!(matrix.count_dark(), 2);
        assert_eq!(ModuleMatrix::new(0, 3).unwrap_err(), ArgumentError::InvalidSize(0));
    }

    #[test]
    fn test_version_and_mask_ranges() {
        assert_eq!(Version::try_new(0), None);
        assert_eq!(Version::try_new(41), None);
        assert_eq!(Version::try_new(40), Some(Version::MAX));
        assert_eq!(Mask::try_new(8), None);
        assert_eq!(Mask::try_new(7).map(Mask::value), Some(7));
    }
}
