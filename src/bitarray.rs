//! A growable array of bits packed into 32-bit words.
//!
//! Bit `i` lives in word `i >> 5` at position `i & 31`, least-significant bit first. This is the
//! storage used for the encoder's data bit stream, its module grid and the rows of a rendered
//! [`BitMatrix`](crate::bitmatrix::BitMatrix).

use core::fmt;

use crate::error::ArgumentError;

/// Maps `(x & -x) % 37` to the number of trailing zeros of `x`.
///
/// `2^k mod 37` is distinct for every `k` in `0..32`, so the isolated lowest set bit lands on a
/// unique slot. Slot 0 is only reached for `x == 0`.
static TRAILING_ZEROS: [u8; 37] = [
    32, 0, 1, 26, 2, 23, 27, 0, 3, 16, 24, 30, 28, 11, 0, 13, 4, 7, 17, 0, 25, 22, 31, 15, 29, 10,
    12, 6, 0, 21, 14, 9, 5, 20, 8, 19, 18,
];

fn number_of_trailing_zeros(num: u32) -> usize {
    let index = (num.wrapping_neg() & num) % 37;
    usize::from(TRAILING_ZEROS[index as usize])
}

/// Mask covering bits `first_bit..=last_bit` of a word.
fn word_mask(first_bit: usize, last_bit: usize) -> u32 {
    if first_bit == 0 && last_bit == 31 {
        u32::MAX
    } else {
        (u32::MAX >> (31 - last_bit)) & (u32::MAX << first_bit)
    }
}

fn words_for(size: usize) -> usize {
    (size + 31) >> 5
}

/// A simple, fast array of bits, represented compactly by a vector of `u32` words.
///
/// Accessors only check indices against the allocated words, not against [`size`]: reading or
/// writing a bit in `size..words().len() * 32` succeeds silently.
///
/// # Example
///
/// ```rust
/// use qirender::bitarray::BitArray;
///
/// let mut bits = BitArray::new();
/// bits.append_bits(0b011110, 6).unwrap();
/// assert_eq!(bits.size(), 6);
/// assert_eq!(bits.next_set(0), 1);
/// assert_eq!(bits.next_unset(1), 5);
/// ```
///
/// [`size`]: BitArray::size
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitArray {
    bits: Vec<u32>,
    size: usize,
}

impl BitArray {
    /// Creates an empty array with a single backing word.
    pub fn new() -> Self {
        Self {
            bits: vec![0; 1],
            size: 0,
        }
    }

    /// Creates an array of `size` unset bits.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidSize`] if `size` is zero.
    pub fn with_size(size: usize) -> Result<Self, ArgumentError> {
        if size < 1 {
            return Err(ArgumentError::InvalidSize(size));
        }
        Ok(Self {
            bits: vec![0; words_for(size)],
            size,
        })
    }

    /// Number of logical bits.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of bytes needed to hold [`size`](BitArray::size) bits.
    pub fn size_in_bytes(&self) -> usize {
        (self.size + 7) >> 3
    }

    /// The backing words. The first word holds the first 32 bits, least-significant bit first.
    pub fn words(&self) -> &[u32] {
        &self.bits
    }

    pub fn get(&self, i: usize) -> bool {
        (self.bits[i >> 5] & (1 << (i & 0x1F))) != 0
    }

    pub fn set(&mut self, i: usize, value: bool) {
        if value {
            self.bits[i >> 5] |= 1 << (i & 0x1F);
        } else {
            self.bits[i >> 5] &= !(1 << (i & 0x1F));
        }
    }

    /// Flips bit `i`.
    pub fn flip(&mut self, i: usize) {
        self.bits[i >> 5] ^= 1 << (i & 0x1F);
    }

    fn ensure_capacity(&mut self, size: usize) {
        if size > self.bits.len() << 5 {
            self.bits.resize(words_for(size), 0);
        }
    }

    /// Index of the first set bit at or after `from`, or [`size`](BitArray::size) if there is none.
    pub fn next_set(&self, from: usize) -> usize {
        self.next_matching(from, |word| word)
    }

    /// Index of the first unset bit at or after `from`, or [`size`](BitArray::size) if there is
    /// none.
    pub fn next_unset(&self, from: usize) -> usize {
        self.next_matching(from, |word| !word)
    }

    /// Word-at-a-time scan. `view` turns a backing word into one where the wanted bits are ones.
    fn next_matching(&self, from: usize, view: impl Fn(u32) -> u32) -> usize {
        if from >= self.size {
            return self.size;
        }
        let mut offset = from >> 5;
        // mask off lesser bits first
        let mut current = view(self.bits[offset]) & !((1u32 << (from & 0x1F)) - 1);
        while current == 0 {
            offset += 1;
            if offset == self.bits.len() {
                return self.size;
            }
            current = view(self.bits[offset]);
        }
        let result = (offset << 5) + number_of_trailing_zeros(current);
        result.min(self.size)
    }

    /// Overwrites the whole word containing bit `i`.
    ///
    /// The word is selected by `i >> 5`; the low five bits of `i` are ignored. Bit 0 of
    /// `new_bits` lands on the first bit of that word.
    pub fn set_bulk(&mut self, i: usize, new_bits: u32) {
        self.bits[i >> 5] = new_bits;
    }

    /// Sets every bit in `start..end`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidRange`] if `end < start`.
    pub fn set_range(&mut self, start: usize, end: usize) -> Result<(), ArgumentError> {
        if end < start {
            return Err(ArgumentError::InvalidRange { start, end });
        }
        if end == start {
            return Ok(());
        }
        let last = end - 1;
        let first_int = start >> 5;
        let last_int = last >> 5;
        for i in first_int..=last_int {
            let first_bit = if i > first_int { 0 } else { start & 0x1F };
            let last_bit = if i < last_int { 31 } else { last & 0x1F };
            self.bits[i] |= word_mask(first_bit, last_bit);
        }
        Ok(())
    }

    /// Clears all bits. The logical size is unchanged.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Checks whether every bit in `start..end` equals `value`. An empty range matches.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidRange`] if `end < start`.
    pub fn is_range(&self, start: usize, end: usize, value: bool) -> Result<bool, ArgumentError> {
        if end < start {
            return Err(ArgumentError::InvalidRange { start, end });
        }
        if end == start {
            return Ok(true);
        }
        let last = end - 1;
        let first_int = start >> 5;
        let last_int = last >> 5;
        for i in first_int..=last_int {
            let first_bit = if i > first_int { 0 } else { start & 0x1F };
            let last_bit = if i < last_int { 31 } else { last & 0x1F };
            let mask = word_mask(first_bit, last_bit);
            if (self.bits[i] & mask) != (if value { mask } else { 0 }) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn append_bit(&mut self, bit: bool) {
        self.ensure_capacity(self.size + 1);
        if bit {
            self.bits[self.size >> 5] |= 1 << (self.size & 0x1F);
        }
        self.size += 1;
    }

    /// Appends the `num_bits` least-significant bits of `value`, most-significant first.
    ///
    /// Appending 6 bits from `0x1E` appends `0, 1, 1, 1, 1, 0` in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidBitCount`] if `num_bits > 32`.
    pub fn append_bits(&mut self, value: u32, num_bits: usize) -> Result<(), ArgumentError> {
        if num_bits > 32 {
            return Err(ArgumentError::InvalidBitCount(num_bits));
        }
        self.ensure_capacity(self.size + num_bits);
        for bits_left in (1..=num_bits).rev() {
            self.append_bit(((value >> (bits_left - 1)) & 0x01) == 1);
        }
        Ok(())
    }

    /// Appends a copy of every logical bit of `other`.
    pub fn append_bit_array(&mut self, other: &BitArray) {
        self.ensure_capacity(self.size + other.size);
        for i in 0..other.size {
            self.append_bit(other.get(i));
        }
    }

    /// XORs `other` into `self`, word by word.
    ///
    /// Only the backing word counts must agree; the logical sizes may differ.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::WordLengthMismatch`] if the word counts differ.
    pub fn xor(&mut self, other: &BitArray) -> Result<(), ArgumentError> {
        if self.bits.len() != other.bits.len() {
            return Err(ArgumentError::WordLengthMismatch {
                left: self.bits.len(),
                right: other.bits.len(),
            });
        }
        for (word, other) in self.bits.iter_mut().zip(&other.bits) {
            *word ^= other;
        }
        Ok(())
    }

    /// Packs `num_bytes` bytes starting at `bit_offset` into `array[offset..]`.
    ///
    /// Each byte is written most-significant bit first, the opposite of the internal layout.
    pub fn to_bytes(&self, mut bit_offset: usize, array: &mut [u8], offset: usize, num_bytes: usize) {
        for byte in &mut array[offset..offset + num_bytes] {
            let mut the_byte = 0u8;
            for j in 0..8 {
                if self.get(bit_offset) {
                    the_byte |= 1 << (7 - j);
                }
                bit_offset += 1;
            }
            *byte = the_byte;
        }
    }

    /// Reverses the order of the logical bits.
    pub fn reverse(&mut self) {
        let mut new_bits = vec![0u32; self.bits.len()];
        let size = self.size;
        for i in 0..size {
            if self.get(size - i - 1) {
                new_bits[i >> 5] |= 1 << (i & 0x1F);
            }
        }
        self.bits = new_bits;
    }
}

impl Default for BitArray {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BitArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.size {
            if (i & 0x07) == 0 {
                f.write_str(" ")?;
            }
            f.write_str(if self.get(i) { "X" } else { "." })?;
        }
        Ok(())
    }
}
