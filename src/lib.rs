//! # qirender
//!
//! A Rust library for encoding QR codes and rendering them into pixel rasters of any size.
//!
//! `qirender` pairs a compact, word-packed [`BitArray`](bitarray::BitArray) with a writer that
//! scales a QR symbol by a whole number of pixels per module, centers it and keeps a quiet zone
//! around it. Symbols come from any [`Encoder`](qrcode::Encoder); the built-in
//! [`QrEncoder`](qrcode::QrEncoder) implements QR Code Model 2, versions 1 to 40, with all four
//! error correction levels.
//!
//! ## Features
//!
//! - Bit array with range set/test, word-at-a-time scanning, XOR, byte packing and reversal.
//! - Encode text in numeric, alphanumeric or byte mode.
//! - Render to a [`BitMatrix`](bitmatrix::BitMatrix) of at least the requested size.
//! - Convert rasters to `image` buffers, SVG strings or console output.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qirender = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Render a QR code at 200x200 pixels with a two-module margin:
//!
//! ```rust
//! use qirender::hints::EncodeHints;
//! use qirender::qrcode::QrCodeEcc;
//! use qirender::writer::{BarcodeFormat, QrCodeWriter};
//!
//! let hints = EncodeHints::default()
//!     .with_error_correction(QrCodeEcc::Medium)
//!     .with_margin(2);
//! let matrix = QrCodeWriter::new()
//!     .encode("https://example.com", BarcodeFormat::QrCode, 200, 200, Some(&hints))
//!     .unwrap();
//! assert_eq!((matrix.width(), matrix.height()), (200, 200));
//!
//! let img = matrix.to_image();
//! assert_eq!(img.dimensions(), (200, 200));
//! ```
//!
//! ## Modules
//!
//! - [`bitarray`]: Growable array of bits packed into 32-bit words.
//! - [`bitmatrix`]: The rendered pixel raster.
//! - [`qrcode`]: The encoder contract and the built-in QR encoder.
//! - [`writer`]: Validation, option handling and rasterization.
//! - [`hints`]: Options for the writer and encoder.
//! - [`helper`]: Utilities for turning rasters into images and SVG.
//! - [`error`]: Error types.

pub mod bitarray;
pub mod bitmatrix;
pub mod error;
pub mod helper;
pub mod hints;
pub mod qrcode;
pub mod writer;

pub use error::{ArgumentError, Error, Result};
