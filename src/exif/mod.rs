//! EXIF metadata reading and writing for JPEG images.
//!
//! This module provides three main functions:
//!
//! - [`read_exif`]: Read the IFD0, Exif, and GPS directories of a JPEG
//! - [`write_exif`]: Save a copy with named tags set, preserving existing EXIF
//! - [`clear_exif`]: Save a copy with the EXIF block removed
//!
//! Tag names follow the usual EXIF naming (`Make`, `Model`, `DateTimeOriginal`,
//! ...); see [`tags::TAGS`] for the full list and which of them are writable.

mod reader;
pub mod tags;
mod tiff;
mod writer;

pub use reader::{ExifData, ExifEntry, read_exif};
pub use tags::Section;
pub use writer::{clear_exif, write_exif};
