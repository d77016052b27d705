//! # meta-tool
//!
//! Read and write document metadata in PDF and JPEG files: the Info
//! dictionary of a PDF, the EXIF block of a JPEG.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through the pipeline module, which
//! dispatches on the file extension:
//!
//! ```rust,no_run
//! use meta_tool::config::Config;
//! use meta_tool::metadata::parse_metadata_string;
//! use meta_tool::pipeline::{FileKind, default_output_path, write_metadata};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let input = Path::new("photo.jpg");
//!
//!     let meta = parse_metadata_string("Make=Canon;Artist=Max");
//!     let output = default_output_path(FileKind::detect(input)?, &config);
//!     let result = write_metadata(input, &output, Some(&meta), &config)?;
//!
//!     println!("Modified file saved as '{}'", result.output_path.display());
//!     for skipped in &result.skipped {
//!         eprintln!("Skipped {}: {}", skipped.key, skipped.reason);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! The format modules can be called directly:
//!
//! ```rust,no_run
//! use meta_tool::config::PdfOptions;
//! use meta_tool::metadata::parse_metadata_string;
//! use meta_tool::pdf::{read_pdf_metadata, write_pdf_metadata};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let info = read_pdf_metadata(Path::new("report.pdf"))?;
//!     println!("Title: {}", info.title().unwrap_or("unknown"));
//!
//!     let meta = parse_metadata_string("/Title=Annual Report;/Author=Max");
//!     let options = PdfOptions { stamp_mod_date: true };
//!     write_pdf_metadata("report.pdf".as_ref(), "modMeta.pdf".as_ref(), Some(&meta), &options)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Read | Write |
//! |--------|------|-------|
//! | PDF (`.pdf`) | Info dictionary | Replaces the Info dictionary |
//! | JPEG (`.jpg`, `.jpeg`) | IFD0, Exif and GPS directories | Merges tags into the EXIF block |
//!
//! ## Modules
//!
//! - [`config`]: Configuration types and loading/saving
//! - [`exif`]: EXIF reading and writing for JPEG
//! - [`metadata`]: Metadata maps and the `key=value;...` parser
//! - [`pdf`]: PDF Info dictionary reading and writing
//! - [`pipeline`]: Format detection and read/write dispatch

pub mod config;
pub mod exif;
pub mod metadata;
pub mod pdf;
pub mod pipeline;
