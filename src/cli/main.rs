use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use meta_tool::exif::{ExifData, Section};
use meta_tool::metadata::{WriteResult, parse_metadata_string};
use meta_tool::pdf::{PdfInfo, STANDARD_KEYS};
use meta_tool::pipeline::{self, FileKind, MetadataReport, Operation};
use meta_tool::config;

const AFTER_HELP: &str = "\
Valid PDF metadata keys:
  /Title, /Author, /Subject, /Creator, /Producer, /CreationDate, /ModDate
  (any other /Name is written as a custom entry)

Common JPEG EXIF tags:
  Make, Model, DateTimeOriginal, DateTime, Artist, Copyright, Software,
  Orientation, ExposureTime, FNumber, ISOSpeedRatings, FocalLength, Flash,
  ImageDescription, UserComment, XPTitle, XPKeywords
  (GPS tags are shown when reading but cannot be written)

Examples:
  meta-tool report.pdf r
  meta-tool report.pdf w -m \"/Title=My PDF;/Author=Max\"
  meta-tool photo.jpg w -m \"Make=Canon;Model=EOS 5D;FNumber=2.8\"
  meta-tool photo.jpg w                  (clears the EXIF block)
  meta-tool photo.jpg r --json";

#[derive(Parser, Debug)]
#[command(
    name = "meta-tool",
    version,
    about = "Read and write metadata in PDF and JPEG files",
    after_help = AFTER_HELP
)]
struct Cli {
    /// PDF or JPEG file to read from or write to
    #[arg(value_name = "FILE", required_unless_present = "init")]
    file: Option<PathBuf>,

    /// Operation: r (read) or w (write)
    #[arg(value_name = "OPERATION", required_unless_present = "init")]
    operation: Option<OperationArg>,

    /// Metadata to write, as "key=value;key=value". Omit to clear.
    #[arg(short, long, value_name = "PAIRS")]
    metadata: Option<String>,

    /// Where to save the modified copy (default: modMeta.pdf / modMeta.jpg)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OperationArg {
    #[value(name = "r", alias = "read")]
    Read,
    #[value(name = "w", alias = "write")]
    Write,
}

impl From<OperationArg> for Operation {
    fn from(op: OperationArg) -> Self {
        match op {
            OperationArg::Read => Operation::Read,
            OperationArg::Write => Operation::Write,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let (Some(file), Some(operation)) = (cli.file.as_deref(), cli.operation) else {
        bail!("No input file or operation specified. Use --help for usage.");
    };

    let config = config::Config::load(cli.config.as_deref())?;

    match Operation::from(operation) {
        Operation::Read => {
            if cli.metadata.is_some() {
                log::warn!("--metadata is ignored when reading");
            }
            let report = pipeline::read_metadata(file)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match &report {
                    MetadataReport::Pdf(info) => print_pdf_info(file, info),
                    MetadataReport::Jpeg(data) => print_exif(file, data),
                }
            }
        }
        Operation::Write => {
            let kind = FileKind::detect(file)?;
            let metadata = cli
                .metadata
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(parse_metadata_string);
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| pipeline::default_output_path(kind, &config));

            let result = pipeline::write_metadata(file, &output, metadata.as_ref(), &config)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_write_result(&result);
            }
        }
    }

    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Value column width for wrapping in metadata tables.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (2 leading + 22 tag + 3 separator).
const INDENT: &str = "                           ";

fn print_header(path: &Path) {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));
}

fn print_section_title(title: &str) {
    println!("  {BOLD}{title}{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(70));
}

/// Print the PDF Info dictionary: standard fields first, then custom keys.
fn print_pdf_info(path: &Path, info: &PdfInfo) {
    print_header(path);

    print_section_title("Document Info");
    for (key, label) in STANDARD_KEYS {
        print_row(label, info.get(key).unwrap_or("unknown"));
    }
    println!();

    let custom: Vec<_> = info.custom_entries().collect();
    if !custom.is_empty() {
        print_section_title("Custom Entries");
        for (key, value) in custom {
            print_row(key, value);
        }
        println!();
    }

    print_section_title("Document");
    print_row("PDF Version", &info.version);
    print_row("Pages", &info.page_count.to_string());
    if info.encrypted {
        print_row("Encrypted", "yes");
    }
    println!();
}

/// Print EXIF metadata for a JPEG, organized by directory.
fn print_exif(path: &Path, data: &ExifData) {
    print_header(path);

    if let Some((w, h)) = data.dimensions {
        print_row("ImageSize", &format!("{w} x {h}"));
        println!();
    }

    if data.is_empty() {
        println!("  {DIM}No general EXIF metadata found.{RESET}");
        println!();
        return;
    }

    for section in [Section::Image, Section::Exif, Section::Gps] {
        let entries = data.section(section);
        if entries.is_empty() {
            continue;
        }
        print_section_title(section.title());
        for entry in entries {
            print_row(&entry.tag, &entry.value);
        }
        println!();
    }
}

fn print_write_result(result: &WriteResult) {
    let verb = if result.cleared { "cleared" } else { "updated" };
    println!(
        "{GREEN}Metadata {verb}.{RESET} Modified file saved as '{}'.",
        result.output_path.display()
    );

    if !result.written.is_empty() {
        log::info!("  Wrote: {}", result.written.join(", "));
    }

    if !result.skipped.is_empty() {
        println!();
        println!("  {BOLD}Skipped{RESET}");
        for skipped in &result.skipped {
            print_skipped(&skipped.key, &skipped.reason);
        }
    }
}

fn print_skipped(tag: &str, reason: &str) {
    let tag_col = format!("{:<22}", tag);
    println!("  {DIM}{tag_col} : {reason}{RESET}");
}

/// Print a single row in a metadata table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_read_and_write_aliases() {
        let cli = Cli::try_parse_from(["meta-tool", "doc.pdf", "read"]).unwrap();
        assert!(matches!(cli.operation, Some(OperationArg::Read)));

        let cli = Cli::try_parse_from(["meta-tool", "photo.jpg", "w", "-m", "Make=Canon"]).unwrap();
        assert!(matches!(cli.operation, Some(OperationArg::Write)));
        assert_eq!(cli.metadata.as_deref(), Some("Make=Canon"));
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(Cli::try_parse_from(["meta-tool", "doc.pdf", "x"]).is_err());
    }

    #[test]
    fn file_is_optional_with_init() {
        let cli = Cli::try_parse_from(["meta-tool", "--init"]).unwrap();
        assert!(cli.init);
        assert!(cli.file.is_none());
        assert!(Cli::try_parse_from(["meta-tool"]).is_err());
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }
}
