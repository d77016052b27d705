use anyhow::{Context, Result, anyhow, bail};
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};
use little_exif::endian::Endian;
use little_exif::exif_tag::{ExifTag, ExifTagGroup};
use little_exif::exif_tag_format::ExifTagFormat;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use std::path::Path;

use super::tags::{self, Section, TagInfo, ValueKind};
use super::tiff::{self, RawEntry};
use crate::config::JpegOptions;
use crate::metadata::{MetadataMap, WriteResult};

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// img-parts set_exif() expects just the TIFF data (after Exif\0\0)
const JPEG_EXIF_OVERHEAD: usize = 10;

const APP1: u8 = 0xE1;
const APP13: u8 = 0xED;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";
const XMP_PREFIX: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const IPTC_PREFIX: &[u8] = b"Photoshop 3.0\0";
const USER_COMMENT_ASCII: &[u8] = b"ASCII\0\0\0";
/// Entry count 0, no next IFD.
const EMPTY_IFD: [u8; 6] = [0; 6];

/// Write named EXIF tags into a copy of a JPEG, preserving existing EXIF.
///
/// `metadata == None` clears the EXIF block instead (see [`clear_exif`]).
///
/// Keys are EXIF tag names such as `Make`, `Artist`, or `DateTimeOriginal`.
/// Unknown names, read-only tags, and values that don't fit the tag's type
/// are skipped and listed in the result. Only the EXIF APP1 segment changes;
/// the compressed image data is copied byte for byte.
pub fn write_exif(
    input: &Path,
    output: &Path,
    metadata: Option<&MetadataMap>,
    options: &JpegOptions,
) -> Result<WriteResult> {
    let Some(map) = metadata else {
        return clear_exif(input, output, options);
    };

    let mut jpeg = load_jpeg(input)?;
    let existing_tiff = jpeg.exif();
    let mut result = WriteResult {
        output_path: output.to_path_buf(),
        ..Default::default()
    };

    let new_tags = collect_tags(map, &mut result);

    if new_tags.is_empty() {
        log::warn!("No writable EXIF tags given; saving an unchanged copy");
    } else {
        let tiff_data = merged_tiff_data(input, existing_tiff.as_deref(), &new_tags)?;
        replace_exif_segment(&mut jpeg, tiff_data);
    }

    save_jpeg(jpeg, output)?;
    Ok(result)
}

/// Save a copy of a JPEG without its EXIF block.
///
/// With `options.clear_xmp_iptc`, XMP (APP1) and IPTC (APP13) segments are
/// dropped as well.
pub fn clear_exif(input: &Path, output: &Path, options: &JpegOptions) -> Result<WriteResult> {
    let mut jpeg = load_jpeg(input)?;

    if jpeg.exif().is_some() {
        log::debug!("Removing EXIF segment");
    } else {
        log::debug!("{} has no EXIF segment", input.display());
    }
    jpeg.set_exif(None);

    if options.clear_xmp_iptc {
        let segments = jpeg.segments_mut();
        let before = segments.len();
        segments.retain(|s| !is_xmp_segment(s) && !is_iptc_segment(s));
        log::debug!("Removed {} XMP/IPTC segments", before - segments.len());
    }

    save_jpeg(jpeg, output)?;
    Ok(WriteResult {
        output_path: output.to_path_buf(),
        cleared: true,
        ..Default::default()
    })
}

fn load_jpeg(path: &Path) -> Result<Jpeg> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file {}", path.display()))?;
    Jpeg::from_bytes(Bytes::from(bytes)).map_err(|e| anyhow!("Failed to parse JPEG: {e}"))
}

fn save_jpeg(jpeg: Jpeg, output: &Path) -> Result<()> {
    let bytes = jpeg.encoder().bytes();
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write JPEG file {}", output.display()))?;
    log::debug!("Saved JPEG to {}", output.display());
    Ok(())
}

/// Turn `name=value` pairs into little_exif tags, recording what was skipped.
fn collect_tags(map: &MetadataMap, result: &mut WriteResult) -> Vec<ExifTag> {
    let mut new_tags = Vec::new();

    for (key, value) in map.iter() {
        let Some(info) = tags::by_name(key) else {
            result.skip(key, "unknown EXIF tag");
            continue;
        };
        if !info.writable {
            result.skip(key, "tag is read-only");
            continue;
        }

        match build_tag(info, value) {
            Ok(tag) => {
                log::debug!("  {key}: {value}");
                new_tags.push(tag);
                result.written.push(key.to_string());
            }
            Err(reason) => result.skip(key, reason),
        }
    }

    new_tags
}

/// Build a little_exif tag for `info` from a text value.
fn build_tag(info: &TagInfo, value: &str) -> Result<ExifTag, String> {
    match info.kind {
        ValueKind::Ascii => {
            let tag = ascii_tag(info.code, value.to_string())
                .ok_or_else(|| format!("no ASCII writer for {}", info.name))?;
            // Date tags have a fixed size of 20 including the NUL
            let size = tag.number_of_components();
            if tag.value_as_u8_vec(&Endian::Little).len() as u32 > size {
                return Err(format!("longer than {} characters", size - 1));
            }
            Ok(tag)
        }
        ValueKind::Short => {
            let raw = parse_list(value, |v| v.parse::<u16>().ok())
                .ok_or_else(|| format!("expected an integer, got {value:?}"))?
                .into_iter()
                .flat_map(u16::to_le_bytes)
                .collect();
            raw_tag(info, &ExifTagFormat::INT16U, raw)
        }
        ValueKind::Rational => {
            let raw = parse_list(value, parse_rational)
                .ok_or_else(|| format!("expected a rational like 1/250 or 2.8, got {value:?}"))?
                .into_iter()
                .flat_map(|(num, den)| num.to_le_bytes().into_iter().chain(den.to_le_bytes()))
                .collect();
            raw_tag(info, &ExifTagFormat::RATIONAL64U, raw)
        }
        ValueKind::Xp => raw_tag(info, &ExifTagFormat::INT8U, encode_utf16le(value)),
        ValueKind::Comment => {
            let mut comment = USER_COMMENT_ASCII.to_vec();
            comment.extend_from_slice(value.as_bytes());
            Ok(ExifTag::UserComment(comment))
        }
        _ => Err(format!("{} cannot be written", info.name)),
    }
}

/// Native little_exif variants for the writable ASCII tags.
fn ascii_tag(code: u16, value: String) -> Option<ExifTag> {
    let tag = match code {
        0x010E => ExifTag::ImageDescription(value),
        0x010F => ExifTag::Make(value),
        0x0110 => ExifTag::Model(value),
        0x0131 => ExifTag::Software(value),
        0x0132 => ExifTag::ModifyDate(value),
        0x013B => ExifTag::Artist(value),
        0x8298 => ExifTag::Copyright(value),
        0x9003 => ExifTag::DateTimeOriginal(value),
        0x9004 => ExifTag::CreateDate(value),
        _ => return None,
    };
    Some(tag)
}

/// Build a tag from little-endian raw bytes.
fn raw_tag(info: &TagInfo, format: &ExifTagFormat, raw: Vec<u8>) -> Result<ExifTag, String> {
    let group = match info.section {
        Section::Image => ExifTagGroup::IFD0,
        Section::Exif => ExifTagGroup::ExifIFD,
        Section::Gps => ExifTagGroup::GPSIFD,
    };
    ExifTag::from_u16_with_data(info.code, format, &raw, &Endian::Little, &group)
        .map_err(|e| format!("could not encode {}: {e:?}", info.name))
}

/// Parse a comma-separated list, failing if any element fails.
fn parse_list<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let items: Option<Vec<T>> = value.split(',').map(|v| parse(v.trim())).collect();
    items.filter(|v| !v.is_empty())
}

/// Parse `n/d` or a non-negative decimal into an unsigned rational.
fn parse_rational(s: &str) -> Option<(u32, u32)> {
    if let Some((num, den)) = s.split_once('/') {
        let num = num.trim().parse().ok()?;
        let den: u32 = den.trim().parse().ok()?;
        return (den != 0).then_some((num, den));
    }

    let value: f64 = s.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let decimals = s.split_once('.').map_or(0, |(_, frac)| frac.len().min(6));
    let den = 10u32.pow(decimals as u32);
    let num = (value * den as f64).round();
    (num <= u32::MAX as f64).then_some((num as u32, den))
}

/// Encode a string as UTF-16LE bytes with a NUL terminator (used for XP* tags).
fn encode_utf16le(s: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = s.encode_utf16().flat_map(|c| c.to_le_bytes()).collect();
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Load existing EXIF metadata from a file path using little_exif.
/// Returns None if there is none or it can't be parsed.
fn load_existing_metadata(path: &Path) -> Option<Metadata> {
    let path_owned = path.to_path_buf();
    // little_exif panics on some malformed blocks
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(move || Metadata::new_from_path(&path_owned));
    std::panic::set_hook(prev_hook);

    match result {
        Ok(Ok(m)) if !m.data().is_empty() => {
            log::debug!("little_exif loaded {} existing EXIF tags", m.data().len());
            Some(m)
        }
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        Err(_) => {
            log::debug!("little_exif panicked parsing EXIF");
            None
        }
    }
}

/// Merge new tags into the file's existing EXIF and return the TIFF payload.
fn merged_tiff_data(
    input: &Path,
    existing_tiff: Option<&[u8]>,
    new_tags: &[ExifTag],
) -> Result<Vec<u8>> {
    let existing = if existing_tiff.is_some() {
        load_existing_metadata(input)
    } else {
        None
    };
    let mut metadata = match existing {
        Some(m) => m,
        None => {
            if existing_tiff.is_some() {
                log::warn!("Existing EXIF in {} could not be parsed; it will be replaced", input.display());
            }
            Metadata::new()
        }
    };

    for tag in new_tags {
        metadata.set_tag(tag.clone());
    }

    match existing_tiff.and_then(tiff::gps_entries) {
        Some((source_endian, gps)) => {
            log::debug!("Carrying over {} GPS entries", gps.len());
            append_gps_ifd(&mut metadata, source_endian, gps)
        }
        None => tiff_payload(&metadata),
    }
}

/// Serialize with little_exif and strip the APP1 framing.
fn tiff_payload(metadata: &Metadata) -> Result<Vec<u8>> {
    let exif_bytes = metadata.as_u8_vec(FileExtension::JPEG);
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        bail!("EXIF serialization produced no data");
    }
    Ok(exif_bytes[JPEG_EXIF_OVERHEAD..].to_vec())
}

/// Serialize `metadata` with the original GPS directory appended after
/// little_exif's output and linked from IFD0.
fn append_gps_ifd(
    metadata: &mut Metadata,
    source_endian: Endian,
    mut gps: Vec<RawEntry>,
) -> Result<Vec<u8>> {
    if source_endian != *metadata.get_endian() {
        gps.iter_mut().for_each(tiff::swap_byte_order);
    }

    // The pointer value sits inline in its IFD0 entry, so the payload length
    // does not depend on it.
    metadata.set_tag(ExifTag::GPSInfo(vec![0]));
    let mut end = tiff_payload(metadata)?.len();

    // IFD0 always links an Exif IFD; with no Exif entries that link points
    // at the end of the payload, so give it an empty directory to land on.
    let has_exif_ifd = metadata
        .data()
        .iter()
        .any(|t| t.get_group() == ExifTagGroup::ExifIFD && t.is_writable());
    if !has_exif_ifd {
        end += EMPTY_IFD.len();
    }
    let gps_offset = end.next_multiple_of(2);

    metadata.set_tag(ExifTag::GPSInfo(vec![gps_offset as u32]));
    let mut tiff_data = tiff_payload(metadata)?;
    if !has_exif_ifd {
        tiff_data.extend_from_slice(&EMPTY_IFD);
    }
    tiff_data.resize(gps_offset, 0);
    tiff_data.extend(tiff::encode_ifd(&gps, gps_offset as u32, metadata.get_endian()));
    Ok(tiff_data)
}

/// Swap in a new EXIF payload, keeping the segment where the old one was.
fn replace_exif_segment(jpeg: &mut Jpeg, tiff_data: Vec<u8>) {
    let orig_exif_pos = find_exif_segment_pos(jpeg);
    jpeg.set_exif(Some(Bytes::from(tiff_data)));

    // set_exif() inserts at a fixed position, which may be after XMP APP1.
    // Move the EXIF segment back so EXIF comes before XMP.
    if let Some(new_pos) = find_exif_segment_pos(jpeg) {
        let target_pos = orig_exif_pos.unwrap_or(1); // default: right after APP0
        if target_pos < new_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            segments.insert(target_pos, seg);
        }
    }
}

/// Find the position of the EXIF APP1 segment in a JPEG.
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == APP1 && s.contents().starts_with(EXIF_PREFIX))
}

fn is_xmp_segment(segment: &JpegSegment) -> bool {
    segment.marker() == APP1 && segment.contents().starts_with(XMP_PREFIX)
}

fn is_iptc_segment(segment: &JpegSegment) -> bool {
    segment.marker() == APP13 && segment.contents().starts_with(IPTC_PREFIX)
}
