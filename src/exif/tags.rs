//! Names, codes, and value types of the EXIF tags this tool knows about.

use serde::Serialize;

/// Which directory of the EXIF block a tag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// IFD0, the main image directory ("0th").
    Image,
    /// The Exif sub-IFD (capture settings).
    Exif,
    /// The GPS sub-IFD.
    Gps,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Image => "Image (IFD0)",
            Self::Exif => "Exif",
            Self::Gps => "GPS",
        }
    }
}

/// How a tag's value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Ascii,
    Byte,
    Short,
    Long,
    Rational,
    SRational,
    /// Windows XP* tags: UTF-16LE text in a BYTE array.
    Xp,
    /// UserComment: 8-byte charset header followed by text.
    Comment,
    Undefined,
    /// Offset to a sub-IFD; never displayed or written.
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    pub name: &'static str,
    pub code: u16,
    pub section: Section,
    pub kind: ValueKind,
    pub writable: bool,
}

const fn tag(name: &'static str, code: u16, section: Section, kind: ValueKind, writable: bool) -> TagInfo {
    TagInfo { name, code, section, kind, writable }
}

use Section::{Exif, Gps, Image};
use ValueKind::*;

pub const TAGS: &[TagInfo] = &[
    // IFD0
    tag("ImageWidth", 0x0100, Image, Long, false),
    tag("ImageLength", 0x0101, Image, Long, false),
    tag("DocumentName", 0x010D, Image, Ascii, false),
    tag("ImageDescription", 0x010E, Image, Ascii, true),
    tag("Make", 0x010F, Image, Ascii, true),
    tag("Model", 0x0110, Image, Ascii, true),
    tag("Orientation", 0x0112, Image, Short, true),
    tag("XResolution", 0x011A, Image, Rational, true),
    tag("YResolution", 0x011B, Image, Rational, true),
    tag("ResolutionUnit", 0x0128, Image, Short, true),
    tag("Software", 0x0131, Image, Ascii, true),
    tag("DateTime", 0x0132, Image, Ascii, true),
    tag("Artist", 0x013B, Image, Ascii, true),
    tag("HostComputer", 0x013C, Image, Ascii, false),
    tag("YCbCrPositioning", 0x0213, Image, Short, false),
    tag("Copyright", 0x8298, Image, Ascii, true),
    tag("ExifTag", 0x8769, Image, Pointer, false),
    tag("GPSTag", 0x8825, Image, Pointer, false),
    tag("XPTitle", 0x9C9B, Image, Xp, true),
    tag("XPComment", 0x9C9C, Image, Xp, true),
    tag("XPAuthor", 0x9C9D, Image, Xp, true),
    tag("XPKeywords", 0x9C9E, Image, Xp, true),
    tag("XPSubject", 0x9C9F, Image, Xp, true),
    // Exif sub-IFD
    tag("ExposureTime", 0x829A, Exif, Rational, true),
    tag("FNumber", 0x829D, Exif, Rational, true),
    tag("ExposureProgram", 0x8822, Exif, Short, true),
    tag("ISOSpeedRatings", 0x8827, Exif, Short, true),
    tag("ExifVersion", 0x9000, Exif, Undefined, false),
    tag("DateTimeOriginal", 0x9003, Exif, Ascii, true),
    tag("DateTimeDigitized", 0x9004, Exif, Ascii, true),
    tag("OffsetTime", 0x9010, Exif, Ascii, false),
    tag("ShutterSpeedValue", 0x9201, Exif, SRational, false),
    tag("ApertureValue", 0x9202, Exif, Rational, false),
    tag("ExposureBiasValue", 0x9204, Exif, SRational, false),
    tag("MeteringMode", 0x9207, Exif, Short, true),
    tag("Flash", 0x9209, Exif, Short, true),
    tag("FocalLength", 0x920A, Exif, Rational, true),
    tag("MakerNote", 0x927C, Exif, Undefined, false),
    tag("UserComment", 0x9286, Exif, Comment, true),
    tag("ColorSpace", 0xA001, Exif, Short, false),
    tag("PixelXDimension", 0xA002, Exif, Long, false),
    tag("PixelYDimension", 0xA003, Exif, Long, false),
    tag("InteroperabilityTag", 0xA005, Exif, Pointer, false),
    tag("FocalLengthIn35mmFilm", 0xA405, Exif, Short, true),
    tag("LensMake", 0xA433, Exif, Ascii, false),
    tag("LensModel", 0xA434, Exif, Ascii, false),
    // GPS sub-IFD
    tag("GPSVersionID", 0x0000, Gps, Byte, false),
    tag("GPSLatitudeRef", 0x0001, Gps, Ascii, false),
    tag("GPSLatitude", 0x0002, Gps, Rational, false),
    tag("GPSLongitudeRef", 0x0003, Gps, Ascii, false),
    tag("GPSLongitude", 0x0004, Gps, Rational, false),
    tag("GPSAltitudeRef", 0x0005, Gps, Byte, false),
    tag("GPSAltitude", 0x0006, Gps, Rational, false),
    tag("GPSTimeStamp", 0x0007, Gps, Rational, false),
    tag("GPSSatellites", 0x0008, Gps, Ascii, false),
    tag("GPSStatus", 0x0009, Gps, Ascii, false),
    tag("GPSMeasureMode", 0x000A, Gps, Ascii, false),
    tag("GPSDOP", 0x000B, Gps, Rational, false),
    tag("GPSSpeedRef", 0x000C, Gps, Ascii, false),
    tag("GPSSpeed", 0x000D, Gps, Rational, false),
    tag("GPSImgDirectionRef", 0x0010, Gps, Ascii, false),
    tag("GPSImgDirection", 0x0011, Gps, Rational, false),
    tag("GPSMapDatum", 0x0012, Gps, Ascii, false),
    tag("GPSProcessingMethod", 0x001B, Gps, Undefined, false),
    tag("GPSDateStamp", 0x001D, Gps, Ascii, false),
];

/// Find a tag by its exact name (e.g. `"Make"`, `"DateTimeOriginal"`).
pub fn by_name(name: &str) -> Option<&'static TagInfo> {
    TAGS.iter().find(|t| t.name == name)
}

/// Find a tag by numeric code.
///
/// GPS codes (0x00–0x1F) never collide with IFD0 or Exif codes, so the code
/// alone identifies the tag.
pub fn by_code(code: u16) -> Option<&'static TagInfo> {
    TAGS.iter().find(|t| t.code == code)
}

/// Best guess at the section of a tag missing from [`TAGS`].
pub fn guess_section(code: u16) -> Section {
    match code {
        0x0000..=0x001F => Section::Gps,
        0x829A..=0xBFFF => Section::Exif,
        _ => Section::Image,
    }
}

/// Names of all tags that can be written, in table order.
pub fn writable_names() -> impl Iterator<Item = &'static str> {
    TAGS.iter().filter(|t| t.writable).map(|t| t.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_is_case_sensitive() {
        assert_eq!(by_name("Make").map(|t| t.code), Some(0x010F));
        assert!(by_name("make").is_none());
    }

    #[test]
    fn lookup_by_code() {
        let tag = by_code(0x001B).unwrap();
        assert_eq!(tag.name, "GPSProcessingMethod");
        assert_eq!(tag.section, Section::Gps);
    }

    #[test]
    fn codes_and_names_are_unique() {
        for (i, a) in TAGS.iter().enumerate() {
            for b in &TAGS[i + 1..] {
                assert_ne!(a.code, b.code, "{} and {} share a code", a.name, b.name);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn gps_and_pointer_tags_are_read_only() {
        assert!(TAGS
            .iter()
            .filter(|t| t.section == Section::Gps || t.kind == ValueKind::Pointer)
            .all(|t| !t.writable));
    }

    #[test]
    fn unknown_codes_get_a_section() {
        assert_eq!(guess_section(0x001E), Section::Gps);
        assert_eq!(guess_section(0x9290), Section::Exif);
        assert_eq!(guess_section(0x02BC), Section::Image);
    }

    #[test]
    fn common_camera_tags_are_writable() {
        let names: Vec<_> = writable_names().collect();
        for name in ["Make", "Model", "Artist", "Copyright", "DateTimeOriginal", "ImageDescription"] {
            assert!(names.contains(&name), "{name} should be writable");
        }
    }
}
