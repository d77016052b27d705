//! Raw TIFF directory access for the GPS IFD.
//!
//! little_exif serializes only IFD0 and the Exif IFD, and decodes GPS tag
//! 0x0001 as the Interop tag of the same code, so the GPS directory is
//! copied across at the byte level instead.

use little_exif::endian::Endian;

const TAG_GPS_INFO: u16 = 0x8825;
const IFD_ENTRY_LEN: usize = 12;

/// One directory entry with its value bytes resolved from any offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub tag: u16,
    pub format: u16,
    pub count: u32,
    pub value: Vec<u8>,
}

/// Size of one component of a TIFF field type, or None if unknown.
fn format_size(format: u16) -> Option<usize> {
    match format {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 | 11 => Some(4),
        5 | 10 | 12 => Some(8),
        _ => None,
    }
}

/// Width of the integers that make up a component, for byte swapping.
fn swap_unit(format: u16) -> usize {
    match format {
        // numerator and denominator are swapped separately
        5 | 10 => 4,
        f => format_size(f).unwrap_or(1),
    }
}

struct Reader<'a> {
    data: &'a [u8],
    endian: Endian,
}

impl Reader<'_> {
    fn bytes(&self, at: usize, len: usize) -> Option<&[u8]> {
        self.data.get(at..at.checked_add(len)?)
    }

    fn u16(&self, at: usize) -> Option<u16> {
        let b: [u8; 2] = self.bytes(at, 2)?.try_into().ok()?;
        Some(match self.endian {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        })
    }

    fn u32(&self, at: usize) -> Option<u32> {
        let b: [u8; 4] = self.bytes(at, 4)?.try_into().ok()?;
        Some(match self.endian {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        })
    }

    fn entries(&self, ifd_offset: usize) -> Option<Vec<RawEntry>> {
        let count = self.u16(ifd_offset)? as usize;
        let mut entries = Vec::with_capacity(count);

        for i in 0..count {
            let at = ifd_offset + 2 + i * IFD_ENTRY_LEN;
            let tag = self.u16(at)?;
            let format = self.u16(at + 2)?;
            let components = self.u32(at + 4)?;
            let Some(size) = format_size(format) else {
                log::debug!("Skipping GPS entry 0x{tag:04X} with unknown type {format}");
                continue;
            };

            let len = size.checked_mul(components as usize)?;
            let value = if len <= 4 {
                self.bytes(at + 8, len)?
            } else {
                self.bytes(self.u32(at + 8)? as usize, len)?
            };

            entries.push(RawEntry {
                tag,
                format,
                count: components,
                value: value.to_vec(),
            });
        }

        Some(entries)
    }
}

/// Read the GPS directory of a TIFF payload (the EXIF block without its
/// `Exif\0\0` prefix).
///
/// Returns the payload's byte order and the GPS entries, or None when there
/// is no GPS IFD or the block is malformed.
pub(crate) fn gps_entries(tiff: &[u8]) -> Option<(Endian, Vec<RawEntry>)> {
    let endian = match tiff.get(0..2)? {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        _ => return None,
    };
    let reader = Reader { data: tiff, endian };

    let ifd0 = reader.u32(4)? as usize;
    let ifd0_entries = reader.u16(ifd0)? as usize;
    let gps_offset = (0..ifd0_entries).find_map(|i| {
        let at = ifd0 + 2 + i * IFD_ENTRY_LEN;
        (reader.u16(at)? == TAG_GPS_INFO).then(|| reader.u32(at + 8)).flatten()
    })?;

    let entries = reader.entries(gps_offset as usize)?;
    if entries.is_empty() {
        return None;
    }
    Some((reader.endian, entries))
}

/// Re-order the value bytes of `entry` from one byte order to the other.
pub(crate) fn swap_byte_order(entry: &mut RawEntry) {
    let unit = swap_unit(entry.format);
    if unit > 1 {
        entry.value.chunks_mut(unit).for_each(<[u8]>::reverse);
    }
}

fn u16_bytes(v: u16, endian: &Endian) -> [u8; 2] {
    match endian {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    }
}

fn u32_bytes(v: u32, endian: &Endian) -> [u8; 4] {
    match endian {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    }
}

/// Encode entries as a directory placed at `offset` in the payload, with
/// values larger than four bytes stored right after it.
pub(crate) fn encode_ifd(entries: &[RawEntry], offset: u32, endian: &Endian) -> Vec<u8> {
    let mut dir = u16_bytes(entries.len() as u16, endian).to_vec();
    let mut data_area = Vec::new();
    let mut data_offset = offset + (2 + IFD_ENTRY_LEN * entries.len() + 4) as u32;

    for entry in entries {
        dir.extend(u16_bytes(entry.tag, endian));
        dir.extend(u16_bytes(entry.format, endian));
        dir.extend(u32_bytes(entry.count, endian));

        if entry.value.len() > 4 {
            dir.extend(u32_bytes(data_offset, endian));
            data_area.extend_from_slice(&entry.value);
            if entry.value.len() % 2 == 1 {
                data_area.push(0);
            }
            data_offset += entry.value.len().next_multiple_of(2) as u32;
        } else {
            let mut inline = entry.value.clone();
            inline.resize(4, 0);
            dir.extend(inline);
        }
    }

    // no next IFD
    dir.extend([0u8; 4]);
    dir.extend(data_area);
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Little-endian payload: IFD0 with Make and a GPS pointer, GPS IFD with
    /// GPSLatitudeRef and GPSLatitude.
    fn sample_tiff() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(b"II\x2a\x00\x08\x00\x00\x00");
        t.extend(2u16.to_le_bytes());
        t.extend([0x0F, 0x01, 2, 0]);
        t.extend(4u32.to_le_bytes());
        t.extend(b"Cam\0");
        t.extend([0x25, 0x88, 4, 0]);
        t.extend(1u32.to_le_bytes());
        t.extend(38u32.to_le_bytes());
        t.extend(0u32.to_le_bytes());
        t.extend(2u16.to_le_bytes());
        t.extend([0x01, 0x00, 2, 0]);
        t.extend(2u32.to_le_bytes());
        t.extend(b"N\0\0\0");
        t.extend([0x02, 0x00, 5, 0]);
        t.extend(3u32.to_le_bytes());
        t.extend(68u32.to_le_bytes());
        t.extend(0u32.to_le_bytes());
        for v in [51u32, 1, 30, 1, 0, 1] {
            t.extend(v.to_le_bytes());
        }
        t
    }

    #[test]
    fn finds_gps_entries() {
        let (endian, entries) = gps_entries(&sample_tiff()).unwrap();
        assert_eq!(endian, Endian::Little);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, 0x0001);
        assert_eq!(entries[0].value, b"N\0");
        assert_eq!(entries[1].count, 3);
        assert_eq!(entries[1].value.len(), 24);
    }

    #[test]
    fn no_gps_pointer_gives_none() {
        let mut tiff = sample_tiff();
        // retag the GPS pointer as an unrelated LONG
        tiff[22] = 0x00;
        tiff[23] = 0x01;
        assert!(gps_entries(&tiff).is_none());
    }

    #[test]
    fn truncated_block_gives_none() {
        let tiff = sample_tiff();
        assert!(gps_entries(&tiff[..50]).is_none());
        assert!(gps_entries(b"XX").is_none());
    }

    #[test]
    fn encoded_ifd_reads_back() {
        let (_, entries) = gps_entries(&sample_tiff()).unwrap();

        let mut tiff = b"II\x2a\x00\x08\x00\x00\x00".to_vec();
        tiff.extend(1u16.to_le_bytes());
        tiff.extend([0x25, 0x88, 4, 0]);
        tiff.extend(1u32.to_le_bytes());
        tiff.extend(26u32.to_le_bytes());
        tiff.extend(0u32.to_le_bytes());
        assert_eq!(tiff.len(), 26);
        tiff.extend(encode_ifd(&entries, 26, &Endian::Little));

        let (_, again) = gps_entries(&tiff).unwrap();
        assert_eq!(again, entries);
    }

    #[test]
    fn rationals_swap_per_half() {
        let mut entry = RawEntry {
            tag: 0x0002,
            format: 5,
            count: 1,
            value: vec![1, 0, 0, 0, 2, 0, 0, 0],
        };
        swap_byte_order(&mut entry);
        assert_eq!(entry.value, vec![0, 0, 0, 1, 0, 0, 0, 2]);

        let mut ascii = RawEntry { tag: 0x0001, format: 2, count: 2, value: b"N\0".to_vec() };
        swap_byte_order(&mut ascii);
        assert_eq!(ascii.value, b"N\0");
    }
}
