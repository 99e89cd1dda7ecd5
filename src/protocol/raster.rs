//! # Brother QL Raster Lines
//!
//! One command per print-head row. The row is a full head-width slice of
//! MSB-first packed dots (bit 7 = leftmost dot in head order, 1 = burn).
//!
//! ## Commands
//!
//! | Command     | Bytes               | Used for |
//! |-------------|---------------------|----------|
//! | Raster line | `g 00 n d1...dn`    | monochrome |
//! | Two-colour  | `w 01 n d1...dn`    | black plane |
//! |             | `w 02 n d1...dn`    | red plane |
//!
//! `n` is the byte count of the data that follows: the packed row, or its
//! PackBits encoding when compression mode (`M 02`) is selected.
//!
//! ## PackBits
//!
//! ```text
//! header 0..=127     copy the next header+1 bytes literally
//! header -1..=-127   repeat the next byte 1-header times
//! header -128        no-op
//! ```

/// Raster graphics transfer (monochrome)
pub const RASTER: u8 = b'g';

/// Two-colour raster graphics transfer
pub const RASTER_TWO_COLOR: u8 = b'w';

/// Plane selector for two-colour rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Black,
    Red,
}

impl Plane {
    fn selector(self) -> u8 {
        match self {
            Plane::Black => 0x01,
            Plane::Red => 0x02,
        }
    }
}

/// # Raster Line (g 00 n d1...dn)
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::raster::raster_line;
///
/// let cmd = raster_line(&[0xFF, 0x00], false);
/// assert_eq!(cmd, vec![b'g', 0x00, 2, 0xFF, 0x00]);
/// ```
pub fn raster_line(row: &[u8], compress: bool) -> Vec<u8> {
    line(RASTER, 0x00, row, compress)
}

/// # Two-Colour Raster Line (w p n d1...dn)
///
/// Each head row is sent twice: black plane first, then red.
pub fn two_color_line(plane: Plane, row: &[u8], compress: bool) -> Vec<u8> {
    line(RASTER_TWO_COLOR, plane.selector(), row, compress)
}

fn line(command: u8, selector: u8, row: &[u8], compress: bool) -> Vec<u8> {
    let payload = if compress {
        packbits(row)
    } else {
        row.to_vec()
    };
    debug_assert!(payload.len() <= u8::MAX as usize, "raster row too long");

    let mut cmd = Vec::with_capacity(3 + payload.len());
    cmd.push(command);
    cmd.push(selector);
    cmd.push(payload.len() as u8);
    cmd.extend_from_slice(&payload);
    cmd
}

/// Longest run one PackBits header can describe
const MAX_RUN: usize = 128;

/// Encode bytes with TIFF PackBits.
///
/// Runs of three or more equal bytes become repeat packets; everything else
/// is grouped into literal packets.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::raster::packbits;
///
/// // A blank 90-byte row compresses to two bytes
/// assert_eq!(packbits(&[0u8; 90]), vec![(1i8 - 90) as u8, 0x00]);
/// ```
pub fn packbits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 1);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == data[i])
            .count();

        if run >= 3 {
            flush_literal(&mut out, &data[literal_start..i]);
            out.push((1 - run as i16) as i8 as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += run;
        }
    }
    flush_literal(&mut out, &data[literal_start..]);

    out
}

fn flush_literal(out: &mut Vec<u8>, literal: &[u8]) {
    for chunk in literal.chunks(MAX_RUN) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}

/// Decode TIFF PackBits. Truncated input decodes as far as it goes.
pub fn unpackbits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let header = data[i] as i8;
        i += 1;
        match header {
            -128 => {}
            h if h >= 0 => {
                let end = (i + h as usize + 1).min(data.len());
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            h => {
                if let Some(&byte) = data.get(i) {
                    out.extend(std::iter::repeat_n(byte, (1 - h as i16) as usize));
                }
                i += 1;
            }
        }
    }

    out
}
