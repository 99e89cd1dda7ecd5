//! # Brother QL Raster Commands
//!
//! This module implements the control commands of the Brother QL raster
//! protocol (QL-500 through QL-1110NWB).
//!
//! ## Protocol Overview
//!
//! A print job is a flat byte stream:
//!
//! ```text
//! NUL × n           invalidate: flush any half-received command
//! ESC @             initialize
//! ESC i S           status information request
//! ESC i a 01        switch to raster mode
//! ESC i z ...       media & quality
//! ESC i M / ESC i A autocut, cut every n labels
//! ESC i K           expanded mode (cut at end, 600 dpi, two-colour)
//! ESC i d           feed margin
//! M n               compression mode
//! g 00 n ...        raster line (one per row)
//! SUB               print with feeding (last page)
//! ```
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! ## Reference
//!
//! Brother "Raster Command Reference" for the QL-800 series, and the
//! behaviour of the `brother_ql` Python package.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// NUL - Invalidate byte
pub const NUL: u8 = 0x00;

/// FF (Form Feed) - Print, more pages follow
pub const FF: u8 = 0x0C;

/// SUB - Print with feeding, last page
pub const SUB: u8 = 0x1A;

// ============================================================================
// SESSION COMMANDS
// ============================================================================

/// # Invalidate (NUL × n)
///
/// A run of NUL bytes that the printer ignores. Sent first so that a command
/// cut short by a previous aborted job cannot swallow the start of this one.
///
/// Most models take 200 bytes; the QL-800 series wants 400.
#[inline]
pub fn invalidate(count: usize) -> Vec<u8> {
    vec![NUL; count]
}

/// # Initialize (ESC @)
///
/// Clears the print buffer and resets all modes to their power-on defaults.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Status Information Request (ESC i S)
///
/// Asks the printer to send a 32-byte status frame (see
/// [`status`](super::status)).
///
/// | Format | Bytes    |
/// |--------|----------|
/// | ASCII  | ESC i S  |
/// | Hex    | 1B 69 53 |
#[inline]
pub fn status_request() -> Vec<u8> {
    vec![ESC, b'i', b'S']
}

/// # Switch Dynamic Command Mode (ESC i a n)
///
/// `n = 1` selects raster mode. Models without mode setting
/// (QL-500/550/560/570/700) are always in raster mode and must not be sent
/// this command.
///
/// | Format | Bytes       |
/// |--------|-------------|
/// | ASCII  | ESC i a 1   |
/// | Hex    | 1B 69 61 01 |
#[inline]
pub fn switch_to_raster() -> Vec<u8> {
    vec![ESC, b'i', b'a', 0x01]
}

// ============================================================================
// PAGE SETUP COMMANDS
// ============================================================================

/// Validity flag: the command carries meaningful data
const PI_KIND: u8 = 0x02;
const PI_WIDTH: u8 = 0x04;
const PI_LENGTH: u8 = 0x08;
const PI_QUALITY: u8 = 0x40;
const PI_RECOVER: u8 = 0x80;

/// # Print Information (ESC i z)
///
/// Describes the media and the page about to be sent.
///
/// ## Protocol Details
///
/// | Byte | Meaning |
/// |------|---------|
/// | 0-2  | `1B 69 7A` |
/// | 3    | validity flags (0x80 recover, 0x02 kind, 0x04 width, 0x08 length, 0x40 quality) |
/// | 4    | media type (0x0A endless, 0x0B die-cut) |
/// | 5    | media width in mm |
/// | 6    | media length in mm (0 for endless) |
/// | 7-10 | raster line count, u32 little-endian |
/// | 11   | starting page (0) |
/// | 12   | fixed 0 |
///
/// A flag is only set when its field is non-zero.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands::media_and_quality;
///
/// let cmd = media_and_quality(0x0B, 17, 54, 566, true);
/// assert_eq!(&cmd[..7], &[0x1B, 0x69, 0x7A, 0xCE, 0x0B, 17, 54]);
/// assert_eq!(&cmd[7..11], &566u32.to_le_bytes());
/// ```
pub fn media_and_quality(
    media_type: u8,
    width_mm: u8,
    length_mm: u8,
    raster_lines: u32,
    high_quality: bool,
) -> Vec<u8> {
    let mut flags = PI_RECOVER;
    if media_type != 0 {
        flags |= PI_KIND;
    }
    if width_mm != 0 {
        flags |= PI_WIDTH;
    }
    if length_mm != 0 {
        flags |= PI_LENGTH;
    }
    if high_quality {
        flags |= PI_QUALITY;
    }

    let mut cmd = Vec::with_capacity(13);
    cmd.extend_from_slice(&[ESC, b'i', b'z', flags, media_type, width_mm, length_mm]);
    cmd.extend_from_slice(&raster_lines.to_le_bytes());
    cmd.push(0); // starting page
    cmd.push(0);
    cmd
}

/// # Various Mode Settings (ESC i M)
///
/// Bit 6 enables the automatic cutter.
///
/// | Format | Bytes          |
/// |--------|----------------|
/// | Hex    | 1B 69 4D 40/00 |
#[inline]
pub fn autocut(enabled: bool) -> Vec<u8> {
    vec![ESC, b'i', b'M', if enabled { 0x40 } else { 0x00 }]
}

/// # Cut Every n Labels (ESC i A n)
#[inline]
pub fn cut_every(n: u8) -> Vec<u8> {
    vec![ESC, b'i', b'A', n.max(1)]
}

/// Expanded mode flags
const EXP_TWO_COLOR: u8 = 0x01;
const EXP_CUT_AT_END: u8 = 0x08;
const EXP_DPI_600: u8 = 0x40;

/// # Expanded Mode (ESC i K)
///
/// | Bit  | Meaning |
/// |------|---------|
/// | 0x01 | two-colour printing |
/// | 0x08 | cut at end |
/// | 0x40 | high resolution (600 dpi across the feed) |
#[inline]
pub fn expanded_mode(cut_at_end: bool, dpi_600: bool, two_color: bool) -> Vec<u8> {
    let mut flags = 0u8;
    if two_color {
        flags |= EXP_TWO_COLOR;
    }
    if cut_at_end {
        flags |= EXP_CUT_AT_END;
    }
    if dpi_600 {
        flags |= EXP_DPI_600;
    }
    vec![ESC, b'i', b'K', flags]
}

/// # Specify Margin Amount (ESC i d n1 n2)
///
/// Feed amount in dots, u16 little-endian. Die-cut labels use 0, endless
/// tape 35.
#[inline]
pub fn margins(dots: u16) -> Vec<u8> {
    let [lo, hi] = dots.to_le_bytes();
    vec![ESC, b'i', b'd', lo, hi]
}

/// # Select Compression Mode (M n)
///
/// `n = 0x02` selects TIFF PackBits compression for subsequent raster
/// lines, `0x00` disables it.
#[inline]
pub fn compression(enabled: bool) -> Vec<u8> {
    vec![b'M', if enabled { 0x02 } else { 0x00 }]
}

// ============================================================================
// PRINT COMMANDS
// ============================================================================

/// # Print (FF / SUB)
///
/// `FF` prints the page and waits for the next one; `SUB` prints the last
/// page and feeds it out.
#[inline]
pub fn print(last_page: bool) -> Vec<u8> {
    vec![if last_page { SUB } else { FF }]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_invalidate() {
        let cmd = invalidate(200);
        assert_eq!(cmd.len(), 200);
        assert!(cmd.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_status_request() {
        assert_eq!(status_request(), vec![0x1B, 0x69, 0x53]);
    }

    #[test]
    fn test_switch_to_raster() {
        assert_eq!(switch_to_raster(), vec![0x1B, 0x69, 0x61, 0x01]);
    }

    #[test]
    fn test_media_and_quality_die_cut() {
        let cmd = media_and_quality(0x0B, 17, 54, 566, true);
        assert_eq!(
            cmd,
            vec![0x1B, 0x69, 0x7A, 0xCE, 0x0B, 17, 54, 0x36, 0x02, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_media_and_quality_endless() {
        let cmd = media_and_quality(0x0A, 62, 0, 300, false);
        // no length flag, no quality flag
        assert_eq!(cmd[3], 0x80 | 0x02 | 0x04);
        assert_eq!(cmd[6], 0);
    }

    #[test]
    fn test_autocut() {
        assert_eq!(autocut(true), vec![0x1B, 0x69, 0x4D, 0x40]);
        assert_eq!(autocut(false), vec![0x1B, 0x69, 0x4D, 0x00]);
    }

    #[test]
    fn test_cut_every() {
        assert_eq!(cut_every(1), vec![0x1B, 0x69, 0x41, 0x01]);
        assert_eq!(cut_every(0), vec![0x1B, 0x69, 0x41, 0x01]);
    }

    #[test]
    fn test_expanded_mode() {
        assert_eq!(expanded_mode(true, false, false), vec![0x1B, 0x69, 0x4B, 0x08]);
        assert_eq!(expanded_mode(true, true, true), vec![0x1B, 0x69, 0x4B, 0x49]);
        assert_eq!(expanded_mode(false, false, false), vec![0x1B, 0x69, 0x4B, 0x00]);
    }

    #[test]
    fn test_margins() {
        assert_eq!(margins(0), vec![0x1B, 0x69, 0x64, 0x00, 0x00]);
        assert_eq!(margins(35), vec![0x1B, 0x69, 0x64, 0x23, 0x00]);
        assert_eq!(margins(0x1234), vec![0x1B, 0x69, 0x64, 0x34, 0x12]);
    }

    #[test]
    fn test_compression() {
        assert_eq!(compression(true), vec![0x4D, 0x02]);
        assert_eq!(compression(false), vec![0x4D, 0x00]);
    }

    #[test]
    fn test_print() {
        assert_eq!(print(true), vec![0x1A]);
        assert_eq!(print(false), vec![0x0C]);
    }
}
