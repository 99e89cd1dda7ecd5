//! # Label Types
//!
//! Physical label media for Brother QL printers, identified by the label code
//! the printer firmware and the raster transpiler agree on.
//!
//! ## Code Convention
//!
//! Codes are `"{tape width}x{length}"` in millimetres, height first when the
//! label is held landscape: the 54×17mm address label is `"17x54"`.
//! Endless tape has only a width (`"62"`), round labels use a `d` prefix.
//!
//! ## Dots
//!
//! ```text
//! ├──────────── dots_total.0 ─────────────┤
//! │ margin │ dots_printable.0 │ right_margin_dots │
//! ```
//!
//! Die-cut and round labels also have a fixed length in dots. The printable
//! counts are vendor values, not exact roundings of the millimetre size.

/// Shape of the label media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    /// Continuous tape, cut to any length
    Endless,
    /// Pre-cut rectangular labels
    DieCut,
    /// Pre-cut round labels
    RoundDieCut,
}

impl FormFactor {
    /// Media type byte for the `ESC i z` command
    pub fn media_type(self) -> u8 {
        match self {
            Self::Endless => 0x0A,
            Self::DieCut | Self::RoundDieCut => 0x0B,
        }
    }

    pub fn has_fixed_length(self) -> bool {
        !matches!(self, Self::Endless)
    }
}

/// A Brother QL label type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSpec {
    /// Label code (e.g. "17x54")
    pub code: &'static str,
    /// Nominal tape width and length in mm (length 0 for endless)
    pub tape_size_mm: (u8, u8),
    pub form_factor: FormFactor,
    /// Full media width/length in dots
    pub dots_total: (u32, u32),
    /// Printable area width/length in dots
    pub dots_printable: (u32, u32),
    /// Unprintable dots on the right side of the head
    pub right_margin_dots: u32,
    /// Feed margin for `ESC i d`
    pub feed_margin: u16,
    /// Black/red/white media (DK-22251)
    pub red: bool,
    /// Only fits the 102mm wide printers
    pub wide_only: bool,
}

const fn endless(
    code: &'static str,
    width_mm: u8,
    total: u32,
    printable: u32,
    right_margin_dots: u32,
) -> LabelSpec {
    LabelSpec {
        code,
        tape_size_mm: (width_mm, 0),
        form_factor: FormFactor::Endless,
        dots_total: (total, 0),
        dots_printable: (printable, 0),
        right_margin_dots,
        feed_margin: 35,
        red: false,
        wide_only: false,
    }
}

const fn die_cut(
    code: &'static str,
    size_mm: (u8, u8),
    total: (u32, u32),
    printable: (u32, u32),
    right_margin_dots: u32,
) -> LabelSpec {
    LabelSpec {
        code,
        tape_size_mm: size_mm,
        form_factor: FormFactor::DieCut,
        dots_total: total,
        dots_printable: printable,
        right_margin_dots,
        feed_margin: 0,
        red: false,
        wide_only: false,
    }
}

const fn round(
    code: &'static str,
    diameter_mm: u8,
    total: u32,
    printable: u32,
    right_margin_dots: u32,
) -> LabelSpec {
    LabelSpec {
        code,
        tape_size_mm: (diameter_mm, diameter_mm),
        form_factor: FormFactor::RoundDieCut,
        dots_total: (total, total),
        dots_printable: (printable, printable),
        right_margin_dots,
        feed_margin: 0,
        red: false,
        wide_only: false,
    }
}

/// All known label types at 300 DPI
pub const LABELS: &[LabelSpec] = &[
    endless("12", 12, 142, 106, 29),
    endless("29", 29, 342, 306, 6),
    endless("38", 38, 449, 413, 12),
    endless("50", 50, 590, 554, 12),
    endless("54", 54, 636, 590, 0),
    endless("62", 62, 732, 696, 12),
    LabelSpec {
        red: true,
        ..endless("62red", 62, 732, 696, 12)
    },
    LabelSpec {
        wide_only: true,
        ..endless("102", 102, 1200, 1164, 12)
    },
    die_cut("17x54", (17, 54), (201, 566), (165, 566), 0),
    die_cut("17x87", (17, 87), (201, 956), (165, 956), 0),
    die_cut("23x23", (23, 23), (272, 252), (202, 202), 42),
    die_cut("29x42", (29, 42), (342, 495), (306, 425), 6),
    die_cut("29x90", (29, 90), (342, 1061), (306, 991), 6),
    die_cut("39x90", (38, 90), (449, 1061), (413, 991), 12),
    die_cut("39x48", (39, 48), (461, 565), (425, 495), 6),
    die_cut("52x29", (52, 29), (614, 341), (578, 271), 0),
    die_cut("62x29", (62, 29), (732, 341), (696, 271), 12),
    die_cut("62x100", (62, 100), (732, 1179), (696, 1109), 12),
    LabelSpec {
        wide_only: true,
        ..die_cut("102x51", (102, 51), (1200, 603), (1164, 532), 12)
    },
    LabelSpec {
        wide_only: true,
        ..die_cut("102x152", (102, 153), (1200, 1800), (1164, 1736), 12)
    },
    LabelSpec {
        feed_margin: 35,
        ..round("d12", 12, 142, 94, 113)
    },
    round("d24", 24, 284, 236, 42),
    round("d58", 58, 688, 618, 51),
];

/// Resolution the label table is expressed in
pub const LABEL_TABLE_DPI: u32 = 300;

impl LabelSpec {
    /// Look up a label by its exact code.
    pub fn by_code(code: &str) -> Option<Self> {
        LABELS.iter().find(|l| l.code == code).copied()
    }

    /// Expected raster size (width, height) in the printer's orientation.
    ///
    /// `None` height means endless tape.
    pub fn expected_dots(&self) -> (u32, Option<u32>) {
        let (w, len) = self.dots_printable;
        if self.form_factor.has_fixed_length() {
            (w, Some(len))
        } else {
            (w, None)
        }
    }

    /// Pixel size of the label held landscape (length across, tape width down).
    ///
    /// This is the canvas a label composer should draw on. Endless tape has no
    /// fixed length, so only the height is known.
    pub fn landscape_canvas(&self) -> (Option<u32>, u32) {
        let (w, len) = self.dots_printable;
        if self.form_factor.has_fixed_length() {
            (Some(len), w)
        } else {
            (None, w)
        }
    }
}
