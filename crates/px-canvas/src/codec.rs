//! Codec — dual persistence for the pixel grid.
//!
//! Two formats share one `load` entry point, chosen by file extension:
//!
//! - **PNG** (everything that is not `.pxl`): the lossless primary format.
//!   Decoding rides on the `image` crate — signature verification,
//!   grayscale widening, and 16-bit narrowing all happen in its decoder;
//!   we only translate fully transparent source pixels into the
//!   transparency sentinel, because the terminal encoding has no alpha of
//!   its own. Saving emits binary alpha: 0 where a cell equals the
//!   sentinel, 255 everywhere else. Nothing in between is representable,
//!   by design.
//!
//! - **`.pxl`**, the plain-decimal fallback: a width line, a height line,
//!   then `width × height × 4` three-digit groups (R, G, B, marker),
//!   row-major with no separators. The degraded persistence path, written
//!   only when the PNG save fails.
//!
//! One asymmetry is deliberate and preserved: the fallback *writer* encodes
//! transparency in the fourth group (`000` transparent, `255` opaque), but
//! the *loader* consumes that group positionally without interpreting it —
//! RGB is taken literally. Do not "fix" this without changing both sides.
//!
//! Loads are all-or-nothing: a missing file, bad signature, or malformed
//! stream fails the whole load; no partially filled grid ever escapes.
//! Decoded row buffers are owned by the load that allocates them and move
//! into the grid constructor.

use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use image::{ImageFormat, ImageReader, Rgba, RgbaImage};

use crate::color::Color;
use crate::grid::PixelGrid;

/// Extension (lowercased) that selects the fallback format.
pub const FALLBACK_EXT: &str = "pxl";

// ---------------------------------------------------------------------------
// CodecError
// ---------------------------------------------------------------------------

/// Why a load or save failed.
#[derive(Debug)]
pub enum CodecError {
    /// The underlying file or device operation failed.
    Io(io::Error),
    /// The file's content is not a valid image: bad signature, malformed
    /// or truncated fallback stream, unusable dimensions.
    Format(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Format(msg) => write!(f, "bad image data: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Format(_) => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for CodecError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => Self::Io(io),
            other => Self::Format(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Whether `path` selects the fallback format (by extension,
/// case-insensitive).
#[must_use]
pub fn is_fallback_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FALLBACK_EXT))
}

/// Load a grid from `path`. `.pxl` files go through the fallback parser;
/// everything else is decoded as PNG.
///
/// # Errors
///
/// [`CodecError::Io`] for missing/unreadable files, [`CodecError::Format`]
/// for anything the parsers reject.
pub fn load(path: &Path, transparency: Color) -> Result<PixelGrid, CodecError> {
    if is_fallback_path(path) {
        load_plain(path)
    } else {
        load_raster(path, transparency)
    }
}

/// Decode a PNG into a grid.
///
/// The decoder normalizes for us: grayscale widens to RGB, 16-bit
/// channels narrow to 8. Source pixels with alpha 0 become the
/// transparency sentinel; any other alpha is treated as opaque.
fn load_raster(path: &Path, transparency: Color) -> Result<PixelGrid, CodecError> {
    // Guess from content, not extension: the signature decides the format,
    // and an unrecognized signature fails the decode.
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let rgba = decoded.to_rgba8();

    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CodecError::Format("image has no pixels".into()));
    }

    let mut rows = Vec::with_capacity(height as usize);
    for y in 0..height {
        let mut row = Vec::with_capacity(width as usize);
        for x in 0..width {
            let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            row.push(if a == 0 {
                transparency
            } else {
                Color::new(r, g, b)
            });
        }
        rows.push(row);
    }

    PixelGrid::from_rows(rows).ok_or_else(|| CodecError::Format("image has no pixels".into()))
}

/// Parse the plain-decimal fallback text.
///
/// Line 1: width. Line 2: height. Then the digit stream: four three-digit
/// groups per pixel, row-major. Newlines inside the stream are tolerated;
/// anything after the last needed group is ignored (the writer emits
/// nothing there, but trailing bytes don't fail the load).
fn parse_plain(text: &str) -> Result<PixelGrid, CodecError> {
    let mut parts = text.splitn(3, '\n');
    let width = parse_dimension(parts.next(), "width")?;
    let height = parse_dimension(parts.next(), "height")?;
    let stream = parts.next().unwrap_or("");

    let needed = width * height * 12;
    let mut digits = Vec::with_capacity(needed);
    for b in stream.bytes() {
        if digits.len() == needed {
            break;
        }
        match b {
            b'0'..=b'9' => digits.push(b - b'0'),
            b'\n' | b'\r' => {}
            other => {
                return Err(CodecError::Format(format!(
                    "unexpected byte {:?} in pixel stream",
                    char::from(other)
                )));
            }
        }
    }
    if digits.len() < needed {
        return Err(CodecError::Format(format!(
            "truncated pixel stream: {} of {} digits",
            digits.len(),
            needed
        )));
    }

    let mut rows = Vec::with_capacity(height);
    let mut groups = digits.chunks_exact(3);
    for _ in 0..height {
        let mut row = Vec::with_capacity(width);
        for _ in 0..width {
            let r = channel_value(groups.next())?;
            let g = channel_value(groups.next())?;
            let b = channel_value(groups.next())?;
            // The fourth group is the writer's transparency marker. This
            // loader consumes it positionally and does not interpret it.
            let _marker = groups.next();
            row.push(Color::new(r, g, b));
        }
        rows.push(row);
    }

    PixelGrid::from_rows(rows)
        .ok_or_else(|| CodecError::Format("image has no pixels".into()))
}

fn load_plain(path: &Path) -> Result<PixelGrid, CodecError> {
    parse_plain(&fs::read_to_string(path)?)
}

/// Parse one header line as a nonzero dimension.
fn parse_dimension(line: Option<&str>, what: &str) -> Result<usize, CodecError> {
    let n = line
        .map(str::trim)
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| CodecError::Format(format!("missing or malformed {what} line")))?;
    if n == 0 {
        return Err(CodecError::Format(format!("{what} must be nonzero")));
    }
    Ok(n)
}

/// Combine one three-digit group into a channel value.
fn channel_value(group: Option<&[u8]>) -> Result<u8, CodecError> {
    let group = group.ok_or_else(|| CodecError::Format("truncated pixel stream".into()))?;
    let value = u16::from(group[0]) * 100 + u16::from(group[1]) * 10 + u16::from(group[2]);
    u8::try_from(value)
        .map_err(|_| CodecError::Format(format!("channel value {value} out of range")))
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Save the grid as a PNG at `path`.
///
/// Alpha is binary: 0 for cells that exactly equal the transparency
/// sentinel, 255 for everything else.
///
/// # Errors
///
/// Returns an error if encoding or the file write fails.
pub fn save(path: &Path, grid: &PixelGrid, transparency: Color) -> Result<(), CodecError> {
    #[allow(clippy::cast_possible_truncation)] // Grids are far below u32::MAX.
    let mut img = RgbaImage::new(grid.width() as u32, grid.height() as u32);

    for row in 0..grid.height() {
        // Rows in range by construction; the unwrap_or keeps this total.
        let pixels = grid.row(row).unwrap_or(&[]);
        for (col, &color) in pixels.iter().enumerate() {
            let alpha = if color == transparency { 0 } else { 255 };
            #[allow(clippy::cast_possible_truncation)]
            img.put_pixel(
                col as u32,
                row as u32,
                Rgba([color.r, color.g, color.b, alpha]),
            );
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save the grid in the plain-decimal fallback format at `path`.
///
/// The degraded persistence path: invoked only when [`save`] has failed,
/// so an in-memory image never dies with the PNG encoder.
///
/// # Errors
///
/// Returns an error if the file write fails.
pub fn save_plain(path: &Path, grid: &PixelGrid, transparency: Color) -> Result<(), CodecError> {
    let mut text = String::with_capacity(16 + grid.width() * grid.height() * 12);
    let _ = writeln!(text, "{}", grid.width());
    let _ = writeln!(text, "{}", grid.height());

    for row in 0..grid.height() {
        let pixels = grid.row(row).unwrap_or(&[]);
        for &color in pixels {
            let marker = if color == transparency { "000" } else { "255" };
            let _ = write!(text, "{:03}{:03}{:03}{marker}", color.r, color.g, color.b);
        }
    }

    fs::write(path, text)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
