// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Fixed-width hex dump rendering.
//!
//! ```text
//! ; code flash [0x00000000-0x00040000)
//! 00000000: c0 07 00 00 d1 06 00 00 -- -- -- -- -- -- -- --  | ........
//! 00000010: -- -- -- -- -- -- -- -- -- -- -- -- -- -- -- --  |
//! ```

use std::fmt::{self, Display, Formatter};

use crate::image::MemoryImage;
use crate::region::RegionMap;

pub const BYTES_PER_ROW: u64 = 16;

/// Placeholder for a byte that is not set in the image.
const UNSET_CELL: &str = "--";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrettyOptions
{
	/// Fold each run of rows with nothing set in them into a single `*` line
	pub collapse_empty_rows: bool,
}

/// One 16-byte aligned row of the dump.
struct Row
{
	address: u64,
	cells: Vec<Option<u8>>,
}

impl Row
{
	fn read(image: &MemoryImage, address: u64) -> Self
	{
		let cells = (address..address + BYTES_PER_ROW)
			.map(|address| u32::try_from(address).ok().and_then(|address| image.get(address)))
			.collect();
		Self {
			address,
			cells,
		}
	}

	fn is_empty(&self) -> bool
	{
		self.cells.iter().all(Option::is_none)
	}
}

impl Display for Row
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		write!(f, "{:08x}:", self.address)?;
		for cell in &self.cells {
			match cell {
				Some(byte) => write!(f, " {byte:02x}")?,
				None => write!(f, " {UNSET_CELL}")?,
			}
		}
		write!(f, "  | ")?;
		for cell in &self.cells {
			let glyph = match cell {
				Some(byte) if byte.is_ascii_graphic() || *byte == b' ' => *byte as char,
				Some(_) => '.',
				None => ' ',
			};
			write!(f, "{glyph}")?;
		}
		Ok(())
	}
}

/// Render every 16-byte aligned row covering the span of `image`.
///
/// Each region of `map` that the image touches gets a `;` heading before its first row.
pub fn to_pretty_text(image: &MemoryImage, map: &RegionMap) -> String
{
	to_pretty_text_with(image, map, &PrettyOptions::default())
}

/// As [`to_pretty_text`], with control over how rows with nothing set are shown.
pub fn to_pretty_text_with(image: &MemoryImage, map: &RegionMap, options: &PrettyOptions) -> String
{
	let span = match image.span() {
		Some(span) => span,
		None => return String::new(),
	};
	let regions = map.regions(image);
	let first_row = span.start - (span.start % BYTES_PER_ROW);

	let mut text = String::new();
	let mut next_region = 0;
	let mut skipping = false;
	let mut row = first_row;

	while row < span.end {
		// Headings for any regions beginning at or before this row that haven't been announced
		while next_region < regions.len() && (regions[next_region].start as u64) < row + BYTES_PER_ROW {
			let region = &regions[next_region];
			if (region.end as u64) > row && region_touched(image, region.start, region.end) {
				text.push_str(&format!("; {region}\n"));
				skipping = false;
			}
			next_region += 1;
		}

		let line = Row::read(image, row);
		if options.collapse_empty_rows && line.is_empty() {
			if !skipping {
				text.push_str("*\n");
				skipping = true;
			}
			row = next_populated_row(image, row + BYTES_PER_ROW, span.end);
			continue;
		}
		skipping = false;

		text.push_str(&format!("{line}\n"));
		row += BYTES_PER_ROW;
	}

	text
}

fn region_touched(image: &MemoryImage, start: u32, end: u32) -> bool
{
	image
		.chunks()
		.any(|(chunk_start, bytes)| (chunk_start as u64) < end as u64 && chunk_start as u64 + bytes.len() as u64 > start as u64)
}

/// The start of the first row at or after `from` with anything set in it.
fn next_populated_row(image: &MemoryImage, from: u64, limit: u64) -> u64
{
	image
		.chunks()
		.map(|(start, bytes)| (start as u64, start as u64 + bytes.len() as u64))
		.find(|(_, end)| *end > from)
		.map(|(start, _)| start.max(from))
		.map(|address| address - (address % BYTES_PER_ROW))
		.unwrap_or(limit)
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn single_byte_row()
	{
		let image = MemoryImage::from_bytes(0x100, &[0xab]).unwrap();
		let text = to_pretty_text(&image, &RegionMap::microbit());
		let lines: Vec<&str> = text.lines().collect();

		assert_eq!(lines[0], "; code flash [0x00000000-0x00040000)");
		assert_eq!(
			lines[1],
			"00000100: ab -- -- -- -- -- -- -- -- -- -- -- -- -- -- --  | .               "
		);
		assert_eq!(lines.len(), 2);
	}

	#[test]
	fn gap_rows_are_rendered_unset()
	{
		let mut image = MemoryImage::from_bytes(0x00, b"Hi").unwrap();
		image.write(0x20, b"!").unwrap();
		let text = to_pretty_text(&image, &RegionMap::microbit());
		let lines: Vec<&str> = text.lines().collect();

		assert_eq!(lines.len(), 4);
		assert_eq!(
			lines[1],
			"00000000: 48 69 -- -- -- -- -- -- -- -- -- -- -- -- -- --  | Hi              "
		);
		assert_eq!(
			lines[2],
			"00000010: -- -- -- -- -- -- -- -- -- -- -- -- -- -- -- --  |                 "
		);
		assert!(lines[3].starts_with("00000020: 21 --"));
	}

	#[test]
	fn empty_rows_collapse_when_asked()
	{
		let mut image = MemoryImage::from_bytes(0x00, b"Hi").unwrap();
		image.write(0x80, b"!").unwrap();
		let options = PrettyOptions {
			collapse_empty_rows: true,
		};
		let text = to_pretty_text_with(&image, &RegionMap::microbit(), &options);
		let lines: Vec<&str> = text.lines().collect();

		assert_eq!(lines[2], "*");
		assert!(lines[3].starts_with("00000080: 21 --"));
		assert_eq!(lines.len(), 4);
	}

	#[test]
	fn trailing_spaces_stay_in_ascii_column()
	{
		let image = MemoryImage::from_bytes(0x00, b"abcdefghijklmn  ").unwrap();
		let text = to_pretty_text(&image, &RegionMap::microbit());
		let row = text.lines().nth(1).unwrap();

		assert!(row.ends_with("  | abcdefghijklmn  "));
		assert_eq!(row.len(), "00000000: ".len() + 16 * 3 - 1 + "  | ".len() + 16);
	}
}
