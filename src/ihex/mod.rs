// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Intel HEX codec.
//!
//! Decoding is strict: the first malformed line, bad checksum or misplaced End Of File
//! record fails the whole document. Encoding produces records no longer than the
//! configured record size, aligned to multiples of it, with Extended Linear Address
//! records inserted whenever the upper 16 bits of the address change.

mod record;

use log::{debug, trace};

pub use self::record::{HexRecord, RecordType, START_CODE};
use crate::error::Error;
use crate::image::MemoryImage;

/// The payload size most tooling (and the micro:bit toolchain) uses per Data record.
pub const DEFAULT_RECORD_SIZE: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions
{
	/// Maximum number of data bytes per Data record
	pub record_size: u8,
	/// Entry point to emit as a Start Linear Address record, if any
	pub start_address: Option<u32>,
}

impl Default for EncodeOptions
{
	fn default() -> Self
	{
		Self {
			record_size: DEFAULT_RECORD_SIZE,
			start_address: None,
		}
	}
}

/// A complete, validated Intel HEX document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexDocument
{
	records: Vec<HexRecord>,
}

impl HexDocument
{
	/// Decode Intel HEX text. Blank lines are ignored, both `\n` and `\r\n` line endings are accepted.
	pub fn decode(text: &str) -> Result<Self, Error>
	{
		let mut records = Vec::new();
		let mut end_seen = false;

		for (index, line) in text.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			let line_number = index + 1;

			if end_seen {
				return Err(Error::RecordAfterEnd {
					line: line_number,
				});
			}

			let record = HexRecord::parse(line).map_err(|fault| Error::malformed(line_number, fault))?;
			trace!("Line {}: {} record at 0x{:04x}", line_number, record.record_type, record.address);
			end_seen = record.record_type == RecordType::EndOfFile;
			records.push(record);
		}

		if !end_seen {
			return Err(Error::MissingEndMarker);
		}

		debug!("Decoded Intel HEX document with {} records", records.len());
		Ok(Self {
			records,
		})
	}

	/// Build the records describing every byte set in `image`.
	pub fn from_image(image: &MemoryImage, options: &EncodeOptions) -> Self
	{
		// A zero record size could never make progress, treat it as the smallest valid one
		let record_size = options.record_size.max(1) as u64;
		let mut records = Vec::new();
		let mut upper: u16 = 0;

		for (start, bytes) in image.chunks() {
			let mut address = start as u64;
			let end = address + bytes.len() as u64;

			while address < end {
				// Stop at whichever comes first of the record size boundary, the 64KiB window or the chunk
				let next_boundary = (address / record_size + 1) * record_size;
				let window_end = (address | 0xffff) + 1;
				let record_end = next_boundary.min(window_end).min(end);

				let address_upper = (address >> 16) as u16;
				if address_upper != upper {
					records.push(HexRecord::extended_linear_address(address_upper));
					upper = address_upper;
				}

				let offset = (address - start as u64) as usize;
				let length = (record_end - address) as usize;
				records.push(HexRecord::data(address as u16, &bytes[offset..offset + length]));
				address = record_end;
			}
		}

		if let Some(entry_point) = options.start_address {
			records.push(HexRecord::start_linear_address(entry_point));
		}
		records.push(HexRecord::end_of_file());

		Self {
			records,
		}
	}

	pub fn records(&self) -> &[HexRecord]
	{
		&self.records
	}

	/// Iterates the Data records with the extended address base applied, giving the
	/// absolute address of the first byte in each alongside its payload.
	pub fn data_records(&self) -> impl Iterator<Item = (u64, &[u8])> + '_
	{
		let mut base: u64 = 0;
		self.records.iter().filter_map(move |record| {
			match record.record_type {
				RecordType::ExtendedSegmentAddress => {
					base = (record.upper_address() as u64) << 4;
					None
				},
				RecordType::ExtendedLinearAddress => {
					base = (record.upper_address() as u64) << 16;
					None
				},
				RecordType::Data => Some((base + record.address as u64, record.data.as_slice())),
				_ => None,
			}
		})
	}

	/// The entry point given by a Start Linear Address record, if the document has one.
	pub fn start_linear_address(&self) -> Option<u32>
	{
		self.records
			.iter()
			.find(|record| record.record_type == RecordType::StartLinearAddress)
			.map(|record| u32::from_be_bytes([record.data[0], record.data[1], record.data[2], record.data[3]]))
	}

	/// Render the document as Intel HEX text, one record per line, with a trailing newline.
	pub fn to_text(&self) -> String
	{
		let mut text = String::with_capacity(self.records.len() * 44);
		for record in &self.records {
			text.push_str(&record.to_string());
			text.push('\n');
		}
		text
	}
}

/// Decode Intel HEX text straight into a memory image.
pub fn decode(text: &str) -> Result<MemoryImage, Error>
{
	let document = HexDocument::decode(text)?;
	MemoryImage::from_hex_document(&document)
}

/// Encode every byte set in `image` as Intel HEX text.
pub fn encode(image: &MemoryImage, options: &EncodeOptions) -> String
{
	HexDocument::from_image(image, options).to_text()
}
