// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use std::fmt::{self, Display, Formatter, Write};

use hex::FromHexError;

use crate::error::RecordFault;

/// The start code that begins every Intel HEX record.
pub const START_CODE: char = ':';

/// Hex digits taken up by the byte count, address, record type and checksum fields.
const FRAMING_DIGITS: usize = 2 + 4 + 2 + 2;

/// Intel HEX record types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RecordType
{
	Data,
	EndOfFile,
	ExtendedSegmentAddress,
	StartSegmentAddress,
	ExtendedLinearAddress,
	StartLinearAddress,
}

impl RecordType
{
	pub fn value(self) -> u8
	{
		match self {
			Self::Data => 0x00,
			Self::EndOfFile => 0x01,
			Self::ExtendedSegmentAddress => 0x02,
			Self::StartSegmentAddress => 0x03,
			Self::ExtendedLinearAddress => 0x04,
			Self::StartLinearAddress => 0x05,
		}
	}

	/// The payload length every record of this type must have, if it is fixed.
	fn payload_length(self) -> Option<usize>
	{
		match self {
			Self::Data => None,
			Self::EndOfFile => Some(0),
			Self::ExtendedSegmentAddress | Self::ExtendedLinearAddress => Some(2),
			Self::StartSegmentAddress | Self::StartLinearAddress => Some(4),
		}
	}
}

impl TryFrom<u8> for RecordType
{
	type Error = RecordFault;

	fn try_from(value: u8) -> Result<Self, Self::Error>
	{
		match value {
			0x00 => Ok(Self::Data),
			0x01 => Ok(Self::EndOfFile),
			0x02 => Ok(Self::ExtendedSegmentAddress),
			0x03 => Ok(Self::StartSegmentAddress),
			0x04 => Ok(Self::ExtendedLinearAddress),
			0x05 => Ok(Self::StartLinearAddress),
			_ => Err(RecordFault::UnknownRecordType(value)),
		}
	}
}

impl Display for RecordType
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		let name = match self {
			Self::Data => "Data",
			Self::EndOfFile => "End Of File",
			Self::ExtendedSegmentAddress => "Extended Segment Address",
			Self::StartSegmentAddress => "Start Segment Address",
			Self::ExtendedLinearAddress => "Extended Linear Address",
			Self::StartLinearAddress => "Start Linear Address",
		};
		write!(f, "{name}")
	}
}

/// A single Intel HEX record.
///
/// The byte count and checksum are derived from the other fields so that a record
/// held in memory is always self-consistent. Parsing checks the stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRecord
{
	pub record_type: RecordType,
	pub address: u16,
	pub data: Vec<u8>,
}

impl HexRecord
{
	/// Construct a Data record. Panics if `data` is longer than 255 bytes.
	pub fn data(address: u16, data: &[u8]) -> Self
	{
		assert!(data.len() <= u8::MAX as usize, "Data record payload too long: {} bytes", data.len());
		Self {
			record_type: RecordType::Data,
			address,
			data: data.to_vec(),
		}
	}

	pub fn end_of_file() -> Self
	{
		Self {
			record_type: RecordType::EndOfFile,
			address: 0,
			data: Vec::new(),
		}
	}

	pub fn extended_linear_address(upper: u16) -> Self
	{
		Self {
			record_type: RecordType::ExtendedLinearAddress,
			address: 0,
			data: upper.to_be_bytes().to_vec(),
		}
	}

	pub fn start_linear_address(entry_point: u32) -> Self
	{
		Self {
			record_type: RecordType::StartLinearAddress,
			address: 0,
			data: entry_point.to_be_bytes().to_vec(),
		}
	}

	pub fn byte_count(&self) -> u8
	{
		self.data.len() as u8
	}

	/// Two's complement of the sum of every byte in the record bar the checksum itself.
	pub fn checksum(&self) -> u8
	{
		let [address_hi, address_lo] = self.address.to_be_bytes();
		let sum = [self.byte_count(), address_hi, address_lo, self.record_type.value()]
			.iter()
			.chain(self.data.iter())
			.fold(0u8, |sum, byte| sum.wrapping_add(*byte));
		sum.wrapping_neg()
	}

	/// The 16-bit big endian payload of an Extended Segment/Linear Address record.
	pub(crate) fn upper_address(&self) -> u16
	{
		u16::from_be_bytes([self.data[0], self.data[1]])
	}

	/// Parse a single line of text (without its line ending) into a record.
	pub fn parse(line: &str) -> Result<Self, RecordFault>
	{
		let digits = line
			.strip_prefix(START_CODE)
			.ok_or(RecordFault::MissingStartMarker)?;

		let bytes = hex::decode(digits).map_err(|error| match error {
			FromHexError::InvalidHexCharacter { c, .. } => RecordFault::InvalidDigit(c),
			FromHexError::OddLength | FromHexError::InvalidStringLength => RecordFault::OddDigitCount(digits.len()),
		})?;
		if digits.len() < FRAMING_DIGITS {
			return Err(RecordFault::TooShort(digits.len()));
		}

		let byte_count = bytes[0];
		let address = u16::from_be_bytes([bytes[1], bytes[2]]);
		let type_value = bytes[3];
		let data = &bytes[4..bytes.len() - 1];
		let stored = bytes[bytes.len() - 1];

		if data.len() != byte_count as usize {
			return Err(RecordFault::ByteCountMismatch {
				declared: byte_count,
				actual: data.len(),
			});
		}

		let record_type = RecordType::try_from(type_value)?;
		let record = Self {
			record_type,
			address,
			data: data.to_vec(),
		};

		let computed = record.checksum();
		if computed != stored {
			return Err(RecordFault::ChecksumMismatch {
				stored,
				computed,
			});
		}

		if let Some(expected) = record_type.payload_length() {
			if record.data.len() != expected {
				return Err(RecordFault::InvalidPayloadLength {
					record_type,
					expected,
					actual: record.data.len(),
				});
			}
		}

		Ok(record)
	}
}

impl Display for HexRecord
{
	/// Renders the record as a line of Intel HEX, uppercase, without a line ending.
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		let mut line = String::with_capacity(1 + FRAMING_DIGITS + self.data.len() * 2);
		line.push(START_CODE);
		write!(line, "{:02X}{:04X}{:02X}", self.byte_count(), self.address, self.record_type.value())?;
		for byte in &self.data {
			write!(line, "{byte:02X}")?;
		}
		write!(line, "{:02X}", self.checksum())?;
		f.write_str(&line)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn checksum_of_known_record()
	{
		let record = HexRecord::data(0x0000, &[0x01, 0x02, 0x03]);
		assert_eq!(record.checksum(), 0xF7);
		assert_eq!(record.to_string(), ":03000000010203F7");
	}

	#[test]
	fn end_of_file_renders_canonically()
	{
		assert_eq!(HexRecord::end_of_file().to_string(), ":00000001FF");
	}

	#[test]
	fn parse_accepts_lowercase_digits()
	{
		let record = HexRecord::parse(":0400100048656c6c67").expect("record should parse");
		assert_eq!(record.address, 0x0010);
		assert_eq!(record.data, b"Hell");
	}

	#[test]
	fn parse_rejects_bad_digits()
	{
		assert_eq!(HexRecord::parse(":0000000G01"), Err(RecordFault::InvalidDigit('G')));
		assert_eq!(HexRecord::parse("00000001FF"), Err(RecordFault::MissingStartMarker));
		assert_eq!(HexRecord::parse(":00000001F"), Err(RecordFault::OddDigitCount(9)));
		assert_eq!(HexRecord::parse(":000000"), Err(RecordFault::TooShort(6)));
	}

	#[test]
	fn parse_rejects_unknown_type()
	{
		// Type 0x06 with a checksum that balances
		assert_eq!(HexRecord::parse(":00000006FA"), Err(RecordFault::UnknownRecordType(0x06)));
	}

	#[test]
	fn parse_rejects_short_extended_address()
	{
		let fault = HexRecord::parse(":0100000410EB").unwrap_err();
		assert_eq!(fault, RecordFault::InvalidPayloadLength {
			record_type: RecordType::ExtendedLinearAddress,
			expected: 2,
			actual: 1,
		});
	}
}
