// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Module for error handling code.

use thiserror::Error;

use crate::ihex::RecordType;

/// The specific way an Intel HEX line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordFault
{
	#[error("line does not begin with the ':' start marker")]
	MissingStartMarker,

	#[error("record contains an odd number of hex digits ({0})")]
	OddDigitCount(usize),

	#[error("record is too short ({0} hex digits) to hold a header and checksum")]
	TooShort(usize),

	#[error("'{0}' is not a hex digit")]
	InvalidDigit(char),

	#[error("byte count field says {declared} bytes but the record carries {actual}")]
	ByteCountMismatch
	{
		declared: u8,
		actual: usize,
	},

	#[error("checksum is 0x{stored:02X} but the record sums to 0x{computed:02X}")]
	ChecksumMismatch
	{
		stored: u8,
		computed: u8,
	},

	#[error("unknown record type 0x{0:02X}")]
	UnknownRecordType(u8),

	#[error("{record_type} record must carry {expected} data bytes, not {actual}")]
	InvalidPayloadLength
	{
		record_type: RecordType,
		expected: usize,
		actual: usize,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error
{
	#[error("Malformed Intel HEX record on line {line}: {fault}")]
	MalformedRecord
	{
		/// 1-based line number of the offending record
		line: usize,
		#[source]
		fault: RecordFault,
	},

	#[error("Intel HEX document has no End Of File record")]
	MissingEndMarker,

	#[error("Intel HEX record on line {line} follows the End Of File record")]
	RecordAfterEnd
	{
		line: usize,
	},

	#[error("No MicroPython runtime signature found in flash, no code present")]
	MarkerNotFound,

	#[error("Device error when attempting to {operation}: {reason}")]
	DeviceError
	{
		/// The access that failed (e.g. `"read 0x40000 bytes from 0x00000000"`).
		operation: String,
		reason: String,
	},

	#[error("Address range 0x{start:08x}-0x{end:08x} is outside of the memory image")]
	RangeError
	{
		start: u64,
		end: u64,
	},
}

impl Error
{
	pub(crate) fn malformed(line: usize, fault: RecordFault) -> Self
	{
		Self::MalformedRecord {
			line,
			fault,
		}
	}

	pub(crate) fn device(operation: impl Into<String>, reason: impl Into<String>) -> Self
	{
		Self::DeviceError {
			operation: operation.into(),
			reason: reason.into(),
		}
	}
}

#[macro_export]
macro_rules! log_and_return
{
	($err:expr) => {
		let err = $err;
		log::error!("{}", err);
		return Err(err);
	}
}
