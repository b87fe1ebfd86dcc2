// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Pulling the MicroPython runtime, user code, whole flash or UICR out of a memory image.

use log::debug;

use crate::error::Error;
use crate::ihex::{self, EncodeOptions};
use crate::image::MemoryImage;
use crate::pretty::{PrettyOptions, to_pretty_text_with};
use crate::region::RegionMap;

/// Header that uflash-style tooling prefixes onto a MicroPython script in flash.
pub const SCRIPT_MAGIC: &[u8; 2] = b"MP";
const SCRIPT_HEADER_LENGTH: usize = 4;

/// Extracts parts of a code flash/UICR image according to a [`RegionMap`].
///
/// None of the operations modify the image they're given.
pub struct FirmwareExtractor<'m>
{
	map: &'m RegionMap,
	options: EncodeOptions,
	pretty_options: PrettyOptions,
}

impl<'m> FirmwareExtractor<'m>
{
	pub fn new(map: &'m RegionMap) -> Self
	{
		Self {
			map,
			options: EncodeOptions::default(),
			pretty_options: PrettyOptions::default(),
		}
	}

	pub fn with_encode_options(mut self, options: EncodeOptions) -> Self
	{
		self.options = options;
		self
	}

	pub fn with_pretty_options(mut self, options: PrettyOptions) -> Self
	{
		self.pretty_options = options;
		self
	}

	/// The bytes between the runtime signature and the end of code flash, with trailing
	/// unset and padding bytes trimmed off. Unset bytes within that range read as padding.
	pub fn extract_user_code(&self, image: &MemoryImage) -> Result<Vec<u8>, Error>
	{
		let split = self.map.locate_runtime_user_split(image)?;
		let flash_end = self.map.code_flash().end;
		let padding = self.map.padding_byte();

		let user = image.slice(split, flash_end)?;
		// Only materialise up to the last set byte, which bounds the trim below
		let end = match user.span() {
			Some(span) => span.end as u32,
			None => return Ok(Vec::new()),
		};

		let mut code: Vec<u8> = (split..end)
			.map(|address| user.get(address).unwrap_or(padding))
			.collect();
		let used = code
			.iter()
			.rposition(|byte| *byte != padding)
			.map_or(0, |index| index + 1);
		code.truncate(used);

		debug!("Extracted {} bytes of user code from 0x{:08x}", code.len(), split);
		Ok(code)
	}

	/// The user code decoded as MicroPython source text.
	///
	/// If it starts with the `MP` header, the little endian length that follows says how much
	/// of what comes after is the script. Otherwise all of the user code is taken as the script.
	pub fn extract_python_code(&self, image: &MemoryImage) -> Result<String, Error>
	{
		let code = self.extract_user_code(image)?;
		let script = match code.get(..SCRIPT_HEADER_LENGTH) {
			Some([magic_0, magic_1, length_lo, length_hi]) if [*magic_0, *magic_1] == *SCRIPT_MAGIC => {
				let length = u16::from_le_bytes([*length_lo, *length_hi]) as usize;
				let end = (SCRIPT_HEADER_LENGTH + length).min(code.len());
				&code[SCRIPT_HEADER_LENGTH..end]
			},
			_ => code.as_slice(),
		};

		let text = String::from_utf8_lossy(script);
		Ok(text.trim_end_matches('\0').to_string())
	}

	/// Code flash from its start up to the runtime signature's end, as Intel HEX.
	pub fn extract_runtime(&self, image: &MemoryImage) -> Result<String, Error>
	{
		let split = self.map.locate_runtime_user_split(image)?;
		let runtime = image.slice(self.map.code_flash().start, split)?;
		Ok(ihex::encode(&runtime, &self.options))
	}

	pub fn extract_full_flash(&self, image: &MemoryImage) -> Result<String, Error>
	{
		let flash = self.map.code_flash().slice(image)?;
		Ok(ihex::encode(&flash, &self.options))
	}

	pub fn extract_full_flash_pretty(&self, image: &MemoryImage) -> Result<String, Error>
	{
		let flash = self.map.code_flash().slice(image)?;
		Ok(to_pretty_text_with(&flash, self.map, &self.pretty_options))
	}

	pub fn extract_uicr(&self, image: &MemoryImage) -> Result<String, Error>
	{
		let uicr = self.map.uicr().slice(image)?;
		Ok(ihex::encode(&uicr, &self.options))
	}

	/// Only the customer registers of the UICR, as Intel HEX.
	pub fn extract_uicr_customer(&self, image: &MemoryImage) -> Result<String, Error>
	{
		let customer = self.map.uicr_customer().slice(image)?;
		Ok(ihex::encode(&customer, &self.options))
	}
}
