// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! The named operations a front end can ask for, each producing a string to display.

use log::info;

use crate::compare::{ReportOptions, compare, to_report};
use crate::error::Error;
use crate::extractor::FirmwareExtractor;
use crate::ihex::{self, EncodeOptions};
use crate::image::MemoryImage;
use crate::pretty::PrettyOptions;
use crate::region::RegionMap;
use crate::target::{MemoryTarget, read_region};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation
{
	/// Read the MicroPython script stored after the runtime
	ReadCode,
	/// Read the MicroPython runtime as Intel HEX
	ReadRuntime,
	/// Read all of code flash as Intel HEX
	ReadFlashHex,
	/// Read all of code flash as a pretty hex dump
	ReadFlashPretty,
	/// Read the UICR as Intel HEX
	ReadUicr,
	/// Read only the UICR customer registers as Intel HEX
	ReadUicrCustomer,
	/// Compare code flash against a reference image
	CompareFlash(MemoryImage),
	/// Compare the UICR against a reference image
	CompareUicr(MemoryImage),
	/// Write the contents of an Intel HEX document to the target
	FlashHex(String),
}

impl Operation
{
	/// The command title a front end shows for this operation.
	pub fn title(&self) -> &'static str
	{
		match self {
			Self::ReadCode => "Read MicroPython code",
			Self::ReadRuntime => "Read MicroPython runtime",
			Self::ReadFlashHex => "Read full flash contents (Intel Hex)",
			Self::ReadFlashPretty => "Read full flash contents (Pretty Hex)",
			Self::ReadUicr => "Read UICR",
			Self::ReadUicrCustomer => "Read UICR Customer",
			Self::CompareFlash(_) => "Compare full flash contents (Intel Hex)",
			Self::CompareUicr(_) => "Compare UICR (Intel Hex)",
			Self::FlashHex(_) => "Flash Intel Hex",
		}
	}
}

/// Everything about how operations behave that isn't the target itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings
{
	pub map: RegionMap,
	pub encode_options: EncodeOptions,
	pub report_options: ReportOptions,
	pub pretty_options: PrettyOptions,
}

/// Run `operation` against `target`, returning the text to display.
pub fn dispatch(operation: &Operation, target: &mut dyn MemoryTarget, settings: &Settings) -> Result<String, Error>
{
	info!("{}", operation.title());
	let map = &settings.map;
	let extractor = FirmwareExtractor::new(map)
		.with_encode_options(settings.encode_options)
		.with_pretty_options(settings.pretty_options);

	match operation {
		Operation::ReadCode => extractor.extract_python_code(&read_region(target, map.code_flash())?),
		Operation::ReadRuntime => extractor.extract_runtime(&read_region(target, map.code_flash())?),
		Operation::ReadFlashHex => extractor.extract_full_flash(&read_region(target, map.code_flash())?),
		Operation::ReadFlashPretty => extractor.extract_full_flash_pretty(&read_region(target, map.code_flash())?),
		Operation::ReadUicr => extractor.extract_uicr(&read_region(target, map.uicr())?),
		Operation::ReadUicrCustomer => extractor.extract_uicr_customer(&read_region(target, map.uicr_customer())?),
		Operation::CompareFlash(reference) => {
			let device = read_region(target, map.code_flash())?;
			let reference = map.code_flash().slice(reference)?;
			Ok(to_report(&compare(&device, &reference), &settings.report_options))
		},
		Operation::CompareUicr(reference) => {
			let device = read_region(target, map.uicr())?;
			let reference = map.uicr().slice(reference)?;
			Ok(to_report(&compare(&device, &reference), &settings.report_options))
		},
		Operation::FlashHex(text) => flash_hex(target, text),
	}
}

fn flash_hex(target: &mut dyn MemoryTarget, text: &str) -> Result<String, Error>
{
	// Decode everything before touching the target so a bad file writes nothing
	let image = ihex::decode(text)?;
	let mut runs = 0;
	for (address, bytes) in image.chunks() {
		target.write_memory_range(address, bytes)?;
		runs += 1;
	}
	Ok(format!("Wrote {} bytes in {} runs\n", image.len(), runs))
}
