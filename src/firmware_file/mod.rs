// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Loading memory images from firmware and dump files.

use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use color_eyre::eyre::{Context, Result, eyre};
use log::debug;

mod elf;
mod ihex;
mod raw;

use self::elf::ElfFirmwareFile;
use self::ihex::IntelHexFirmwareFile;
use self::raw::RawFirmwareFile;
use crate::image::MemoryImage;
use crate::region::RegionMap;

/// File formats a firmware image or memory dump can be in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FirmwareFormat
{
	/// Raw binary format, as from `objcopy -O binary` or a flash dump. Typical file extension: `.bin`.
	Binary,

	/// The Unix ELF executable binary format. Typical file extension: `.elf`.
	Elf,

	/// Intel HEX. Typical file extensions: `.hex`, `.ihex`.
	IntelHex,
}

impl FirmwareFormat
{
	/// Detect the kind of firmware from its data.
	pub fn detect_from_firmware(firmware: &[u8]) -> Self
	{
		if firmware.starts_with(b"\x7fELF") {
			FirmwareFormat::Elf
		} else if firmware.starts_with(b":") {
			FirmwareFormat::IntelHex
		} else {
			FirmwareFormat::Binary
		}
	}
}

impl Display for FirmwareFormat
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		match self {
			Self::Binary => write!(f, "raw binary")?,
			Self::Elf => write!(f, "ELF")?,
			Self::IntelHex => write!(f, "Intel HEX")?,
		};

		Ok(())
	}
}

trait FirmwareStorage
{
	fn into_image(self: Box<Self>) -> MemoryImage;
}

/// The memory contents described by a firmware file, whatever its format.
pub struct FirmwareFile
{
	format: FirmwareFormat,
	image: MemoryImage,
}

impl FirmwareFile
{
	/// Construct a FirmwareFile from a path to a file
	pub fn from_path(file_name: &Path, map: &RegionMap) -> Result<Self>
	{
		let mut file =
			File::open(file_name).wrap_err_with(|| eyre!("Failed to read file {} as firmware", file_name.display()))?;
		let mut contents = Vec::new();
		file.read_to_end(&mut contents)
			.wrap_err_with(|| eyre!("Failed to read file {} as firmware", file_name.display()))?;

		Self::from_bytes(contents, map).wrap_err_with(|| eyre!("Failed to load {}", file_name.display()))
	}

	/// Construct a FirmwareFile from the contents of a file. Raw binaries are placed at the
	/// start of `map`'s code flash.
	pub fn from_bytes(contents: Vec<u8>, map: &RegionMap) -> Result<Self>
	{
		let format = FirmwareFormat::detect_from_firmware(&contents);
		debug!("Firmware file detected as {}", format);

		let storage: Box<dyn FirmwareStorage> = match format {
			FirmwareFormat::Elf => Box::new(ElfFirmwareFile::try_from(contents.as_slice())?),
			FirmwareFormat::IntelHex => Box::new(IntelHexFirmwareFile::try_from(contents.as_slice())?),
			FirmwareFormat::Binary => Box::new(RawFirmwareFile::new(contents, map.code_flash().start)?),
		};

		Ok(Self {
			format,
			image: storage.into_image(),
		})
	}

	pub fn format(&self) -> FirmwareFormat
	{
		self.format
	}

	pub fn image(&self) -> &MemoryImage
	{
		&self.image
	}

	pub fn into_image(self) -> MemoryImage
	{
		self.image
	}
}
