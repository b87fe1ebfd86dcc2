// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use color_eyre::eyre::{Result, eyre};
use log::debug;

use super::FirmwareStorage;
use crate::image::MemoryImage;

pub struct RawFirmwareFile
{
	image: MemoryImage,
}

impl RawFirmwareFile
{
	pub fn new(contents: Vec<u8>, load_address: u32) -> Result<Self>
	{
		debug!("Loading file as raw binary at 0x{:08x}", load_address);
		// Check that the result isn't too insanely big
		if load_address as u64 + contents.len() as u64 > u32::MAX as u64 + 1 {
			Err(eyre!(
				"Binary of {} bytes does not fit in the 32-bit address space when loaded at 0x{:08x}",
				contents.len(),
				load_address
			))
		} else {
			Ok(Self {
				image: MemoryImage::from_bytes(load_address, &contents)?,
			})
		}
	}
}

impl FirmwareStorage for RawFirmwareFile
{
	fn into_image(self: Box<Self>) -> MemoryImage
	{
		self.image
	}
}
