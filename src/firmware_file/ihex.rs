// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use color_eyre::eyre::{Report, Result, eyre};
use log::debug;

use super::FirmwareStorage;
use crate::ihex::HexDocument;
use crate::image::MemoryImage;

pub struct IntelHexFirmwareFile
{
	image: MemoryImage,
}

impl TryFrom<&[u8]> for IntelHexFirmwareFile
{
	type Error = Report;

	fn try_from(contents: &[u8]) -> Result<Self>
	{
		debug!("Loading file as Intel HEX");
		let text = std::str::from_utf8(contents).map_err(|_| eyre!("Intel HEX file is not valid text"))?;
		let document = HexDocument::decode(text)?;
		if let Some(entry_point) = document.start_linear_address() {
			debug!("Intel HEX file gives an entry point of 0x{:08x}", entry_point);
		}

		Ok(Self {
			image: MemoryImage::from_hex_document(&document)?,
		})
	}
}

impl FirmwareStorage for IntelHexFirmwareFile
{
	fn into_image(self: Box<Self>) -> MemoryImage
	{
		self.image
	}
}
