// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use color_eyre::eyre::{Report, Result, eyre};
use goblin::container::Endian;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::{Elf, header::{EI_CLASS, ELFCLASS32, EM_ARM}};
use log::debug;

use super::FirmwareStorage;
use crate::image::MemoryImage;

pub struct ElfFirmwareFile
{
	image: MemoryImage,
}

impl TryFrom<&[u8]> for ElfFirmwareFile
{
	type Error = Report;

	fn try_from(contents: &[u8]) -> Result<Self>
	{
		debug!("Loading file as ELF");
		let elf = Elf::parse(contents)?;

		// Validate the header is for a 32-bit little endian ARM device
		let header = elf.header;
		if header.e_machine != EM_ARM || header.endianness()? != Endian::Little ||
			header.e_ident[EI_CLASS] != ELFCLASS32 {
			return Err(eyre!("ELF does not represent firmware for a 32-bit ARM device"));
		}

		// Place every loadable non-zero-length segment at its physical (load) address
		let mut image = MemoryImage::new();
		for segment in elf.program_headers.iter().filter(|header| header.p_type == PT_LOAD && header.p_filesz != 0) {
			let data = contents
				.get(segment.file_range())
				.ok_or_else(|| eyre!("ELF segment at 0x{:08x} runs past the end of the file", segment.p_paddr))?;
			let address = u32::try_from(segment.p_paddr)
				.map_err(|_| eyre!("ELF segment address 0x{:x} is not a 32-bit address", segment.p_paddr))?;
			debug!("Loading {} byte segment at 0x{:08x}", data.len(), address);
			image.write(address, data)?;
		}

		Ok(Self {
			image,
		})
	}
}

impl FirmwareStorage for ElfFirmwareFile
{
	fn into_image(self: Box<Self>) -> MemoryImage
	{
		self.image
	}
}
