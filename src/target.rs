// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use log::{debug, trace};

use crate::error::Error;
use crate::image::MemoryImage;
use crate::log_and_return;
use crate::region::{ERASED_FLASH_BYTE, RegionDescriptor, RegionMap};

/// Types implementing this trait provide access to the memory of a target device,
/// normally through a debug probe.
///
/// A read either returns the whole of the requested range or fails; there is no partial result.
pub trait MemoryTarget
{
	fn read_memory_range(&mut self, start: u32, length: u32) -> Result<Vec<u8>, Error>;
	fn write_memory_range(&mut self, start: u32, data: &[u8]) -> Result<(), Error>;
}

/// Read `region` of the target in one access and wrap it up as an image.
pub fn read_region(target: &mut dyn MemoryTarget, region: &RegionDescriptor) -> Result<MemoryImage, Error>
{
	debug!("Reading {}", region);
	let bytes = target.read_memory_range(region.start, region.len())?;
	if bytes.len() != region.len() as usize {
		log_and_return!(Error::device(
			format!("read {} bytes from 0x{:08x}", region.len(), region.start),
			format!("target returned {} bytes", bytes.len()),
		));
	}
	MemoryImage::from_bytes(region.start, &bytes)
}

/// A target whose memory is held in a [`MemoryImage`], such as one loaded from a dump file.
///
/// Only addresses inside the code flash and UICR of the map it was built with exist.
/// Bytes of those regions that the image leaves unset read back as erased flash.
pub struct ImageTarget
{
	memory: MemoryImage,
	regions: Vec<RegionDescriptor>,
}

impl ImageTarget
{
	pub fn new(memory: MemoryImage, map: &RegionMap) -> Self
	{
		Self {
			memory,
			regions: vec![map.code_flash().clone(), map.uicr().clone()],
		}
	}

	pub fn memory(&self) -> &MemoryImage
	{
		&self.memory
	}

	fn check_access(&self, operation: impl FnOnce() -> String, start: u32, length: u32) -> Result<(), Error>
	{
		if self.regions.iter().any(|region| region.covers(start, length)) {
			Ok(())
		} else {
			Err(Error::device(operation(), "address range is not backed by target memory"))
		}
	}
}

impl MemoryTarget for ImageTarget
{
	fn read_memory_range(&mut self, start: u32, length: u32) -> Result<Vec<u8>, Error>
	{
		self.check_access(|| format!("read {length} bytes from 0x{start:08x}"), start, length)?;
		trace!("Reading {} bytes from 0x{:08x}", length, start);

		// `covers` succeeded, so the range doesn't run off the end of the address space
		Ok((0..length)
			.map(|offset| self.memory.get(start + offset).unwrap_or(ERASED_FLASH_BYTE))
			.collect())
	}

	fn write_memory_range(&mut self, start: u32, data: &[u8]) -> Result<(), Error>
	{
		let length = u32::try_from(data.len())
			.map_err(|_| Error::device(format!("write {} bytes to 0x{start:08x}", data.len()), "write too large"))?;
		self.check_access(|| format!("write {length} bytes to 0x{start:08x}"), start, length)?;
		trace!("Writing {} bytes to 0x{:08x}", length, start);
		self.memory.write(start, data)
	}
}
