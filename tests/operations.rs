// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

#[cfg(test)]
mod tests
{
	use color_eyre::eyre::Result;
	use ubitflashtool::Error;
	use ubitflashtool::firmware_file::{FirmwareFile, FirmwareFormat};
	use ubitflashtool::ihex::{self, EncodeOptions};
	use ubitflashtool::image::MemoryImage;
	use ubitflashtool::operation::{Operation, Settings, dispatch};
	use ubitflashtool::region::{RegionMap, Signature};
	use ubitflashtool::target::{ImageTarget, MemoryTarget};

	const SIGNATURE: [u8; 4] = [0xfe, 0xca, 0x0d, 0xf0];

	fn settings() -> Settings
	{
		Settings {
			map: RegionMap::microbit().with_runtime_signature(Signature::new(&SIGNATURE).unwrap()),
			..Default::default()
		}
	}

	fn device_memory() -> MemoryImage
	{
		let mut memory = MemoryImage::from_bytes(0, &[0x00; 0x1ffc]).unwrap();
		memory.write(0x1ffc, &SIGNATURE).unwrap();
		memory.write(0x2000, b"import os\n").unwrap();
		memory.write(0x1000_1080, &[0x01, 0x02, 0x03, 0x04]).unwrap();
		memory
	}

	fn target() -> ImageTarget
	{
		ImageTarget::new(device_memory(), &settings().map)
	}

	/// A target whose probe has gone away.
	struct DisconnectedTarget;

	impl MemoryTarget for DisconnectedTarget
	{
		fn read_memory_range(&mut self, _start: u32, _length: u32) -> Result<Vec<u8>, Error>
		{
			Err(Error::DeviceError {
				operation: "read".into(),
				reason: "probe disconnected".into(),
			})
		}

		fn write_memory_range(&mut self, _start: u32, _data: &[u8]) -> Result<(), Error>
		{
			Err(Error::DeviceError {
				operation: "write".into(),
				reason: "probe disconnected".into(),
			})
		}
	}

	/// A target that hands back less than it was asked for.
	struct ShortReadTarget;

	impl MemoryTarget for ShortReadTarget
	{
		fn read_memory_range(&mut self, _start: u32, length: u32) -> Result<Vec<u8>, Error>
		{
			Ok(vec![0xff; length as usize / 2])
		}

		fn write_memory_range(&mut self, _start: u32, _data: &[u8]) -> Result<(), Error>
		{
			Ok(())
		}
	}

	#[test]
	fn read_code_from_target() -> Result<()>
	{
		let text = dispatch(&Operation::ReadCode, &mut target(), &settings())?;
		assert_eq!(text, "import os\n");
		Ok(())
	}

	#[test]
	fn read_runtime_from_target() -> Result<()>
	{
		let text = dispatch(&Operation::ReadRuntime, &mut target(), &settings())?;
		assert_eq!(ihex::decode(&text)?, device_memory().slice(0, 0x2000)?);
		Ok(())
	}

	#[test]
	fn read_full_flash_covers_whole_region() -> Result<()>
	{
		let text = dispatch(&Operation::ReadFlashHex, &mut target(), &settings())?;
		let flash = ihex::decode(&text)?;

		assert_eq!(flash.span(), Some(0..0x40000));
		assert_eq!(flash.len(), 0x40000);
		// Bytes the dump doesn't hold read back as erased flash
		assert_eq!(flash.get(0x3_ffff), Some(0xff));
		assert_eq!(flash.get(0x2000), Some(b'i'));
		Ok(())
	}

	#[test]
	fn read_flash_pretty() -> Result<()>
	{
		let text = dispatch(&Operation::ReadFlashPretty, &mut target(), &settings())?;
		assert!(text.starts_with("; runtime [0x00000000-0x00002000)\n"));
		assert!(text.contains("; user code [0x00002000-0x00040000)\n"));
		Ok(())
	}

	#[test]
	fn read_uicr_and_customer_registers() -> Result<()>
	{
		let uicr = ihex::decode(&dispatch(&Operation::ReadUicr, &mut target(), &settings())?)?;
		assert_eq!(uicr.span(), Some(0x1000_1000..0x1000_1100));
		assert_eq!(uicr.get(0x1000_1000), Some(0xff));
		assert_eq!(uicr.get(0x1000_1081), Some(0x02));

		let customer = ihex::decode(&dispatch(&Operation::ReadUicrCustomer, &mut target(), &settings())?)?;
		assert_eq!(customer.span(), Some(0x1000_1080..0x1000_1100));
		Ok(())
	}

	#[test]
	fn compare_flash_reports_changes() -> Result<()>
	{
		let mut reference = device_memory().slice(0, 0x3000)?;
		reference.set(0x2004, b'X')?;
		reference.write(0x2000 + 10, &[0xff; 0x3000 - 0x200a])?;

		let report = dispatch(&Operation::CompareFlash(reference), &mut target(), &settings())?;
		assert_eq!(
			report,
			"0x00002004-0x00002005: differing\n0x00003000-0x00040000: only in A\n"
		);
		Ok(())
	}

	#[test]
	fn compare_uicr_against_itself() -> Result<()>
	{
		let mut reference = MemoryImage::from_bytes(0x1000_1000, &[0xff; 0x100])?;
		reference.write(0x1000_1080, &[0x01, 0x02, 0x03, 0x04])?;
		// Flash contents in the reference aren't part of a UICR comparison
		reference.write(0x0, &[0xaa; 16])?;

		let report = dispatch(&Operation::CompareUicr(reference), &mut target(), &settings())?;
		assert_eq!(report, "No differences found\n");
		Ok(())
	}

	#[test]
	fn flash_hex_writes_every_run() -> Result<()>
	{
		let mut image = MemoryImage::from_bytes(0x4000, b"firmware")?;
		image.write(0x1000_1080, &[0xaa, 0x55])?;
		let text = ihex::encode(&image, &EncodeOptions::default());

		let mut target = ImageTarget::new(MemoryImage::new(), &settings().map);
		let summary = dispatch(&Operation::FlashHex(text), &mut target, &settings())?;

		assert_eq!(summary, "Wrote 10 bytes in 2 runs\n");
		assert_eq!(target.memory(), &image);
		Ok(())
	}

	#[test]
	fn flash_hex_with_bad_document_writes_nothing()
	{
		let mut target = ImageTarget::new(MemoryImage::new(), &settings().map);
		let result = dispatch(&Operation::FlashHex(":0100000000FF\n".into()), &mut target, &settings());

		assert_eq!(result, Err(Error::MissingEndMarker));
		assert!(target.memory().is_empty());
	}

	#[test]
	fn access_outside_target_memory_fails()
	{
		let mut target = target();
		assert!(matches!(target.read_memory_range(0x2000_0000, 4), Err(Error::DeviceError { .. })));
		assert!(matches!(target.read_memory_range(0x3_fffe, 4), Err(Error::DeviceError { .. })));
		assert!(matches!(target.write_memory_range(0x1000_0000, &[0]), Err(Error::DeviceError { .. })));
	}

	#[test]
	fn device_errors_propagate_unchanged()
	{
		let expected = Err(Error::DeviceError {
			operation: "read".into(),
			reason: "probe disconnected".into(),
		});
		for operation in [Operation::ReadCode, Operation::ReadUicr, Operation::CompareFlash(MemoryImage::new())] {
			assert_eq!(dispatch(&operation, &mut DisconnectedTarget, &settings()), expected);
		}
	}

	#[test]
	fn short_reads_are_device_errors()
	{
		let result = dispatch(&Operation::ReadFlashHex, &mut ShortReadTarget, &settings());
		assert!(matches!(result, Err(Error::DeviceError { .. })));
	}

	#[test]
	fn missing_runtime_signature()
	{
		let settings = Settings::default();
		let mut target = ImageTarget::new(device_memory(), &settings.map);
		assert_eq!(dispatch(&Operation::ReadCode, &mut target, &settings), Err(Error::MarkerNotFound));
	}

	#[test]
	fn firmware_files_by_format() -> Result<()>
	{
		let map = RegionMap::microbit();

		let hex = FirmwareFile::from_bytes(b":03000000010203F7\n:00000001FF\n".to_vec(), &map)?;
		assert_eq!(hex.format(), FirmwareFormat::IntelHex);
		assert_eq!(hex.image(), &MemoryImage::from_bytes(0, &[1, 2, 3])?);

		let raw = FirmwareFile::from_bytes(vec![0xc0, 0x07, 0x00, 0x00], &map)?;
		assert_eq!(raw.format(), FirmwareFormat::Binary);
		assert_eq!(raw.into_image(), MemoryImage::from_bytes(0, &[0xc0, 0x07, 0x00, 0x00])?);

		assert_eq!(FirmwareFormat::detect_from_firmware(b"\x7fELF\x01\x01\x01"), FirmwareFormat::Elf);
		assert!(FirmwareFile::from_bytes(b":0300000001".to_vec(), &map).is_err());
		Ok(())
	}
}
