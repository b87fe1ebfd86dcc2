// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

#[cfg(test)]
mod tests
{
	use color_eyre::eyre::Result;
	use ubitflashtool::Error;
	use ubitflashtool::ihex::HexDocument;
	use ubitflashtool::image::MemoryImage;

	#[test]
	fn overlapping_records_last_write_wins() -> Result<()>
	{
		let document = HexDocument::decode(":020000001111DC\n:0100010022DC\n:00000001FF\n")?;
		let image = MemoryImage::from_hex_document(&document)?;

		assert_eq!(image.get(0), Some(0x11));
		assert_eq!(image.get(1), Some(0x22));
		assert_eq!(image.len(), 2);
		Ok(())
	}

	#[test]
	fn slice_does_not_zero_fill() -> Result<()>
	{
		let mut image = MemoryImage::from_bytes(0x10, &[1, 2, 3, 4])?;
		image.write(0x40, &[5, 6])?;

		let slice = image.slice(0x12, 0x41)?;
		assert_eq!(slice.len(), 3);
		assert_eq!(slice.get(0x11), None);
		assert_eq!(slice.get(0x12), Some(3));
		assert_eq!(slice.get(0x20), None);
		assert_eq!(slice.get(0x40), Some(5));
		assert_eq!(slice.get(0x41), None);
		assert_eq!(slice.span(), Some(0x12..0x41));
		Ok(())
	}

	#[test]
	fn slice_with_inverted_range()
	{
		let image = MemoryImage::from_bytes(0, &[0]).unwrap();
		assert_eq!(image.slice(8, 4), Err(Error::RangeError { start: 8, end: 4 }));
	}

	#[test]
	fn empty_and_zero_are_different()
	{
		let mut image = MemoryImage::new();
		assert!(image.is_empty());
		assert_eq!(image.get(0), None);

		image.set(0, 0x00).unwrap();
		assert!(!image.is_empty());
		assert_eq!(image.get(0), Some(0x00));
		assert!(image.slice(1, 100).unwrap().is_empty());
	}

	#[test]
	fn contiguous_bytes_requires_every_byte() -> Result<()>
	{
		let mut image = MemoryImage::from_bytes(0x00, b"abcd")?;
		image.write(0x05, b"f")?;

		assert_eq!(image.contiguous_bytes(0x01, 0x03), Some(&b"bc"[..]));
		assert_eq!(image.contiguous_bytes(0x02, 0x06), None);
		Ok(())
	}

	#[test]
	fn full_flash_built_one_byte_at_a_time() -> Result<()>
	{
		let mut image = MemoryImage::new();
		for address in 0..0x4_0000u32 {
			image.set(address, address as u8)?;
		}

		assert_eq!(image.chunks().count(), 1);
		assert_eq!(image.len(), 0x4_0000);
		assert_eq!(image.span(), Some(0..0x4_0000));
		assert_eq!(image.get(0x1_2345), Some(0x45));
		Ok(())
	}

	#[test]
	fn write_inside_and_across_runs() -> Result<()>
	{
		let mut image = MemoryImage::from_bytes(0x10, &[0xaa; 8])?;
		image.write(0x12, &[0x11, 0x22])?;
		assert_eq!(image.contiguous_bytes(0x10, 0x18), Some(&[0xaa, 0xaa, 0x11, 0x22, 0xaa, 0xaa, 0xaa, 0xaa][..]));

		// Starting before the lowest run and swallowing the next one whole
		image.write(0x20, &[0xbb; 2])?;
		image.write(0x0e, &[0xcc; 0x13])?;
		let chunks: Vec<_> = image.chunks().collect();
		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].0, 0x0e);
		assert_eq!(chunks[0].1.len(), 0x14);
		assert_eq!(image.get(0x21), Some(0xbb));
		assert_eq!(image.get(0x20), Some(0xcc));
		Ok(())
	}

	#[test]
	fn equal_contents_written_differently_compare_equal() -> Result<()>
	{
		let mut piecewise = MemoryImage::new();
		for (offset, byte) in b"hello".iter().enumerate().rev() {
			piecewise.set(0x100 + offset as u32, *byte)?;
		}
		assert_eq!(piecewise, MemoryImage::from_bytes(0x100, b"hello")?);
		Ok(())
	}
}
