// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::Error;
use crate::ihex::HexDocument;

/// One past the highest address representable on the 32-bit target.
const ADDRESS_SPACE_END: u64 = 1 << 32;

/// A sparse view of target memory.
///
/// Bytes are held as maximal runs of contiguous set addresses, keyed by the address of
/// their first byte. Runs never touch or overlap, so two images holding the same set of
/// bytes are always structurally equal. Addresses that were never written are unset,
/// which is not the same as holding `0x00`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage
{
	chunks: BTreeMap<u32, Vec<u8>>,
}

impl MemoryImage
{
	pub fn new() -> Self
	{
		Self::default()
	}

	/// An image holding `bytes` contiguously from `base`.
	pub fn from_bytes(base: u32, bytes: &[u8]) -> Result<Self, Error>
	{
		let mut image = Self::new();
		image.write(base, bytes)?;
		Ok(image)
	}

	/// Replay the Data records of a document in order, later records overwriting earlier ones.
	pub fn from_hex_document(document: &HexDocument) -> Result<Self, Error>
	{
		let mut image = Self::new();
		for (address, data) in document.data_records() {
			if address >= ADDRESS_SPACE_END {
				return Err(Error::RangeError {
					start: address,
					end: address + data.len() as u64,
				});
			}
			image.write(address as u32, data)?;
		}
		Ok(image)
	}

	pub fn is_empty(&self) -> bool
	{
		self.chunks.is_empty()
	}

	/// Number of set bytes.
	pub fn len(&self) -> usize
	{
		self.chunks.values().map(Vec::len).sum()
	}

	pub fn get(&self, address: u32) -> Option<u8>
	{
		let (start, bytes) = self.chunks.range(..=address).next_back()?;
		bytes.get((address - start) as usize).copied()
	}

	pub fn set(&mut self, address: u32, value: u8) -> Result<(), Error>
	{
		self.write(address, &[value])
	}

	/// Write a run of bytes, replacing any already set in that range and merging with
	/// any neighbouring runs.
	pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), Error>
	{
		if data.is_empty() {
			return Ok(());
		}
		let start = address as u64;
		let end = start + data.len() as u64;
		if end > ADDRESS_SPACE_END {
			return Err(Error::RangeError {
				start,
				end,
			});
		}

		// Every run that overlaps or abuts the new one, lowest first
		let mut touching: Vec<u32> = self
			.chunks
			.range(..=end.min(u32::MAX as u64) as u32)
			.rev()
			.take_while(|(chunk_start, bytes)| **chunk_start as u64 + bytes.len() as u64 >= start)
			.map(|(chunk_start, _)| *chunk_start)
			.collect();
		touching.reverse();

		// Grow the lowest run in place when it begins at or before the write
		let (base, mut run) = match touching.first() {
			Some(&first) if first as u64 <= start => match self.chunks.remove(&first) {
				Some(bytes) => (first as u64, bytes),
				None => (start, Vec::new()),
			},
			_ => (start, Vec::with_capacity(data.len())),
		};

		let offset = (start - base) as usize;
		let overlap = run.len().saturating_sub(offset).min(data.len());
		run[offset..offset + overlap].copy_from_slice(&data[..overlap]);
		run.extend_from_slice(&data[overlap..]);

		// The remaining runs start inside the write; only a tail past its end survives
		for chunk_start in touching.into_iter().filter(|chunk_start| *chunk_start as u64 > base) {
			if let Some(bytes) = self.chunks.remove(&chunk_start) {
				let chunk_end = chunk_start as u64 + bytes.len() as u64;
				if chunk_end > end {
					run.extend_from_slice(&bytes[(end - chunk_start as u64) as usize..]);
				}
			}
		}

		self.chunks.insert(base as u32, run);
		Ok(())
	}

	/// A new image holding only the addresses of this one that fall within `[start, end)`.
	pub fn slice(&self, start: u32, end: u32) -> Result<Self, Error>
	{
		self.slice_range(start as u64, end as u64)
	}

	/// As [`MemoryImage::slice`], but with an end that may be one past the last 32-bit address.
	pub fn slice_range(&self, start: u64, end: u64) -> Result<Self, Error>
	{
		if start > end || end > ADDRESS_SPACE_END {
			return Err(Error::RangeError {
				start,
				end,
			});
		}

		let mut chunks = BTreeMap::new();
		for (chunk_start, bytes) in self.chunks() {
			let chunk_start = chunk_start as u64;
			let chunk_end = chunk_start + bytes.len() as u64;
			if chunk_end <= start || chunk_start >= end {
				continue;
			}
			let from = start.max(chunk_start);
			let to = end.min(chunk_end);
			let piece = bytes[(from - chunk_start) as usize..(to - chunk_start) as usize].to_vec();
			chunks.insert(from as u32, piece);
		}

		Ok(Self {
			chunks,
		})
	}

	/// Ascending runs of contiguous set bytes.
	pub fn chunks(&self) -> impl DoubleEndedIterator<Item = (u32, &[u8])> + '_
	{
		self.chunks.iter().map(|(start, bytes)| (*start, bytes.as_slice()))
	}

	/// Every set byte with its address, in ascending address order.
	pub fn bytes(&self) -> impl Iterator<Item = (u32, u8)> + '_
	{
		self.chunks().flat_map(|(start, bytes)| {
			bytes
				.iter()
				.enumerate()
				.map(move |(offset, byte)| (start + offset as u32, *byte))
		})
	}

	/// The lowest set address and one past the highest, if anything is set.
	pub fn span(&self) -> Option<Range<u64>>
	{
		let (first, _) = self.chunks.first_key_value()?;
		let (last, bytes) = self.chunks.last_key_value()?;
		Some(*first as u64..*last as u64 + bytes.len() as u64)
	}

	/// The bytes of `[start, end)` if every one of them is set.
	pub fn contiguous_bytes(&self, start: u32, end: u32) -> Option<&[u8]>
	{
		if start >= end {
			return None;
		}
		let (chunk_start, bytes) = self.chunks.range(..=start).next_back()?;
		let from = (start - chunk_start) as usize;
		let to = (end - chunk_start) as usize;
		bytes.get(from..to)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn adjacent_writes_merge_into_one_run()
	{
		let mut image = MemoryImage::new();
		image.write(0x10, &[1, 2]).unwrap();
		image.write(0x14, &[5]).unwrap();
		image.write(0x12, &[3, 4]).unwrap();

		let chunks: Vec<_> = image.chunks().collect();
		assert_eq!(chunks, vec![(0x10, &[1u8, 2, 3, 4, 5][..])]);
	}

	#[test]
	fn overlapping_write_spanning_runs()
	{
		let mut image = MemoryImage::new();
		image.write(0x00, &[0xaa; 4]).unwrap();
		image.write(0x08, &[0xbb; 4]).unwrap();
		image.write(0x02, &[0xcc; 8]).unwrap();

		let chunks: Vec<_> = image.chunks().collect();
		assert_eq!(chunks.len(), 1);
		assert_eq!(chunks[0].1, &[0xaa, 0xaa, 0xcc, 0xcc, 0xcc, 0xcc, 0xcc, 0xcc, 0xcc, 0xcc, 0xbb, 0xbb]);
	}

	#[test]
	fn write_at_top_of_address_space()
	{
		let mut image = MemoryImage::new();
		image.write(0xffff_fffe, &[1, 2]).unwrap();
		assert_eq!(image.get(0xffff_ffff), Some(2));
		assert!(image.write(0xffff_ffff, &[1, 2]).is_err());
	}
}
