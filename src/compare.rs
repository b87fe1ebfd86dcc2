// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Address-by-address comparison of two memory images.

use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;

use crate::error::Error;
use crate::ihex;
use crate::image::MemoryImage;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiffKind
{
	/// Set in the first image only
	OnlyInA,
	/// Set in the second image only
	OnlyInB,
	/// Set in both, with different values
	Differing,
	/// Set in both, with the same value
	Identical,
}

impl Display for DiffKind
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		match self {
			Self::OnlyInA => write!(f, "only in A")?,
			Self::OnlyInB => write!(f, "only in B")?,
			Self::Differing => write!(f, "differing")?,
			Self::Identical => write!(f, "identical")?,
		};

		Ok(())
	}
}

/// A maximal run of contiguous addresses sharing one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRegion
{
	pub start: u32,
	/// One past the last address of the run. `u64` as a run may end at the top of the address space.
	pub end: u64,
	pub kind: DiffKind,
}

impl DiffRegion
{
	pub fn len(&self) -> u64
	{
		self.end - self.start as u64
	}

	pub fn is_empty(&self) -> bool
	{
		self.len() == 0
	}
}

impl Display for DiffRegion
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		write!(f, "0x{:08x}-0x{:08x}: {}", self.start, self.end, self.kind)
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions
{
	/// Also list the runs where both images agree
	pub include_identical: bool,
}

/// Classify every address set in either image, coalescing contiguous runs of the same kind.
///
/// An address set in neither image ends any run in progress, so a region never claims
/// addresses that are absent from both sides.
pub fn compare(a: &MemoryImage, b: &MemoryImage) -> Vec<DiffRegion>
{
	let mut a_bytes = a.bytes().peekable();
	let mut b_bytes = b.bytes().peekable();
	let mut regions: Vec<DiffRegion> = Vec::new();

	while let Some((address, kind)) = next_classified(&mut a_bytes, &mut b_bytes) {
		match regions.last_mut() {
			Some(last) if last.kind == kind && last.end == address as u64 => last.end += 1,
			_ => regions.push(DiffRegion {
				start: address,
				end: address as u64 + 1,
				kind,
			}),
		}
	}

	regions
}

/// Pull the next lowest address from the pair of ascending byte streams and classify it.
fn next_classified<A, B>(a: &mut Peekable<A>, b: &mut Peekable<B>) -> Option<(u32, DiffKind)>
	where A: Iterator<Item = (u32, u8)>, B: Iterator<Item = (u32, u8)>
{
	match (a.peek().copied(), b.peek().copied()) {
		(None, None) => None,
		(Some((address, _)), None) => {
			a.next();
			Some((address, DiffKind::OnlyInA))
		},
		(None, Some((address, _))) => {
			b.next();
			Some((address, DiffKind::OnlyInB))
		},
		(Some((a_address, a_value)), Some((b_address, b_value))) => {
			if a_address < b_address {
				a.next();
				Some((a_address, DiffKind::OnlyInA))
			} else if b_address < a_address {
				b.next();
				Some((b_address, DiffKind::OnlyInB))
			} else {
				a.next();
				b.next();
				let kind = if a_value == b_value { DiffKind::Identical } else { DiffKind::Differing };
				Some((a_address, kind))
			}
		},
	}
}

/// Decode two Intel HEX documents and compare their contents.
pub fn compare_hex(a: &str, b: &str) -> Result<Vec<DiffRegion>, Error>
{
	let a = ihex::decode(a)?;
	let b = ihex::decode(b)?;
	Ok(compare(&a, &b))
}

/// Render `diffs` as one `start-end: kind` line per region, skipping identical regions
/// unless asked for them.
pub fn to_report(diffs: &[DiffRegion], options: &ReportOptions) -> String
{
	let mut report = String::new();
	for region in diffs
		.iter()
		.filter(|region| options.include_identical || region.kind != DiffKind::Identical)
	{
		report.push_str(&format!("{region}\n"));
	}

	if report.is_empty() {
		report.push_str("No differences found\n");
	}
	report
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn gap_breaks_identical_run()
	{
		let mut a = MemoryImage::from_bytes(0x00, &[1, 2]).unwrap();
		a.write(0x10, &[3]).unwrap();
		let b = a.clone();

		let diffs = compare(&a, &b);
		assert_eq!(diffs.len(), 2);
		assert_eq!(diffs[0].end, 2);
		assert_eq!(diffs[1].start, 0x10);
	}
}
