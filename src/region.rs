// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors
//! Memory layout of the micro:bit's nRF51822 and the runtime/user code split.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use hex::FromHexError;
use log::debug;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::error::Error;
use crate::image::MemoryImage;

/// nRF51822 code flash: 256KiB from address 0.
pub const NRF51_FLASH_START: u32 = 0x0000_0000;
pub const NRF51_FLASH_SIZE: u32 = 256 * 1024;
/// nRF51822 User Information Configuration Registers.
pub const NRF51_UICR_START: u32 = 0x1000_1000;
pub const NRF51_UICR_SIZE: u32 = 0x100;
/// The CUSTOMER[0..31] registers within the UICR.
pub const NRF51_UICR_CUSTOMER_START: u32 = NRF51_UICR_START + 0x80;
pub const NRF51_UICR_CUSTOMER_SIZE: u32 = 32 * 4;

/// The value erased flash reads back as.
pub const ERASED_FLASH_BYTE: u8 = 0xff;

/// A named, half-open range of target addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor
{
	pub name: String,
	pub start: u32,
	/// One past the last address of the region
	pub end: u32,
}

impl RegionDescriptor
{
	pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self
	{
		Self {
			name: name.into(),
			start,
			end,
		}
	}

	/// Construct a region from its base address and size. The region is clipped to the 32-bit address space.
	pub fn sized(name: impl Into<String>, start: u32, size: u32) -> Self
	{
		Self::new(name, start, start.saturating_add(size))
	}

	pub fn len(&self) -> u32
	{
		self.end - self.start
	}

	pub fn is_empty(&self) -> bool
	{
		self.start == self.end
	}

	pub fn contains(&self, address: u32) -> bool
	{
		(self.start..self.end).contains(&address)
	}

	/// Whether `length` bytes from `address` all lie inside this region.
	pub fn covers(&self, address: u32, length: u32) -> bool
	{
		address >= self.start && address as u64 + length as u64 <= self.end as u64
	}

	/// The part of `image` that lies within this region.
	pub fn slice(&self, image: &MemoryImage) -> Result<MemoryImage, Error>
	{
		image.slice(self.start, self.end)
	}
}

impl Display for RegionDescriptor
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		write!(f, "{} [0x{:08x}-0x{:08x})", self.name, self.start, self.end)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError
{
	#[error("runtime signature must not be empty")]
	Empty,
	#[error("runtime signature must be an even number of hex digits")]
	OddLength,
	#[error("'{0}' is not a hex digit")]
	InvalidDigit(char),
}

/// The byte sequence that ends the MicroPython runtime in flash.
///
/// Written in configuration and on the command line as a string of hex digits,
/// optionally separated by spaces (e.g. `"fe ca 0d f0"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature
{
	pub fn new(bytes: &[u8]) -> Result<Self, SignatureError>
	{
		if bytes.is_empty() {
			return Err(SignatureError::Empty);
		}
		Ok(Self(bytes.to_vec()))
	}

	pub fn as_bytes(&self) -> &[u8]
	{
		&self.0
	}
}

impl FromStr for Signature
{
	type Err = SignatureError;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
		let bytes = hex::decode(&digits).map_err(|error| match error {
			FromHexError::InvalidHexCharacter { c, .. } => SignatureError::InvalidDigit(c),
			FromHexError::OddLength | FromHexError::InvalidStringLength => SignatureError::OddLength,
		})?;
		Self::new(&bytes)
	}
}

impl Display for Signature
{
	fn fmt(&self, f: &mut Formatter) -> fmt::Result
	{
		for byte in &self.0 {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

struct SignatureVisitor;

impl<'de> Deserialize<'de> for Signature
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where D: Deserializer<'de>
	{
		deserializer.deserialize_str(SignatureVisitor)
	}
}

impl<'de> Visitor<'de> for SignatureVisitor
{
	type Value = Signature;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str("a runtime signature as a string of hex digits")
	}

	fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
		where E: serde::de::Error,
	{
		Signature::from_str(value)
			.map_err(|e| E::custom(e.to_string()))
	}
}

/// Which occurrence of the runtime signature marks the split, when flash holds more than one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchDirection
{
	/// Use the lowest-addressed occurrence
	#[default]
	Forward,
	/// Use the highest-addressed occurrence
	Backward,
}

/// Layout of the target chip's memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMap
{
	code_flash: RegionDescriptor,
	uicr: RegionDescriptor,
	uicr_customer: RegionDescriptor,
	runtime_signature: Option<Signature>,
	search_direction: SearchDirection,
	padding_byte: u8,
}

impl Default for RegionMap
{
	fn default() -> Self
	{
		Self::microbit()
	}
}

impl RegionMap
{
	/// The micro:bit v1's nRF51822 memory map. No runtime signature is configured.
	pub fn microbit() -> Self
	{
		Self {
			code_flash: RegionDescriptor::sized("code flash", NRF51_FLASH_START, NRF51_FLASH_SIZE),
			uicr: RegionDescriptor::sized("uicr", NRF51_UICR_START, NRF51_UICR_SIZE),
			uicr_customer: RegionDescriptor::sized("uicr customer", NRF51_UICR_CUSTOMER_START, NRF51_UICR_CUSTOMER_SIZE),
			runtime_signature: None,
			search_direction: SearchDirection::Forward,
			padding_byte: ERASED_FLASH_BYTE,
		}
	}

	pub fn with_code_flash(mut self, start: u32, size: u32) -> Self
	{
		self.code_flash = RegionDescriptor::sized("code flash", start, size);
		self
	}

	pub fn with_uicr(mut self, start: u32, size: u32) -> Self
	{
		self.uicr = RegionDescriptor::sized("uicr", start, size);
		self
	}

	pub fn with_uicr_customer(mut self, start: u32, size: u32) -> Self
	{
		self.uicr_customer = RegionDescriptor::sized("uicr customer", start, size);
		self
	}

	pub fn with_runtime_signature(mut self, signature: Signature) -> Self
	{
		self.runtime_signature = Some(signature);
		self
	}

	pub fn with_search_direction(mut self, direction: SearchDirection) -> Self
	{
		self.search_direction = direction;
		self
	}

	pub fn with_padding_byte(mut self, padding_byte: u8) -> Self
	{
		self.padding_byte = padding_byte;
		self
	}

	pub fn code_flash(&self) -> &RegionDescriptor
	{
		&self.code_flash
	}

	pub fn uicr(&self) -> &RegionDescriptor
	{
		&self.uicr
	}

	pub fn uicr_customer(&self) -> &RegionDescriptor
	{
		&self.uicr_customer
	}

	pub fn runtime_signature(&self) -> Option<&Signature>
	{
		self.runtime_signature.as_ref()
	}

	pub fn padding_byte(&self) -> u8
	{
		self.padding_byte
	}

	/// Find the address just past the runtime signature within code flash, which is
	/// where user code begins.
	///
	/// A match must lie entirely within set bytes.
	pub fn locate_runtime_user_split(&self, image: &MemoryImage) -> Result<u32, Error>
	{
		let signature = self
			.runtime_signature
			.as_ref()
			.ok_or(Error::MarkerNotFound)?
			.as_bytes();
		let flash = self.code_flash.slice(image)?;

		let found = match self.search_direction {
			SearchDirection::Forward => flash.chunks().find_map(|(start, bytes)| {
				bytes
					.windows(signature.len())
					.position(|window| window == signature)
					.map(|offset| start + offset as u32)
			}),
			SearchDirection::Backward => flash.chunks().rev().find_map(|(start, bytes)| {
				bytes
					.windows(signature.len())
					.rposition(|window| window == signature)
					.map(|offset| start + offset as u32)
			}),
		};

		let split = found.ok_or(Error::MarkerNotFound)? + signature.len() as u32;
		debug!("Runtime signature found, user code starts at 0x{:08x}", split);
		Ok(split)
	}

	/// The ordered regions of `image`: the runtime and user code halves of code flash
	/// when the split can be located (otherwise code flash as a whole), then the UICR.
	pub fn regions(&self, image: &MemoryImage) -> Vec<RegionDescriptor>
	{
		let mut regions = match self.locate_runtime_user_split(image) {
			Ok(split) => vec![
				RegionDescriptor::new("runtime", self.code_flash.start, split),
				RegionDescriptor::new("user code", split, self.code_flash.end),
			],
			Err(_) => vec![self.code_flash.clone()],
		};
		regions.push(self.uicr.clone());
		regions.retain(|region| !region.is_empty());
		regions.sort_by_key(|region| region.start);
		regions
	}
}
