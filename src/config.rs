// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result, eyre};
use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;

use crate::ihex::{DEFAULT_RECORD_SIZE, EncodeOptions};
use crate::region::{RegionMap, SearchDirection, Signature};

const CONFIG_FILE_NAME: &str = "config.json";

/// Base address and size of one memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegionConfig
{
	pub start: u32,
	pub size: u32,
}

/// The user-adjustable settings, all optional; anything left out takes the micro:bit default.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig
{
	pub code_flash: Option<RegionConfig>,
	pub uicr: Option<RegionConfig>,
	pub uicr_customer: Option<RegionConfig>,
	pub runtime_signature: Option<Signature>,
	pub search_direction: Option<SearchDirection>,
	pub padding_byte: Option<u8>,
	pub record_size: Option<u8>,
}

impl ToolConfig
{
	/// The default location of the configuration file for this platform.
	pub fn default_path() -> Option<PathBuf>
	{
		ProjectDirs::from("org", "microbit", "ubitflashtool").map(|paths| paths.config_dir().join(CONFIG_FILE_NAME))
	}

	/// Load the configuration from `path` if given (which must then exist), otherwise from
	/// the default location if there is a file there, otherwise use the defaults.
	pub fn load(path: Option<&Path>) -> Result<Self>
	{
		match path {
			Some(path) => Self::from_path(path),
			None => match Self::default_path() {
				Some(path) if path.is_file() => Self::from_path(&path),
				_ => {
					debug!("No configuration file found, using defaults");
					Ok(Self::default())
				},
			},
		}
	}

	pub fn from_path(path: &Path) -> Result<Self>
	{
		info!("Loading configuration from {}", path.display());
		let file =
			File::open(path).wrap_err_with(|| eyre!("Failed to open configuration file {}", path.display()))?;
		let config: Self = serde_json::from_reader(BufReader::new(file))
			.wrap_err_with(|| eyre!("Configuration file {} is invalid", path.display()))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()>
	{
		if self.record_size == Some(0) {
			return Err(eyre!("record_size must be between 1 and 255"));
		}
		for (name, region) in [("code_flash", self.code_flash), ("uicr", self.uicr), ("uicr_customer", self.uicr_customer)] {
			if let Some(region) = region {
				if region.start as u64 + region.size as u64 > 1 << 32 {
					return Err(eyre!("{name} region runs past the end of the 32-bit address space"));
				}
			}
		}
		Ok(())
	}

	/// The micro:bit memory map with this configuration's overrides applied.
	pub fn region_map(&self) -> RegionMap
	{
		let mut map = RegionMap::microbit();
		if let Some(region) = self.code_flash {
			map = map.with_code_flash(region.start, region.size);
		}
		if let Some(region) = self.uicr {
			map = map.with_uicr(region.start, region.size);
		}
		if let Some(region) = self.uicr_customer {
			map = map.with_uicr_customer(region.start, region.size);
		}
		if let Some(signature) = &self.runtime_signature {
			map = map.with_runtime_signature(signature.clone());
		}
		if let Some(direction) = self.search_direction {
			map = map.with_search_direction(direction);
		}
		if let Some(padding_byte) = self.padding_byte {
			map = map.with_padding_byte(padding_byte);
		}
		map
	}

	pub fn encode_options(&self) -> EncodeOptions
	{
		EncodeOptions {
			record_size: self.record_size.unwrap_or(DEFAULT_RECORD_SIZE),
			start_address: None,
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn overrides_apply_to_region_map()
	{
		let config: ToolConfig = serde_json::from_str(
			r#"{
				"code_flash": { "start": 0, "size": 131072 },
				"runtime_signature": "de ad be ef",
				"search_direction": "backward",
				"padding_byte": 0
			}"#,
		)
		.expect("configuration should parse");

		let map = config.region_map();
		assert_eq!(map.code_flash().end, 0x20000);
		assert_eq!(map.runtime_signature().map(Signature::as_bytes), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
		assert_eq!(map.padding_byte(), 0);
		assert_eq!(map.uicr(), RegionMap::microbit().uicr());
	}

	#[test]
	fn unknown_keys_are_rejected()
	{
		assert!(serde_json::from_str::<ToolConfig>(r#"{ "flash_size": 4 }"#).is_err());
	}

	#[test]
	fn zero_record_size_is_invalid()
	{
		let config = ToolConfig {
			record_size: Some(0),
			..Default::default()
		};
		assert!(config.validate().is_err());
	}
}
