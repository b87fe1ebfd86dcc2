// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use clap::Subcommand;
use color_eyre::eyre::{OptionExt, Result};
use log::{debug, warn};
use owo_colors::OwoColorize;
use ubitflashtool::Error;
use ubitflashtool::config::ToolConfig;
use ubitflashtool::firmware_file::FirmwareFile;
use ubitflashtool::operation::{Operation, Settings, dispatch};
use ubitflashtool::target::ImageTarget;

use crate::cli_commands::microbit::MicrobitArguments;
use crate::cli_commands::nrf::NrfArguments;
use crate::{CliArguments, CompletionArguments};

pub mod microbit;
pub mod nrf;

#[derive(Subcommand)]
pub enum ToplevelCommmands
{
	/// Actions that read MicroPython from a micro:bit
	Microbit(MicrobitArguments),
	/// Actions against the nRF51822's flash and UICR
	Nrf(NrfArguments),
	/// Generate completions data for the shell
	Complete(CompletionArguments),
}

impl CliArguments
{
	/// Work out the operation settings from the configuration file, then any command line overrides.
	fn settings(&self) -> Result<Settings>
	{
		let config = ToolConfig::load(self.config.as_deref())?;
		let mut map = config.region_map();
		if let Some(signature) = &self.runtime_signature {
			map = map.with_runtime_signature(signature.clone());
		}
		if let Some(direction) = self.search_direction {
			map = map.with_search_direction(direction);
		}

		let mut encode_options = config.encode_options();
		if let Some(record_size) = self.record_size {
			encode_options.record_size = record_size;
		}

		Ok(Settings {
			map,
			encode_options,
			report_options: Default::default(),
			pretty_options: Default::default(),
		})
	}
}

/// Run an operation against the target image named on the command line and print what it gives back.
pub fn run_operation(cli_args: &CliArguments, operation: Operation, settings: &Settings) -> Result<()>
{
	let path = cli_args
		.target_image
		.as_deref()
		.ok_or_eyre("No target to read from, please give a memory dump with --target-image")?;
	let image = FirmwareFile::from_path(path, &settings.map)?.into_image();
	debug!("Target image holds {} bytes", image.len());
	let mut target = ImageTarget::new(image, &settings.map);

	match dispatch(&operation, &mut target, settings) {
		Ok(text) => {
			print!("{text}");
			Ok(())
		},
		// Not finding any MicroPython is an expected outcome, not a failure of the tool
		Err(error @ Error::MarkerNotFound) => {
			if settings.map.runtime_signature().is_none() {
				warn!("No runtime signature is configured, set one with --runtime-signature or in the config file");
			}
			eprintln!("{} {}", "No code found:".yellow(), error);
			Ok(())
		},
		Err(error) => Err(error.into()),
	}
}
