// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use std::path::PathBuf;

use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use ubitflashtool::firmware_file::FirmwareFile;
use ubitflashtool::operation::Operation;

use crate::CliArguments;
use crate::cli_commands::run_operation;

#[derive(Args)]
pub struct NrfArguments
{
	#[command(subcommand)]
	subcommand: NrfCommmands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help(true))]
enum NrfCommmands
{
	/// Read the full flash contents as Intel HEX
	FlashHex,
	/// Read the full flash contents as a pretty hex dump
	FlashPretty(PrettyArguments),
	/// Read the UICR as Intel HEX
	Uicr,
	/// Read the UICR customer registers as Intel HEX
	UicrCustomer,
	/// Compare the full flash contents against a reference file
	CompareFlash(CompareArguments),
	/// Compare the UICR against a reference file
	CompareUicr(CompareArguments),
}

#[derive(Args)]
struct PrettyArguments
{
	#[arg(long = "collapse-empty-rows", default_value_t = false)]
	/// Show each run of rows with nothing in them as a single '*' line
	collapse_empty_rows: bool,
}

#[derive(Args)]
struct CompareArguments
{
	/// Reference image (Intel HEX, ELF or raw binary) to compare the target against
	reference: PathBuf,
	#[arg(long = "include-identical", default_value_t = false)]
	/// Also list the regions where the target and reference agree
	include_identical: bool,
}

impl NrfArguments
{
	pub fn subcommand(&self, cli_args: &CliArguments) -> Result<()>
	{
		let mut settings = cli_args.settings()?;
		let operation = match &self.subcommand {
			NrfCommmands::FlashHex => Operation::ReadFlashHex,
			NrfCommmands::FlashPretty(pretty_args) => {
				settings.pretty_options.collapse_empty_rows = pretty_args.collapse_empty_rows;
				Operation::ReadFlashPretty
			},
			NrfCommmands::Uicr => Operation::ReadUicr,
			NrfCommmands::UicrCustomer => Operation::ReadUicrCustomer,
			NrfCommmands::CompareFlash(compare_args) => {
				settings.report_options.include_identical = compare_args.include_identical;
				Operation::CompareFlash(FirmwareFile::from_path(&compare_args.reference, &settings.map)?.into_image())
			},
			NrfCommmands::CompareUicr(compare_args) => {
				settings.report_options.include_identical = compare_args.include_identical;
				Operation::CompareUicr(FirmwareFile::from_path(&compare_args.reference, &settings.map)?.into_image())
			},
		};
		run_operation(cli_args, operation, &settings)
	}
}
