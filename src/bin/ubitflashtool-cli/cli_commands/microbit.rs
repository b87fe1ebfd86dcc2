// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

use clap::{Args, Subcommand};
use color_eyre::eyre::Result;
use ubitflashtool::operation::Operation;

use crate::CliArguments;
use crate::cli_commands::run_operation;

#[derive(Args)]
pub struct MicrobitArguments
{
	#[command(subcommand)]
	subcommand: MicrobitCommmands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help(true))]
enum MicrobitCommmands
{
	/// Read the MicroPython code stored after the runtime
	Code,
	/// Read the MicroPython runtime as Intel HEX
	Runtime,
}

impl MicrobitArguments
{
	pub fn subcommand(&self, cli_args: &CliArguments) -> Result<()>
	{
		let settings = cli_args.settings()?;
		let operation = match self.subcommand {
			MicrobitCommmands::Code => Operation::ReadCode,
			MicrobitCommmands::Runtime => Operation::ReadRuntime,
		};
		run_operation(cli_args, operation, &settings)
	}
}
