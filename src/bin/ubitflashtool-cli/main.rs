// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 ubitflashtool contributors

mod cli_commands;

use std::io::stdout;
use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::styling::Styles;
use clap::{Args, CommandFactory, Parser, crate_description, crate_version};
use clap_complete::{Shell, generate};
use color_eyre::config::HookBuilder;
use color_eyre::eyre::{EyreHandler, InstallError, Result};
use owo_colors::OwoColorize;
use ubitflashtool::region::{SearchDirection, Signature};

use crate::cli_commands::ToplevelCommmands;

#[derive(Parser)]
#[command(
	version,
	about = format!("{} v{}", crate_description!(), crate_version!()),
	styles(style()),
	disable_colored_help(false),
	arg_required_else_help(true)
)]
struct CliArguments
{
	#[arg(global = true, short = 't', long = "target-image")]
	/// Memory dump (Intel HEX, ELF or raw binary) to use as the target device's memory
	target_image: Option<PathBuf>,
	#[arg(global = true, short = 'c', long = "config")]
	/// Use the given configuration file rather than the default one
	config: Option<PathBuf>,
	#[arg(global = true, long = "runtime-signature", value_parser = Signature::from_str)]
	/// Hex bytes that mark the end of the MicroPython runtime in flash (e.g. "fe ca 0d f0")
	runtime_signature: Option<Signature>,
	#[arg(global = true, long = "search-direction", value_enum)]
	/// Which occurrence of the runtime signature to split at, if there are several
	search_direction: Option<SearchDirection>,
	#[arg(global = true, long = "record-size", value_parser = clap::value_parser!(u8).range(1..))]
	/// Maximum number of data bytes per Intel HEX record
	record_size: Option<u8>,

	#[command(subcommand)]
	pub subcommand: ToplevelCommmands,
}

#[derive(Args)]
struct CompletionArguments
{
	shell: Shell,
}

type EyreHookFunc = Box<dyn Fn(&(dyn std::error::Error + 'static)) -> Box<dyn EyreHandler> + Send + Sync + 'static>;
type PanicHookFunc = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Send + Sync + 'static>;

struct UbitFlashToolHook
{
	inner_hook: EyreHookFunc,
}

struct UbitFlashToolPanic
{
	inner_hook: PanicHookFunc,
}

struct UbitFlashToolHandler
{
	inner_handler: Box<dyn EyreHandler>,
}

impl UbitFlashToolHook
{
	fn build_handler(&self, error: &(dyn std::error::Error + 'static)) -> UbitFlashToolHandler
	{
		UbitFlashToolHandler {
			inner_handler: (*self.inner_hook)(error),
		}
	}

	pub fn install(self) -> Result<(), InstallError>
	{
		color_eyre::eyre::set_hook(self.into_eyre_hook())
	}

	pub fn into_eyre_hook(self) -> EyreHookFunc
	{
		Box::new(move |err| Box::new(self.build_handler(err)))
	}
}

impl UbitFlashToolPanic
{
	pub fn install(self)
	{
		std::panic::set_hook(self.into_panic_hook());
	}

	pub fn into_panic_hook(self) -> PanicHookFunc
	{
		Box::new(move |panic_info| {
			print_cut_header();
			(*self.inner_hook)(panic_info);
			eprintln!();
			eprintln!("{}", "Please include all lines down to this one from the cut here".yellow());
			eprintln!("{}", "marker, and report this issue to our issue tracker at".yellow());
			eprintln!("https://github.com/carlosperate/ubitflashtool/issues");
		})
	}
}

fn print_cut_header()
{
	eprintln!("------------[ ✂ cut here ✂ ]------------");
	eprintln!("Unhandled crash in ubitflashtool-cli v{}", crate_version!());
	eprintln!();
}

impl EyreHandler for UbitFlashToolHandler
{
	fn debug(&self, error: &(dyn std::error::Error + 'static), fmt: &mut core::fmt::Formatter<'_>)
	-> core::fmt::Result
	{
		writeln!(fmt, "------------[ ✂ cut here ✂ ]------------")?;
		write!(fmt, "Unhandled crash in ubitflashtool-cli v{}", crate_version!())?;
		self.inner_handler.debug(error, fmt)?;
		writeln!(fmt)?;
		writeln!(fmt)?;
		writeln!(
			fmt,
			"{}",
			"Please include all lines down to this one from the cut here".yellow()
		)?;
		writeln!(fmt, "{}", " marker, and report this issue to our issue tracker at".yellow())?;
		write!(fmt, "https://github.com/carlosperate/ubitflashtool/issues")
	}

	fn track_caller(&mut self, location: &'static std::panic::Location<'static>)
	{
		self.inner_handler.track_caller(location);
	}
}

fn install_error_handler() -> Result<()>
{
	// Grab us a new default handler
	let default_handler = HookBuilder::default();
	// Turn that into a pair of hooks - one for panic, and the other for errors
	let (panic_hook, eyre_hook) = default_handler.try_into_hooks()?;

	// Wrap the panic hook so crashes get framed for bug reports
	UbitFlashToolPanic {
		inner_hook: panic_hook.into_panic_hook(),
	}
	.install();

	// Likewise for the error hook, leaving the main error handling to the default one
	UbitFlashToolHook {
		inner_hook: eyre_hook.into_eyre_hook(),
	}
	.install()?;
	Ok(())
}

/// Clap v3 style (approximate)
/// See https://stackoverflow.com/a/75343828
fn style() -> clap::builder::Styles
{
	Styles::styled()
		.usage(
			anstyle::Style::new()
				.fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)))
				.bold(),
		)
		.header(
			anstyle::Style::new()
				.bold()
				.fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
		)
		.literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
}

fn main() -> Result<()>
{
	install_error_handler()?;
	env_logger::Builder::new()
		.filter_level(log::LevelFilter::Info)
		.parse_default_env()
		.init();

	let cli_args = CliArguments::parse();

	match &cli_args.subcommand {
		ToplevelCommmands::Microbit(microbit_args) => microbit_args.subcommand(&cli_args),
		ToplevelCommmands::Nrf(nrf_args) => nrf_args.subcommand(&cli_args),
		ToplevelCommmands::Complete(comp_args) => {
			let mut cmd = CliArguments::command();
			generate(comp_args.shell, &mut cmd, "ubitflashtool-cli", &mut stdout());
			Ok(())
		},
	}
}
