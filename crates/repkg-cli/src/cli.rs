use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

pub const REPKG_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\n{subcommands}\nGlobal options:\n{options}\n";

pub const REPKG_BEFORE_HELP: &str = concat!(
    "repkg ",
    env!("CARGO_PKG_VERSION"),
    " – package reinstaller for repkg projects\n",
);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    disable_help_subcommand = true,
    before_help = REPKG_BEFORE_HELP,
    help_template = REPKG_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct RepkgCli {
    #[arg(short, long, help = "Suppress human output", global = true)]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        value_name = "DIR",
        help = "Project directory (defaults to the nearest repkg.toml above the working directory)",
        global = true
    )]
    pub project: Option<PathBuf>,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Uninstall and reinstall a package, keeping local-copy settings.",
        override_usage = "repkg reinstall <ID> <VERSION>"
    )]
    Reinstall(PackageArgs),
    #[command(
        about = "Install a package version from the project's package source.",
        override_usage = "repkg install <ID> <VERSION>"
    )]
    Install(PackageArgs),
    #[command(
        about = "Remove an installed package from the project.",
        override_usage = "repkg uninstall <ID> <VERSION> [--force]"
    )]
    Uninstall(UninstallArgs),
}

#[derive(Args, Debug)]
pub struct PackageArgs {
    #[arg(value_name = "ID")]
    pub id: String,
    #[arg(value_name = "VERSION")]
    pub version: String,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    #[command(flatten)]
    pub package: PackageArgs,
    #[arg(long, help = "Remove even when other installed packages depend on it")]
    pub force: bool,
}
