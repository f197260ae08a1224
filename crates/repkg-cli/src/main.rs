use std::sync::Arc;

use atty::Stream;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use repkg_core::{
    CommandContext, CommandGroup, CommandInfo, ExecutionOutcome, GlobalOptions, InstallRequest,
    ReinstallRequest, SystemFileSystem, UninstallRequest,
};
use serde_json::Value;

mod cli;
mod style;

use cli::{CommandGroupCli, RepkgCli};
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = RepkgCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        project: cli.project.clone(),
    };

    let ctx = CommandContext::new(&global, Arc::new(SystemFileSystem));
    let (info, outcome) = dispatch(&ctx, &cli.command).map_err(|err| eyre!("{err:?}"))?;
    let code = emit_output(&cli, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter =
        format!("repkg={level},repkg_core={level},repkg_domain={level},repkg_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn dispatch(
    ctx: &CommandContext,
    command: &CommandGroupCli,
) -> anyhow::Result<(CommandInfo, ExecutionOutcome)> {
    match command {
        CommandGroupCli::Reinstall(args) => {
            let request = ReinstallRequest {
                id: args.id.clone(),
                version: args.version.clone(),
            };
            let outcome = repkg_core::reinstall_package(ctx, &request)?;
            Ok((CommandInfo::new(CommandGroup::Reinstall, "reinstall"), outcome))
        }
        CommandGroupCli::Install(args) => {
            let request = InstallRequest {
                id: args.id.clone(),
                version: args.version.clone(),
            };
            let outcome = repkg_core::install_package(ctx, &request)?;
            Ok((CommandInfo::new(CommandGroup::Install, "install"), outcome))
        }
        CommandGroupCli::Uninstall(args) => {
            let request = UninstallRequest {
                id: args.package.id.clone(),
                version: args.package.version.clone(),
                force: args.force,
            };
            let outcome = repkg_core::uninstall_package(ctx, &request)?;
            Ok((CommandInfo::new(CommandGroup::Uninstall, "uninstall"), outcome))
        }
    }
}

fn emit_output(cli: &RepkgCli, info: CommandInfo, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.status.exit_code();
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = repkg_core::to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet {
        let message = repkg_core::format_status_message(info, &outcome.message);
        println!("{}", style.status(outcome.status, &message));
        for (label, value) in detail_lines(&outcome.details) {
            println!("{}", style.detail(label, &value));
        }
        if let Some(hint) = hint_from_details(&outcome.details) {
            println!("{}", style.info(&format!("Hint: {hint}")));
        }
        if let Some(readme) = outcome.details.get("readme_text").and_then(Value::as_str) {
            println!();
            println!("{}", readme.trim_end());
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn detail_lines(details: &Value) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();
    if let Some(restored) = string_list(details.get("restored")) {
        lines.push(("kept local copy", restored));
    }
    if let Some(dependents) = string_list(details.get("dependents")) {
        lines.push(("required by", dependents));
    }
    lines
}

fn string_list(value: Option<&Value>) -> Option<String> {
    let items: Vec<&str> = value?.as_array()?.iter().filter_map(Value::as_str).collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}
