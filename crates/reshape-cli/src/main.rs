use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Arg, ArgMatches, Command};
use reshape_core::{init_tracing, init_tracing_with_default, ShapeConfig};
use reshape_cli::{run_command, ReshapeCommand};

fn path_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .value_name("FILE")
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
        .required(true)
}

fn flag_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .action(clap::ArgAction::SetTrue)
}

fn cli() -> Command {
    Command::new("reshape")
        .version(reshape_core::VERSION)
        .about("Restructure JSON data with signal-based match and format templates")
        .subcommand_required(true)
        .arg(flag_arg("debug", "Log every template node visited").global(true))
        .arg(flag_arg("strict", "Fail on the first hook error").global(true))
        .subcommand(
            Command::new("transform")
                .about("Match the data, then format the result")
                .arg(path_arg("data", "data", "Input data (JSON)"))
                .arg(path_arg("match", "match", "Match template (JSON notation)"))
                .arg(path_arg("format", "format", "Format template (JSON notation)"))
                .arg(flag_arg(
                    "deep-clean",
                    "Also drop objects and lists left empty",
                )),
        )
        .subcommand(
            Command::new("match")
                .about("Match the data and print the scope tree")
                .arg(path_arg("data", "data", "Input data (JSON)"))
                .arg(path_arg("match", "match", "Match template (JSON notation)")),
        )
}

fn path(matches: &ArgMatches, id: &str) -> PathBuf {
    matches
        .get_one::<PathBuf>(id)
        .cloned()
        .unwrap_or_default()
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let debug = matches.get_flag("debug");
    if debug {
        init_tracing_with_default("debug");
    } else {
        init_tracing();
    }

    let (command, deep_clean) = match matches.subcommand() {
        Some(("transform", sub)) => (
            ReshapeCommand::Transform {
                data: path(sub, "data"),
                match_template: path(sub, "match"),
                format_template: path(sub, "format"),
            },
            sub.get_flag("deep-clean"),
        ),
        Some(("match", sub)) => (
            ReshapeCommand::Match {
                data: path(sub, "data"),
                match_template: path(sub, "match"),
            },
            false,
        ),
        Some((other, _)) => bail!("Unknown command: {other}"),
        None => bail!("No command given"),
    };

    let config = ShapeConfig {
        strict_hooks: matches.get_flag("strict"),
        deep_clean,
        debug,
    };

    let output = run_command(&command, config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from([
                "reshape", "transform", "--data", "d.json", "--match", "m.json", "--format",
                "f.json", "--strict", "--deep-clean",
            ])
            .unwrap();

        assert!(matches.get_flag("strict"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "transform");
        assert!(sub.get_flag("deep-clean"));
        assert_eq!(path(sub, "format"), PathBuf::from("f.json"));
    }
}
