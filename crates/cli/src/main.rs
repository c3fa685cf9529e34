// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgGroup, Command};
use std::path::PathBuf;

mod commands;

fn range_args(command: Command, required: bool) -> Command {
    command
        .arg(
            Arg::new("page")
                .short('p')
                .long("page")
                .value_name("PAGE")
                .value_parser(clap::value_parser!(u32))
                .help("Page number"),
        )
        .arg(
            Arg::new("chapter")
                .short('c')
                .long("chapter")
                .value_name("CHAPTER")
                .value_parser(clap::value_parser!(u16))
                .help("Chapter number"),
        )
        .group(
            ArgGroup::new("range")
                .args(["page", "chapter"])
                .required(required),
        )
}

fn source_arg() -> Arg {
    Arg::new("source")
        .short('s')
        .long("source")
        .value_name("SOURCE")
        .help("husaryQaloon, alafasyHafs, husaryHafs, abdulbasitHafs or userRecording:<id>")
}

fn build_cli() -> Command {
    Command::new("verserec")
        .version(env!("CARGO_PKG_VERSION"))
        .author("DrTomLLC")
        .about("Recitation practice: reference audio, recording and upload")
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Keep config and data in DIR instead of the platform directories")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print config and data locations")),
        )
        .subcommand(range_args(
            Command::new("range").about("Show the items of a page or chapter"),
            true,
        ))
        .subcommand(
            Command::new("resolve")
                .about("Find or download the audio for an item")
                .arg(Arg::new("item").required(true).value_name("ITEM_ID").help("Item id, e.g. 078001"))
                .arg(source_arg()),
        )
        .subcommand(
            range_args(Command::new("play").about("Play a page or chapter"), false)
                .arg(Arg::new("item").short('i').long("item").value_name("ITEM_ID").help("Start at this item"))
                .arg(source_arg())
                .arg(
                    Arg::new("repeat")
                        .short('r')
                        .long("repeat")
                        .help("Repeat the range")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("record")
                .about("Record a take from the microphone")
                .arg(
                    Arg::new("item")
                        .value_name("ITEM_ID")
                        .help("Item to record, e.g. 078001")
                        .required_unless_present("list-devices"),
                )
                .arg(
                    Arg::new("recording")
                        .long("recording")
                        .value_name("RECORDING_ID")
                        .help("Add the take to this range recording"),
                )
                .arg(
                    Arg::new("seconds")
                        .short('s')
                        .long("seconds")
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .help("Stop after this many seconds instead of waiting for Ctrl-C"),
                )
                .arg(Arg::new("device").long("device").value_name("NAME").help("Input device"))
                .arg(
                    Arg::new("list-devices")
                        .long("list-devices")
                        .help("Print the input devices and exit")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("recordings")
                .about("Inspect and delete recorded takes")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List range recordings and their tracks"))
                .subcommand(
                    Command::new("delete")
                        .about("Delete tracks of a range recording")
                        .arg(Arg::new("id").required(true).value_name("RECORDING_ID").help("Range recording id"))
                        .arg(Arg::new("item").long("item").value_name("ITEM_ID").help("Delete only this track"))
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .help("Delete every track")
                                .action(ArgAction::SetTrue),
                        )
                        .group(ArgGroup::new("which").args(["item", "all"]).required(true)),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload the pending tracks of a range recording")
                .arg(Arg::new("id").required(true).value_name("RECORDING_ID").help("Range recording id")),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let app = commands::App::open(matches.get_one::<PathBuf>("config-dir").cloned())
        .context("Failed to load configuration")?;

    match matches.subcommand() {
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&app),
            Some(("show", _)) => commands::config_show(&app),
            Some(("path", _)) => commands::config_path(&app),
            _ => unreachable!("clap requires a config subcommand"),
        },
        Some(("range", sub_matches)) => commands::show_range(&app, sub_matches),
        Some(("resolve", sub_matches)) => commands::resolve_item(&app, sub_matches).await,
        Some(("play", sub_matches)) => commands::play_range(&app, sub_matches).await,
        Some(("recordings", sub_matches)) => match sub_matches.subcommand() {
            Some(("list", _)) => commands::list_recordings(&app),
            Some(("delete", delete_matches)) => {
                commands::delete_recording(&app, delete_matches).await
            }
            _ => unreachable!("clap requires a recordings subcommand"),
        },
        Some(("record", sub_matches)) => commands::record_take(&app, sub_matches).await,
        Some(("upload", sub_matches)) => commands::upload_recording(&app, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
