use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use crossterm::tty::IsTty;
use std::env;
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod command_list;
mod config;
mod error;
mod geometry;
mod launcher;
mod layout;
mod screen;
mod temp;

use command_list::CommandSource;
use config::{resolve_min_height, SessionConfig, MIN_HEIGHT_ENV};
use geometry::ResizeProbe;
use launcher::Launcher;
use screen::Screen;

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "PARUN_LOG";

const EXAMPLES: &str = "\
Example usage:

    # adhoc command line
    cat /etc/passwd | parun \"echo hello; echo =====; echo; cat; sleep 10\" \\
                            \"echo world; echo =====; echo; cat; sleep 10\"

    # as an executable
    cat > example << 'EOF'
    #!/usr/bin/env parun
    echo hello; echo =====; echo; cat; sleep 10
    echo world; echo =====; echo; cat; sleep 10
    EOF

    chmod +x ./example
    cat /etc/passwd | ./example";

#[derive(Parser, Debug)]
#[command(name = "parun")]
#[command(about = "Run commands in parallel in a screen session")]
#[command(override_usage = "parun [OPTIONS] 'cmd1 args' 'cmd2 args' ...\n       parun [OPTIONS] path/to/command-list")]
#[command(after_help = EXAMPLES)]
#[command(disable_help_flag = true)]
struct Args {
    /// Name of screen session
    #[arg(long, value_name = "STR")]
    name: Option<String>,

    /// Launch screen into background (daemon mode)
    #[arg(long)]
    daemon: bool,

    /// Minimum screen window height (default: 8). If splitting the screen would
    /// produce windows shorter than this, show a window list instead.
    /// Environment variable: PARUN_MINHEIGHT
    #[arg(long, value_name = "LINES", value_parser = clap::value_parser!(u16).range(1..))]
    minheight: Option<u16>,

    /// Print help
    #[arg(short, long)]
    help: bool,

    /// Commands to run, or the path of a single command-list file
    #[arg(value_name = "COMMAND")]
    commands: Vec<String>,
}

/// Build the session configuration from parsed arguments and the environment.
fn build_config(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<SessionConfig> {
    let min_height = resolve_min_height(args.minheight, env(MIN_HEIGHT_ENV).as_deref())?;

    let source = CommandSource::from_args(args.commands.clone());
    let commands = source.load()?;
    let name = args
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .or_else(|| source.default_session_name());

    Ok(SessionConfig::new(commands, min_height)?
        .with_name(name)
        .with_daemon(args.daemon))
}

fn print_usage() {
    let mut command = Args::command();
    eprintln!("{}", command.render_help());
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_tty())
        .with_target(false)
        .init();
}

/// Exit status after an interrupting signal. ctrlc does not say which one
/// fired, so this is the SIGINT convention.
const INTERRUPTED: i32 = 130;

/// Remove live temp files when SIGINT, SIGTERM or SIGHUP arrives.
fn install_signal_cleanup() -> Result<()> {
    ctrlc::set_handler(|| {
        temp::remove_all_live();
        std::process::exit(INTERRUPTED);
    })
    .context("Failed to install signal handler")
}

fn run(args: &Args) -> Result<i32> {
    let config = build_config(args, |key| env::var(key).ok())?;
    debug!(?config, "resolved configuration");

    let launcher = Launcher::new(ResizeProbe::new(), Screen::locate()?);
    install_signal_cleanup()?;

    let stdin = io::stdin();
    if stdin.is_tty() {
        launcher.run(&config, None)
    } else {
        launcher.run(&config, Some(&mut stdin.lock()))
    }
}

fn main() -> ExitCode {
    colored::control::set_override(io::stderr().is_tty());
    init_logging();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    if args.help || args.commands.is_empty() {
        print_usage();
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
