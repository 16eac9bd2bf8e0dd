mod apply;
mod cli;
mod config;
mod error;
mod logging;
mod printer;
mod selector;

use std::io;
use std::process::ExitCode;

use clap::Parser;

use apply::ShellRunner;
use cli::{normalize_args, Args, Session};
use printer::Printer;

fn main() -> ExitCode {
    let args = Args::parse_from(normalize_args(std::env::args_os()));

    let printer = Printer::new(args.debug);
    let mut session =
        Session::new(printer, io::stdin().lock(), ShellRunner, rand::rng()).with_file_logging();

    match session.run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            session.printer().error(&err, Some(err.kind()));
            ExitCode::FAILURE
        }
    }
}
