use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use feature_dump::{run, Args};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            let _ = err.print();
            return ExitCode::from(1);
        }
        Err(err) => {
            eprintln!("Error!!! {}", err.render());
            return ExitCode::from(1);
        }
    };

    let Some(config) = args.into_config() else {
        println!("{}", Args::command().render_help());
        return ExitCode::from(1);
    };
    log::debug!("{config:?}");

    match run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            // -1 surfaces as 255
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
