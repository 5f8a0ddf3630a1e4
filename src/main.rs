mod book;
mod cli;
mod commands;
mod config;
mod error;
mod logging;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<error::SetupError>()
            .map_or(1, error::SetupError::exit_code);
        std::process::exit(code);
    }
}
