use std::io::{stdin, stdout, BufReader};
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

mod completion;
mod diagnostics;
mod document;
mod frontmatter;
mod hover;
mod protocol;
mod schema;
mod server;
mod transport;
mod validator;
mod yaml_path;

use server::Server;

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut server = match Server::new(BufReader::new(stdin()), stdout()) {
        Ok(server) => server,
        Err(err) => {
            error!("failed to start gh-aw-ls: {err}");
            return ExitCode::FAILURE;
        }
    };

    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("gh-aw-ls exited with error: {err}");
            ExitCode::FAILURE
        }
    }
}
