mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, enumerate};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();
    let cfg = commands.to_config();

    logging::init_logging(cfg.quiet);
    print::banner(cfg.quiet);

    enumerate::enumerate(&commands.domains, &cfg).await
}
