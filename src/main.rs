use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsengine::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    // stdout carries the CSV result
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tsengine=info".into()),
        )
        .init();

    run(Cli::parse())
}
