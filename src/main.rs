use anyhow::Result;
use clap::Parser;
use entity_annotator::cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so prompts and rendered text on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("entity_annotator=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
