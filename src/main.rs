use clap::Parser;
use phone_advisor::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Ask { question, thread } => cli::ask::run(question, thread).await,
        Command::Chat { thread } => cli::chat::run(thread).await,
        Command::Load { file } => cli::load::run(file).await,
    }
}
