//! Chat command - interactive session on a single thread

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::AppConfig;
use crate::domain::ThreadId;
use crate::infrastructure::logging::init_logging;

pub async fn run(thread: Option<String>) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let thread_id = ThreadId::resolve(thread.as_deref())?;
    let state = crate::create_app_state(&config).await?;

    println!("Phone advisor (thread {}). Type 'exit' to leave.", thread_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            break;
        }

        let response = state.engine.ask(question, Some(thread_id.clone())).await;
        println!("Advisor: {}", response.answer);

        if !response.is_ok() {
            println!("({})", response.status);
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn is_exit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q")
}
