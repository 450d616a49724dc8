//! Ask command - answers one question and exits

use crate::config::AppConfig;
use crate::domain::{AskResponse, ThreadId};
use crate::infrastructure::logging::init_logging;

pub async fn run(question: String, thread: Option<String>) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let thread_id = ThreadId::resolve(thread.as_deref())?;
    let state = crate::create_app_state(&config).await?;
    let response = state.engine.ask(&question, Some(thread_id)).await;

    println!("{}", format_response(&response));
    Ok(())
}

/// Human-readable rendering of a response
pub fn format_response(response: &AskResponse) -> String {
    let mut out = format!("Answer: {}\n", response.answer);

    if let Some(query) = &response.query {
        out.push_str(&format!("Query: {}\n", query));
    }

    out.push_str(&format!("Status: {}\nThread: {}", response.status, response.thread_id));
    out
}
