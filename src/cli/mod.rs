//! Command-line entry points
//!
//! - `serve`: HTTP API
//! - `ask`: answer one question and exit
//! - `chat`: interactive conversation on one thread
//! - `load`: import scraped phone records into the database

pub mod ask;
pub mod chat;
pub mod load;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Phone advisor - ask questions about phone specifications in plain language
#[derive(Parser)]
#[command(name = "phone-advisor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer a single question
    Ask {
        question: String,

        /// Continue an existing conversation thread
        #[arg(long)]
        thread: Option<String>,
    },

    /// Interactive question/answer session
    Chat {
        /// Resume an existing conversation thread
        #[arg(long)]
        thread: Option<String>,
    },

    /// Create the phone table if needed and upsert records from a JSON file
    Load { file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_thread() {
        let cli = Cli::try_parse_from(["phone-advisor", "ask", "Which phones have 5G?", "--thread", "t1"]).unwrap();

        match cli.command {
            Command::Ask { question, thread } => {
                assert_eq!(question, "Which phones have 5G?");
                assert_eq!(thread.as_deref(), Some("t1"));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_load() {
        let cli = Cli::try_parse_from(["phone-advisor", "load", "phones.json"]).unwrap();
        assert!(matches!(cli.command, Command::Load { file } if file == PathBuf::from("phones.json")));
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["phone-advisor", "ask"]).is_err());
    }
}
