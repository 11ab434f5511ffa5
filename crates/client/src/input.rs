//! Line-based terminal input shared by prompts and the command loop.
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use runtime::{ChoiceProvider, GateCheckError, PlayerChoice};

/// Cloneable reader over stdin lines.
#[derive(Clone)]
pub struct TerminalInput {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl TerminalInput {
    pub fn stdin() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Next trimmed line, or `None` at end of input.
    pub async fn next_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line.map(|l| l.trim().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read terminal input: {}", e);
                None
            }
        }
    }
}

/// Asks the continue/new question on the terminal.
pub struct TerminalChoiceProvider {
    input: TerminalInput,
}

impl TerminalChoiceProvider {
    pub fn new(input: TerminalInput) -> Self {
        Self { input }
    }
}

/// Maps an answer to a choice. Only `new` is accepted when there is nothing
/// to continue.
pub fn parse_choice(answer: &str, can_continue: bool) -> Option<PlayerChoice> {
    match answer.to_ascii_lowercase().as_str() {
        "1" | "c" | "continue" if can_continue => Some(PlayerChoice::Continue),
        "2" | "n" | "new" => Some(PlayerChoice::New),
        "1" if !can_continue => Some(PlayerChoice::New),
        _ => None,
    }
}

#[async_trait]
impl ChoiceProvider for TerminalChoiceProvider {
    async fn choose(&self, can_continue: bool) -> Result<PlayerChoice, GateCheckError> {
        loop {
            println!();
            if can_continue {
                println!("  1) {}", PlayerChoice::Continue.label());
                println!("  2) {}", PlayerChoice::New.label());
            } else {
                println!("  1) {}", PlayerChoice::New.label());
            }
            println!("Choose your path:");

            let Some(answer) = self.input.next_line().await else {
                return Err(GateCheckError::NoChoice(String::from("input closed")));
            };

            match parse_choice(&answer, can_continue) {
                Some(choice) => return Ok(choice),
                None => println!("'{}' is not one of the options.", answer),
            }
        }
    }
}
