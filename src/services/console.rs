//! Operator prompt backed by stdin/stdout
//!
//! Pure side-effecting I/O: renders menus and free-text prompts, loops
//! until the input is usable, and returns nothing beyond the operator's
//! choice.

use std::io::{self, BufRead, Write};

use crate::error::{MigrateError, MigrateResult};
use crate::traits::Prompt;

/// stdin/stdout-backed `Prompt` implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> MigrateResult<String> {
        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| MigrateError::PromptFailed { message: e.to_string() })?;
        Ok(input.trim().to_string())
    }
}

impl Prompt for ConsolePrompt {
    fn ask_choice(&self, title: &str, options: &[String]) -> MigrateResult<usize> {
        println!("\n{title}:");
        for (index, option) in options.iter().enumerate() {
            println!("{index}. {option}");
        }

        loop {
            print!("Enter choice: ");
            let _ = io::stdout().flush();

            let input = self.read_line()?;
            match input.parse::<usize>() {
                Ok(choice) if choice < options.len() => {
                    return Ok(choice);
                }
                _ => println!("Invalid choice. Please enter 0-{}", options.len().saturating_sub(1)),
            }
        }
    }

    fn ask_text(&self, prompt: &str) -> MigrateResult<String> {
        print!("{prompt}");
        let _ = io::stdout().flush();
        self.read_line()
    }
}
