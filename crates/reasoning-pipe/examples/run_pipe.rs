//! Run the reasoning pipe against real backends from the terminal.
//!
//! Run with: cargo run -p reasoning-pipe --example run_pipe
//! Or with a custom query: cargo run -p reasoning-pipe --example run_pipe -- "Your question here"
//!
//! Configure the models in .env:
//!   REASONING_MODEL - comma-separated reasoning model ids
//!   RESPONDING_MODEL - model id for the final answer
//!   ENABLE_SHOW_REASONING_TRACE=true - print reasoning as it streams
//!   OLLAMA_BASE_URL / OPENAI_API_BASE_URL / OPENAI_API_KEY - backend endpoints

use std::env;
use std::io::Write;

use backend_core::{ChatMessage, Role};
use reasoning_pipe::{async_trait, EventEmitter, PipeError, PipeEvent, PipeRequest, ReasoningPipe};

/// Prints message text to stdout and statuses to stderr.
struct TerminalEmitter;

#[async_trait]
impl EventEmitter for TerminalEmitter {
    async fn emit(&self, event: PipeEvent) -> Result<(), PipeError> {
        match event {
            PipeEvent::Message { content, role } => {
                if role == Role::AssistantReasoning {
                    print!("\x1b[2m{}\x1b[0m", content);
                } else {
                    print!("{}", content);
                }
                let _ = std::io::stdout().flush();
            }
            PipeEvent::Status { description, done } => {
                if done {
                    eprintln!("\n[{}]", description);
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let query = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "Write a function that checks whether a string is a palindrome.".to_string()
    };

    let pipe = ReasoningPipe::from_env()?;
    for descriptor in pipe.pipes() {
        println!("Pipe: {}", descriptor.name);
    }
    println!("Query: \"{}\"\n", query);

    let request = PipeRequest::new(vec![ChatMessage::user(query)]);
    let answer = pipe.run(request, &TerminalEmitter).await?;

    println!("\n\n=== Final answer ===\n{}", answer);
    Ok(())
}
