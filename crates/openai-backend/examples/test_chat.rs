//! Simple test for OpenAiBackend chat completion.
//!
//! Run with: cargo run -p openai-backend --example test_chat
//! Or with a custom message: cargo run -p openai-backend --example test_chat -- "Your message here"
//!
//! Make sure to set environment variables in .env:
//!   OPENAI_API_KEY - API key for authentication
//!   OPENAI_MODEL - model id (default: gpt-4o-mini)

use openai_backend::{ChatMessage, CompletionBackend, CompletionRequest, OpenAiBackend};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Get message from command line args or use default
    let args: Vec<String> = env::args().collect();
    let message_text = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "Hello! Please respond with a short greeting.".to_string()
    };
    let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    println!("Initializing OpenAiBackend...");
    let backend = OpenAiBackend::from_env()?;
    println!("API URL: {}", backend.config().api_url);
    println!("Model: {}", model);
    println!();

    println!("Sending: \"{}\"", message_text);
    println!("Streaming response...\n");

    let request = CompletionRequest::new(model, vec![ChatMessage::user(message_text)])
        .streaming(true);
    let mut stream = backend.generate(request).await?.into_stream()?;

    println!("=== Stream lines ===");
    while let Some(chunk) = stream.read(1024).await? {
        print!("{}", String::from_utf8_lossy(&chunk));
    }
    println!("====================");
    stream.close();

    Ok(())
}
