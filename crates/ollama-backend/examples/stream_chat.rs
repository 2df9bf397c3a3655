//! Stream a single chat completion from Ollama and print the raw lines.
//!
//! Run with: cargo run -p ollama-backend --example stream_chat -- llama3 "Your message"
//!
//! Set OLLAMA_BASE_URL in .env to target a non-local server.

use ollama_backend::{ChatMessage, CompletionBackend, CompletionRequest, OllamaBackend};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let model = args.get(1).cloned().unwrap_or_else(|| "llama3".to_string());
    let text = if args.len() > 2 {
        args[2..].join(" ")
    } else {
        "Hello! Please respond with a short greeting.".to_string()
    };

    let backend = OllamaBackend::from_env()?;
    println!("Ollama at {}, model {}", backend.config().base_url, model);

    let request = CompletionRequest::new(model, vec![ChatMessage::user(text)]).streaming(true);
    let mut stream = backend.generate(request).await?.into_stream()?;

    while let Some(chunk) = stream.read(1024).await? {
        print!("{}", String::from_utf8_lossy(&chunk));
    }
    stream.close();

    Ok(())
}
