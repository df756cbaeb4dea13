//! Terminal chat client for the scripture QA service.
//!
//! One session identifier is generated at startup; every question and answer
//! is appended to the scrollback as it happens. `/upload <path>` indexes a
//! text file; `/quit` exits.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use uuid::Uuid;

use shastra_qa::client::ChatApi;

#[derive(Parser)]
#[command(
    name = "shastra-chat",
    about = "Chat with the Digambar Jain scripture QA service"
)]
struct Args {
    /// Base URL of the QA service.
    #[arg(long, env = "API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Gemini API key, sent as the x-api-key header.
    #[arg(long, env = "GEMINI_API_KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let api_key = match args.api_key {
        Some(key) if !key.trim().is_empty() => key,
        _ => prompt_for_key()?,
    };

    let api = ChatApi::new(&args.api_url, api_key);
    let session_id = Uuid::new_v4().to_string();

    println!("{}", "Digambar Jain QA".bold());
    println!("Connected to {} (session {})", args.api_url, session_id);
    println!("Ask a question, or use /upload <path> to index a document. /quit exits.\n");

    let stdin = io::stdin();
    loop {
        print!("{} ", "you>".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input == "/quit" || input == "/exit" {
            break;
        }

        if let Some(path) = input.strip_prefix("/upload ") {
            let message = api.upload_file(&PathBuf::from(path.trim())).await;
            print_server_line(&message);
            continue;
        }

        let answer = api.chat(input, &session_id).await;
        print_server_line(&answer);
    }

    Ok(())
}

fn print_server_line(text: &str) {
    if text.starts_with("Error:") {
        println!("{} {}\n", "!".red().bold(), text.red());
    } else {
        println!("{} {}\n", "qa>".cyan().bold(), text);
    }
}

fn prompt_for_key() -> anyhow::Result<String> {
    print!("Gemini API key: ");
    io::stdout().flush()?;
    let mut key = String::new();
    io::stdin().read_line(&mut key)?;
    let key = key.trim().to_string();
    anyhow::ensure!(!key.is_empty(), "An API key is required to proceed");
    Ok(key)
}
