// Terminal front end: load one PDF, then answer questions typed on stdin.

use anyhow::{Context, Result};
use docchat::{ChatSession, Config, FileValidator, OpenAiService, UploadedDocument, PDF_MIME_TYPE};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn declared_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: docchat <file.pdf>")?;
    let path = Path::new(&path);

    let config = Config::from_env()?;
    let session = ChatSession::new(OpenAiService::new(&config), FileValidator::new(config.max_upload_bytes));

    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let document = session
        .upload(UploadedDocument::new(filename, declared_mime_type(path), content))
        .await?;
    println!("Loaded {} ({} pages). Ask a question, or /quit to exit.", document.filename, document.pages);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        match session.send(line).await {
            Ok(exchange) => println!("{}\n", exchange.reply.text),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    Ok(())
}
