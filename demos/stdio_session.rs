//! Drive a real language server over stdio
//!
//! Usage: `cargo run --example stdio_session -- <server-binary> <file> [line] [character]`
//!
//! Starts the server, opens the file, asks for hover and document symbols at
//! the given position, then shuts everything down.

use lsp_session::prelude::*;
use std::path::Path;
use tokio::process::Command;
use tokio::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(server), Some(file)) = (args.next(), args.next()) else {
        eprintln!("usage: stdio_session <server-binary> <file> [line] [character]");
        std::process::exit(2);
    };
    let line = args.next().map(|v| v.parse()).transpose()?.unwrap_or(0);
    let character = args.next().map(|v| v.parse()).transpose()?.unwrap_or(0);

    let path = std::fs::canonicalize(&file)?;
    let root = path.parent().unwrap_or(Path::new("/")).to_path_buf();
    let uri = uri_from_path(&path)?;
    let language_id = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("plaintext")
        .to_string();
    let text = std::fs::read_to_string(&path)?;

    println!("🚀 Starting {}", server);
    let mut process = ServerProcess::spawn(Command::new(&server))?;

    let mut options = SessionOptions::new()
        .with_root_path(&root)
        .with_initialize_timeout(Duration::from_secs(30));
    options
        .handlers_mut()
        .on_notification_typed::<methods::PublishDiagnostics, _>(|params: PublishDiagnosticsParams| {
            for diagnostic in &params.diagnostics {
                println!(
                    "  ⚠️  {}:{} {}",
                    diagnostic.range.start.line + 1,
                    diagnostic.range.start.character + 1,
                    diagnostic.message
                );
            }
        })?;

    let session = process.start_session(options)?;
    let result = session.initialize().await?;
    if let Some(info) = &result.server_info {
        println!("✅ Connected to {} {}", info.name, info.version.as_deref().unwrap_or(""));
    }

    session.open_document(uri.clone(), language_id, text).await?;
    println!("📄 Opened {}", uri);

    let position = Position::new(line, character);
    if session.server_capabilities().is_some_and(|caps| caps.supports_hover()) {
        match session.hover(&uri, position).await? {
            Some(hover) => println!("🔍 Hover: {:?}", hover.contents),
            None => println!("🔍 Nothing to show at {}:{}", line, character),
        }
    }

    match session.document_symbols(&uri).await {
        Ok(Some(symbols)) => println!("🔧 {} top-level symbols", symbols.len()),
        Ok(None) => println!("🔧 No symbols"),
        Err(LspError::Response(error)) => println!("🔧 Symbols unavailable: {}", error),
        Err(e) => return Err(e.into()),
    }

    session.close_document(&uri).await?;
    session.shutdown().await?;
    let status = process.wait_with_grace(Duration::from_secs(5)).await?;
    println!("👋 Server exited with {}", status);
    Ok(())
}
