//! `piste chat` — Ask the assistant from the terminal.

use piste_assistant::{Assistant, ReplySource};
use piste_config::QUICK_QUESTIONS;
use piste_core::AssistantMode;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    video_context: &str,
    local: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let remote = piste_providers::build_from_config(&config)?;
    let assistant = Arc::new(Assistant::from_config(&config, remote));
    if local {
        assistant.switch_mode(AssistantMode::Local);
    }

    if let Some(msg) = message {
        // Single message mode
        let reply = assistant.handle(&msg, video_context).await?;
        println!("{}", reply.text);
        eprintln!("  [{} · {}]", reply.intent.label(), source_label(reply.source));
        return Ok(());
    }

    // Interactive mode
    let status = assistant.status();
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        piste — 击剑AI专家 Interactive Mode     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Mode:      {}", status.mode);
    println!(
        "  Remote:    {}",
        status.remote_name.as_deref().unwrap_or("not configured")
    );
    if !video_context.is_empty() {
        println!("  Watching:  {video_context}");
    }
    println!();
    println!("  Try one of:");
    for question in QUICK_QUESTIONS {
        println!("    - {question}");
    }
    println!();
    println!("  Commands: /mode local|remote, /clear, exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "exit" | "quit" => break,
            "/clear" => {
                let removed = assistant.clear_history();
                println!("  Cleared {removed} turn(s).");
            }
            cmd if cmd.starts_with("/mode") => {
                match cmd.trim_start_matches("/mode").parse::<AssistantMode>() {
                    Ok(mode) => {
                        let status = assistant.switch_mode(mode);
                        println!("  Mode is now {}.", status.mode);
                    }
                    Err(e) => eprintln!("  [Error] {e}"),
                }
            }
            msg => match assistant.handle(msg, video_context).await {
                Ok(reply) => {
                    println!();
                    for text_line in reply.text.lines() {
                        println!("  专家 > {text_line}");
                    }
                    println!("  ({} · {})", reply.intent.label(), source_label(reply.source));
                    println!();
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            },
        }
        prompt()?;
    }

    println!();
    println!("  再见！👋");
    println!();

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn source_label(source: ReplySource) -> &'static str {
    match source {
        ReplySource::Remote => "remote",
        ReplySource::Local => "local",
        ReplySource::LocalFallback => "local fallback",
    }
}
