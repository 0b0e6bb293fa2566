pub mod commands;

use std::io::{self, Write};

use crate::api::models::Mode;
use crate::chat::{ChatSession, RelayClient, TranscriptRenderer};
use crate::config::AppConfig;

/// Parses a REPL command; `None` means the line is a chat message.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Mode(Option<Mode>),
    Invalid(String),
}

pub fn parse_repl_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }

    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("/exit") | Some("/quit") => Some(ReplCommand::Exit),
        Some("/mode") => match parts.next() {
            None => Some(ReplCommand::Mode(None)),
            Some(arg) => Some(
                arg.parse::<Mode>()
                    .map(|m| ReplCommand::Mode(Some(m)))
                    .unwrap_or_else(ReplCommand::Invalid),
            ),
        },
        Some(other) => Some(ReplCommand::Invalid(format!("unknown command '{}'", other))),
        None => None,
    }
}

pub async fn run_repl(config: AppConfig, mode: Mode, url: Option<String>, colored: bool) {
    let client = RelayClient::new(url.unwrap_or(config.client.relay_url));
    let renderer = if colored {
        TranscriptRenderer::colored("base16-ocean.dark")
    } else {
        TranscriptRenderer::plain()
    };
    let mut session = ChatSession::new(mode);

    println!("--- Exam Chat ---");
    println!("Relay: {}", client.url());
    println!("Mode: {} (/mode task|code to switch, /mode to toggle, /exit to quit)", mode.as_str());
    println!("-----------------");
    print!("{}", renderer.render(&session));

    loop {
        print!("\nYou> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let text = input.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            continue;
        }

        match parse_repl_command(text) {
            Some(ReplCommand::Exit) => break,
            Some(ReplCommand::Mode(next)) => {
                let next = next.unwrap_or_else(|| session.mode().toggled());
                session.set_mode(next);
                println!("Mode: {}", next.as_str());
                continue;
            }
            Some(ReplCommand::Invalid(reason)) => {
                eprintln!("{}", reason);
                continue;
            }
            None => {}
        }

        print!("Assistant> ");
        let _ = io::stdout().flush();

        let result = client
            .submit(&mut session, text, |_, delta| {
                print!("{}", delta);
                let _ = io::stdout().flush();
            })
            .await;
        println!();

        // Show the finished answer again with markdown cleanup and highlighting
        if let Some(answer) = session.messages().last() {
            if !answer.content.is_empty() {
                println!("\n{}", renderer.render_message(answer));
            }
        }
        if result.is_err() || session.error().is_some() {
            eprintln!("Error: {}", session.error().unwrap_or("unknown error"));
        }
    }
}
