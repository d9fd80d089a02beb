//! Terminal chat client
//!
//! Reads one message per line from stdin and prints the agent's answer, the
//! image URLs it picked and the reply language. `/reset` clears the
//! conversation and `/quit` exits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use realty_agent_agent::{ChatSession, Responder};
use realty_agent_config::{load_settings, Settings};
use realty_agent_core::{PipelineResult, ResponseMode};
use realty_agent_server::{build_components, init_cli_tracing, warm_up_llm};

enum Command<'a> {
    Quit,
    Reset,
    Ask(&'a str),
    Skip,
}

fn parse_line(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Skip,
        "/quit" | "/exit" => Command::Quit,
        "/reset" => Command::Reset,
        message => Command::Ask(message),
    }
}

fn render(result: &PipelineResult) -> String {
    let mut out = format!("\nAgent: {}\n", result.text);
    for url in &result.image_urls {
        out.push_str(&format!("  image: {}\n", url));
    }
    out.push_str(&format!("  [language: {}]\n\n", result.language.code()));
    out
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("REALTY_AGENT_ENV").ok();
    let config = load_settings(env.as_deref()).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });
    init_cli_tracing();

    let components = build_components(&config).await?;
    warm_up_llm(&config).await;

    let responder: Arc<dyn Responder> = components.agent;
    let session = ChatSession::new("terminal", responder, config.conversation.max_history_turns);

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Real-estate assistant. Type /reset to start over, /quit to exit.\n\n")
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            Command::Quit => break,
            Command::Skip => continue,
            Command::Reset => {
                session.reset();
                stdout.write_all(b"(conversation cleared)\n\n").await?;
            },
            Command::Ask(message) => match session.ask(message, ResponseMode::Text).await {
                Ok(result) => stdout.write_all(render(&result).as_bytes()).await?,
                Err(e) => {
                    tracing::warn!(error = %e, "Turn failed");
                    stdout
                        .write_all(format!("\n(error: {})\n\n", e).as_bytes())
                        .await?;
                },
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_agent_core::Language;

    #[test]
    fn test_parse_line() {
        assert!(matches!(parse_line("  /quit "), Command::Quit));
        assert!(matches!(parse_line("/exit"), Command::Quit));
        assert!(matches!(parse_line("/reset"), Command::Reset));
        assert!(matches!(parse_line("   "), Command::Skip));
        assert!(matches!(parse_line(" 3BHK in Goa? "), Command::Ask("3BHK in Goa?")));
    }

    #[test]
    fn test_render_lists_images_and_language() {
        let out = render(&PipelineResult {
            text: "Palm Grove has a pool.".to_string(),
            image_urls: vec!["http://x/1.jpg".to_string()],
            language: Language::Tamil,
        });
        assert!(out.contains("Agent: Palm Grove has a pool."));
        assert!(out.contains("image: http://x/1.jpg"));
        assert!(out.contains("[language: ta]"));
    }
}
