//! Line-oriented interactive loop.

use anyhow::{Context, Result};
use synapse_agent::CommandRouter;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

/// What the loop should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    Health,
    Request(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "quit" | "exit" => Input::Quit,
        ":status" => Input::Health,
        text => Input::Request(text),
    }
}

/// Read requests from stdin until EOF or `exit`.  `:status` prints the
/// health report.
pub async fn run(router: &CommandRouter) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Synapse ready. Type a command, `:status`, or `exit`.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            stdout.write_all(b"\n").await?;
            info!("EOF received, exiting");
            break;
        };

        let reply = match classify(&line) {
            Input::Skip => continue,
            Input::Quit => {
                info!("user requested exit");
                break;
            }
            Input::Health => serde_json::to_string_pretty(&router.health().await)?,
            Input::Request(text) => router.handle(text).await,
        };

        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_lines() {
        assert_eq!(classify("   "), Input::Skip);
        assert_eq!(classify("exit"), Input::Quit);
        assert_eq!(classify(" quit "), Input::Quit);
        assert_eq!(classify(":status"), Input::Health);
        assert_eq!(
            classify("  list my repositories "),
            Input::Request("list my repositories")
        );
    }
}
