//! Terminal chat: a stdin/stdout REPL over one conversation session.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::intake::{Attachment, ConversationSession, FlowController, UserInput};

use super::command::{Command, CommandParser, HELP_TEXT};

pub struct Repl {
    controller: Arc<FlowController>,
    session: ConversationSession,
}

impl Repl {
    pub fn new(controller: Arc<FlowController>) -> Self {
        Self {
            controller,
            session: ConversationSession::new(),
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Read lines until EOF or `/quit`, writing replies to `out`.
    pub async fn run<R, W>(&mut self, input: R, mut out: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        eprint!("> ");

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                eprint!("> ");
                continue;
            }

            let reply = match CommandParser::parse(&line) {
                Command::Quit => break,
                Command::Help => HELP_TEXT.to_string(),
                Command::Invalid(usage) => usage,
                Command::Reset => {
                    self.session = ConversationSession::new();
                    "Started a new conversation.".to_string()
                }
                Command::Start(workflow) => {
                    self.controller.start_flow(&mut self.session, workflow).text
                }
                Command::Feedback { helpful } => {
                    if self.controller.rate_last_answer(&self.session, helpful).await {
                        "Thanks for the feedback!".to_string()
                    } else {
                        "There's no answer to rate yet.".to_string()
                    }
                }
                Command::Attach { path, caption } => match Attachment::read(&path).await {
                    Ok(file) => {
                        let input = UserInput::from_parts(caption.unwrap_or_default(), Some(file));
                        self.turn(input).await
                    }
                    Err(e) => format!("Could not read {}: {e}", path.display()),
                },
                Command::Say(text) => self.turn(UserInput::text(text)).await,
            };

            out.write_all(format!("\n{reply}\n\n").as_bytes()).await?;
            out.flush().await?;
            eprint!("> ");
        }
        Ok(())
    }

    async fn turn(&mut self, input: UserInput) -> String {
        self.controller
            .handle_user_turn(&mut self.session, input)
            .await
            .text
    }
}
