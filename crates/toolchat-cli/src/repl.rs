// Line-oriented front end driving the session manager

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use toolchat_client::{Backend, ProfileClient};
use toolchat_core::{Applied, SessionManager};

use crate::commands::{self, Command, ProfileCommand, HELP};
use crate::render;

pub struct Repl {
    session: SessionManager,
    backend: Arc<dyn Backend>,
    /// Timeline blocks already printed
    printed: usize,
}

/// Whether the loop should keep reading
enum Flow {
    Continue,
    Quit,
}

impl Repl {
    pub fn new(session: SessionManager, backend: Arc<dyn Backend>) -> Self {
        Self {
            session,
            backend,
            printed: 0,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("toolchat - conversation {}", self.session.active_id());
        println!("Type /help for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                break;
            };

            let flow = match commands::parse(&line) {
                Ok(command) => self.execute(command).await,
                Err(err) => {
                    println!("{}", err);
                    Flow::Continue
                }
            };

            self.report_banner();
            if matches!(flow, Flow::Quit) {
                break;
            }
        }

        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Flow {
        let result = match command {
            Command::Empty => Ok(()),
            Command::Send(query) => self.ask(&query).await,
            Command::New => {
                let id = self.session.create_new().to_string();
                self.printed = 0;
                println!("New conversation {}", id);
                Ok(())
            }
            Command::List(term) => self.list(term.as_deref()).await,
            Command::Open(id) => self.open(&id, tokio::signal::ctrl_c()).await,
            Command::Rename { id, title } => self
                .session
                .rename(&id, &title)
                .await
                .map(|_| println!("Renamed."))
                .map_err(Into::into),
            Command::Delete(id) => self.delete(&id).await,
            Command::Clear => self.clear().await,
            Command::Reset => self
                .session
                .reset_memory()
                .await
                .map(|message| println!("{}", message))
                .map_err(Into::into),
            Command::Profile(profile) => self.profile(profile).await,
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Quit => return Flow::Quit,
        };

        if let Err(err) = result {
            tracing::warn!(error = %err, "Command failed");
            println!("Error: {}", err);
        }
        Flow::Continue
    }

    async fn ask(&mut self, query: &str) -> Result<()> {
        let pending = self.session.submit(query)?;
        self.print_new_blocks();

        let dispatched = tokio::select! {
            dispatched = pending.wait() => Some(dispatched),
            _ = tokio::signal::ctrl_c() => None,
        };

        match dispatched {
            Some(dispatched) => {
                if self.session.apply(dispatched) == Applied::Appended(0) {
                    println!("(no answer)");
                }
            }
            None => {
                self.session.stop();
            }
        }

        self.print_new_blocks();
        Ok(())
    }

    /// Replay a past conversation; resolving `interrupt` abandons the load
    async fn open<F: Future>(&mut self, id: &str, interrupt: F) -> Result<()> {
        let Some(pending) = self.session.begin_select(id)? else {
            println!("Already in conversation {}", id);
            return Ok(());
        };
        self.printed = 0;

        let loaded = tokio::select! {
            biased;
            _ = interrupt => None,
            loaded = pending.wait() => Some(loaded),
        };

        match loaded {
            Some(loaded) => {
                self.session.apply_load(loaded);
            }
            None => {
                // Abandon the load and continue in a fresh conversation
                self.session.create_new();
                println!("Loading stopped.");
            }
        }

        println!("Conversation {}", self.session.active_id());
        self.print_new_blocks();
        Ok(())
    }

    async fn list(&mut self, term: Option<&str>) -> Result<()> {
        self.session.refresh_conversations().await?;

        let shown = match term {
            Some(term) => self.session.search(term),
            None => self.session.conversations().iter().collect(),
        };
        print!(
            "{}",
            render::render_conversations(&shown, self.session.active_id(), self.session.labeler())
        );
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<()> {
        let was_active = id == self.session.active_id();
        self.session.remove(id).await?;

        println!("Deleted {}", id);
        if was_active {
            self.printed = 0;
            println!("New conversation {}", self.session.active_id());
        }
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.session.remove_all().await?;
        self.printed = 0;
        println!("All conversations deleted. New conversation {}", self.session.active_id());
        Ok(())
    }

    async fn profile(&mut self, command: ProfileCommand) -> Result<()> {
        let user_id = self.session.identity().as_str();

        match command {
            ProfileCommand::Show => match self.backend.get_profile(user_id).await? {
                Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                None => println!("No profile stored."),
            },
            ProfileCommand::Set(profile) => {
                self.backend.put_profile(user_id, profile).await?;
                println!("Profile saved.");
            }
            ProfileCommand::Delete => {
                self.backend.delete_profile(user_id).await?;
                println!("Profile deleted.");
            }
        }
        Ok(())
    }

    fn print_new_blocks(&mut self) {
        let rendered = self.session.timeline().rendered();
        if self.printed > rendered.len() {
            self.printed = 0;
        }

        print!("{}", render::render_blocks(&rendered[self.printed..]));
        self.printed = rendered.len();
    }

    fn report_banner(&mut self) {
        if let Some(banner) = self.session.error() {
            eprintln!("! {}", banner);
            self.session.clear_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_client::{MemoryBackend, QueryClient, QueryRequest};
    use toolchat_core::{SessionState, UserIdentity};

    async fn repl_with_past_conversation() -> Repl {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .ask(QueryRequest::new("old question", "conv-x", "user-1"))
            .await
            .unwrap();

        let backend: Arc<dyn Backend> = backend;
        let session = SessionManager::new(Arc::clone(&backend), UserIdentity::new("user-1"));
        Repl::new(session, backend)
    }

    #[tokio::test]
    async fn test_open_replays_conversation() {
        let mut repl = repl_with_past_conversation().await;

        repl.open("conv-x", std::future::pending::<()>()).await.unwrap();

        assert_eq!(repl.session.active_id(), "conv-x");
        assert_eq!(repl.session.state(), SessionState::Ready);
        assert_eq!(repl.printed, 2);
    }

    #[tokio::test]
    async fn test_interrupted_open_starts_fresh_conversation() {
        let mut repl = repl_with_past_conversation().await;

        repl.open("conv-x", std::future::ready(())).await.unwrap();

        assert_ne!(repl.session.active_id(), "conv-x");
        assert_eq!(repl.session.state(), SessionState::Ready);
        assert!(repl.session.timeline().is_empty());
        assert_eq!(repl.printed, 0);

        // Queries are accepted again once the load is abandoned
        assert!(repl.session.send("next").await.is_ok());
    }

    #[tokio::test]
    async fn test_open_rejects_blank_id() {
        let mut repl = repl_with_past_conversation().await;
        assert!(repl.open("  ", std::future::pending::<()>()).await.is_err());
    }
}
