//! Keyboard shortcuts for the builder
//!
//! Reads command lines (`s` saves, `q` leaves) either from an async reader
//! or from the process's stdin.

use log::debug;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutCommand {
    Save,
    Quit,
}

pub fn parse_shortcut(line: &str) -> Option<ShortcutCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "save" | ":w" => Some(ShortcutCommand::Save),
        "q" | "quit" | ":q" => Some(ShortcutCommand::Quit),
        _ => None,
    }
}

/// A registered shortcut listener; dropping it keeps it running, call
/// [`deregister`](Self::deregister) to stop it
#[derive(Debug)]
pub enum ShortcutListener {
    Task(JoinHandle<()>),
    /// Blocking stdin reader; a detached thread so it never holds up runtime
    /// shutdown
    Stdin(Arc<AtomicBool>),
}

impl ShortcutListener {
    pub fn spawn<R>(reader: R, commands: mpsc::UnboundedSender<ShortcutCommand>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match parse_shortcut(&line) {
                    Some(command) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    None => debug!("Ignoring unknown shortcut: {:?}", line),
                }
            }
        });

        ShortcutListener::Task(handle)
    }

    /// Listen on the process's stdin
    pub fn stdin(commands: mpsc::UnboundedSender<ShortcutCommand>) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let flag = active.clone();

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Some(command) = parse_shortcut(&line) {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
            }
            flag.store(false, Ordering::SeqCst);
        });

        ShortcutListener::Stdin(active)
    }

    pub fn is_active(&self) -> bool {
        match self {
            ShortcutListener::Task(handle) => !handle.is_finished(),
            ShortcutListener::Stdin(active) => active.load(Ordering::SeqCst),
        }
    }

    pub fn deregister(self) {
        match self {
            ShortcutListener::Task(handle) => handle.abort(),
            ShortcutListener::Stdin(active) => active.store(false, Ordering::SeqCst),
        }
    }
}
