// src/app/console.rs

use std::collections::VecDeque;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::pin::Pin;

use thiserror::Error;
use tokio::runtime::{Builder, Runtime};

/// What came back from a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Line(String),
    /// The user pressed Ctrl-C.
    Interrupted,
    /// Input reached end-of-file.
    Closed,
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The line was read but is not valid UTF-8. The input stream is still usable.
    #[error("input line is not valid UTF-8")]
    Undecodable,
}

impl ConsoleError {
    /// True when the console itself can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConsoleError::Io(_))
    }
}

pub trait Console {
    /// Shows `label` and waits for one line of input.
    fn prompt(&mut self, label: &str) -> Result<Reply, ConsoleError>;

    /// Writes one line of output.
    fn say(&mut self, message: &str) -> Result<(), ConsoleError>;
}

// ============================================================================
// Terminal Console
// ============================================================================

type InterruptFuture = Pin<Box<dyn Future<Output = io::Result<()>>>>;

/// Stdin/stdout console that turns Ctrl-C into [`Reply::Interrupted`].
///
/// Lines are read on a blocking worker while a small current-thread runtime
/// waits on either the line or the interrupt signal. The signal future lives
/// as long as the console, so a Ctrl-C pressed while a request is in flight
/// is reported at the next prompt.
pub struct TerminalConsole {
    runtime: Option<Runtime>,
    interrupt: InterruptFuture,
    interrupted: bool,
}

impl TerminalConsole {
    pub fn new() -> Result<Self, ConsoleError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime: Some(runtime),
            interrupt: Box::pin(tokio::signal::ctrl_c()),
            interrupted: false,
        })
    }
}

impl Console for TerminalConsole {
    fn prompt(&mut self, label: &str) -> Result<Reply, ConsoleError> {
        if self.interrupted {
            return Ok(Reply::Interrupted);
        }

        let mut stdout = io::stdout();
        write!(stdout, "{label}")?;
        stdout.flush()?;

        let Self {
            runtime, interrupt, ..
        } = self;
        let Some(runtime) = runtime.as_ref() else {
            return Ok(Reply::Closed);
        };

        // `None` means Ctrl-C won the race.
        let read: io::Result<Option<Vec<u8>>> = runtime.block_on(async {
            let read = tokio::task::spawn_blocking(|| {
                let mut bytes = Vec::new();
                io::stdin().lock().read_until(b'\n', &mut bytes).map(|_| bytes)
            });

            tokio::select! {
                biased;
                signal = interrupt.as_mut() => signal.map(|_| None),
                joined = read => match joined {
                    Ok(bytes) => bytes.map(Some),
                    Err(join) => Err(io::Error::other(join)),
                },
            }
        });

        match read? {
            None => {
                self.interrupted = true;
                // Keep the farewell on its own line after the echoed ^C.
                writeln!(io::stdout())?;
                Ok(Reply::Interrupted)
            }
            Some(bytes) if bytes.is_empty() => Ok(Reply::Closed),
            Some(bytes) => {
                let line = String::from_utf8(bytes).map_err(|_| ConsoleError::Undecodable)?;
                Ok(Reply::Line(line.trim_end_matches(['\r', '\n']).to_string()))
            }
        }
    }

    fn say(&mut self, message: &str) -> Result<(), ConsoleError> {
        writeln!(io::stdout(), "{message}")?;
        Ok(())
    }
}

impl Drop for TerminalConsole {
    fn drop(&mut self) {
        // A stdin read abandoned by Ctrl-C never returns; don't wait for it.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

// ============================================================================
// Scripted Console
// ============================================================================

/// In-memory console fed from a queue of replies; records everything shown.
///
/// Once the queue is empty every prompt returns [`Reply::Closed`].
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    replies: VecDeque<Result<Reply, ConsoleError>>,
    transcript: Vec<String>,
    prompts: usize,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: lines.into_iter().map(|l| Ok(Reply::Line(l.into()))).collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, reply: Reply) -> &mut Self {
        self.replies.push_back(Ok(reply));
        self
    }

    /// Queues a failed read.
    pub fn push_error(&mut self, err: ConsoleError) -> &mut Self {
        self.replies.push_back(Err(err));
        self
    }

    pub fn push_lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .extend(lines.into_iter().map(|l| Ok(Reply::Line(l.into()))));
        self
    }

    /// Everything written with `say`, one entry per line.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl Console for ScriptedConsole {
    fn prompt(&mut self, _label: &str) -> Result<Reply, ConsoleError> {
        self.prompts += 1;
        self.replies.pop_front().unwrap_or(Ok(Reply::Closed))
    }

    fn say(&mut self, message: &str) -> Result<(), ConsoleError> {
        self.transcript.push(message.to_string());
        Ok(())
    }
}
