//! Contains the presentation side of the tracker. [Surface] is the contract the dispatcher talks
//! to, [TerminalSurface] renders sessions as prompts on stdout.

use std::io::{self, BufRead, Write};

use ansi_term::{Colour, Style};
use anyhow::Result;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

use crate::utils::{clock::Clock, time::clock_face};

use super::{
    session::{Field, FormSession, Progress},
    storage::entities::SubmitOutcome,
};

const INPUT_CAPACITY: usize = 16;

pub const HELP: &str = "Commands: :p new check-in, :c close without saving, :q quit, :h help";

/// Intended to serve as a contract for anything that can show a check-in to the user.
#[cfg_attr(test, mockall::automock)]
pub trait Surface {
    /// Shows the session, asking for the field it currently waits for.
    fn present(&mut self, session: &FormSession) -> Result<()>;

    fn saved(&mut self, outcome: &SubmitOutcome) -> Result<()>;

    fn closed(&mut self) -> Result<()>;

    fn notify(&mut self, message: &str) -> Result<()>;

    fn error(&mut self, message: &str) -> Result<()>;
}

pub struct TerminalSurface<W: Write> {
    out: W,
    clock: Box<dyn Clock>,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout(clock: Box<dyn Clock>) -> Self {
        Self::new(io::stdout(), clock)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, clock: Box<dyn Clock>) -> Self {
        Self { out, clock }
    }

    fn header(&mut self, session: &FormSession) -> Result<()> {
        writeln!(
            self.out,
            "\n{}  {}",
            Style::new().bold().paint("Productivity Check"),
            Colour::Cyan.paint(format!("Time: {}", clock_face(&self.clock.time())))
        )?;
        writeln!(
            self.out,
            "{}",
            Colour::Fixed(245).paint(format!(
                "Check-in {} ({}). {HELP}",
                session.timestamp(),
                session.origin().describe()
            ))
        )?;
        Ok(())
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn present(&mut self, session: &FormSession) -> Result<()> {
        let Progress::Awaiting(field) = session.progress() else {
            return Ok(());
        };

        if field == Field::Priorities {
            self.header(session)?;
        }
        write!(self.out, "{}", Style::new().bold().paint(field.label()))?;
        let current = session.text(Field::Priorities);
        if field == Field::Priorities && !current.is_empty() {
            write!(
                self.out,
                " {}",
                Colour::Yellow.paint(format!("[enter keeps: {current}]"))
            )?;
        }
        write!(self.out, "\n> ")?;
        self.out.flush()?;
        Ok(())
    }

    fn saved(&mut self, outcome: &SubmitOutcome) -> Result<()> {
        let note = if outcome.priority.is_some() {
            "Saved, priorities updated."
        } else {
            "Saved."
        };
        writeln!(self.out, "{}", Colour::Green.paint(note))?;
        Ok(())
    }

    fn closed(&mut self) -> Result<()> {
        writeln!(self.out, "{}", Colour::Fixed(245).paint("Check-in closed, nothing saved."))?;
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        Ok(())
    }

    fn error(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{}", Colour::Red.bold().paint(message))?;
        Ok(())
    }
}

/// Reads stdin lines on a dedicated thread. Blocking stdin reads inside the runtime would keep it
/// from shutting down, a plain thread just dies with the process.
pub fn spawn_input_reader() -> Result<ReceiverStream<String>> {
    let (sender, receiver) = mpsc::channel(INPUT_CAPACITY);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Failed reading stdin {e:?}");
                        break;
                    }
                };
                if sender.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("Input reader finished");
        })?;
    Ok(ReceiverStream::new(receiver))
}
