//! Line-oriented terminal front end: stdout rendering and stdin commands.

use std::io::{self, Write};

use nottif_client::SendRequest;
use nottif_core::{JobId, NottifError, Result};
use nottif_dashboard::{Command, EventRow, JobRow, Notifier, Surface, Toast};

pub const HELP: &str = "\
commands:
  add <message> | <schedule>   schedule a notification (cron syntax)
  delete <job-id>              remove a scheduled job
  webhook <url>                set the webhook URL
  test                         send a test notification
  send <text>                  send a notification now
  refresh                      reload both lists
  help                         show this text
  quit                         exit";

/// What one stdin line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Help,
    Quit,
}

/// Parse one stdin line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "add" => {
            let Some((message, schedule)) = rest.split_once('|') else {
                return Err(NottifError::InvalidInput(
                    "usage: add <message> | <schedule>".to_string(),
                ));
            };
            let (message, schedule) = (message.trim(), schedule.trim());
            if message.is_empty() || schedule.is_empty() {
                return Err(NottifError::InvalidInput(
                    "message and schedule are both required".to_string(),
                ));
            }
            Input::Command(Command::AddJob {
                message: message.to_string(),
                schedule: schedule.to_string(),
            })
        }
        "delete" | "rm" => Input::Command(Command::DeleteJob {
            id: JobId::from(required(rest, "usage: delete <job-id>")?),
        }),
        "webhook" => Input::Command(Command::UpdateWebhook {
            url: required(rest, "usage: webhook <url>")?.to_string(),
        }),
        "test" => Input::Command(Command::TestWebhook),
        "send" => Input::Command(Command::Send(SendRequest::new(required(
            rest,
            "usage: send <text>",
        )?))),
        "refresh" => Input::Command(Command::Refresh),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => {
            return Err(NottifError::InvalidInput(format!(
                "unknown command {other:?}, try `help`"
            )))
        }
    };
    Ok(Some(input))
}

fn required<'a>(arg: &'a str, usage: &str) -> Result<&'a str> {
    if arg.is_empty() {
        Err(NottifError::InvalidInput(usage.to_string()))
    } else {
        Ok(arg)
    }
}

/// Redraws a list section on stdout each time it changes.
pub struct TerminalSurface;

impl Surface for TerminalSurface {
    fn draw_jobs(&mut self, rows: &[JobRow]) {
        let mut out = String::from("── Scheduled jobs ──\n");
        for row in rows {
            match row {
                JobRow::Job {
                    id,
                    message,
                    schedule,
                } => out.push_str(&format!("  [{id}] {schedule}  {message}\n")),
                JobRow::Placeholder(text) => out.push_str(&format!("  {text}\n")),
            }
        }
        emit(&out);
    }

    fn draw_events(&mut self, rows: &[EventRow]) {
        let mut out = String::from("── Recent notifications ──\n");
        for row in rows {
            match row {
                EventRow::Event { glyph, line, time } => {
                    out.push_str(&format!("  {} {time}  {line}\n", glyph.symbol()))
                }
                EventRow::Placeholder(text) => out.push_str(&format!("  {text}\n")),
            }
        }
        emit(&out);
    }
}

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, toast: Toast) {
        let marker = if toast.is_error() { "!!" } else { ">>" };
        emit(&format!("{marker} {}\n", toast.message));
    }
}

fn emit(text: &str) {
    let mut stdout = io::stdout().lock();
    // A closed stdout only loses display output.
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_line(line) {
            Ok(Some(Input::Command(c))) => c,
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn add_splits_on_pipe() {
        assert_eq!(
            command("add Backup done | 0 2 * * *"),
            Command::AddJob {
                message: "Backup done".into(),
                schedule: "0 2 * * *".into(),
            }
        );
    }

    #[test]
    fn add_requires_both_parts() {
        assert!(parse_line("add Backup").is_err());
        assert!(parse_line("add | 0 2 * * *").is_err());
        assert!(parse_line("add Backup |").is_err());
    }

    #[test]
    fn delete_takes_raw_id() {
        assert_eq!(
            command("delete 42"),
            Command::DeleteJob {
                id: JobId::from("42")
            }
        );
        assert!(parse_line("delete").is_err());
    }

    #[test]
    fn send_keeps_whole_text() {
        assert_eq!(
            command("send hello  there"),
            Command::Send(SendRequest::new("hello  there"))
        );
    }

    #[test]
    fn simple_words() {
        assert_eq!(command("test"), Command::TestWebhook);
        assert_eq!(command("REFRESH"), Command::Refresh);
        assert_eq!(
            command("webhook https://example.com/hook"),
            Command::UpdateWebhook {
                url: "https://example.com/hook".into()
            }
        );
        assert_eq!(parse_line("help").unwrap(), Some(Input::Help));
        assert_eq!(parse_line("quit").unwrap(), Some(Input::Quit));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn unknown_word_is_invalid_input() {
        let err = parse_line("launch rockets").unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
