//! Terminal input and rendering

use parley_session::Notifier;
use parley_types::{ChatRoom, Message, Sender, TimelineEvent};
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Display name of the simulated peer
const PEER_NAME: &str = "Gemini";

/// Lines typed by the user
///
/// Stdin is read on a dedicated thread, outside the runtime, since a blocking
/// read cannot be cancelled.
pub struct Input {
    lines: mpsc::Receiver<String>,
}

impl Input {
    pub fn spawn() -> Self {
        let (tx, lines) = mpsc::channel(16);
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            debug!("Input closed");
        });
        Self { lines }
    }

    /// Print `prompt` and wait for the next line; `None` at end of input
    pub async fn prompt(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = io::stdout().flush();
        self.lines.recv().await.map(|line| line.trim().to_string())
    }
}

/// Notifier that prints toasts to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_success(&self, message: &str) {
        debug!(target: "parley::toast", "{}", message);
        println!("  [ok] {}", message);
    }

    fn notify_error(&self, message: &str) {
        debug!(target: "parley::toast", "{}", message);
        println!("  [error] {}", message);
    }
}

pub fn format_message(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Peer => PEER_NAME,
    };
    let mut line = format!(
        "#{:<4} {} {}: {}",
        message.id,
        message.timestamp.format("%H:%M"),
        who,
        message.text
    );
    if message.image.is_some() {
        if !message.text.is_empty() {
            line.push(' ');
        }
        line.push_str("[image]");
    }
    line
}

pub fn print_messages(messages: &[Message]) {
    for message in messages {
        println!("{}", format_message(message));
    }
}

pub fn print_rooms<'a>(rooms: impl IntoIterator<Item = (usize, &'a ChatRoom)>) {
    let mut any = false;
    for (n, room) in rooms {
        println!("  {}. {}", n, room.title);
        any = true;
    }
    if !any {
        println!("  (no chatrooms)");
    }
}

pub fn render_event(event: &TimelineEvent) {
    match event {
        TimelineEvent::Appended(message) => println!("{}", format_message(message)),
        TimelineEvent::Prepended { added, has_more } => {
            println!("-- {} older messages --", added.len());
            print_messages(added);
            if !has_more {
                println!("-- start of conversation --");
            }
        }
        TimelineEvent::LoadingOlder(true) => println!("Loading older messages..."),
        TimelineEvent::Typing(true) => println!("{} is typing...", PEER_NAME),
        TimelineEvent::Hydrated { .. }
        | TimelineEvent::LoadingOlder(false)
        | TimelineEvent::Typing(false)
        | TimelineEvent::Throttled(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_message() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let message = Message::peer(7, "Here's what I found.", ts);
        assert_eq!(
            format_message(&message),
            "#7    09:30 Gemini: Here's what I found."
        );

        let mut image = Message::peer(8, "", ts);
        image.sender = Sender::User;
        image.image = Some("data:image/png;base64,AAAA".into());
        assert_eq!(format_message(&image), "#8    09:30 You: [image]");
    }
}
