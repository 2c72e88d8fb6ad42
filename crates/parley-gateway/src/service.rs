use crate::config::Config;
use crate::console::{self, ConsoleNotifier, Input};
use anyhow::Result;
use parley_persistence::{KeyValueStore, SqliteStore};
use parley_session::{AuthService, AuthStep, Notifier, RoomRegistry, SessionContext, SessionError};
use parley_timeline::{LoadOutcome, Timeline};
use parley_types::{ChatRoom, MessageDraft, MessageId, User};
use std::sync::Arc;
use tokio::signal;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

const ROOM_HELP: &str = "Commands: /new <title>, /delete <n>, /search <term>, /open <n>, /quit";
const CHAT_HELP: &str =
    "Type to send. Commands: /image <data-uri> [caption], /older, /copy <id>, /back, /quit";

/// How a chat view was left
enum ChatExit {
    Back,
    Quit,
}

/// Gateway service - wires storage, login, rooms and timelines to the terminal
pub struct GatewayService {
    config: Config,
}

impl GatewayService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        parley_logging::init_logging(&self.config.logging.level, self.config.logging.format)?;
        info!("Starting Parley");

        let store: Arc<dyn KeyValueStore> =
            Arc::new(SqliteStore::new(&self.config.storage.path).await?);
        info!(path = %self.config.storage.path, "Storage initialized");

        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let mut session = ConsoleSession {
            config: self.config,
            auth: AuthService::new(store, notifier.clone()),
            notifier,
            input: Input::spawn(),
        };

        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
            info!("Received shutdown signal");
        };

        tokio::select! {
            result = session.run() => {
                if let Err(e) = result {
                    error!("Session error: {}", e);
                    return Err(e);
                }
            }
            _ = shutdown => {
                println!();
                info!("Shutting down gracefully...");
            }
        }

        info!("Parley stopped");
        Ok(())
    }
}

/// One interactive user session
struct ConsoleSession {
    config: Config,
    auth: AuthService,
    notifier: Arc<dyn Notifier>,
    input: Input,
}

impl ConsoleSession {
    async fn run(&mut self) -> Result<()> {
        let Some(user) = self.login().await? else {
            return Ok(());
        };
        println!("Logged in as {}", user.display_name());

        let mut rooms = RoomRegistry::load(self.auth.context(&user)).await?;
        self.room_list(&mut rooms).await
    }

    /// `None` if input ends before login completes
    async fn login(&mut self) -> Result<Option<User>> {
        loop {
            let Some(country_code) = self.input.prompt("Country code (e.g. +1): ").await else {
                return Ok(None);
            };
            let Some(phone) = self.input.prompt("Phone number: ").await else {
                return Ok(None);
            };

            match self.auth.request_otp(&country_code, &phone).await {
                Ok(AuthStep::LoggedIn(user)) => return Ok(Some(user)),
                Ok(AuthStep::OtpSent) => {}
                Err(SessionError::Validation(msg)) => {
                    self.notifier.notify_error(&msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            loop {
                let Some(code) = self.input.prompt("OTP: ").await else {
                    return Ok(None);
                };
                match self.auth.verify_otp(&code).await {
                    Ok(user) => return Ok(Some(user)),
                    Err(SessionError::InvalidOtp) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    async fn room_list(&mut self, rooms: &mut RoomRegistry) -> Result<()> {
        println!("{}", ROOM_HELP);
        loop {
            println!("Chatrooms:");
            console::print_rooms(rooms.rooms().iter().enumerate().map(|(i, r)| (i + 1, r)));

            let Some(line) = self.input.prompt("> ").await else {
                return Ok(());
            };
            let (command, arg) = split_command(&line);

            match command {
                "" => {}
                "/new" => {
                    if let Err(e) = rooms.create(arg).await {
                        warn!("Failed to create chatroom: {}", e);
                    }
                }
                "/delete" => match pick_room(rooms, arg) {
                    Some(room) => {
                        if let Err(e) = rooms.delete(&room.id).await {
                            warn!("Failed to delete chatroom: {}", e);
                        }
                    }
                    None => println!("No chatroom numbered {:?}", arg),
                },
                "/search" => {
                    println!("Matching \"{}\":", arg);
                    console::print_rooms(numbered_matches(rooms, arg));
                }
                "/open" => match pick_room(rooms, arg) {
                    Some(room) => {
                        let ctx = rooms.context().clone();
                        if let ChatExit::Quit = self.chat(ctx, room).await? {
                            return Ok(());
                        }
                        println!("{}", ROOM_HELP);
                    }
                    None => println!("No chatroom numbered {:?}", arg),
                },
                "/quit" => return Ok(()),
                _ => println!("{}", ROOM_HELP),
            }
        }
    }

    async fn chat(&mut self, ctx: SessionContext, room: ChatRoom) -> Result<ChatExit> {
        let timeline = Timeline::builder(ctx, room.id.clone())
            .with_config(self.config.timeline.clone())
            .open()
            .await?;

        println!("== {} ==", room.title);
        console::print_messages(&timeline.messages());
        println!("{}", CHAT_HELP);

        let mut events = BroadcastStream::new(timeline.subscribe());
        let renderer = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => console::render_event(&event),
                    Err(BroadcastStreamRecvError::Lagged(n)) => {
                        warn!("Renderer skipped {} events", n);
                    }
                }
            }
        });

        let exit = loop {
            let Some(line) = self.input.prompt("").await else {
                break ChatExit::Quit;
            };
            let (command, arg) = split_command(&line);

            match command {
                "/back" => break ChatExit::Back,
                "/quit" => break ChatExit::Quit,
                "/older" => match timeline.load_older_page(self.config.timeline.page_size).await {
                    LoadOutcome::Loaded(_) | LoadOutcome::Failed => {}
                    LoadOutcome::AlreadyLoading => println!("Already loading older messages"),
                    LoadOutcome::Exhausted => println!("No older messages"),
                },
                "/copy" => {
                    let found = arg
                        .parse::<MessageId>()
                        .ok()
                        .and_then(|id| timeline.messages().into_iter().find(|m| m.id == id));
                    match found {
                        Some(message) => {
                            println!("{}", message.text);
                            self.notifier.notify_success("Copied to clipboard!");
                        }
                        None => println!("No message #{}", arg),
                    }
                }
                "/image" => {
                    let (uri, caption) = split_command(arg);
                    if uri.is_empty() {
                        println!("Usage: /image <data-uri> [caption]");
                    } else {
                        timeline
                            .append(MessageDraft::text(caption).with_image(uri))
                            .await;
                    }
                }
                cmd if cmd.starts_with('/') => println!("{}", CHAT_HELP),
                _ => {
                    timeline.append(MessageDraft::text(line.as_str())).await;
                }
            }
        };

        timeline.close();
        renderer.abort();
        Ok(exit)
    }
}

/// Split `"/cmd rest of line"` into `("/cmd", "rest of line")`
fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

/// Search results paired with their 1-based number in the full list
fn numbered_matches<'a>(rooms: &'a RoomRegistry, term: &str) -> Vec<(usize, &'a ChatRoom)> {
    rooms
        .search(term)
        .into_iter()
        .filter_map(|room| {
            let n = rooms.rooms().iter().position(|r| r.id == room.id)?;
            Some((n + 1, room))
        })
        .collect()
}

/// Resolve a 1-based room number
fn pick_room(rooms: &RoomRegistry, arg: &str) -> Option<ChatRoom> {
    let n: usize = arg.parse().ok()?;
    rooms.rooms().get(n.checked_sub(1)?).cloned()
}
