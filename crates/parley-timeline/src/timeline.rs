use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::history::{HistorySource, SyntheticHistory};
use crate::reply::{CannedReplies, ReplyGenerator};
use crate::scheduler::{DelayedTask, ReplyScheduler};
use chrono::Utc;
use parking_lot::Mutex;
use parley_persistence::{get_json, messages_key, set_json, KeyValueStore};
use parley_session::{Notifier, SessionContext};
use parley_types::{Message, MessageDraft, MessageId, RoomId, TimelineEvent, UserId};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Messages prepended by one backfill call
#[derive(Debug, Clone, PartialEq)]
pub struct OlderPage {
    /// Lowest id first
    pub added: Vec<Message>,
    pub has_more: bool,
}

/// Result of [`Timeline::load_older_page`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(OlderPage),
    /// Another fetch is outstanding; this call did nothing
    AlreadyLoading,
    /// History is exhausted; this call did nothing
    Exhausted,
    /// The history source failed; state is unchanged and the user was notified
    Failed,
}

#[derive(Debug, Default)]
struct TimelineState {
    /// Ascending by id
    messages: Vec<Message>,
    has_more: bool,
    loading_older: bool,
    reply: ReplyScheduler,
}

impl TimelineState {
    fn max_id(&self) -> MessageId {
        self.messages.iter().map(|m| m.id).max().unwrap_or(0)
    }

    fn cursor(&self) -> Option<MessageId> {
        self.messages.first().map(|m| m.id)
    }
}

struct Inner {
    user_id: UserId,
    room_id: RoomId,
    key: String,
    config: TimelineConfig,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    history: Arc<dyn HistorySource>,
    replies: Arc<dyn ReplyGenerator>,
    state: Mutex<TimelineState>,
    /// Held from a mutation through its store write, so writes land in order
    write_lock: tokio::sync::Mutex<()>,
    /// Reply delay or cooldown timer, whichever is running
    timer: Mutex<Option<DelayedTask>>,
    events: broadcast::Sender<TimelineEvent>,
}

/// Builder for [`Timeline`]
pub struct TimelineBuilder {
    ctx: SessionContext,
    room_id: RoomId,
    config: TimelineConfig,
    history: Arc<dyn HistorySource>,
    replies: Arc<dyn ReplyGenerator>,
}

impl TimelineBuilder {
    pub fn with_config(mut self, config: TimelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_history(mut self, history: Arc<dyn HistorySource>) -> Self {
        self.history = history;
        self
    }

    pub fn with_replies(mut self, replies: Arc<dyn ReplyGenerator>) -> Self {
        self.replies = replies;
        self
    }

    /// Create the timeline and hydrate it from storage
    pub async fn open(self) -> Result<Timeline> {
        if self.room_id.is_blank() {
            return Err(TimelineError::InvalidRoom);
        }

        let user_id = self.ctx.user_id();
        let key = messages_key(&user_id, &self.room_id);
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));

        let timeline = Timeline {
            inner: Arc::new(Inner {
                user_id,
                room_id: self.room_id,
                key,
                config: self.config,
                store: self.ctx.store().clone(),
                notifier: self.ctx.notifier().clone(),
                history: self.history,
                replies: self.replies,
                state: Mutex::new(TimelineState::default()),
                write_lock: tokio::sync::Mutex::new(()),
                timer: Mutex::new(None),
                events,
            }),
        };

        timeline.hydrate().await;
        info!(
            user_id = %timeline.inner.user_id,
            room_id = %timeline.inner.room_id,
            "Timeline opened"
        );
        Ok(timeline)
    }
}

/// Ordered, paginated message log for one (user, room) pair
///
/// Cheap to clone; clones share state. Timers hold only a weak handle, so once
/// every clone is dropped any pending reply or cooldown becomes a no-op.
#[derive(Clone)]
pub struct Timeline {
    inner: Arc<Inner>,
}

impl Timeline {
    pub fn builder(ctx: SessionContext, room_id: RoomId) -> TimelineBuilder {
        TimelineBuilder {
            ctx,
            room_id,
            config: TimelineConfig::default(),
            history: Arc::new(SyntheticHistory),
            replies: Arc::new(CannedReplies::default()),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.inner.user_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.inner.room_id
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.inner.config
    }

    /// Snapshot of the log, ascending by id
    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().messages.is_empty()
    }

    /// Lowest loaded id: the exclusive upper bound of the next older page
    pub fn cursor(&self) -> Option<MessageId> {
        self.inner.state.lock().cursor()
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.lock().has_more
    }

    pub fn is_loading_older(&self) -> bool {
        self.inner.state.lock().loading_older
    }

    /// Whether the peer is "typing" a reply
    pub fn is_typing(&self) -> bool {
        self.inner.state.lock().reply.is_pending()
    }

    /// Whether the reply cooldown is active
    pub fn is_throttled(&self) -> bool {
        self.inner.state.lock().reply.is_throttled()
    }

    /// Receive an event after every state change
    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.inner.events.subscribe()
    }

    /// (Re)load the log from storage, seeding the demo page if nothing is
    /// stored. Also clears an exhausted backfill.
    ///
    /// A backfill already in flight keeps its single-flight claim and still
    /// prepends only ids below the reloaded cursor.
    pub async fn hydrate(&self) {
        let write = self.inner.write_lock.lock().await;

        let (stored, readable) =
            match get_json::<Vec<Message>>(self.inner.store.as_ref(), &self.inner.key).await {
                Ok(stored) => (stored.unwrap_or_default(), true),
                Err(e) => {
                    warn!(key = %self.inner.key, "Failed to read saved messages: {}", e);
                    self.inner.notifier.notify_error("Failed to load saved messages");
                    (Vec::new(), false)
                }
            };

        let (messages, seeded) = if stored.is_empty() {
            (self.seed_page().await, true)
        } else {
            let mut stored = stored;
            stored.sort_by_key(|m| m.id);
            stored.dedup_by_key(|m| m.id);
            (stored, false)
        };

        let count = messages.len();
        let snapshot = {
            let mut state = self.inner.state.lock();
            state.messages = messages;
            state.has_more = true;
            // An unreadable log may still hold history; never overwrite it with the seed
            (seeded && readable && count > 0).then(|| state.messages.clone())
        };

        if let Some(snapshot) = snapshot {
            self.persist(&snapshot).await;
        }
        drop(write);

        debug!(room_id = %self.inner.room_id, count, seeded, "Timeline hydrated");
        self.emit(TimelineEvent::Hydrated { count });
    }

    /// Append a user message.
    ///
    /// Blank drafts (whitespace-only text, no image) are ignored and return
    /// `None`. An accepted message schedules a peer reply unless one is
    /// already pending or the cooldown is running.
    pub async fn append(&self, draft: MessageDraft) -> Option<Message> {
        let draft = draft.normalized();
        if draft.is_blank() {
            debug!(room_id = %self.inner.room_id, "Ignoring blank draft");
            return None;
        }

        let write = self.inner.write_lock.lock().await;
        let (message, snapshot, reply_accepted) = {
            let mut state = self.inner.state.lock();
            let id = state.max_id() + 1;
            let message = Message::from_draft(id, draft, Utc::now());
            state.messages.push(message.clone());
            let reply_accepted = state.reply.try_begin(id + 1);
            (message, state.messages.clone(), reply_accepted)
        };
        self.persist(&snapshot).await;
        drop(write);

        debug!(message_id = message.id, room_id = %self.inner.room_id, "Message appended");
        self.emit(TimelineEvent::Appended(message.clone()));

        if reply_accepted {
            self.emit(TimelineEvent::Typing(true));
            self.schedule_reply(message.id + 1, message.clone());
        } else {
            debug!(message_id = message.id, "Reply dropped: scheduler busy");
        }

        Some(message)
    }

    /// Append a peer message at the tail.
    ///
    /// `id` is the id reserved when the reply was scheduled; if a user
    /// message has since taken it, the next free id is used so the log stays
    /// unique and ascending.
    pub async fn append_reply(&self, id: MessageId, text: impl Into<String>) -> Message {
        let text = text.into();

        let write = self.inner.write_lock.lock().await;
        let (message, snapshot) = {
            let mut state = self.inner.state.lock();
            let id = id.max(state.max_id() + 1);
            let message = Message::peer(id, text, Utc::now());
            state.messages.push(message.clone());
            (message, state.messages.clone())
        };
        self.persist(&snapshot).await;
        drop(write);

        self.emit(TimelineEvent::Appended(message.clone()));
        message
    }

    /// Fetch and prepend up to `page_size` messages older than the cursor.
    ///
    /// Single-flight: a call made while another is outstanding returns
    /// [`LoadOutcome::AlreadyLoading`]. A page shorter than `page_size` ends
    /// the history; later calls return [`LoadOutcome::Exhausted`] until the
    /// timeline is re-hydrated.
    pub async fn load_older_page(&self, page_size: usize) -> LoadOutcome {
        let page_size = page_size.max(1);

        let cursor = {
            let mut state = self.inner.state.lock();
            if !state.has_more {
                return LoadOutcome::Exhausted;
            }
            if state.loading_older {
                return LoadOutcome::AlreadyLoading;
            }
            state.loading_older = true;
            state
                .cursor()
                .unwrap_or(self.inner.config.seed_newest_id + 1)
        };
        let mut loading = LoadingFlag::armed(&self.inner.state);
        self.emit(TimelineEvent::LoadingOlder(true));

        let latency = self.inner.config.load_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let fetched = match self.inner.history.older_than(cursor, page_size).await {
            Ok(fetched) => fetched,
            Err(e) => {
                drop(loading);
                error!(room_id = %self.inner.room_id, cursor, "Failed to load older messages: {}", e);
                self.inner.notifier.notify_error("Failed to load older messages");
                self.emit(TimelineEvent::LoadingOlder(false));
                return LoadOutcome::Failed;
            }
        };
        let has_more = fetched.len() >= page_size;

        let write = self.inner.write_lock.lock().await;
        let (page, snapshot) = {
            let mut state = self.inner.state.lock();
            let floor = state.cursor().unwrap_or(MessageId::MAX);
            let mut added: Vec<Message> = fetched.into_iter().filter(|m| m.id < floor).collect();
            added.sort_by_key(|m| m.id);
            added.dedup_by_key(|m| m.id);

            state.messages.splice(0..0, added.iter().cloned());
            state.has_more = has_more;
            state.loading_older = false;
            loading.disarm();

            (OlderPage { added, has_more }, state.messages.clone())
        };
        self.persist(&snapshot).await;
        drop(write);

        info!(
            room_id = %self.inner.room_id,
            added = page.added.len(),
            cursor = ?self.cursor(),
            has_more,
            "Older messages loaded"
        );
        self.emit(TimelineEvent::Prepended {
            added: page.added.clone(),
            has_more,
        });
        self.emit(TimelineEvent::LoadingOlder(false));
        LoadOutcome::Loaded(page)
    }

    /// Tear down: cancel any pending reply or cooldown timer
    pub fn close(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.cancel();
        }
        self.inner.state.lock().reply.reset();
        info!(room_id = %self.inner.room_id, "Timeline closed");
    }

    fn schedule_reply(&self, reserved: MessageId, prompt: Message) {
        let weak = Arc::downgrade(&self.inner);
        let task = DelayedTask::spawn(self.inner.config.reply_delay(), async move {
            if let Some(timeline) = Timeline::upgrade(&weak) {
                timeline.complete_reply(reserved, prompt).await;
            }
        });
        *self.inner.timer.lock() = Some(task);
    }

    async fn complete_reply(&self, reserved: MessageId, prompt: Message) {
        let text = self.inner.replies.generate(&prompt);
        let reply = self.append_reply(reserved, text).await;

        self.inner.state.lock().reply.complete();
        debug!(message_id = reply.id, room_id = %self.inner.room_id, "Reply delivered");
        self.emit(TimelineEvent::Typing(false));
        self.emit(TimelineEvent::Throttled(true));

        let weak = Arc::downgrade(&self.inner);
        let task = DelayedTask::spawn(self.inner.config.reply_cooldown(), async move {
            if let Some(timeline) = Timeline::upgrade(&weak) {
                timeline.end_cooldown();
            }
        });
        *self.inner.timer.lock() = Some(task);
    }

    fn end_cooldown(&self) {
        self.inner.state.lock().reply.release();
        self.emit(TimelineEvent::Throttled(false));
    }

    async fn seed_page(&self) -> Vec<Message> {
        let newest = self.inner.config.seed_newest_id;
        if newest == 0 {
            return Vec::new();
        }

        match self
            .inner
            .history
            .older_than(newest + 1, self.inner.config.page_size)
            .await
        {
            Ok(mut page) => {
                page.sort_by_key(|m| m.id);
                page.dedup_by_key(|m| m.id);
                page
            }
            Err(e) => {
                warn!(room_id = %self.inner.room_id, "Failed to build seed page: {}", e);
                Vec::new()
            }
        }
    }

    /// Best-effort write of the full log; failures never roll back memory
    async fn persist(&self, snapshot: &[Message]) {
        if let Err(e) = set_json(self.inner.store.as_ref(), &self.inner.key, snapshot).await {
            error!(key = %self.inner.key, "Failed to persist messages: {}", e);
            self.inner.notifier.notify_error("Failed to save messages");
        }
    }

    fn emit(&self, event: TimelineEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("user_id", &self.inner.user_id)
            .field("room_id", &self.inner.room_id)
            .finish_non_exhaustive()
    }
}

/// Clears `loading_older` if a backfill is abandoned mid-flight
struct LoadingFlag<'a> {
    state: &'a Mutex<TimelineState>,
    armed: bool,
}

impl<'a> LoadingFlag<'a> {
    fn armed(state: &'a Mutex<TimelineState>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().loading_older = false;
        }
    }
}
