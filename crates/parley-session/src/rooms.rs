use crate::context::SessionContext;
use crate::error::{Result, SessionError};
use parley_persistence::{chatrooms_key, get_json, set_json, StorageError};
use parley_types::{ChatRoom, RoomId};
use tracing::{info, warn};
use uuid::Uuid;

/// A user's room list, mirrored to the store on every change
pub struct RoomRegistry {
    ctx: SessionContext,
    key: String,
    rooms: Vec<ChatRoom>,
}

impl RoomRegistry {
    /// Load the room list for the context's user
    ///
    /// A missing or unreadable list loads as empty.
    pub async fn load(ctx: SessionContext) -> Result<Self> {
        let key = chatrooms_key(&ctx.user_id());
        let rooms = match get_json::<Vec<ChatRoom>>(ctx.store().as_ref(), &key).await {
            Ok(rooms) => rooms.unwrap_or_default(),
            Err(StorageError::Json(e)) => {
                warn!(key = %key, "Failed to load chatrooms: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %ctx.user_id(), count = rooms.len(), "Chatrooms loaded");
        Ok(Self { ctx, key, rooms })
    }

    pub fn rooms(&self) -> &[ChatRoom] {
        &self.rooms
    }

    pub fn get(&self, id: &RoomId) -> Option<&ChatRoom> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub async fn create(&mut self, title: &str) -> Result<ChatRoom> {
        let title = title.trim();
        if title.is_empty() {
            self.ctx
                .notifier()
                .notify_error("Chatroom name can't be empty");
            return Err(SessionError::EmptyRoomTitle);
        }

        let room = ChatRoom::new(RoomId::new(Uuid::new_v4().to_string()), title);
        self.rooms.push(room.clone());
        if let Err(e) = self.save().await {
            self.rooms.pop();
            return Err(e);
        }

        self.ctx
            .notifier()
            .notify_success(&format!("Chatroom \"{}\" created", room.title));
        Ok(room)
    }

    /// Remove a room from the list; its stored messages are left untouched.
    ///
    /// Like [`create`](Self::create), a failed write leaves the list as it was.
    pub async fn delete(&mut self, id: &RoomId) -> Result<ChatRoom> {
        let idx = self
            .rooms
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| SessionError::RoomNotFound(id.to_string()))?;

        let room = self.rooms.remove(idx);
        if let Err(e) = self.save().await {
            self.rooms.insert(idx, room);
            return Err(e);
        }

        self.ctx
            .notifier()
            .notify_success(&format!("Chatroom \"{}\" deleted", room.title));
        Ok(room)
    }

    /// Rooms whose title contains `term`, ignoring case; a blank term matches all
    pub fn search(&self, term: &str) -> Vec<&ChatRoom> {
        let term = term.trim();
        if term.is_empty() {
            return self.rooms.iter().collect();
        }
        self.rooms.iter().filter(|r| r.title_matches(term)).collect()
    }

    async fn save(&self) -> Result<()> {
        set_json(self.ctx.store().as_ref(), &self.key, &self.rooms).await?;
        Ok(())
    }
}
