use parley_types::{RoomId, UserId};

/// Key holding the list of registered users
pub const USERS_KEY: &str = "users";

/// Key holding one room's message log
pub fn messages_key(user_id: &UserId, room_id: &RoomId) -> String {
    format!("messages_{}_{}", user_id, room_id)
}

/// Key holding one user's room list
pub fn chatrooms_key(user_id: &UserId) -> String {
    format!("chatrooms_{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::User;

    #[test]
    fn test_key_names() {
        let user_id = User::new("+44", "7700900123").id();
        let room_id = RoomId::new("room-1");
        assert_eq!(messages_key(&user_id, &room_id), "messages_+44_7700900123_room-1");
        assert_eq!(chatrooms_key(&user_id), "chatrooms_+44_7700900123");
    }
}
