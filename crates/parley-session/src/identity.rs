//! Phone number + one-time-code login
//!
//! There is no real verification service: the code is generated locally and
//! announced through the [`Notifier`] so the user can type it back in.

use crate::context::SessionContext;
use crate::error::{Result, SessionError};
use crate::notifier::Notifier;
use parley_persistence::{chatrooms_key, get_json, set_json, KeyValueStore, StorageError, USERS_KEY};
use parley_types::{ChatRoom, User};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shortest accepted phone number
const MIN_PHONE_LEN: usize = 7;

/// Outcome of submitting country code and phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    /// Known user, no code needed
    LoggedIn(User),
    /// A code was sent; call [`AuthService::verify_otp`]
    OtpSent,
}

#[derive(Debug, Clone)]
struct PendingOtp {
    user: User,
    code: String,
}

/// Login flow over the shared store
pub struct AuthService {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    pending: Option<PendingOtp>,
}

impl AuthService {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            pending: None,
        }
    }

    /// First step: validate input, then either log a known user straight in
    /// or send a demo code.
    pub async fn request_otp(&mut self, country_code: &str, phone: &str) -> Result<AuthStep> {
        let country_code = country_code.trim();
        let phone = phone.trim();

        if country_code.is_empty() {
            return Err(SessionError::Validation("Select country".to_string()));
        }
        if phone.chars().count() < MIN_PHONE_LEN {
            return Err(SessionError::Validation(
                "Phone number is too short".to_string(),
            ));
        }

        let users = self.registered_users().await?;
        if let Some(existing) = users.into_iter().find(|u| u.matches(country_code, phone)) {
            info!(user_id = %existing.id(), "Returning user logged in");
            self.pending = None;
            self.notifier.notify_success("Welcome back!");
            return Ok(AuthStep::LoggedIn(existing));
        }

        let code = rand::thread_rng().gen_range(1000..10000).to_string();
        self.notifier
            .notify_success(&format!("OTP sent: {} (for demo)", code));
        debug!(country_code, "OTP issued");

        self.pending = Some(PendingOtp {
            user: User::new(country_code, phone),
            code,
        });
        Ok(AuthStep::OtpSent)
    }

    /// Code issued by the last [`request_otp`](Self::request_otp), if still pending
    pub fn pending_code(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.code.as_str())
    }

    /// Second step: check the code and register the new user.
    ///
    /// A wrong code leaves the pending code in place so the user can retry.
    pub async fn verify_otp(&mut self, code: &str) -> Result<User> {
        let pending = self.pending.as_ref().ok_or(SessionError::NoPendingOtp)?;

        if pending.code != code.trim() {
            self.notifier.notify_error("Invalid OTP");
            return Err(SessionError::InvalidOtp);
        }

        let user = pending.user.clone();

        let mut users = self.registered_users().await?;
        users.push(user.clone());
        set_json(self.store.as_ref(), USERS_KEY, &users).await?;

        let rooms_key = chatrooms_key(&user.id());
        if self.store.get(&rooms_key).await?.is_none() {
            set_json(self.store.as_ref(), &rooms_key, &Vec::<ChatRoom>::new()).await?;
        }

        self.pending = None;
        info!(user_id = %user.id(), "New user registered");
        self.notifier.notify_success("Login successful!");
        Ok(user)
    }

    /// Build the context a logged-in user's timelines are opened with
    pub fn context(&self, user: &User) -> SessionContext {
        SessionContext::new(user.clone(), self.store.clone(), self.notifier.clone())
    }

    async fn registered_users(&self) -> Result<Vec<User>> {
        match get_json::<Vec<User>>(self.store.as_ref(), USERS_KEY).await {
            Ok(users) => Ok(users.unwrap_or_default()),
            Err(StorageError::Json(e)) => {
                warn!("Ignoring unreadable user list: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::RecordingNotifier;
    use parley_persistence::MemoryStore;
    use serde_json::json;

    fn service() -> (AuthService, Arc<MemoryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        (
            AuthService::new(store.clone(), notifier.clone()),
            store,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_rejects_missing_country() {
        let (mut auth, _, _) = service();
        let err = auth.request_otp(" ", "5551234567").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(msg) if msg == "Select country"));
    }

    #[tokio::test]
    async fn test_rejects_short_phone() {
        let (mut auth, _, _) = service();
        let err = auth.request_otp("+1", "12345").await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(msg) if msg == "Phone number is too short"));
        assert!(auth.pending_code().is_none());
    }

    #[tokio::test]
    async fn test_new_user_gets_four_digit_code() {
        let (mut auth, _, notifier) = service();
        let step = auth.request_otp("+1", "5551234567").await.unwrap();
        assert_eq!(step, AuthStep::OtpSent);

        let code = auth.pending_code().unwrap().to_string();
        assert_eq!(code.len(), 4);
        let value: u32 = code.parse().unwrap();
        assert!((1000..10000).contains(&value));
        assert_eq!(
            notifier.successes(),
            vec![format!("OTP sent: {} (for demo)", code)]
        );
    }

    #[tokio::test]
    async fn test_verify_registers_user_and_room_list() {
        let (mut auth, store, notifier) = service();
        auth.request_otp("+1", "5551234567").await.unwrap();
        let code = auth.pending_code().unwrap().to_string();

        let user = auth.verify_otp(&code).await.unwrap();
        assert_eq!(user.id().as_str(), "+1_5551234567");
        assert!(auth.pending_code().is_none());

        let users = store.get(USERS_KEY).await.unwrap().unwrap();
        assert_eq!(users, json!([{"countryCode": "+1", "phone": "5551234567"}]));
        let rooms = store.get("chatrooms_+1_5551234567").await.unwrap();
        assert_eq!(rooms, Some(json!([])));
        assert!(notifier
            .successes()
            .contains(&"Login successful!".to_string()));
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_pending_code() {
        let (mut auth, _, notifier) = service();
        auth.request_otp("+1", "5551234567").await.unwrap();
        let code = auth.pending_code().unwrap().to_string();
        let wrong = if code == "1000" { "1001" } else { "1000" };

        let err = auth.verify_otp(wrong).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidOtp));
        assert_eq!(notifier.errors(), vec!["Invalid OTP".to_string()]);

        assert!(auth.verify_otp(&code).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_without_request() {
        let (mut auth, _, _) = service();
        let err = auth.verify_otp("1234").await.unwrap_err();
        assert!(matches!(err, SessionError::NoPendingOtp));
    }

    #[tokio::test]
    async fn test_returning_user_skips_code() {
        let (mut auth, store, notifier) = service();
        store
            .set(USERS_KEY, json!([{"countryCode": "+44", "phone": "7700900123"}]))
            .await
            .unwrap();

        let step = auth.request_otp("+44", "7700900123").await.unwrap();
        assert_eq!(step, AuthStep::LoggedIn(User::new("+44", "7700900123")));
        assert!(auth.pending_code().is_none());
        assert_eq!(notifier.successes(), vec!["Welcome back!".to_string()]);
    }

    #[tokio::test]
    async fn test_existing_room_list_is_not_reset() {
        let (mut auth, store, _) = service();
        store
            .set(
                "chatrooms_+1_5551234567",
                json!([{"id": "r1", "title": "Kept"}]),
            )
            .await
            .unwrap();

        auth.request_otp("+1", "5551234567").await.unwrap();
        let code = auth.pending_code().unwrap().to_string();
        auth.verify_otp(&code).await.unwrap();

        let rooms = store.get("chatrooms_+1_5551234567").await.unwrap().unwrap();
        assert_eq!(rooms[0]["title"], "Kept");
    }
}
