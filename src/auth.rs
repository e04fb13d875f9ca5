//! Accounts and the current session
//!
//! Credentials are compared as plain text. There are two kinds of account:
//! the built-in administrator whose login and password come from
//! `Settings`, and registered users stored in the `users` blob as
//! `{ email: { password, role } }`. The logged-in user is remembered under
//! `currentUser`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::persistence::{BlobStore, keys, load_json, save_json};
use crate::settings::Settings;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        }
    }
}

/// Who is logged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Account listing entry for the admin panel (no password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub role: Role,
}

/// Registered users and the current session
#[derive(Debug, Clone, Default)]
pub struct Auth {
    users: BTreeMap<String, UserRecord>,
    session: Option<SessionUser>,
}

impl Auth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load users and restore the remembered session.
    ///
    /// A remembered registered user whose record is gone is logged out, and
    /// the role is refreshed from the record in case an admin changed it.
    pub fn load(store: &dyn BlobStore, settings: &Settings) -> Result<Self> {
        let users: BTreeMap<String, UserRecord> =
            load_json(store, keys::USERS)?.unwrap_or_default();
        let remembered: Option<SessionUser> = load_json(store, keys::CURRENT_USER)?;

        let session = remembered.and_then(|s| {
            if settings.is_builtin_admin(&s.email) {
                return Some(SessionUser {
                    email: s.email,
                    role: Role::Admin,
                });
            }
            match users.get(&s.email) {
                Some(record) => Some(SessionUser {
                    email: s.email,
                    role: record.role,
                }),
                None => {
                    log::warn!("Dropping session for unknown user {}", s.email);
                    None
                }
            }
        });

        if let Some(s) = &session {
            log::info!("Restored session for {} ({})", s.email, s.role.as_str());
        }
        log::info!("Loaded {} registered users", users.len());

        Ok(Self { users, session })
    }

    pub fn save_users(&self, store: &mut dyn BlobStore) -> Result<()> {
        save_json(store, keys::USERS, &self.users)
    }

    pub fn save_session(&self, store: &mut dyn BlobStore) -> Result<()> {
        match &self.session {
            Some(user) => save_json(store, keys::CURRENT_USER, user),
            None => store.remove(keys::CURRENT_USER),
        }
    }

    /// Reload users and the remembered session, e.g. after another tab or
    /// process logged in
    pub fn restore(&mut self, store: &dyn BlobStore, settings: &Settings) -> Result<()> {
        *self = Self::load(store, settings)?;
        Ok(())
    }

    pub fn current(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(SessionUser::is_admin)
    }

    /// The session, if it belongs to an administrator
    pub fn require_admin(&self) -> Result<&SessionUser> {
        match &self.session {
            None => Err(Error::Unauthorized),
            Some(user) if user.is_admin() => Ok(user),
            Some(_) => Err(Error::Forbidden),
        }
    }

    /// Create a regular account and log it in
    pub fn register(
        &mut self,
        settings: &Settings,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<&SessionUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation("email and password are required".to_string()));
        }
        if password != confirm {
            return Err(AuthError::PasswordMismatch.into());
        }
        if password.chars().count() < settings.min_password_length {
            return Err(AuthError::WeakPassword {
                min: settings.min_password_length,
            }
            .into());
        }
        if settings.is_builtin_admin(email) || self.users.contains_key(email) {
            return Err(AuthError::UserExists(email.to_string()).into());
        }

        self.users.insert(
            email.to_string(),
            UserRecord {
                password: password.to_string(),
                role: Role::User,
            },
        );
        log::info!("Registered user {}", email);

        Ok(&*self.session.insert(SessionUser {
            email: email.to_string(),
            role: Role::User,
        }))
    }

    /// Check credentials and start a session
    pub fn login(&mut self, settings: &Settings, email: &str, password: &str) -> Result<&SessionUser> {
        let email = email.trim();

        let role = if email == settings.admin_login && password == settings.admin_password {
            Role::Admin
        } else {
            match self.users.get(email) {
                Some(record) if record.password == password => record.role,
                _ => {
                    log::warn!("Failed login for {}", email);
                    return Err(AuthError::InvalidCredentials.into());
                }
            }
        };

        log::info!("{} logged in as {}", email, role.as_str());
        Ok(&*self.session.insert(SessionUser {
            email: email.to_string(),
            role,
        }))
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.session.take() {
            log::info!("{} logged out", user.email);
        }
    }

    /// Change the logged-in user's own password
    pub fn change_password(
        &mut self,
        settings: &Settings,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<()> {
        let email = self.session.as_ref().ok_or(Error::Unauthorized)?.email.clone();

        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(Error::Validation("all password fields are required".to_string()));
        }
        if new.chars().count() < settings.min_password_length {
            return Err(AuthError::WeakPassword {
                min: settings.min_password_length,
            }
            .into());
        }
        if new != confirm {
            return Err(AuthError::PasswordMismatch.into());
        }
        if settings.is_builtin_admin(&email) {
            return Err(AuthError::ProtectedAccount.into());
        }

        match self.users.get_mut(&email) {
            Some(record) if record.password == current => {
                record.password = new.to_string();
                log::info!("Password changed for {}", email);
                Ok(())
            }
            _ => Err(AuthError::InvalidCredentials.into()),
        }
    }

    /// All registered accounts, sorted by email (admin only)
    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.require_admin()?;
        Ok(self
            .users
            .iter()
            .map(|(email, record)| UserSummary {
                email: email.clone(),
                role: record.role,
            })
            .collect())
    }

    /// Promote a user to admin or demote back (admin only); returns the new role
    pub fn toggle_role(&mut self, email: &str) -> Result<Role> {
        self.require_admin()?;
        let record = self
            .users
            .get_mut(email)
            .ok_or_else(|| AuthError::UnknownUser(email.to_string()))?;
        record.role = record.role.toggled();
        let role = record.role;

        if let Some(session) = self.session.as_mut().filter(|s| s.email == email) {
            session.role = role;
        }
        log::info!("Role of {} is now {}", email, role.as_str());
        Ok(role)
    }

    /// Remove an account (admin only); removing yourself also logs you out
    pub fn delete_user(&mut self, email: &str) -> Result<()> {
        self.require_admin()?;
        if self.users.remove(email).is_none() {
            return Err(AuthError::UnknownUser(email.to_string()).into());
        }
        if self.session.as_ref().is_some_and(|s| s.email == email) {
            self.session = None;
        }
        log::info!("Deleted user {}", email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn settings() -> Settings {
        Settings::default()
    }

    fn with_user(email: &str, password: &str) -> Auth {
        let mut auth = Auth::new();
        auth.register(&settings(), email, password, password).unwrap();
        auth.logout();
        auth
    }

    fn admin_login(auth: &mut Auth) {
        let s = settings();
        auth.login(&s, &s.admin_login, &s.admin_password).unwrap();
    }

    #[test]
    fn test_register_logs_in_as_user() {
        let mut auth = Auth::new();
        let user = auth
            .register(&settings(), "ann@example.com", "secret1", "secret1")
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert!(auth.is_authenticated());
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_register_validation() {
        let mut auth = Auth::new();
        let s = settings();
        assert!(matches!(
            auth.register(&s, "", "secret1", "secret1"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            auth.register(&s, "a@b.c", "12345", "12345"),
            Err(Error::Auth(AuthError::WeakPassword { min: 6 }))
        ));
        assert!(matches!(
            auth.register(&s, "a@b.c", "secret1", "secret2"),
            Err(Error::Auth(AuthError::PasswordMismatch))
        ));
        assert!(matches!(
            auth.register(&s, "admin", "secret1", "secret1"),
            Err(Error::Auth(AuthError::UserExists(_)))
        ));
        auth.register(&s, "a@b.c", "secret1", "secret1").unwrap();
        assert!(matches!(
            auth.register(&s, "a@b.c", "other12", "other12"),
            Err(Error::Auth(AuthError::UserExists(_)))
        ));
    }

    #[test]
    fn test_login_builtin_admin() {
        let mut auth = Auth::new();
        admin_login(&mut auth);
        assert!(auth.is_admin());
        assert_eq!(auth.require_admin().unwrap().email, "admin");
    }

    #[test]
    fn test_login_registered_user() {
        let mut auth = with_user("bob@example.com", "hunter22");
        let s = settings();
        assert!(matches!(
            auth.login(&s, "bob@example.com", "wrong"),
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
        assert!(matches!(
            auth.login(&s, "nobody@example.com", "hunter22"),
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
        auth.login(&s, " bob@example.com ", "hunter22").unwrap();
        assert_eq!(auth.current().unwrap().email, "bob@example.com");
    }

    #[test]
    fn test_require_admin() {
        let mut auth = with_user("bob@example.com", "hunter22");
        assert!(matches!(auth.require_admin(), Err(Error::Unauthorized)));
        auth.login(&settings(), "bob@example.com", "hunter22").unwrap();
        assert!(matches!(auth.require_admin(), Err(Error::Forbidden)));
    }

    #[test]
    fn test_toggle_role_promotes_and_updates_session() {
        let mut auth = with_user("bob@example.com", "hunter22");
        admin_login(&mut auth);
        assert_eq!(auth.toggle_role("bob@example.com").unwrap(), Role::Admin);

        auth.login(&settings(), "bob@example.com", "hunter22").unwrap();
        assert!(auth.is_admin());
        // demoting yourself takes effect immediately
        assert_eq!(auth.toggle_role("bob@example.com").unwrap(), Role::User);
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_delete_user() {
        let mut auth = with_user("bob@example.com", "hunter22");
        assert!(matches!(auth.delete_user("bob@example.com"), Err(Error::Unauthorized)));
        admin_login(&mut auth);
        auth.delete_user("bob@example.com").unwrap();
        assert!(auth.list_users().unwrap().is_empty());
        assert!(matches!(
            auth.delete_user("bob@example.com"),
            Err(Error::Auth(AuthError::UnknownUser(_)))
        ));
    }

    #[test]
    fn test_change_password() {
        let mut auth = with_user("bob@example.com", "hunter22");
        let s = settings();
        assert!(matches!(
            auth.change_password(&s, "hunter22", "newpass1", "newpass1"),
            Err(Error::Unauthorized)
        ));

        auth.login(&s, "bob@example.com", "hunter22").unwrap();
        assert!(matches!(
            auth.change_password(&s, "wrong", "newpass1", "newpass1"),
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
        assert!(matches!(
            auth.change_password(&s, "hunter22", "short", "short"),
            Err(Error::Auth(AuthError::WeakPassword { .. }))
        ));
        auth.change_password(&s, "hunter22", "newpass1", "newpass1").unwrap();

        auth.logout();
        assert!(auth.login(&s, "bob@example.com", "hunter22").is_err());
        auth.login(&s, "bob@example.com", "newpass1").unwrap();
    }

    #[test]
    fn test_builtin_admin_password_is_protected() {
        let mut auth = Auth::new();
        admin_login(&mut auth);
        let s = settings();
        assert!(matches!(
            auth.change_password(&s, "changeme", "newpass1", "newpass1"),
            Err(Error::Auth(AuthError::ProtectedAccount))
        ));
    }

    #[test]
    fn test_persist_and_restore_session() {
        let mut store = MemoryStore::new();
        let s = settings();
        let mut auth = Auth::new();
        auth.register(&s, "ann@example.com", "secret1", "secret1").unwrap();
        auth.save_users(&mut store).unwrap();
        auth.save_session(&mut store).unwrap();

        let raw = store.get(keys::USERS).unwrap().unwrap();
        assert_eq!(raw, r#"{"ann@example.com":{"password":"secret1","role":"user"}}"#);

        let restored = Auth::load(&store, &s).unwrap();
        assert_eq!(restored.current().unwrap().email, "ann@example.com");

        auth.logout();
        auth.save_session(&mut store).unwrap();
        assert!(store.get(keys::CURRENT_USER).unwrap().is_none());
    }

    #[test]
    fn test_restore_drops_unknown_user_and_refreshes_role() {
        let mut store = MemoryStore::new();
        let s = settings();
        store
            .set(keys::CURRENT_USER, r#"{"email":"ghost@example.com","role":"admin"}"#)
            .unwrap();
        assert!(Auth::load(&store, &s).unwrap().current().is_none());

        store
            .set(keys::USERS, r#"{"ann@example.com":{"password":"secret1","role":"user"}}"#)
            .unwrap();
        store
            .set(keys::CURRENT_USER, r#"{"email":"ann@example.com","role":"admin"}"#)
            .unwrap();
        let auth = Auth::load(&store, &s).unwrap();
        assert_eq!(auth.current().unwrap().role, Role::User);
    }

    #[test]
    fn test_restore_picks_up_external_logout() {
        let mut store = MemoryStore::new();
        let s = settings();
        let mut auth = Auth::new();
        auth.login(&s, "admin", "changeme").unwrap();
        auth.save_session(&mut store).unwrap();

        store.remove(keys::CURRENT_USER).unwrap();
        auth.restore(&store, &s).unwrap();
        assert!(auth.current().is_none());
    }
}
