use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Who is logged in, plus the transient flags presentation code reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<Profile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// The part of a session that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Profile>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl Session {
    /// Project onto the persisted fields
    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            token: self.token.clone(),
            user: self.user.clone(),
            is_authenticated: self.is_authenticated,
        }
    }

    /// Rebuild a session from a stored record. Anything short of a complete
    /// sign-in (token, profile and the authenticated flag) restores as empty.
    pub fn hydrate(record: PersistedSession) -> Self {
        match (record.token, record.user) {
            (Some(token), Some(user)) if record.is_authenticated && !token.is_empty() => Self {
                token: Some(token),
                user: Some(user),
                is_authenticated: true,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    pub fn begin_attempt(&mut self) {
        self.is_loading = true;
        self.last_error = None;
    }

    /// A token was issued but the profile is not known yet
    pub fn hold_token(&mut self, token: String) {
        self.token = Some(token);
        self.user = None;
        self.is_authenticated = false;
    }

    pub fn commit(&mut self, token: String, user: Profile) {
        self.token = Some(token);
        self.user = Some(user);
        self.is_authenticated = true;
        self.is_loading = false;
        self.last_error = None;
    }

    /// Sign-in failed at either step
    pub fn fail(&mut self, message: String) {
        self.token = None;
        self.user = None;
        self.is_authenticated = false;
        self.is_loading = false;
        self.last_error = Some(message);
    }

    /// Account creation failed; nothing was signed in
    pub fn fail_registration(&mut self, message: String) {
        self.is_loading = false;
        self.last_error = Some(message);
    }

    pub fn sign_out(&mut self) {
        self.token = None;
        self.user = None;
        self.is_authenticated = false;
        self.is_loading = false;
        self.last_error = None;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
