use crate::quiz_engine::models::{QuizResult, UserProfile, UserRole};
use crate::quiz_engine::storage::{now_unix, KeyValueStore};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

fn profile_key(name: &str) -> String {
    format!("quiz_user_{name}")
}

/// Holds the logged-in identity and its quiz history, persisted through an
/// injected [`KeyValueStore`].
///
/// Profiles are keyed by name (`quiz_user_<name>`), serialized as one flat
/// JSON record per user. The quiz session talks to this store exactly once
/// per run, through [`append_result`](Self::append_result).
pub struct ProfileStore {
    store: Box<dyn KeyValueStore>,
    user: Option<UserProfile>,
    last_quiz_at: Option<u64>,
}

impl ProfileStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            user: None,
            last_quiz_at: None,
        }
    }

    /// Log in as `name`, loading the stored profile if one exists or
    /// creating (and persisting) a fresh one otherwise.
    ///
    /// A stored record that fails to parse is treated as absent; the broken
    /// payload is overwritten by the fresh profile on the next save.
    pub fn login(&mut self, name: &str, country: &str) {
        let loaded = self
            .store
            .get(&profile_key(name))
            .and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    log::warn!("discarding unreadable profile for {name}: {e}");
                    None
                }
            });

        match loaded {
            Some(profile) => {
                log::debug!("loaded profile {name} ({} past results)", profile.history.len());
                self.user = Some(profile);
            }
            None => {
                self.user = Some(UserProfile::new(name, country));
                self.save();
            }
        }
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.last_quiz_at = None;
    }

    /// Append a finished quiz result to the active profile's history.
    /// Silent no-op when nobody is logged in; the result is discarded.
    pub fn append_result(&mut self, result: QuizResult) {
        let Some(user) = self.user.as_mut() else {
            log::debug!("no active profile, quiz result discarded");
            return;
        };
        user.history.push(result);
        self.last_quiz_at = Some(now_unix());
        self.save();
    }

    pub fn upgrade_to_premium(&mut self) {
        if let Some(user) = self.user.as_mut() {
            user.is_premium = true;
            self.save();
        }
    }

    fn save(&mut self) {
        let Some(user) = self.user.as_ref() else {
            return;
        };
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(&profile_key(&user.name), raw),
            Err(e) => log::warn!("failed to serialize profile {}: {e}", user.name),
        }
    }

    // -- derived read-only views ------------------------------------------

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Display name of the active user, with a guest fallback.
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("Guest", |u| u.name.as_str())
    }

    pub fn is_premium(&self) -> bool {
        self.user.as_ref().map_or(false, |u| u.is_premium)
    }

    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .map_or(false, |u| u.role == Some(UserRole::Admin))
    }

    pub fn quiz_history(&self) -> &[QuizResult] {
        self.user.as_ref().map_or(&[], |u| u.history.as_slice())
    }

    /// The five best results by score, best first.
    pub fn top_scores(&self) -> Vec<QuizResult> {
        let mut scores = self.quiz_history().to_vec();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores.truncate(5);
        scores
    }

    /// Premium users replay at will; free users get one quiz per 24 hours.
    pub fn can_play_again(&self) -> bool {
        self.can_play_again_at(now_unix())
    }

    fn can_play_again_at(&self, now: u64) -> bool {
        if self.is_premium() {
            return true;
        }
        match self.last_quiz_at {
            None => true,
            Some(last) => now.saturating_sub(last) >= SECONDS_PER_DAY,
        }
    }
}
