//! Session -> members bookkeeping.
//!
//! Sessions are created on first join and deleted eagerly when their last
//! member leaves. Anything left empty by other paths is swept by the reaper
//! through [`SessionRegistry::list_stale_empty`].

use super::participants::ParticipantInfo;
use chrono::{DateTime, Utc};
use common::types::{ParticipantId, SessionId};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub participants: HashMap<ParticipantId, ParticipantInfo>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(session_id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            participants: HashMap::new(),
            created_at,
        }
    }

    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Any member other than `excluding`.
    #[must_use]
    pub fn partner_of(&self, excluding: &ParticipantId) -> Option<&ParticipantInfo> {
        self.participants
            .values()
            .find(|info| &info.participant_id != excluding)
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it with `created_at = now` if absent.
    pub fn get_or_create(&mut self, session_id: &SessionId, now: DateTime<Utc>) -> &mut Session {
        self.sessions
            .entry(session_id.clone())
            .or_insert_with(|| Session::new(session_id.clone(), now))
    }

    /// Insert or overwrite a member. No capacity check.
    ///
    /// Creates the session with `created_at = now` if needed and returns the
    /// member previously stored under `participant_id`, if any.
    pub fn add_participant(
        &mut self,
        session_id: &SessionId,
        participant_id: ParticipantId,
        info: ParticipantInfo,
        now: DateTime<Utc>,
    ) -> Option<ParticipantInfo> {
        self.get_or_create(session_id, now)
            .participants
            .insert(participant_id, info)
    }

    /// Remove a member and return how many remain.
    ///
    /// A session that becomes empty is deleted immediately.
    pub fn remove_participant(
        &mut self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> usize {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return 0;
        };

        if session.participants.remove(participant_id).is_none() {
            return session.participant_count();
        }

        let remaining = session.participant_count();
        if remaining == 0 {
            self.sessions.remove(session_id);
            debug!(
                target: "relay.core",
                session_id = %session_id,
                "Session deleted, no participants remaining"
            );
        }
        remaining
    }

    #[must_use]
    pub fn get_partner(
        &self,
        session_id: &SessionId,
        excluding: &ParticipantId,
    ) -> Option<&ParticipantInfo> {
        self.sessions.get(session_id)?.partner_of(excluding)
    }

    /// Empty sessions strictly older than `max_age` at `now`.
    ///
    /// Lazy and one-shot: collect before mutating the registry. A session
    /// whose `created_at` lies after `now` is skipped.
    pub fn list_stale_empty(
        &self,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions
            .values()
            .filter(|session| session.is_empty())
            .filter_map(move |session| match (now - session.created_at).to_std() {
                Ok(age) if age > max_age => Some(session.session_id.clone()),
                Ok(_) => None,
                Err(_) => {
                    debug!(
                        target: "relay.core",
                        session_id = %session.session_id,
                        "Skipping session with creation time in the future"
                    );
                    None
                }
            })
    }

    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn remove_session(&mut self, session_id: &SessionId) -> Option<Session> {
        self.sessions.remove(session_id)
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Total members across all sessions.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.sessions.values().map(Session::participant_count).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::types::ConnectionId;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn info(participant: &str, session: &str) -> ParticipantInfo {
        ParticipantInfo {
            participant_id: participant.into(),
            display_name: format!("{participant}-name"),
            session_id: session.into(),
            connection_id: ConnectionId::new(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_get_or_create_keeps_original_timestamp() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");

        registry.get_or_create(&id, t0());
        let later = t0() + chrono::Duration::hours(5);
        let session = registry.get_or_create(&id, later);

        assert_eq!(session.created_at, t0());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_participant_overwrites() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");

        assert!(registry
            .add_participant(&id, "A".into(), info("A", "S1"), t0())
            .is_none());
        let previous = registry.add_participant(&id, "A".into(), info("A", "S1"), t0());

        assert!(previous.is_some());
        assert_eq!(registry.get(&id).unwrap().participant_count(), 1);
    }

    #[test]
    fn test_add_participant_uses_given_creation_time() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");
        let later = t0() + chrono::Duration::hours(3);

        registry.add_participant(&id, "A".into(), info("A", "S1"), t0());
        registry.add_participant(&id, "B".into(), info("B", "S1"), later);

        assert_eq!(registry.get(&id).unwrap().created_at, t0());
    }

    #[test]
    fn test_no_capacity_enforcement() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");

        for p in ["A", "B", "C"] {
            registry.add_participant(&id, p.into(), info(p, "S1"), t0());
        }

        assert_eq!(registry.get(&id).unwrap().participant_count(), 3);
        assert_eq!(registry.participant_count(), 3);
    }

    #[test]
    fn test_remove_participant_deletes_empty_session() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");
        registry.add_participant(&id, "A".into(), info("A", "S1"), t0());
        registry.add_participant(&id, "B".into(), info("B", "S1"), t0());

        assert_eq!(registry.remove_participant(&id, &"A".into()), 1);
        assert!(registry.get(&id).is_some());

        assert_eq!(registry.remove_participant(&id, &"B".into()), 0);
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn test_remove_unknown_participant_or_session() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");
        registry.add_participant(&id, "A".into(), info("A", "S1"), t0());

        assert_eq!(registry.remove_participant(&id, &"Z".into()), 1);
        assert_eq!(registry.remove_participant(&"nope".into(), &"A".into()), 0);
    }

    #[test]
    fn test_get_partner() {
        let mut registry = SessionRegistry::new();
        let id = SessionId::from("S1");
        registry.add_participant(&id, "A".into(), info("A", "S1"), t0());

        assert!(registry.get_partner(&id, &"A".into()).is_none());

        registry.add_participant(&id, "B".into(), info("B", "S1"), t0());
        let partner = registry.get_partner(&id, &"A".into()).unwrap();
        assert_eq!(partner.participant_id.as_str(), "B");

        assert!(registry.get_partner(&"S9".into(), &"A".into()).is_none());
    }

    #[test]
    fn test_list_stale_empty() {
        let mut registry = SessionRegistry::new();
        let old = SessionId::from("old-empty");
        let young = SessionId::from("young-empty");
        let occupied = SessionId::from("old-occupied");

        registry.get_or_create(&old, t0());
        registry.get_or_create(&young, t0() + chrono::Duration::hours(20));
        registry
            .get_or_create(&occupied, t0())
            .participants
            .insert("A".into(), info("A", "old-occupied"));

        let now = t0() + chrono::Duration::hours(25);
        let stale: Vec<SessionId> = registry.list_stale_empty(now, DAY).collect();

        assert_eq!(stale, vec![old]);
    }

    #[test]
    fn test_list_stale_empty_boundary_is_strict() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create(&"S1".into(), t0());

        let exactly_max_age = t0() + chrono::Duration::hours(24);
        assert_eq!(registry.list_stale_empty(exactly_max_age, DAY).count(), 0);

        let just_over = exactly_max_age + chrono::Duration::seconds(1);
        assert_eq!(registry.list_stale_empty(just_over, DAY).count(), 1);
    }

    #[test]
    fn test_list_stale_empty_skips_future_sessions() {
        let mut registry = SessionRegistry::new();
        registry.get_or_create(&"future".into(), t0() + chrono::Duration::days(10));
        registry.get_or_create(&"past".into(), t0() - chrono::Duration::days(10));

        let stale: Vec<SessionId> = registry.list_stale_empty(t0(), DAY).collect();
        assert_eq!(stale, vec![SessionId::from("past")]);
    }
}
