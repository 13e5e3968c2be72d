//! Notification read/unread/archived state machine.
//!
//! ```text
//! unread ──mark_read──▶ read
//!   │                    │
//!   └──────archive───────┴──▶ archived (terminal)
//! ```
//!
//! Every transition is idempotent. The unread badge is always recomputed
//! from the notifications themselves.

use chrono::{DateTime, Utc};
use estate_types::{
    EstateError, Notification, NotificationCategory, NotificationStatus, Priority, Result,
};
use tracing::debug;

/// Read transition. Already-read and archived notifications come back unchanged.
pub fn mark_read(notification: &Notification, now: DateTime<Utc>) -> Notification {
    let mut next = notification.clone();
    if !next.is_read && !next.is_archived() {
        next.is_read = true;
        next.read_at = Some(now);
    }
    next
}

/// Archive transition. Archiving twice keeps the first `archived_at`.
pub fn archive(notification: &Notification, now: DateTime<Utc>) -> Notification {
    let mut next = notification.clone();
    if !next.is_archived() {
        next.status = NotificationStatus::Archived;
        next.archived_at = Some(now);
    }
    next
}

/// Unread and not archived
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| n.is_unread()).count()
}

/// Local view over one user's (or one page's) notifications
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationInbox {
    items: Vec<Notification>,
}

impl NotificationInbox {
    pub fn new(items: Vec<Notification>) -> Self {
        Self { items }
    }

    /// Swap in a freshly fetched collection
    pub fn replace(&mut self, items: Vec<Notification>) {
        self.items = items;
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Notification> {
        self.items
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Default view: everything not archived
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(|n| !n.is_archived())
    }

    pub fn unread_count(&self) -> usize {
        unread_count(&self.items)
    }

    pub fn unread_count_for(&self, user_id: &str) -> usize {
        self.items
            .iter()
            .filter(|n| n.user_id == user_id && n.is_unread())
            .count()
    }

    pub fn by_category(&self, category: NotificationCategory) -> Vec<&Notification> {
        self.visible().filter(|n| n.category == category).collect()
    }

    /// Visible notifications at or above `min` priority
    pub fn by_priority(&self, min: Priority) -> Vec<&Notification> {
        self.visible().filter(|n| n.priority >= min).collect()
    }

    /// Returns whether anything changed
    pub fn mark_read(&mut self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        self.transition(id, |n| mark_read(n, now))
    }

    /// Returns whether anything changed
    pub fn archive(&mut self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        self.transition(id, |n| archive(n, now))
    }

    /// Marks every unread notification of `user_id`; returns how many changed.
    ///
    /// The new collection is built first and swapped in whole, so readers
    /// never observe a half-applied batch.
    pub fn mark_all_read(&mut self, user_id: &str, now: DateTime<Utc>) -> usize {
        self.apply_batch(user_id, |n| n.is_unread(), |n| mark_read(n, now))
    }

    /// Archives every read, not yet archived notification of `user_id`
    pub fn archive_all_read(&mut self, user_id: &str, now: DateTime<Utc>) -> usize {
        self.apply_batch(
            user_id,
            |n| n.is_read && !n.is_archived(),
            |n| archive(n, now),
        )
    }

    fn transition<F>(&mut self, id: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&Notification) -> Notification,
    {
        let slot = self
            .items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| EstateError::not_found("notification", id))?;
        let next = f(slot);
        let changed = next != *slot;
        if changed {
            debug!(notification = id, state = ?next.state(), "notification transitioned");
            *slot = next;
        }
        Ok(changed)
    }

    fn apply_batch<P, F>(&mut self, user_id: &str, selected: P, f: F) -> usize
    where
        P: Fn(&Notification) -> bool,
        F: Fn(&Notification) -> Notification,
    {
        let mut changed = 0;
        let next: Vec<Notification> = self
            .items
            .iter()
            .map(|n| {
                if n.user_id == user_id && selected(n) {
                    changed += 1;
                    f(n)
                } else {
                    n.clone()
                }
            })
            .collect();
        self.items = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use estate_types::NotificationState;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, minute, 0).unwrap()
    }

    fn notification(id: &str, user: &str) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: user.to_string(),
            title: format!("Notification {}", id),
            message: String::new(),
            category: NotificationCategory::Lead,
            priority: Priority::Medium,
            is_read: false,
            read_at: None,
            status: NotificationStatus::Active,
            archived_at: None,
            created_at: at(0),
        }
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let n = notification("n1", "u1");
        let once = mark_read(&n, at(1));
        let twice = mark_read(&once, at(2));
        assert_eq!(once, twice);
        assert_eq!(once.read_at, Some(at(1)));
        assert_eq!(once.state(), NotificationState::Read);
    }

    #[test]
    fn test_archived_is_terminal() {
        let archived = archive(&notification("n1", "u1"), at(1));
        assert_eq!(archived.state(), NotificationState::Archived);
        let still = mark_read(&archived, at(2));
        assert_eq!(still, archived);
        assert_eq!(archive(&archived, at(3)).archived_at, Some(at(1)));
    }

    #[test]
    fn test_mark_all_read_clears_badge() {
        let mut inbox = NotificationInbox::new(vec![
            notification("n1", "u1"),
            notification("n2", "u1"),
            notification("n3", "u1"),
        ]);
        assert_eq!(inbox.unread_count(), 3);
        assert_eq!(inbox.mark_all_read("u1", at(5)), 3);
        assert!(inbox.items().iter().all(|n| n.is_read));
        assert_eq!(inbox.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_read_is_scoped_to_user() {
        let mut inbox = NotificationInbox::new(vec![notification("n1", "u1"), notification("n2", "u2")]);
        assert_eq!(inbox.mark_all_read("u1", at(5)), 1);
        assert_eq!(inbox.unread_count_for("u2"), 1);
    }

    #[test]
    fn test_archived_unread_excluded_from_count_and_default_view() {
        let mut inbox = NotificationInbox::new(vec![notification("n1", "u1"), notification("n2", "u1")]);
        assert!(inbox.archive("n1", at(1)).unwrap());
        assert_eq!(inbox.unread_count(), 1);
        assert_eq!(inbox.visible().count(), 1);
    }

    #[test]
    fn test_unknown_id_is_not_found_and_state_unchanged() {
        let mut inbox = NotificationInbox::new(vec![notification("n1", "u1")]);
        let before = inbox.clone();
        let err = inbox.mark_read("missing", at(1)).unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(inbox, before);
    }

    #[test]
    fn test_priority_and_category_views() {
        let mut urgent = notification("n1", "u1");
        urgent.priority = Priority::Urgent;
        urgent.category = NotificationCategory::Payment;
        let inbox = NotificationInbox::new(vec![urgent, notification("n2", "u1")]);
        assert_eq!(inbox.by_priority(Priority::High).len(), 1);
        assert_eq!(inbox.by_category(NotificationCategory::Payment)[0].id, "n1");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Read(usize),
        Archive(usize),
        ReadAll,
        ArchiveRead,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..8).prop_map(Op::Read),
            (0usize..8).prop_map(Op::Archive),
            Just(Op::ReadAll),
            Just(Op::ArchiveRead),
        ]
    }

    proptest! {
        #[test]
        fn unread_count_matches_state_after_any_ops(
            size in 1usize..8,
            ops in prop::collection::vec(arb_op(), 0..30),
        ) {
            let mut inbox = NotificationInbox::new(
                (0..size).map(|i| notification(&format!("n{}", i), "u1")).collect(),
            );
            for (minute, op) in ops.into_iter().enumerate() {
                let now = at((minute % 60) as u32);
                match op {
                    Op::Read(i) => { let _ = inbox.mark_read(&format!("n{}", i % size), now); }
                    Op::Archive(i) => { let _ = inbox.archive(&format!("n{}", i % size), now); }
                    Op::ReadAll => { inbox.mark_all_read("u1", now); }
                    Op::ArchiveRead => { inbox.archive_all_read("u1", now); }
                }
                let expected = inbox
                    .items()
                    .iter()
                    .filter(|n| !n.is_read && n.status != NotificationStatus::Archived)
                    .count();
                prop_assert_eq!(inbox.unread_count(), expected);
            }
        }

        #[test]
        fn mark_read_twice_equals_once(read in any::<bool>(), archived in any::<bool>()) {
            let mut n = notification("n1", "u1");
            n.is_read = read;
            if archived {
                n = archive(&n, at(0));
            }
            let once = mark_read(&n, at(1));
            prop_assert_eq!(mark_read(&once, at(2)), once);
        }
    }
}
