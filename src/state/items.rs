/// Item list with optimistic status overrides
///
/// Setting a status is a command: it is applied to the list immediately,
/// remembered as pending, and later either confirmed by the server or
/// rolled back. Each command gets a sequence number so that a late answer
/// to an older command cannot clobber a newer one.

use std::collections::HashMap;

use super::data::{ItemStatus, ItemSummary, StatePatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingStatus {
    /// Status before the first unconfirmed command
    prior: ItemStatus,
    seq: u64,
}

/// A status command ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCommand {
    pub id: String,
    pub seq: u64,
    pub patch: StatePatch,
}

#[derive(Debug, Default)]
pub struct ItemList {
    items: Vec<ItemSummary>,
    pending: HashMap<String, PendingStatus>,
    next_seq: u64,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ItemSummary] {
        &self.items
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Replace the list with an authoritative fetch. Pending commands are
    /// forgotten; the server's answer is the truth now.
    pub fn replace(&mut self, items: Vec<ItemSummary>) {
        self.items = items;
        self.pending.clear();
    }

    /// Apply a status optimistically and build the command to send.
    ///
    /// Returns `None` for unknown items or when the status is unchanged.
    pub fn issue(&mut self, id: &str, status: ItemStatus) -> Option<StatusCommand> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        if item.status == status {
            return None;
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        let prior = self
            .pending
            .get(id)
            .map(|pending| pending.prior)
            .unwrap_or(item.status);

        item.status = status;
        self.pending.insert(id.to_string(), PendingStatus { prior, seq });
        tracing::debug!(item = id, %status, seq, "status command issued");

        Some(StatusCommand {
            id: id.to_string(),
            seq,
            patch: StatePatch {
                manual_status: Some(status),
                ..StatePatch::default()
            },
        })
    }

    /// The server accepted command `seq`.
    pub fn confirm(&mut self, id: &str, seq: u64) {
        if self.pending.get(id).is_some_and(|pending| pending.seq == seq) {
            self.pending.remove(id);
            tracing::debug!(item = id, seq, "status command confirmed");
        }
    }

    /// The server rejected command `seq`. The optimistic value is undone
    /// unless a newer command for the same item is still in flight.
    pub fn rollback(&mut self, id: &str, seq: u64) -> bool {
        let Some(pending) = self.pending.get(id).copied() else {
            return false;
        };
        if pending.seq != seq {
            return false;
        }

        self.pending.remove(id);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            tracing::info!(item = id, status = %pending.prior, "status command rolled back");
            item.status = pending.prior;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, status: ItemStatus) -> ItemSummary {
        ItemSummary {
            id: id.into(),
            status,
            confidence: 0.5,
            source_url: None,
            preview_url: None,
            svg_url: None,
            updated_at: None,
        }
    }

    fn status_of(list: &ItemList, id: &str) -> ItemStatus {
        list.items().iter().find(|item| item.id == id).map(|item| item.status).unwrap()
    }

    fn list() -> ItemList {
        let mut list = ItemList::new();
        list.replace(vec![
            summary("menu", ItemStatus::Ok),
            summary("kit", ItemStatus::NeedsReview),
        ]);
        list
    }

    #[test]
    fn test_issue_applies_optimistically() {
        let mut list = list();
        let command = list.issue("kit", ItemStatus::Rejected).unwrap();

        assert_eq!(command.patch.manual_status, Some(ItemStatus::Rejected));
        assert_eq!(status_of(&list, "kit"), ItemStatus::Rejected);
        assert!(list.is_pending("kit"));

        list.confirm("kit", command.seq);
        assert!(!list.is_pending("kit"));
        assert_eq!(status_of(&list, "kit"), ItemStatus::Rejected);
    }

    #[test]
    fn test_unchanged_or_unknown_is_not_issued() {
        let mut list = list();
        assert_eq!(list.issue("menu", ItemStatus::Ok), None);
        assert_eq!(list.issue("missing", ItemStatus::Ok), None);
    }

    #[test]
    fn test_rollback_restores_prior() {
        let mut list = list();
        let command = list.issue("menu", ItemStatus::NeedsReview).unwrap();

        assert!(list.rollback("menu", command.seq));
        assert_eq!(status_of(&list, "menu"), ItemStatus::Ok);
        assert!(!list.is_pending("menu"));
    }

    #[test]
    fn test_stale_answers_do_not_clobber_newer_command() {
        let mut list = list();
        let first = list.issue("menu", ItemStatus::NeedsReview).unwrap();
        let second = list.issue("menu", ItemStatus::Rejected).unwrap();

        assert!(!list.rollback("menu", first.seq));
        list.confirm("menu", first.seq);
        assert_eq!(status_of(&list, "menu"), ItemStatus::Rejected);
        assert!(list.is_pending("menu"));

        // Rolling back the newest restores the status from before both
        assert!(list.rollback("menu", second.seq));
        assert_eq!(status_of(&list, "menu"), ItemStatus::Ok);
    }

    #[test]
    fn test_replace_clears_pending() {
        let mut list = list();
        list.issue("kit", ItemStatus::Ok).unwrap();
        list.replace(vec![summary("kit", ItemStatus::NeedsReview)]);

        assert!(!list.is_pending("kit"));
        assert_eq!(status_of(&list, "kit"), ItemStatus::NeedsReview);
    }
}
