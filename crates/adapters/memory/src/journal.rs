//! Listeners that record or log the changes they receive.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use linkhub_app::ports::{Change, ProviderChangeListener};

/// Records every change notification, in arrival order.
pub struct ChangeJournal<E> {
    changes: Mutex<Vec<Change<E>>>,
}

impl<E> Default for ChangeJournal<E> {
    fn default() -> Self {
        Self {
            changes: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for ChangeJournal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeJournal")
            .field("len", &self.len())
            .finish()
    }
}

impl<E> ChangeJournal<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Change<E>>> {
        self.changes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take every recorded change, leaving the journal empty.
    pub fn drain(&self) -> Vec<Change<E>> {
        std::mem::take(&mut *self.lock())
    }
}

impl<E: Clone> ChangeJournal<E> {
    /// Copy of every recorded change.
    #[must_use]
    pub fn changes(&self) -> Vec<Change<E>> {
        self.lock().clone()
    }
}

impl<E: Clone + Send> ProviderChangeListener<E> for ChangeJournal<E> {
    fn added(&self, element: &E) {
        self.lock().push(Change::Added(element.clone()));
    }

    fn removed(&self, element: &E) {
        self.lock().push(Change::Removed(element.clone()));
    }

    fn updated(&self, old: &E, new: &E) {
        self.lock().push(Change::Updated {
            old: old.clone(),
            new: new.clone(),
        });
    }
}

/// Logs every change notification at `info` level.
#[derive(Debug, Clone, Copy)]
pub struct TracingListener {
    source: &'static str,
}

impl TracingListener {
    /// `source` names the provider in every log line.
    #[must_use]
    pub fn new(source: &'static str) -> Self {
        Self { source }
    }
}

impl<E: fmt::Debug> ProviderChangeListener<E> for TracingListener {
    fn added(&self, element: &E) {
        tracing::info!(source = self.source, element = ?element, "added");
    }

    fn removed(&self, element: &E) {
        tracing::info!(source = self.source, element = ?element, "removed");
    }

    fn updated(&self, old: &E, new: &E) {
        tracing::info!(source = self.source, old = ?old, new = ?new, "updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_record_changes_in_order() {
        let journal: ChangeJournal<i32> = ChangeJournal::new();

        journal.added(&1);
        journal.updated(&1, &2);
        journal.removed(&2);

        assert_eq!(
            journal.changes(),
            vec![
                Change::Added(1),
                Change::Updated { old: 1, new: 2 },
                Change::Removed(2)
            ]
        );
    }

    #[test]
    fn should_empty_journal_when_drained() {
        let journal: ChangeJournal<&str> = ChangeJournal::new();
        journal.added(&"a");

        assert_eq!(journal.drain(), vec![Change::Added("a")]);
        assert!(journal.is_empty());
        assert_eq!(journal.len(), 0);
    }
}
