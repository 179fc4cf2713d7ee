//! Change notifications emitted after a mutation commits.
//!
//! [`Notifier`] keeps one subscriber list per notification kind. Delivery is
//! synchronous on the task that performed the mutation, once per non-empty
//! category, and always carries fully materialized entities so subscribers
//! can patch their views without a follow-up query.
//!
//! Handlers must not call back into mutating [`crate::library::Library`]
//! operations from inside the callback.
//!
//! # Usage
//!
//! ```rust,ignore
//! let id = library.notifier().on_songs_discovered(|songs| {
//!     for song in songs {
//!         println!("+ {:?}", song.filename);
//!     }
//! });
//!
//! // Or drain events as a queue:
//! let rx = library.notifier().events();
//! while let Ok(event) = rx.try_recv() {
//!     println!("{event:?}");
//! }
//!
//! library.notifier().disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, unbounded};
use parking_lot::RwLock;

use crate::model::{Directory, Song};

/// One notification, as delivered through [`Notifier::events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    DirectoriesDiscovered(Vec<Directory>),
    DirectoriesDeleted(Vec<Directory>),
    /// Newly added and changed songs
    SongsDiscovered(Vec<Song>),
    SongsDeleted(Vec<Song>),
}

/// Handle returned by the `on_*` methods, used to [`Notifier::disconnect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

struct Slot<T> {
    handlers: RwLock<Vec<(SubscriptionId, Handler<T>)>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    fn connect(&self, id: SubscriptionId, handler: Handler<T>) {
        self.handlers.write().push((id, handler));
    }

    fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        handlers.len() != before
    }

    fn emit(&self, items: &[T]) {
        if items.is_empty() {
            return;
        }
        // Snapshot so handlers may subscribe or disconnect while running
        let handlers: Vec<Handler<T>> = self.handlers.read().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(items);
        }
    }
}

/// Per-kind subscriber registry.
pub struct Notifier {
    next_id: AtomicU64,
    directories_discovered: Slot<Directory>,
    directories_deleted: Slot<Directory>,
    songs_discovered: Slot<Song>,
    songs_deleted: Slot<Song>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            directories_discovered: Slot::new(),
            directories_deleted: Slot::new(),
            songs_discovered: Slot::new(),
            songs_deleted: Slot::new(),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn on_directories_discovered<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&[Directory]) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.directories_discovered.connect(id, Arc::new(f));
        id
    }

    pub fn on_directories_deleted<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&[Directory]) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.directories_deleted.connect(id, Arc::new(f));
        id
    }

    /// Subscribe to added and changed songs.
    pub fn on_songs_discovered<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&[Song]) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.songs_discovered.connect(id, Arc::new(f));
        id
    }

    pub fn on_songs_deleted<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&[Song]) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.songs_deleted.connect(id, Arc::new(f));
        id
    }

    /// Remove a subscription. Returns false if it was not connected.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        // Bitwise or: the id lives in exactly one slot, but check them all
        self.directories_discovered.disconnect(id)
            | self.directories_deleted.disconnect(id)
            | self.songs_discovered.disconnect(id)
            | self.songs_deleted.disconnect(id)
    }

    /// Receive every notification kind as [`LibraryEvent`]s on a queue.
    ///
    /// The queue is unbounded; events are pushed synchronously during
    /// delivery and stay queued until received.
    pub fn events(&self) -> Receiver<LibraryEvent> {
        let (tx, rx) = unbounded();

        let sender = tx.clone();
        self.on_directories_discovered(move |dirs| {
            let _ = sender.send(LibraryEvent::DirectoriesDiscovered(dirs.to_vec()));
        });
        let sender = tx.clone();
        self.on_directories_deleted(move |dirs| {
            let _ = sender.send(LibraryEvent::DirectoriesDeleted(dirs.to_vec()));
        });
        let sender = tx.clone();
        self.on_songs_discovered(move |songs| {
            let _ = sender.send(LibraryEvent::SongsDiscovered(songs.to_vec()));
        });
        self.on_songs_deleted(move |songs| {
            let _ = tx.send(LibraryEvent::SongsDeleted(songs.to_vec()));
        });

        rx
    }

    pub(crate) fn directories_discovered(&self, dirs: &[Directory]) {
        self.directories_discovered.emit(dirs);
    }

    pub(crate) fn directories_deleted(&self, dirs: &[Directory]) {
        self.directories_deleted.emit(dirs);
    }

    pub(crate) fn songs_discovered(&self, songs: &[Song]) {
        self.songs_discovered.emit(songs);
    }

    pub(crate) fn songs_deleted(&self, songs: &[Song]) {
        self.songs_deleted.emit(songs);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("directories_discovered", &self.directories_discovered.handlers.read().len())
            .field("directories_deleted", &self.directories_deleted.handlers.read().len())
            .field("songs_discovered", &self.songs_discovered.handlers.read().len())
            .field("songs_deleted", &self.songs_deleted.handlers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn directory() -> Directory {
        Directory {
            id: 1,
            path: "/test".into(),
        }
    }

    #[test]
    fn test_empty_batches_are_not_delivered() {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        notifier.on_songs_deleted(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.songs_deleted(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        notifier.songs_deleted(&[Song::default()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_kinds_are_independent() {
        let notifier = Notifier::new();
        let rx = notifier.events();

        notifier.directories_deleted(&[directory()]);

        assert_eq!(
            rx.try_recv().unwrap(),
            LibraryEvent::DirectoriesDeleted(vec![directory()])
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnect_stops_delivery() {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let id = notifier.on_directories_discovered(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.directories_discovered(&[directory()]);
        assert!(notifier.disconnect(id));
        assert!(!notifier.disconnect(id));
        notifier.directories_discovered(&[directory()]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_subscribe_during_delivery() {
        let notifier = Arc::new(Notifier::new());
        let inner = notifier.clone();
        notifier.on_directories_discovered(move |_| {
            inner.on_directories_discovered(|_| {});
        });

        notifier.directories_discovered(&[directory()]);
        assert_eq!(notifier.directories_discovered.handlers.read().len(), 2);
    }
}
