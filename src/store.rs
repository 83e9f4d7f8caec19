use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{catalog::Catalog, updates};

/// Sent to subscribers after the store accepted a change.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    Replaced { generation: u64, count: usize },
    Updated { generation: u64, names: Vec<String> },
}

type Observer = Box<dyn Fn(&CatalogEvent) + Send + Sync>;

/// Issued when a refresh starts. Only a ticket newer than the installed
/// catalog may replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Owns the current catalog. Readers take cheap snapshots, the single writer
/// swaps whole catalogs in, so a reader never sees a half applied change.
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
    issued: AtomicU64,
    writer: Mutex<()>,
    observers: RwLock<Vec<Observer>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// Starts with an empty catalog, generation 0.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Catalog::default())),
            issued: AtomicU64::new(0),
            writer: Mutex::new(()),
            observers: RwLock::new(vec![]),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Install a freshly built catalog. Returns false, leaving the store
    /// untouched, when a newer refresh has already been installed.
    pub fn install(&self, ticket: RefreshTicket, mut catalog: Catalog) -> bool {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let installed = self.generation();
        if ticket.0 <= installed {
            log::warn!(
                "Discarding catalog of refresh {} (generation {installed} already installed)",
                ticket.0
            );
            return false;
        }

        catalog.set_generation(ticket.0);
        let count = catalog.len();
        self.swap(catalog);
        log::info!("Installed catalog generation {} with {count} packages", ticket.0);

        self.notify(&CatalogEvent::Replaced {
            generation: ticket.0,
            count,
        });
        true
    }

    /// Merge an update check that started against catalog `generation`.
    /// `None` when the catalog was replaced meanwhile and the result is stale.
    pub fn apply_updates(
        &self,
        generation: u64,
        updates: &HashMap<String, String>,
    ) -> Option<Vec<String>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = self.snapshot();
        if snapshot.generation() != generation {
            log::warn!(
                "Discarding update check for generation {generation} (now {})",
                snapshot.generation()
            );
            return None;
        }

        //copy, mutate, swap
        let mut next = Catalog::clone(&snapshot);
        drop(snapshot);
        let names = updates::apply_updates(&mut next, updates);
        if !names.is_empty() {
            self.swap(next);
            self.notify(&CatalogEvent::Updated {
                generation,
                names: names.clone(),
            });
        }
        Some(names)
    }

    /// `observer` is called after every accepted install or update.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&CatalogEvent) + Send + Sync + 'static,
    {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    fn swap(&self, catalog: Catalog) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
    }

    fn notify(&self, event: &CatalogEvent) {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(event);
        }
    }
}
