//! Per-user document store with change listeners
//!
//! Collections live under `users/{user}/operations` and
//! `users/{user}/categories`. Subscribers receive the full ordered snapshot
//! of one collection right away and again after every change to it.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::error::{CoreError, CoreResult};
use crate::models::{Category, CategoryDraft, Operation, OperationDraft};

/// Callback receiving a collection snapshot
pub type SnapshotListener<T> = Box<dyn Fn(&[T]) + Send + Sync>;

/// Handle of a registered listener
///
/// The listener stays registered until [`Subscription::unsubscribe`] is
/// called or the handle is dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Storage backend for operations and categories
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn subscribe_operations(&self, user: &str, listener: SnapshotListener<Operation>) -> Subscription;

    fn subscribe_categories(&self, user: &str, listener: SnapshotListener<Category>) -> Subscription;

    /// Operations by timestamp, newest first
    async fn operations(&self, user: &str) -> CoreResult<Vec<Operation>>;

    /// Categories by name
    async fn categories(&self, user: &str) -> CoreResult<Vec<Category>>;

    async fn create_operation(&self, user: &str, draft: OperationDraft) -> CoreResult<Operation>;

    /// Replace the editable fields; `id` and `created_at` are kept
    async fn update_operation(&self, user: &str, id: &str, draft: OperationDraft) -> CoreResult<Operation>;

    async fn delete_operation(&self, user: &str, id: &str) -> CoreResult<()>;

    async fn create_category(&self, user: &str, draft: CategoryDraft) -> CoreResult<Category>;

    async fn update_category(&self, user: &str, id: &str, draft: CategoryDraft) -> CoreResult<Category>;

    /// Operations referencing the category keep their dangling id
    async fn delete_category(&self, user: &str, id: &str) -> CoreResult<()>;
}

// ==================== Snapshot ordering ====================

/// Newest first; equal timestamps keep insertion order
pub fn order_operations(operations: &mut [Operation]) {
    operations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub fn order_categories(categories: &mut [Category]) {
    categories.sort_by_key(|c| c.name.to_lowercase());
}

// ==================== Memory store ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserData {
    #[serde(default)]
    operations: Vec<Operation>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl UserData {
    fn operation_snapshot(&self) -> Vec<Operation> {
        let mut operations = self.operations.clone();
        order_operations(&mut operations);
        operations
    }

    fn category_snapshot(&self) -> Vec<Category> {
        let mut categories = self.categories.clone();
        order_categories(&mut categories);
        categories
    }
}

/// On-disk layout of the snapshot file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    users: BTreeMap<String, UserData>,
}

struct ListenerEntry<T> {
    id: u64,
    user: String,
    listener: Arc<dyn Fn(&[T]) + Send + Sync>,
}

struct Registry<T> {
    next_id: u64,
    entries: Vec<ListenerEntry<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

type SharedRegistry<T> = Arc<Mutex<Registry<T>>>;

fn lock<T>(registry: &Mutex<Registry<T>>) -> std::sync::MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn register<T: 'static>(registry: &SharedRegistry<T>, user: &str, listener: SnapshotListener<T>) -> (u64, Arc<dyn Fn(&[T]) + Send + Sync>) {
    let listener: Arc<dyn Fn(&[T]) + Send + Sync> = Arc::from(listener);
    let mut guard = lock(registry);
    let id = guard.next_id;
    guard.next_id += 1;
    guard.entries.push(ListenerEntry {
        id,
        user: user.to_string(),
        listener: listener.clone(),
    });
    (id, listener)
}

fn cancel_handle<T: 'static>(registry: &SharedRegistry<T>, id: u64) -> Subscription {
    let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(registry);
    Subscription::new(move || {
        if let Some(registry) = weak.upgrade() {
            lock(&registry).entries.retain(|entry| entry.id != id);
        }
    })
}

/// Listeners of `user`, in registration order
fn listeners_for<T>(registry: &SharedRegistry<T>, user: &str) -> Vec<Arc<dyn Fn(&[T]) + Send + Sync>> {
    lock(registry)
        .entries
        .iter()
        .filter(|entry| entry.user == user)
        .map(|entry| entry.listener.clone())
        .collect()
}

/// Collection touched by a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Operations,
    Categories,
}

/// In-process [`DocumentStore`] with optional JSON snapshot persistence
///
/// Changes are applied one at a time: each is written to the snapshot file
/// before listeners see it, and a change whose write fails is undone.
/// Listeners always receive snapshots in the order the changes happened.
pub struct MemoryStore {
    data: RwLock<StoreSnapshot>,
    operation_listeners: SharedRegistry<Operation>,
    category_listeners: SharedRegistry<Category>,
    snapshot_path: Option<PathBuf>,
    /// Held from applying a change until its listeners are notified
    commit_lock: tokio::sync::Mutex<()>,
    /// Held while a snapshot is read and handed to listeners
    notify_lock: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store that never touches the disk
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreSnapshot::default()),
            operation_listeners: Arc::new(Mutex::new(Registry::default())),
            category_listeners: Arc::new(Mutex::new(Registry::default())),
            snapshot_path: None,
            commit_lock: tokio::sync::Mutex::new(()),
            notify_lock: Mutex::new(()),
        }
    }

    /// Load the snapshot at `path` and persist every change back to it
    ///
    /// A missing file yields an empty store.
    pub async fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
                log::info!(
                    "Loaded snapshot {} ({} users)",
                    path.display(),
                    snapshot.users.len()
                );
                snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No snapshot at {}, starting empty", path.display());
                StoreSnapshot::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            data: RwLock::new(snapshot),
            snapshot_path: Some(path),
            ..Self::new()
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    fn read<R>(&self, f: impl FnOnce(&StoreSnapshot) -> R) -> R {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreSnapshot) -> R) -> R {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn operation_snapshot(&self, user: &str) -> Vec<Operation> {
        self.read(|data| {
            data.users
                .get(user)
                .map(UserData::operation_snapshot)
                .unwrap_or_default()
        })
    }

    fn category_snapshot(&self, user: &str) -> Vec<Category> {
        self.read(|data| {
            data.users
                .get(user)
                .map(UserData::category_snapshot)
                .unwrap_or_default()
        })
    }

    /// Put `user`'s data back to what it was before a change
    fn restore(&self, user: &str, previous: Option<UserData>) {
        self.write(|data| match previous {
            Some(previous) => {
                data.users.insert(user.to_string(), previous);
            }
            None => {
                data.users.remove(user);
            }
        });
    }

    async fn persist(&self) -> CoreResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let json = self.read(|data| serde_json::to_string_pretty(data))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, json).await?;
        log::debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    /// Hand the current snapshot of `collection` to `user`'s listeners
    fn notify(&self, user: &str, collection: Collection) {
        let _order = self.notify_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match collection {
            Collection::Operations => {
                let listeners = listeners_for(&self.operation_listeners, user);
                if !listeners.is_empty() {
                    let snapshot = self.operation_snapshot(user);
                    for listener in listeners {
                        listener(&snapshot);
                    }
                }
            }
            Collection::Categories => {
                let listeners = listeners_for(&self.category_listeners, user);
                if !listeners.is_empty() {
                    let snapshot = self.category_snapshot(user);
                    for listener in listeners {
                        listener(&snapshot);
                    }
                }
            }
        }
    }

    /// Apply `change` to `user`'s data, persist it, then notify listeners
    ///
    /// If `change` fails or the snapshot cannot be written, `user`'s data is
    /// restored and listeners are not called.
    async fn commit<R, F>(&self, user: &str, collection: Collection, change: F) -> CoreResult<R>
    where
        R: Send,
        F: FnOnce(&mut UserData) -> CoreResult<R> + Send,
    {
        let _commit = self.commit_lock.lock().await;
        let previous = self.read(|data| data.users.get(user).cloned());

        let applied = self.write(|data| change(data.users.entry(user.to_string()).or_default()));
        let result = match applied {
            Ok(result) => result,
            Err(e) => {
                self.restore(user, previous);
                return Err(e);
            }
        };

        if let Err(e) = self.persist().await {
            log::error!("Change for {} rolled back, snapshot not written: {}", user, e);
            self.restore(user, previous);
            return Err(e);
        }

        self.notify(user, collection);
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn subscribe_operations(&self, user: &str, listener: SnapshotListener<Operation>) -> Subscription {
        let _order = self.notify_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (id, listener) = register(&self.operation_listeners, user, listener);
        listener(&self.operation_snapshot(user));
        cancel_handle(&self.operation_listeners, id)
    }

    fn subscribe_categories(&self, user: &str, listener: SnapshotListener<Category>) -> Subscription {
        let _order = self.notify_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (id, listener) = register(&self.category_listeners, user, listener);
        listener(&self.category_snapshot(user));
        cancel_handle(&self.category_listeners, id)
    }

    async fn operations(&self, user: &str) -> CoreResult<Vec<Operation>> {
        Ok(self.operation_snapshot(user))
    }

    async fn categories(&self, user: &str) -> CoreResult<Vec<Category>> {
        Ok(self.category_snapshot(user))
    }

    async fn create_operation(&self, user: &str, draft: OperationDraft) -> CoreResult<Operation> {
        let operation = draft.into_operation(pennywise_utils::generate_id(), Utc::now());
        let stored = operation.clone();
        self.commit(user, Collection::Operations, move |data| {
            data.operations.push(stored);
            Ok(())
        })
        .await?;
        log::debug!("Created operation {} for {}", operation.id, user);
        Ok(operation)
    }

    async fn update_operation(&self, user: &str, id: &str, draft: OperationDraft) -> CoreResult<Operation> {
        let updated = self
            .commit(user, Collection::Operations, |data| {
                let existing = data
                    .operations
                    .iter_mut()
                    .find(|op| op.id == id)
                    .ok_or_else(|| CoreError::OperationNotFound { id: id.to_string() })?;
                *existing = draft.into_operation(existing.id.clone(), existing.created_at);
                Ok(existing.clone())
            })
            .await?;
        log::debug!("Updated operation {} for {}", id, user);
        Ok(updated)
    }

    async fn delete_operation(&self, user: &str, id: &str) -> CoreResult<()> {
        self.commit(user, Collection::Operations, |data| {
            let before = data.operations.len();
            data.operations.retain(|op| op.id != id);
            if data.operations.len() == before {
                return Err(CoreError::OperationNotFound { id: id.to_string() });
            }
            Ok(())
        })
        .await?;
        log::debug!("Deleted operation {} for {}", id, user);
        Ok(())
    }

    async fn create_category(&self, user: &str, draft: CategoryDraft) -> CoreResult<Category> {
        let category = draft.into_category(pennywise_utils::generate_id(), Utc::now());
        let stored = category.clone();
        self.commit(user, Collection::Categories, move |data| {
            data.categories.push(stored);
            Ok(())
        })
        .await?;
        log::debug!("Created category {} for {}", category.id, user);
        Ok(category)
    }

    async fn update_category(&self, user: &str, id: &str, draft: CategoryDraft) -> CoreResult<Category> {
        let updated = self
            .commit(user, Collection::Categories, |data| {
                let existing = data
                    .categories
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| CoreError::CategoryNotFound { id: id.to_string() })?;
                *existing = draft.into_category(existing.id.clone(), existing.created_at);
                Ok(existing.clone())
            })
            .await?;
        log::debug!("Updated category {} for {}", id, user);
        Ok(updated)
    }

    async fn delete_category(&self, user: &str, id: &str) -> CoreResult<()> {
        self.commit(user, Collection::Categories, |data| {
            let before = data.categories.len();
            data.categories.retain(|c| c.id != id);
            if data.categories.len() == before {
                return Err(CoreError::CategoryNotFound { id: id.to_string() });
            }
            Ok(())
        })
        .await?;
        log::debug!("Deleted category {} for {}", id, user);
        Ok(())
    }
}
