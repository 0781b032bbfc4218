//! Canonical window table and observer registry.
//!
//! [`WindowTable`] is the plain data the focus, lifecycle and state modules operate on.
//! [`WindowStore`] owns the committed table, stages every operation on a draft copy, and notifies
//! subscribers once per committed change.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use crate::{
    error::DesktopError,
    model::{AppMeta, DesktopSnapshot, WindowId, WindowInstance, WindowPatch},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Mapping of live windows plus focus and stacking counters.
pub struct WindowTable {
    windows: BTreeMap<WindowId, WindowInstance>,
    active_id: Option<WindowId>,
    /// Highest `z` ever handed out; only grows.
    z_counter: u64,
    next_window_id: u64,
}

impl Default for WindowTable {
    fn default() -> Self {
        Self {
            windows: BTreeMap::new(),
            active_id: None,
            z_counter: 0,
            next_window_id: 1,
        }
    }
}

impl WindowTable {
    pub fn get(&self, window_id: WindowId) -> Option<&WindowInstance> {
        self.windows.get(&window_id)
    }

    pub fn require(&self, window_id: WindowId) -> Result<&WindowInstance, DesktopError> {
        self.get(window_id).ok_or(DesktopError::NotFound(window_id))
    }

    pub fn contains(&self, window_id: WindowId) -> bool {
        self.windows.contains_key(&window_id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &WindowInstance> {
        self.windows.values()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn active_id(&self) -> Option<WindowId> {
        self.active_id
    }

    pub fn max_z(&self) -> Option<u64> {
        self.windows.values().map(|w| w.z).max()
    }

    /// Returns a fresh window id that has never been handed out by this table.
    pub fn allocate_window_id(&mut self) -> WindowId {
        let mut candidate = self.next_window_id;
        while self.windows.contains_key(&WindowId(candidate)) {
            candidate = candidate.saturating_add(1);
        }
        self.next_window_id = candidate.saturating_add(1);
        WindowId(candidate)
    }

    /// Returns the next stacking value, strictly above every `z` currently in the table.
    pub fn allocate_z(&mut self) -> u64 {
        self.z_counter = self
            .z_counter
            .max(self.max_z().unwrap_or(0))
            .saturating_add(1);
        self.z_counter
    }

    /// Adds a new window.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::DuplicateId`] when `instance.id` is already present.
    pub fn insert(&mut self, instance: WindowInstance) -> Result<(), DesktopError> {
        if self.windows.contains_key(&instance.id) {
            return Err(DesktopError::DuplicateId(instance.id));
        }
        self.z_counter = self.z_counter.max(instance.z);
        self.next_window_id = self.next_window_id.max(instance.id.0.saturating_add(1));
        self.windows.insert(instance.id, instance);
        Ok(())
    }

    /// Merges `patch` into an existing window and returns whether anything changed.
    ///
    /// A patch that conceals the active window clears `active_id`; choosing a replacement is the
    /// focus engine's job.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is absent.
    pub fn update(&mut self, window_id: WindowId, patch: &WindowPatch) -> Result<bool, DesktopError> {
        let window = self
            .windows
            .get_mut(&window_id)
            .ok_or(DesktopError::NotFound(window_id))?;
        let changed = patch.apply_to(window);
        let concealed = window.state.is_concealed();
        self.z_counter = self.z_counter.max(window.z);
        if concealed && self.active_id == Some(window_id) {
            self.active_id = None;
        }
        Ok(changed)
    }

    /// Deletes a window, clearing `active_id` when it pointed at the removed window.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is absent.
    pub fn remove(&mut self, window_id: WindowId) -> Result<WindowInstance, DesktopError> {
        let removed = self
            .windows
            .remove(&window_id)
            .ok_or(DesktopError::NotFound(window_id))?;
        if self.active_id == Some(window_id) {
            self.active_id = None;
        }
        Ok(removed)
    }

    /// Points `active_id` at `window_id`, or clears it.
    ///
    /// Callers are responsible for only activating windows in a focusable state.
    pub(crate) fn set_active(&mut self, window_id: Option<WindowId>) -> Result<(), DesktopError> {
        if let Some(id) = window_id {
            self.require(id)?;
        }
        self.active_id = window_id;
        Ok(())
    }

    pub fn snapshot(&self, apps: &[AppMeta]) -> DesktopSnapshot {
        let mut windows: Vec<WindowInstance> = self.windows.values().cloned().collect();
        windows.sort_by_key(|w| w.z);
        DesktopSnapshot {
            apps: apps.to_vec(),
            windows,
            active_id: self.active_id,
        }
    }
}

type Listener = Rc<dyn Fn(&DesktopSnapshot)>;

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Handle returned by [`WindowStore::subscribe`].
///
/// Dropping the handle keeps the listener registered; call [`Subscription::unsubscribe`] or
/// convert it with [`Subscription::into_guard`] to scope it.
#[derive(Debug)]
#[must_use = "dropping a Subscription leaves the listener registered"]
pub struct Subscription {
    id: u64,
    set: Weak<RefCell<ListenerSet>>,
}

impl Subscription {
    /// Removes the listener. Calling it after the store is gone is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(set) = self.set.upgrade() {
            set.borrow_mut().listeners.remove(&self.id);
        }
    }

    /// Wraps the subscription so the listener is removed when the guard drops.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

/// Unsubscribes its listener on drop.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Pending observer delivery for one committed change.
///
/// Delivery is deferred so callers can release their own borrows first, which lets listeners call
/// back into the desktop API.
#[must_use = "observers are only notified when the notification is delivered"]
pub struct Notification {
    snapshot: DesktopSnapshot,
    listeners: Vec<Listener>,
}

impl Notification {
    pub fn snapshot(&self) -> &DesktopSnapshot {
        &self.snapshot
    }

    pub fn deliver(self) {
        for listener in &self.listeners {
            listener(&self.snapshot);
        }
    }
}

/// Single source of truth for window state.
#[derive(Debug)]
pub struct WindowStore {
    table: WindowTable,
    apps: Vec<AppMeta>,
    listeners: Rc<RefCell<ListenerSet>>,
}

impl WindowStore {
    pub fn new(apps: Vec<AppMeta>) -> Self {
        Self {
            table: WindowTable::default(),
            apps,
            listeners: Rc::new(RefCell::new(ListenerSet::default())),
        }
    }

    pub fn table(&self) -> &WindowTable {
        &self.table
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        self.table.snapshot(&self.apps)
    }

    /// Registers a listener invoked after every committed change.
    pub fn subscribe(&self, listener: impl Fn(&DesktopSnapshot) + 'static) -> Subscription {
        let mut set = self.listeners.borrow_mut();
        set.next_id += 1;
        let id = set.next_id;
        set.listeners.insert(id, Rc::new(listener));
        Subscription {
            id,
            set: Rc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().listeners.len()
    }

    /// Applies `f` to a draft copy of the table and commits it only when `f` succeeds.
    ///
    /// Returns a [`Notification`] when the committed table differs from the previous one.
    ///
    /// # Errors
    ///
    /// Propagates the error from `f`; the committed table is left untouched.
    pub fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut WindowTable) -> Result<T, DesktopError>,
    ) -> Result<(T, Option<Notification>), DesktopError> {
        let mut draft = self.table.clone();
        let value = f(&mut draft)?;
        if draft == self.table {
            return Ok((value, None));
        }
        self.table = draft;
        Ok((value, Some(self.notification())))
    }

    /// Inserts a window and notifies observers.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::DuplicateId`] when the id is already present.
    pub fn insert(&mut self, instance: WindowInstance) -> Result<(), DesktopError> {
        self.commit_now(|table| table.insert(instance))
    }

    /// Patches a window and notifies observers when a field changed.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is absent.
    pub fn update(&mut self, window_id: WindowId, patch: &WindowPatch) -> Result<(), DesktopError> {
        self.commit_now(|table| table.update(window_id, patch).map(|_| ()))
    }

    /// Removes a window and notifies observers.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::NotFound`] when the window is absent.
    pub fn remove(&mut self, window_id: WindowId) -> Result<WindowInstance, DesktopError> {
        self.commit_now(|table| table.remove(window_id))
    }

    fn commit_now<T>(
        &mut self,
        f: impl FnOnce(&mut WindowTable) -> Result<T, DesktopError>,
    ) -> Result<T, DesktopError> {
        let (value, notification) = self.transact(f)?;
        if let Some(notification) = notification {
            notification.deliver();
        }
        Ok(value)
    }

    fn notification(&self) -> Notification {
        Notification {
            snapshot: self.snapshot(),
            listeners: self.listeners.borrow().listeners.values().cloned().collect(),
        }
    }
}
