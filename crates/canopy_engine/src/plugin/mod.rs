//! Plugin manager core
//!
//! Every per-frame manager (physics, scene, GUI) embeds a [`PluginCore`]
//! instead of inheriting from a base class: the core holds the shared state
//! (name, enabled flag, update order) and an observer list with
//! deterministic, subscription-ordered dispatch. A top-level scheduler
//! consumes the change notifications to order and gate updates.

/// Change notification emitted by a [`PluginCore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginEvent {
    /// The enabled flag changed to the given value
    EnabledChanged(bool),
    /// The update order changed to the given value
    UpdateOrderChanged(i32),
}

/// Observer of plugin state changes
pub trait PluginObserver {
    /// Called for each state change, in subscription order
    fn on_plugin_event(&mut self, plugin: &str, event: PluginEvent);
}

/// Identifier returned by [`PluginCore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// Shared manager state: name, enabled flag, update order, observers
pub struct PluginCore {
    name: String,
    enabled: bool,
    update_order: i32,
    observers: Vec<(ObserverId, Box<dyn PluginObserver>)>,
    next_observer: u64,
}

impl PluginCore {
    /// Create a core for the named manager
    ///
    /// Managers start enabled; lower update orders run earlier each frame.
    pub fn new(name: impl Into<String>, update_order: i32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            update_order,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Manager name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the manager participates in frame updates
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Set the enabled flag; returns whether the value changed
    ///
    /// Observers are notified only on an actual change.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.notify(PluginEvent::EnabledChanged(enabled));
        true
    }

    /// Update order; lower values update first
    pub fn update_order(&self) -> i32 {
        self.update_order
    }

    /// Set the update order; returns whether the value changed
    pub fn set_update_order(&mut self, order: i32) -> bool {
        if self.update_order == order {
            return false;
        }
        self.update_order = order;
        self.notify(PluginEvent::UpdateOrderChanged(order));
        true
    }

    /// Subscribe an observer; it receives events in subscription order
    pub fn subscribe(&mut self, observer: Box<dyn PluginObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unsubscribe an observer; returns whether it was subscribed
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn notify(&mut self, event: PluginEvent) {
        let name = self.name.clone();
        for (_, observer) in &mut self.observers {
            observer.on_plugin_event(&name, event);
        }
    }
}

/// Capability interface for per-frame managers
///
/// Managers embed a [`PluginCore`] and expose it through this trait; the
/// shared accessors come for free.
pub trait Plugin {
    /// The embedded core
    fn core(&self) -> &PluginCore;

    /// The embedded core, mutable
    fn core_mut(&mut self) -> &mut PluginCore;

    /// Manager name
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Whether the manager participates in frame updates
    fn is_enabled(&self) -> bool {
        self.core().enabled()
    }

    /// Set the enabled flag; returns whether the value changed
    fn set_enabled(&mut self, enabled: bool) -> bool {
        self.core_mut().set_enabled(enabled)
    }

    /// Update order; lower values update first
    fn update_order(&self) -> i32 {
        self.core().update_order()
    }

    /// Set the update order; returns whether the value changed
    fn set_update_order(&mut self, order: i32) -> bool {
        self.core_mut().set_update_order(order)
    }
}
