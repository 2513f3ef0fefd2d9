//! Dependency graph and propagation scheduler.
//!
//! A [`Graph`] owns every node. Primitive cells are created with
//! [`Graph::source`], derived cells with [`Graph::derive`] / [`Graph::derive2`].
//! Writing a source runs one propagation pass:
//!
//! 1. the new value is stored in the source;
//! 2. every node reachable from the source is visited in topological order;
//! 3. nodes that are *active* (subscribed, or feeding a subscribed node) are
//!    recomputed exactly once, the rest are only marked stale;
//! 4. once the pass has settled, subscribers are notified in the same order.
//!
//! Stale nodes are refreshed on demand by [`Graph::get`] and
//! [`Graph::subscribe`], so an unsubscribed node never does work for a change
//! nobody observes, yet always answers with an up-to-date value.

use std::any::type_name;
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};

use crate::cell::{Callback, Cell, CellId, Compute, Value};

/// Typed handle to a primitive cell.
pub struct Source<T> {
    id: CellId,
    _marker: PhantomData<fn() -> T>,
}

/// Typed handle to a derived cell.
pub struct Derived<T> {
    id: CellId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Source<T> {}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Derived<T> {}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source<{}>({})", type_name::<T>(), self.id)
    }
}

impl<T> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Derived<{}>({})", type_name::<T>(), self.id)
    }
}

/// Anything whose current value can be read or observed.
pub trait Readable<T: 'static> {
    fn id(&self) -> CellId;
}

impl<T: 'static> Readable<T> for Source<T> {
    fn id(&self) -> CellId {
        self.id
    }
}

impl<T: 'static> Readable<T> for Derived<T> {
    fn id(&self) -> CellId {
        self.id
    }
}

/// Handle returned by [`Graph::subscribe`]. Dropping it removes the callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    graph: Weak<RefCell<GraphInner>>,
    cell: CellId,
    id: u64,
}

impl Subscription {
    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.graph.upgrade() else {
            return;
        };
        let removed = match inner.try_borrow_mut() {
            Ok(mut inner) => inner.remove_subscriber(self.cell, self.id),
            Err(_) => {
                warn!(
                    "subscription {} on {} dropped during recomputation, left in place",
                    self.id, self.cell
                );
                None
            }
        };
        // the callback may own other subscriptions; release it outside the borrow
        drop(removed);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("cell", &self.cell)
            .field("id", &self.id)
            .finish()
    }
}

/// Reactive dependency graph. Cloning yields another handle to the same graph.
#[derive(Clone, Default)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

#[derive(Default)]
struct GraphInner {
    cells: Vec<Cell>,
    next_subscription: u64,
    in_pass: bool,
    pending: VecDeque<(CellId, Value)>,
}

type Notification = (Callback, Value);

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a primitive cell holding `initial`.
    pub fn source<T: 'static>(&self, label: &str, initial: T) -> Source<T> {
        let mut inner = self.inner.borrow_mut();
        let id = CellId(inner.cells.len());
        inner.cells.push(Cell::source(id, label, Rc::new(initial)));
        debug!("registered source {} '{}'", id, label);
        Source {
            id,
            _marker: PhantomData,
        }
    }

    /// Registers a cell derived from a single upstream.
    pub fn derive<A, T, F>(&self, label: &str, upstream: &impl Readable<A>, f: F) -> Derived<T>
    where
        A: 'static,
        T: 'static,
        F: Fn(&A) -> T + 'static,
    {
        let compute: Compute =
            Box::new(move |inputs: &[Value]| Rc::new(f(cast::<A>(&inputs[0]))) as Value);
        self.register(label, vec![upstream.id()], compute)
    }

    /// Registers a cell derived from two upstreams, passed to `f` in order.
    pub fn derive2<A, B, T, F>(
        &self,
        label: &str,
        first: &impl Readable<A>,
        second: &impl Readable<B>,
        f: F,
    ) -> Derived<T>
    where
        A: 'static,
        B: 'static,
        T: 'static,
        F: Fn(&A, &B) -> T + 'static,
    {
        let compute: Compute = Box::new(move |inputs: &[Value]| {
            Rc::new(f(cast::<A>(&inputs[0]), cast::<B>(&inputs[1]))) as Value
        });
        self.register(label, vec![first.id(), second.id()], compute)
    }

    fn register<T: 'static>(
        &self,
        label: &str,
        upstreams: Vec<CellId>,
        compute: Compute,
    ) -> Derived<T> {
        let mut inner = self.inner.borrow_mut();
        let id = CellId(inner.cells.len());
        for up in &upstreams {
            inner.cells[up.0].dep_insert(id);
        }
        debug!("registered derived {} '{}' <- {:?}", id, label, upstreams);
        inner.cells.push(Cell::derived(id, label, upstreams, compute));
        Derived {
            id,
            _marker: PhantomData,
        }
    }

    /// Replaces the value of a primitive cell and propagates the change.
    ///
    /// A write issued while a pass is running (from inside a subscriber) is
    /// queued and runs as its own pass once the current one has finished.
    pub fn set<T: 'static>(&self, source: &Source<T>, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.pending.push_back((source.id, Rc::new(value) as Value));
            if inner.in_pass {
                trace!("queued write to {} behind running pass", source.id);
                return;
            }
            inner.in_pass = true;
        }
        let _guard = PassGuard(&self.inner);
        loop {
            let next = self.inner.borrow_mut().pending.pop_front();
            let Some((id, value)) = next else {
                break;
            };
            let notifications = self.inner.borrow_mut().propagate(id, value);
            for (callback, value) in notifications {
                callback(&value);
            }
        }
    }

    /// Writes `edit` applied to the latest value of a primitive cell.
    ///
    /// The latest value is the newest write still queued for `source`, or the
    /// stored value when nothing is queued, so several edits issued from one
    /// pass build on each other.
    pub fn update<T: 'static>(&self, source: &Source<T>, edit: impl FnOnce(&T) -> T) {
        let latest = {
            let inner = self.inner.borrow();
            inner
                .pending
                .iter()
                .rev()
                .find(|(id, _)| *id == source.id)
                .map(|(_, value)| Rc::clone(value))
                .unwrap_or_else(|| Rc::clone(&inner.cells[source.id.0].value))
        };
        let value = edit(cast::<T>(&latest));
        self.set(source, value);
    }

    /// Current value of any cell, refreshing it first if it is stale.
    pub fn get<T: 'static>(&self, handle: &impl Readable<T>) -> Rc<T> {
        let mut inner = self.inner.borrow_mut();
        inner.refresh(handle.id());
        let cell = &inner.cells[handle.id().0];
        Rc::clone(&cell.value)
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("cell '{}' does not hold a {}", cell.label, type_name::<T>()))
    }

    /// Calls `callback` with the current value now and after every settled change.
    pub fn subscribe<T, F>(&self, handle: &impl Readable<T>, callback: F) -> Subscription
    where
        T: 'static,
        F: Fn(&T) + 'static,
    {
        let cell = handle.id();
        let callback: Callback = Rc::new(move |value: &Value| callback(cast::<T>(value)));
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            inner.refresh(cell);
            let id = inner.next_subscription;
            inner.next_subscription += 1;
            let node = &mut inner.cells[cell.0];
            node.subscribers.push((id, Rc::clone(&callback)));
            trace!("subscription {} on {} '{}'", id, cell, node.label);
            (id, Rc::clone(&node.value))
        };
        callback(&current);
        Subscription {
            graph: Rc::downgrade(&self.inner),
            cell,
            id,
        }
    }

    pub fn subscriber_count<T: 'static>(&self, handle: &impl Readable<T>) -> usize {
        self.inner.borrow().cells[handle.id().0].subscribers.len()
    }

    /// How many times the compute function of `handle` has run.
    pub fn recompute_count<T: 'static>(&self, handle: &impl Readable<T>) -> u64 {
        self.inner.borrow().cells[handle.id().0].recomputations
    }

    pub fn is_stale<T: 'static>(&self, handle: &impl Readable<T>) -> bool {
        self.inner.borrow().cells[handle.id().0].stale
    }

    pub fn label<T: 'static>(&self, handle: &impl Readable<T>) -> String {
        self.inner.borrow().cells[handle.id().0].label.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f.debug_list().entries(inner.cells.iter()).finish(),
            Err(_) => f.write_str("Graph { <propagating> }"),
        }
    }
}

struct PassGuard<'a>(&'a RefCell<GraphInner>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.in_pass = false;
        }
    }
}

impl GraphInner {
    fn propagate(&mut self, source: CellId, value: Value) -> Vec<Notification> {
        self.cells[source.0].value = value;

        let order = self.topo_sort(source);
        let active = self.active_mask();

        for id in &order[1..] {
            self.cells[id.0].stale = true;
        }
        let mut recomputed = 0;
        for id in &order[1..] {
            if active[id.0] {
                self.refresh(*id);
                recomputed += 1;
            }
        }
        debug!(
            "write to {} '{}': {} reachable, {} recomputed",
            source,
            self.cells[source.0].label,
            order.len() - 1,
            recomputed
        );

        let mut notifications = Vec::new();
        for id in &order {
            let cell = &self.cells[id.0];
            if cell.stale {
                continue;
            }
            for (_, callback) in &cell.subscribers {
                notifications.push((Rc::clone(callback), Rc::clone(&cell.value)));
            }
        }
        notifications
    }

    /// Every node reachable from `starting` (itself included), upstreams first.
    fn topo_sort(&self, starting: CellId) -> Vec<CellId> {
        let mut sorted_nodes = Vec::new();
        let mut visited = BTreeSet::new();
        let mut work_stack = vec![starting];

        while let Some(current) = work_stack.pop() {
            if visited.contains(&current) {
                continue;
            }
            let mut all_dependents_visited = true;
            for dep in self.cells[current.0].dependent_ids() {
                if !visited.contains(&dep) {
                    work_stack.push(current);
                    work_stack.push(dep);
                    all_dependents_visited = false;
                    break;
                }
            }
            if all_dependents_visited {
                visited.insert(current);
                sorted_nodes.push(current);
            }
        }
        sorted_nodes.reverse();
        sorted_nodes
    }

    /// A node is active when it has a subscriber or any active dependent.
    fn active_mask(&self) -> Vec<bool> {
        let mut active = vec![false; self.cells.len()];
        // dependents always carry larger ids, so one descending sweep suffices
        for cell in self.cells.iter().rev() {
            active[cell.id.0] = !cell.subscribers.is_empty()
                || cell.dependent_ids().iter().any(|dep| active[dep.0]);
        }
        active
    }

    fn refresh(&mut self, id: CellId) {
        if !self.cells[id.0].stale {
            return;
        }
        let upstreams = self.cells[id.0].upstreams.clone();
        for up in &upstreams {
            self.refresh(*up);
        }
        let inputs: Vec<Value> = upstreams
            .iter()
            .map(|up| Rc::clone(&self.cells[up.0].value))
            .collect();
        let cell = &mut self.cells[id.0];
        cell.recompute(&inputs);
        trace!("recomputed {} '{}' ({} total)", id, cell.label, cell.recomputations);
    }

    fn remove_subscriber(&mut self, cell: CellId, id: u64) -> Option<Callback> {
        let subscribers = &mut self.cells.get_mut(cell.0)?.subscribers;
        let position = subscribers.iter().position(|(sub, _)| *sub == id)?;
        Some(subscribers.remove(position).1)
    }
}

fn cast<T: 'static>(value: &Value) -> &T {
    value
        .downcast_ref::<T>()
        .unwrap_or_else(|| panic!("cell value is not a {}", type_name::<T>()))
}
