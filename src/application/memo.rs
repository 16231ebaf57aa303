//! Single-slot memoization for components.
//!
//! [`memoize`] wraps a component so that a call whose props are shallowly
//! equal to the previous call's props returns the previous node without
//! invoking the function again. Only the last call is remembered.
//!
//! Slots are kept per [`MemoScope`]. Every render pass runs inside its own
//! scope, so two streamed renders interleaving on one thread never read each
//! other's slot; a scope's slots are dropped when the pass ends. Calls made
//! outside any scope share one process-wide slot that lives until
//! [`Memo::reset`].
//!
//! Memoization is only sound for pure components. A component with side
//! effects will have those effects skipped on every cache hit.

use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::trace;
use uuid::Uuid;

use crate::domain::node::{Component, ComponentError, Map, Node, RenderFn, props_shallow_eq};
use crate::util::lock::mutex_lock;

use super::render::ANONYMOUS_COMPONENT;

const SOURCE: &str = "application::memo";

thread_local! {
    static ACTIVE_SCOPE: RefCell<Option<MemoScope>> = const { RefCell::new(None) };
}

/// Wrap `component` in a single-slot memo.
pub fn memoize(component: Component) -> Component {
    Memo::new(component).component()
}

/// Hit/miss counters of a memoized component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

/// A memoized component together with a handle on its cache.
#[derive(Clone)]
pub struct Memo {
    component: Component,
    cache: Arc<MemoCache>,
}

impl Memo {
    pub fn new(component: Component) -> Self {
        let cache = Arc::new(MemoCache::default());
        let inner = component.clone();
        let wrapper_cache = Arc::clone(&cache);
        let render: Arc<RenderFn> =
            Arc::new(move |props: &Map| wrapper_cache.invoke(&inner, props));

        Self {
            component: component.replace_render(render),
            cache,
        }
    }

    /// The memoized component. Clones share the cache.
    pub fn component(&self) -> Component {
        self.component.clone()
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.cache.hits.load(Ordering::Relaxed),
            misses: self.cache.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of render passes currently holding a slot.
    pub fn active_scopes(&self) -> usize {
        mutex_lock(&self.cache.scoped, SOURCE, "active_scopes").len()
    }

    /// Drop every slot and zero the counters.
    pub fn reset(&self) {
        *mutex_lock(&self.cache.shared, SOURCE, "reset.shared") = None;
        mutex_lock(&self.cache.scoped, SOURCE, "reset.scoped").clear();
        self.cache.hits.store(0, Ordering::Relaxed);
        self.cache.misses.store(0, Ordering::Relaxed);
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("component", &self.component)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Key under which memoized components keep their slot during one pass.
#[derive(Debug, Clone)]
pub struct MemoScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    id: Uuid,
    caches: Mutex<Vec<Weak<MemoCache>>>,
}

impl MemoScope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                caches: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Run `f` with this scope active on the current thread. The previously
    /// active scope is restored afterwards, even if `f` panics.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = ACTIVE_SCOPE.with(|active| active.replace(Some(self.clone())));
        let _restore = RestoreScope(previous);
        f()
    }

    fn current() -> Option<MemoScope> {
        ACTIVE_SCOPE.with(|active| active.borrow().clone())
    }

    fn track(&self, cache: &Arc<MemoCache>) {
        mutex_lock(&self.inner.caches, SOURCE, "scope.track").push(Arc::downgrade(cache));
    }
}

impl Default for MemoScope {
    fn default() -> Self {
        Self::new()
    }
}

struct RestoreScope(Option<MemoScope>);

impl Drop for RestoreScope {
    fn drop(&mut self) {
        let previous = self.0.take();
        let leaving = ACTIVE_SCOPE.with(|active| active.replace(previous));
        drop(leaving);
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let caches = self
            .caches
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for cache in caches.drain(..).filter_map(|cache| cache.upgrade()) {
            cache.release(self.id);
        }
    }
}

#[derive(Debug)]
struct Slot {
    props: Map,
    node: Node,
}

#[derive(Debug, Default)]
struct MemoCache {
    shared: Mutex<Option<Slot>>,
    scoped: Mutex<HashMap<Uuid, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoCache {
    fn invoke(
        self: &Arc<Self>,
        component: &Component,
        props: &Map,
    ) -> Result<Node, ComponentError> {
        let scope = MemoScope::current();
        let name = component.name().unwrap_or(ANONYMOUS_COMPONENT);

        if let Some(node) = self.lookup(scope.as_ref(), props) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(component = name, "memo hit");
            return Ok(node);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(component = name, "memo miss");
        let node = component.call_with(props)?;
        self.store(scope.as_ref(), props, &node);
        Ok(node)
    }

    fn lookup(&self, scope: Option<&MemoScope>, props: &Map) -> Option<Node> {
        let matching = |slot: &&Slot| props_shallow_eq(&slot.props, props);
        match scope {
            Some(scope) => mutex_lock(&self.scoped, SOURCE, "lookup.scoped")
                .get(&scope.id())
                .filter(matching)
                .map(|slot| slot.node.clone()),
            None => mutex_lock(&self.shared, SOURCE, "lookup.shared")
                .as_ref()
                .filter(matching)
                .map(|slot| slot.node.clone()),
        }
    }

    fn store(self: &Arc<Self>, scope: Option<&MemoScope>, props: &Map, node: &Node) {
        let slot = Slot {
            props: props.clone(),
            node: node.clone(),
        };
        match scope {
            Some(scope) => {
                let previous =
                    mutex_lock(&self.scoped, SOURCE, "store.scoped").insert(scope.id(), slot);
                if previous.is_none() {
                    scope.track(self);
                }
            }
            None => *mutex_lock(&self.shared, SOURCE, "store.shared") = Some(slot),
        }
    }

    fn release(&self, scope: Uuid) {
        mutex_lock(&self.scoped, SOURCE, "release").remove(&scope);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::domain::node::props;

    fn counting_component(calls: &Arc<AtomicUsize>) -> Component {
        let calls = Arc::clone(calls);
        Component::new(move |props| {
            calls.fetch_add(1, Ordering::SeqCst);
            let label = props.get("label").and_then(Node::as_str).unwrap_or("");
            Node::from(format!("<{label}>"))
        })
        .named("Label")
    }

    #[test]
    fn equal_props_invoke_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memo::new(counting_component(&calls));
        let component = memo.component();
        let props = props([("label", "a")]);

        let first = component.call_with(&props).expect("first");
        let second = component.call_with(&props.clone()).expect("second");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.stats(), MemoStats { hits: 1, misses: 1 });
    }

    #[test]
    fn changed_prop_invokes_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let component = memoize(counting_component(&calls));

        component.call_with(&props([("label", "a")])).expect("a");
        component.call_with(&props([("label", "b")])).expect("b");
        component.call_with(&props([("label", "a")])).expect("a again");

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn nested_values_compare_by_reference() {
        let calls = Arc::new(AtomicUsize::new(0));
        let component = memoize(counting_component(&calls));
        let items = Node::list(["x", "y"]);

        component
            .call_with(&props([("items", items.clone())]))
            .expect("first");
        component
            .call_with(&props([("items", items)]))
            .expect("same reference");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        component
            .call_with(&props([("items", Node::list(["x", "y"]))]))
            .expect("equal but distinct");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scopes_keep_separate_slots() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memo::new(counting_component(&calls));
        let component = memo.component();
        let first_pass = MemoScope::new();
        let second_pass = MemoScope::new();
        let a = props([("label", "a")]);
        let b = props([("label", "b")]);

        first_pass.enter(|| component.call_with(&a)).expect("a");
        second_pass.enter(|| component.call_with(&b)).expect("b");
        first_pass.enter(|| component.call_with(&a)).expect("a again");
        second_pass.enter(|| component.call_with(&b)).expect("b again");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.active_scopes(), 2);

        drop(first_pass);
        assert_eq!(memo.active_scopes(), 1);
        drop(second_pass);
        assert_eq!(memo.active_scopes(), 0);
    }

    #[test]
    fn enter_restores_the_outer_scope() {
        let outer = MemoScope::new();
        let inner = MemoScope::new();

        outer.enter(|| {
            inner.enter(|| {
                assert_eq!(MemoScope::current().map(|scope| scope.id()), Some(inner.id()));
            });
            assert_eq!(MemoScope::current().map(|scope| scope.id()), Some(outer.id()));
        });
        assert!(MemoScope::current().is_none());
    }

    #[test]
    fn failures_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let component = memoize(Component::fallible(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("first call fails".into())
            } else {
                Ok(Node::from("ok"))
            }
        }));

        assert!(component.call().is_err());
        assert_eq!(component.call().expect("second call"), Node::from("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reset_clears_slot_and_stats() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memo::new(counting_component(&calls));
        let component = memo.component();
        let props = props([("label", "a")]);

        component.call_with(&props).expect("first");
        memo.reset();
        component.call_with(&props).expect("after reset");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.stats(), MemoStats { hits: 0, misses: 1 });
    }
}
