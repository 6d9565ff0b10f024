//! Explicit type-hierarchy table for fuzzy converter resolution.
//!
//! Rust has no runtime class hierarchy to reflect over, so ancestor
//! relations are registered explicitly as upcast functions. Resolution walks
//! the table breadth-first in registration order, which keeps fuzzy lookup
//! deterministic.

use std::any::{type_name, Any, TypeId};
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;

/// Type-erased upcast from a value to one of its registered ancestors.
///
/// Returns None if the value is not of the type the upcast was registered
/// for; callers check TypeIds before invoking.
pub(crate) type UpcastFn = Rc<dyn Fn(&dyn Any) -> Option<Box<dyn Any>>>;

/// Table of registered ancestor relations between types.
pub struct TypeHierarchy {
    /// Direct ancestor edges per type, in registration order.
    edges: FxHashMap<TypeId, Vec<(TypeId, UpcastFn)>>,
    /// Every type ever recorded, in first-seen order.
    order: Vec<TypeId>,
    /// Readable names for recorded types, used in error messages.
    names: FxHashMap<TypeId, &'static str>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        TypeHierarchy {
            edges: FxHashMap::default(),
            order: Vec::new(),
            names: FxHashMap::default(),
        }
    }
}

impl TypeHierarchy {
    /// Creates an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `A` as a direct ancestor of `S`, reachable through `upcast`.
    pub fn register_ancestor<S: Any, A: Any>(&mut self, upcast: impl Fn(&S) -> A + 'static) {
        self.record_type::<S>();
        self.record_type::<A>();
        let erased: UpcastFn = Rc::new(move |value: &dyn Any| {
            value
                .downcast_ref::<S>()
                .map(|s| Box::new(upcast(s)) as Box<dyn Any>)
        });
        self.edges
            .entry(TypeId::of::<S>())
            .or_default()
            .push((TypeId::of::<A>(), erased));
    }

    /// Records a type so its name is available for error messages and its
    /// id participates in descendant iteration.
    pub(crate) fn record_type<T: Any>(&mut self) {
        let id = TypeId::of::<T>();
        if self.names.insert(id, type_name::<T>()).is_none() {
            self.order.push(id);
        }
    }

    /// Returns the recorded name of a type, if any.
    pub fn name_of(&self, id: TypeId) -> &'static str {
        self.names.get(&id).copied().unwrap_or("<unregistered type>")
    }

    /// Returns true if `sub` is `sup` or has `sup` among its ancestors.
    pub fn is_assignable(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        self.ancestors_of(sub).iter().any(|(id, _)| *id == sup)
    }

    /// Returns the ancestors of `id` in breadth-first order, nearest first,
    /// each paired with the upcast composed from the original value.
    pub(crate) fn ancestors_of(&self, id: TypeId) -> Vec<(TypeId, UpcastFn)> {
        let mut out: Vec<(TypeId, UpcastFn)> = Vec::new();
        let mut seen: Vec<TypeId> = vec![id];
        let mut queue: VecDeque<(TypeId, UpcastFn)> = self
            .edges
            .get(&id)
            .into_iter()
            .flatten()
            .map(|(ancestor, edge)| (*ancestor, edge.clone()))
            .collect();

        while let Some((ancestor, upcast)) = queue.pop_front() {
            if seen.contains(&ancestor) {
                continue;
            }
            seen.push(ancestor);
            for (further, edge) in self.edges.get(&ancestor).into_iter().flatten() {
                queue.push_back((*further, compose(&upcast, edge)));
            }
            out.push((ancestor, upcast));
        }
        out
    }

    /// Returns the composed upcast from `from` to its ancestor `to`.
    ///
    /// `from` and `to` must differ; identity is the caller's concern.
    pub(crate) fn upcast_path(&self, from: TypeId, to: TypeId) -> Option<UpcastFn> {
        self.ancestors_of(from)
            .into_iter()
            .find(|(id, _)| *id == to)
            .map(|(_, upcast)| upcast)
    }

    /// Returns all recorded types that have `id` among their ancestors,
    /// in first-seen order.
    pub(crate) fn descendants_of(&self, id: TypeId) -> Vec<TypeId> {
        self.order
            .iter()
            .copied()
            .filter(|candidate| *candidate != id && self.is_assignable(*candidate, id))
            .collect()
    }

    /// Removes every registered relation and recorded type.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.order.clear();
        self.names.clear();
    }
}

fn compose(first: &UpcastFn, second: &UpcastFn) -> UpcastFn {
    let first = first.clone();
    let second = second.clone();
    Rc::new(move |value: &dyn Any| first(value).and_then(|mid| second(mid.as_ref())))
}
