use std::any::Any;
use std::collections::BTreeSet; // Using BTreeSet once a node fans out widely
use std::fmt;
use std::rc::Rc;

/// Number of dependents kept in a plain vector before promoting to an ordered set.
const VECTOR_LIMIT: usize = 7;

/// Dense index of a node inside its [`crate::graph::Graph`].
///
/// Ids are handed out in registration order, and a derived node can only be
/// registered after all of its upstreams, so ascending id order is always a
/// valid topological order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub usize);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type-erased value held by a node.
pub type Value = Rc<dyn Any>;

/// Pure function from the upstream values (in declaration order) to a node value.
pub type Compute = Box<dyn Fn(&[Value]) -> Value>;

/// Subscriber callback, invoked with the node value after every settled change.
pub type Callback = Rc<dyn Fn(&Value)>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Dependents {
    #[default]
    None,
    Vector(Vec<CellId>),
    Set(BTreeSet<CellId>),
}

/// One node of the reactive graph: either a primitive (source) cell with no
/// compute function, or a derived cell recomputed from its upstreams.
pub struct Cell {
    pub id: CellId,
    pub label: String,
    pub upstreams: Vec<CellId>,
    pub dependents: Dependents,
    pub value: Value,
    pub compute: Option<Compute>,
    pub subscribers: Vec<(u64, Callback)>,
    pub stale: bool,
    pub recomputations: u64,
}

impl Cell {
    pub fn source(id: CellId, label: &str, initial: Value) -> Self {
        Cell {
            id,
            label: label.to_string(),
            upstreams: Vec::new(),
            dependents: Dependents::None,
            value: initial,
            compute: None,
            subscribers: Vec::new(),
            stale: false,
            recomputations: 0,
        }
    }

    /// Derived cells start stale; their first value is computed on first read.
    pub fn derived(id: CellId, label: &str, upstreams: Vec<CellId>, compute: Compute) -> Self {
        Cell {
            id,
            label: label.to_string(),
            upstreams,
            dependents: Dependents::None,
            value: Rc::new(()),
            compute: Some(compute),
            subscribers: Vec::new(),
            stale: true,
            recomputations: 0,
        }
    }

    pub fn is_source(&self) -> bool {
        self.compute.is_none()
    }

    pub fn dep_insert(&mut self, id: CellId) {
        match &mut self.dependents {
            Dependents::None => {
                self.dependents = Dependents::Vector(vec![id]);
            }
            Dependents::Vector(vec) => {
                if vec.contains(&id) {
                    return;
                }
                if vec.len() >= VECTOR_LIMIT {
                    let mut set: BTreeSet<CellId> = vec.iter().copied().collect();
                    set.insert(id);
                    self.dependents = Dependents::Set(set);
                } else {
                    vec.push(id);
                }
            }
            Dependents::Set(set) => {
                set.insert(id);
            }
        }
    }

    pub fn dep_remove(&mut self, id: CellId) {
        match &mut self.dependents {
            Dependents::Vector(vec) => vec.retain(|k| *k != id),
            Dependents::Set(set) => {
                set.remove(&id);
            }
            Dependents::None => {}
        }
    }

    pub fn contains(&self, id: CellId) -> bool {
        match &self.dependents {
            Dependents::Vector(vec) => vec.contains(&id),
            Dependents::Set(set) => set.contains(&id),
            Dependents::None => false,
        }
    }

    pub fn dependent_ids(&self) -> Vec<CellId> {
        match &self.dependents {
            Dependents::Vector(vec) => vec.clone(),
            Dependents::Set(set) => set.iter().copied().collect(),
            Dependents::None => Vec::new(),
        }
    }

    /// Re-runs the compute function over `inputs`. Sources are left untouched.
    pub fn recompute(&mut self, inputs: &[Value]) {
        if let Some(compute) = &self.compute {
            self.value = compute(inputs);
            self.recomputations += 1;
        }
        self.stale = false;
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("upstreams", &self.upstreams)
            .field("dependents", &self.dependents)
            .field("source", &self.is_source())
            .field("subscribers", &self.subscribers.len())
            .field("stale", &self.stale)
            .field("recomputations", &self.recomputations)
            .finish()
    }
}
