//! Shape-keyed cache of [`Dht3d`] engines.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::dht1d::DhtError;
use crate::dht3d::Dht3d;

/// Builds [`Dht3d`] engines on demand and reuses them per shape, so repeated
/// transforms of the same extents share tables and scratch.
///
/// ```
/// use fht3d::DhtPlanner;
///
/// let mut planner = DhtPlanner::new();
/// let mut a = vec![0.0; 4 * 4 * 4];
/// a[0] = 1.0;
/// planner.plan(4, 4, 4).unwrap().forward(&mut a).unwrap();
/// ```
#[derive(Default)]
pub struct DhtPlanner {
    engines: HashMap<(usize, usize, usize), Dht3d>,
}

impl DhtPlanner {
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Returns the cached engine for `(n1, n2, n3)`, creating it first if
    /// needed. Invalid extents fail without inserting anything.
    pub fn plan(&mut self, n1: usize, n2: usize, n3: usize) -> Result<&mut Dht3d, DhtError> {
        match self.engines.entry((n1, n2, n3)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(Dht3d::new(n1, n2, n3)?)),
        }
    }

    /// Number of distinct shapes planned so far.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
