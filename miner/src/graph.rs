//! The independence graph.
//!
//! Attributes are nodes; two attributes are connected when some summary
//! itemset contains both. Connected components partition the summarized
//! attributes into groups whose submodels are independent factors of the
//! global distribution.
//!
//! Components live in a flat slot container. Inserting an itemset allocates a
//! new component that absorbs every component it intersects; absorbed slots
//! are tombstoned and their identifiers become stale. Merged submodels are
//! rebuilt and refit from scratch.

use std::ops::Index;

use smallvec::SmallVec;

use crate::dataset::{Dataset, Frequencies};
use crate::itemset::Itemset;
use crate::model::maxent::{MaxEntModel, ScalingOutcome};

/// Identifier of a component slot. Stale after the component is absorbed by
/// a merge.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ComponentId(u32);

/// One connected component: an attribute group and the submodel constrained
/// by the summary itemsets inside it.
pub struct Component {
    attrs: Itemset,
    model: MaxEntModel,
}

impl Component {
    pub fn attrs(&self) -> Itemset {
        self.attrs
    }

    pub fn model(&self) -> &MaxEntModel {
        &self.model
    }

    /// Summary itemsets constraining this component, in insertion order.
    pub fn itemsets(&self) -> impl Iterator<Item = Itemset> + '_ {
        self.model.itemset_constraints().iter().map(|c| c.set)
    }

    pub fn num_itemsets(&self) -> usize {
        self.model.num_itemsets()
    }
}

/// Flat container of live components.
#[derive(Default)]
pub struct ComponentGraph {
    slots: Vec<Option<Component>>,
}

impl ComponentGraph {
    pub fn new() -> ComponentGraph {
        ComponentGraph::default()
    }

    /// Live components, in slot order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a summary itemset, merging every component it intersects into
    /// a fresh one bound to a rebuilt, refit submodel.
    ///
    /// Returns the new component's identifier and the fit outcome.
    pub fn insert(
        &mut self,
        x: Itemset,
        data: &Dataset,
        fr: &mut Frequencies,
    ) -> (ComponentId, ScalingOutcome) {
        let mut attrs = x;
        let mut itemsets: SmallVec<[Itemset; 8]> = SmallVec::new();
        let mut absorbed = 0usize;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|c| c.attrs.intersects(x)) {
                let component = slot.take().unwrap();
                attrs |= component.attrs;
                itemsets.extend(component.itemsets());
                absorbed += 1;
            }
        }
        itemsets.push(x);
        if absorbed > 1 {
            tracing::debug!(%x, absorbed, "merged components");
        }

        let itemset_constraints: Vec<(Itemset, f64)> =
            itemsets.into_iter().map(|y| (y, fr.fr(data, y))).collect();
        let singleton_constraints: Vec<(Itemset, f64)> =
            attrs.singletons().map(|s| (s, fr.fr(data, s))).collect();
        let mut model = MaxEntModel::new(itemset_constraints, singleton_constraints);
        let outcome = model.fit();

        self.slots.push(Some(Component { attrs, model }));
        (ComponentId(self.slots.len() as u32 - 1), outcome)
    }
}

impl Index<ComponentId> for ComponentGraph {
    type Output = Component;

    fn index(&self, id: ComponentId) -> &Component {
        self.slots[id.0 as usize].as_ref().expect("stale component id")
    }
}
