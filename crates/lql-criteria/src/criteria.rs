use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use lql_types::{LinearId, Party, RecordRef, RecordStatus, RecordType};

use crate::expression::Expression;

/// Which lifecycle states a query admits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    Unconsumed,
    Consumed,
    All,
}

impl StatusFilter {
    pub fn admits(&self, status: RecordStatus) -> bool {
        match self {
            Self::Unconsumed => status == RecordStatus::Unconsumed,
            Self::Consumed => status == RecordStatus::Consumed,
            Self::All => true,
        }
    }
}

/// Whether records must be relevant to the local node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relevancy {
    #[default]
    All,
    Relevant,
    NotRelevant,
}

impl Relevancy {
    pub fn admits(&self, relevant: bool) -> bool {
        match self {
            Self::All => true,
            Self::Relevant => relevant,
            Self::NotRelevant => !relevant,
        }
    }
}

/// Structural (non-payload) restrictions. `None` sets are unrestricted.
///
/// The vocabulary is owned by the store; this layer only composes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFilter {
    pub status: StatusFilter,
    /// Record must be assignable to at least one of these.
    pub record_types: Option<BTreeSet<RecordType>>,
    pub references: Option<BTreeSet<RecordRef>>,
    /// Record must have at least one of these participants.
    pub participants: Option<BTreeSet<Party>>,
    pub relevancy: Relevancy,
}

impl StructuralFilter {
    /// No restriction at all, including status.
    pub fn any() -> Self {
        Self {
            status: StatusFilter::All,
            ..Self::default()
        }
    }

    pub fn for_type(record_type: RecordType, status: StatusFilter) -> Self {
        Self {
            status,
            record_types: Some(BTreeSet::from([record_type])),
            ..Self::default()
        }
    }
}

/// Restriction to a set of linear identities, by UUID or external id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearFilter {
    pub ids: BTreeSet<uuid::Uuid>,
    pub external_ids: BTreeSet<String>,
}

impl LinearFilter {
    pub fn from_ids(ids: impl IntoIterator<Item = LinearId>) -> Self {
        let mut filter = Self::default();
        for id in ids {
            filter.ids.insert(id.id);
        }
        filter
    }

    pub fn from_external_ids(external_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: BTreeSet::new(),
            external_ids: external_ids.into_iter().collect(),
        }
    }

    /// A record matches when either its UUID or its external id is listed.
    pub fn admits(&self, linear_id: Option<&LinearId>) -> bool {
        let Some(linear_id) = linear_id else {
            return false;
        };
        self.ids.contains(&linear_id.id)
            || linear_id
                .external_id
                .as_ref()
                .is_some_and(|e| self.external_ids.contains(e))
    }
}

/// Composite, backend-neutral filter.
///
/// Builders seed every nested block with a copy of the structural *base*;
/// structural setters rewrite every structural node so the copies stay in
/// step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Criteria {
    Structural(StructuralFilter),
    Linear(LinearFilter),
    Expression(Expression),
    And(Box<Criteria>, Box<Criteria>),
    Or(Box<Criteria>, Box<Criteria>),
    Not(Box<Criteria>),
}

impl Criteria {
    pub fn for_type(record_type: RecordType, status: StatusFilter) -> Self {
        Self::Structural(StructuralFilter::for_type(record_type, status))
    }

    pub fn and(self, other: Criteria) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Criteria) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// The leftmost structural node, if any.
    pub fn base(&self) -> Option<&StructuralFilter> {
        match self {
            Self::Structural(filter) => Some(filter),
            Self::And(left, _) | Self::Or(left, _) => left.base(),
            _ => None,
        }
    }

    /// Apply `update` to every structural node, including those under `Not`.
    /// Returns how many nodes were visited.
    pub fn for_each_base_mut(&mut self, update: &mut impl FnMut(&mut StructuralFilter)) -> usize {
        match self {
            Self::Structural(filter) => {
                update(filter);
                1
            }
            Self::And(left, right) | Self::Or(left, right) => {
                left.for_each_base_mut(update) + right.for_each_base_mut(update)
            }
            Self::Not(inner) => inner.for_each_base_mut(update),
            Self::Linear(_) | Self::Expression(_) => 0,
        }
    }

    /// Rewrite every structural node, creating an unrestricted one if none
    /// exists.
    pub fn with_base(mut self, mut update: impl FnMut(&mut StructuralFilter)) -> Self {
        if self.for_each_base_mut(&mut update) > 0 {
            return self;
        }
        let mut base = StructuralFilter::any();
        update(&mut base);
        Criteria::Structural(base).and(self)
    }

    /// Status of the base node; `All` when there is none.
    pub fn status(&self) -> StatusFilter {
        self.base().map_or(StatusFilter::All, |b| b.status)
    }
}
