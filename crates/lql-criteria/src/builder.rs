use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use lql_types::{LinearId, PageSpec, Party, RecordRef, RecordType, Sort};

use crate::criteria::{Criteria, LinearFilter, Relevancy, StatusFilter, StructuralFilter};
use crate::error::ProjectionError;
use crate::expression::Expression;

/// Immutable output of a [`QueryBuilder`]: what to match, which page, and in
/// which order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub criteria: Criteria,
    pub paging: PageSpec,
    pub sort: Sort,
}

impl QuerySpec {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            paging: PageSpec::default(),
            sort: Sort::default(),
        }
    }
}

/// Mutable accumulator for one query.
///
/// Starts from a base structural filter scoped to a record type. Nested
/// `and` / `or` / `not` blocks get a fresh builder seeded with the parent's
/// current base, so a nested block never widens the record-type scope.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    criteria: Criteria,
    paging: PageSpec,
    sort: Sort,
}

impl QueryBuilder {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            paging: PageSpec::default(),
            sort: Sort::default(),
        }
    }

    pub fn for_type(record_type: RecordType, status: StatusFilter) -> Self {
        Self::new(Criteria::for_type(record_type, status))
    }

    /// The criteria accumulated so far.
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    // ---- Structural filters (last write wins, across nested blocks too) ----

    pub fn status(&mut self, status: StatusFilter) -> &mut Self {
        self.update_base(|b| b.status = status)
    }

    pub fn record_types(&mut self, types: impl IntoIterator<Item = RecordType>) -> &mut Self {
        let types: BTreeSet<RecordType> = types.into_iter().collect();
        self.update_base(|b| b.record_types = Some(types.clone()))
    }

    pub fn references(&mut self, references: impl IntoIterator<Item = RecordRef>) -> &mut Self {
        let references: BTreeSet<RecordRef> = references.into_iter().collect();
        self.update_base(|b| b.references = Some(references.clone()))
    }

    pub fn participants(&mut self, participants: impl IntoIterator<Item = Party>) -> &mut Self {
        let participants: BTreeSet<Party> = participants.into_iter().collect();
        self.update_base(|b| b.participants = Some(participants.clone()))
    }

    pub fn relevancy(&mut self, relevancy: Relevancy) -> &mut Self {
        self.update_base(|b| b.relevancy = relevancy)
    }

    // ---- Linear identities (always AND-combined) ----

    pub fn linear_ids(&mut self, ids: impl IntoIterator<Item = LinearId>) -> &mut Self {
        self.combine_and(Criteria::Linear(LinearFilter::from_ids(ids)))
    }

    pub fn external_ids(&mut self, external_ids: impl IntoIterator<Item = String>) -> &mut Self {
        self.combine_and(Criteria::Linear(LinearFilter::from_external_ids(
            external_ids,
        )))
    }

    // ---- Expressions ----

    /// AND one compiled expression into the criteria.
    pub fn filter(&mut self, expression: Expression) -> &mut Self {
        self.combine_and(Criteria::Expression(expression))
    }

    /// Drop absent expressions, fold the rest with AND, and merge the result.
    /// Leaves the criteria untouched when nothing remains.
    pub fn with_expressions(
        &mut self,
        expressions: impl IntoIterator<Item = Option<Expression>>,
    ) -> &mut Self {
        match Expression::all(expressions.into_iter().flatten()) {
            Some(folded) => self.filter(folded),
            None => self,
        }
    }

    /// Like [`with_expressions`](Self::with_expressions) but folds with OR.
    pub fn with_any_expressions(
        &mut self,
        expressions: impl IntoIterator<Item = Option<Expression>>,
    ) -> &mut Self {
        match Expression::any(expressions.into_iter().flatten()) {
            Some(folded) => self.filter(folded),
            None => self,
        }
    }

    // ---- Nested blocks ----

    pub fn and(&mut self, block: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        let nested = self.nested(block);
        self.combine_and(nested)
    }

    pub fn or(&mut self, block: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        let nested = self.nested(block);
        let current = self.take_criteria();
        self.criteria = current.or(nested);
        self
    }

    /// AND the negation of the nested block.
    pub fn not(&mut self, block: impl FnOnce(&mut QueryBuilder)) -> &mut Self {
        let nested = self.nested(block);
        self.combine_and(nested.negate())
    }

    /// Fallible `and`: the block may compile predicates.
    pub fn try_and(
        &mut self,
        block: impl FnOnce(&mut QueryBuilder) -> Result<(), ProjectionError>,
    ) -> Result<&mut Self, ProjectionError> {
        let nested = self.try_nested(block)?;
        Ok(self.combine_and(nested))
    }

    /// Fallible `or`: the block may compile predicates.
    pub fn try_or(
        &mut self,
        block: impl FnOnce(&mut QueryBuilder) -> Result<(), ProjectionError>,
    ) -> Result<&mut Self, ProjectionError> {
        let nested = self.try_nested(block)?;
        let current = self.take_criteria();
        self.criteria = current.or(nested);
        Ok(self)
    }

    // ---- Paging and sort ----

    pub fn page(&mut self, paging: PageSpec) -> &mut Self {
        self.paging = paging;
        self
    }

    pub fn sort(&mut self, sort: Sort) -> &mut Self {
        self.sort = sort;
        self
    }

    pub fn build(&self) -> QuerySpec {
        QuerySpec {
            criteria: self.criteria.clone(),
            paging: self.paging,
            sort: self.sort.clone(),
        }
    }

    fn update_base(&mut self, update: impl FnMut(&mut StructuralFilter)) -> &mut Self {
        let current = self.take_criteria();
        self.criteria = current.with_base(update);
        self
    }

    fn combine_and(&mut self, other: Criteria) -> &mut Self {
        let current = self.take_criteria();
        self.criteria = current.and(other);
        self
    }

    fn take_criteria(&mut self) -> Criteria {
        std::mem::replace(
            &mut self.criteria,
            Criteria::Structural(StructuralFilter::any()),
        )
    }

    fn seed(&self) -> QueryBuilder {
        let base = self
            .criteria
            .base()
            .cloned()
            .unwrap_or_else(StructuralFilter::any);
        QueryBuilder::new(Criteria::Structural(base))
    }

    fn nested(&self, block: impl FnOnce(&mut QueryBuilder)) -> Criteria {
        let mut nested = self.seed();
        block(&mut nested);
        nested.criteria
    }

    fn try_nested(
        &self,
        block: impl FnOnce(&mut QueryBuilder) -> Result<(), ProjectionError>,
    ) -> Result<Criteria, ProjectionError> {
        let mut nested = self.seed();
        block(&mut nested)?;
        Ok(nested.criteria)
    }
}
