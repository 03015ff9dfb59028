use std::marker::PhantomData;

use lql_criteria::{Field, Predicate, ProjectionError, QueryBuilder, StatusFilter};
use lql_types::{is_pointing_to, Chained, RecordRef, RecordState, VersionedRecord};

use crate::resolver::{PluralResolvable, Resolver, SingularResolvable};

/// The record a given record evolved from.
pub struct PredecessorOf<T> {
    back_reference: Option<RecordRef>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: RecordState> PredecessorOf<T> {
    pub fn new(record: &impl Chained) -> Self {
        Self::of_back_reference(record.back_reference())
    }

    pub fn of_back_reference(back_reference: Option<RecordRef>) -> Self {
        Self {
            back_reference,
            _marker: PhantomData,
        }
    }
}

impl<T: RecordState> Resolver<T> for PredecessorOf<T> {
    fn criteria(&self, builder: &mut QueryBuilder) -> Result<(), ProjectionError> {
        // A genesis record has no predecessor: an empty reference set.
        builder.references(self.back_reference);
        Ok(())
    }

    fn is_pointing_to(&self, candidate: &VersionedRecord<T>) -> bool {
        self.back_reference == Some(candidate.reference)
    }

    fn status(&self) -> StatusFilter {
        StatusFilter::All
    }
}

impl<T: RecordState> SingularResolvable<T> for PredecessorOf<T> {}

/// Every record that evolved directly from a given record.
pub struct SuccessorsOf<T> {
    target: RecordRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: RecordState> SuccessorsOf<T> {
    pub fn new(record: &impl Chained) -> Self {
        Self::of_reference(record.reference())
    }

    pub fn of_reference(target: RecordRef) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }
}

impl<T: RecordState> Resolver<T> for SuccessorsOf<T> {
    fn criteria(&self, builder: &mut QueryBuilder) -> Result<(), ProjectionError> {
        builder.filter(Field::<RecordRef>::back_reference().matches(&Predicate::equal_to(self.target))?);
        Ok(())
    }

    fn is_pointing_to(&self, candidate: &VersionedRecord<T>) -> bool {
        is_pointing_to(candidate, &self.target)
    }

    fn status(&self) -> StatusFilter {
        StatusFilter::All
    }
}

impl<T: RecordState> PluralResolvable<T> for SuccessorsOf<T> {}
