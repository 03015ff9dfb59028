use std::fmt;
use std::sync::Arc;

use lql_backend::QueryBackend;
use lql_types::{
    RecordRef, RecordState, StoredRecord, TransactionId, TypeError, VersionedRecord,
};

/// Which slot of a draft transaction a lookup reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    /// Records the draft consumes.
    Input,
    /// Records the draft produces.
    Output,
    /// Records the draft reads without consuming.
    Reference,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// A transaction under construction. Lookups against it never touch a
/// backend.
#[derive(Clone, Debug)]
pub struct DraftTransaction {
    id: TransactionId,
    inputs: Vec<StoredRecord>,
    outputs: Vec<StoredRecord>,
    references: Vec<StoredRecord>,
}

impl Default for DraftTransaction {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftTransaction {
    pub fn new() -> Self {
        Self::with_id(TransactionId::ephemeral())
    }

    pub fn with_id(id: TransactionId) -> Self {
        Self {
            id,
            inputs: Vec::new(),
            outputs: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn add_input(&mut self, record: StoredRecord) -> &mut Self {
        self.inputs.push(record);
        self
    }

    pub fn add_reference(&mut self, record: StoredRecord) -> &mut Self {
        self.references.push(record);
        self
    }

    /// Add an output and return the reference it will carry once committed.
    pub fn add_output<T: RecordState>(
        &mut self,
        back_reference: Option<RecordRef>,
        state: &T,
    ) -> Result<RecordRef, TypeError> {
        let reference = RecordRef::new(self.id, self.outputs.len() as u32);
        self.outputs
            .push(StoredRecord::from_state(reference, back_reference, state)?);
        Ok(reference)
    }

    pub fn records(&self, position: Position) -> &[StoredRecord] {
        match position {
            Position::Input => &self.inputs,
            Position::Output => &self.outputs,
            Position::Reference => &self.references,
        }
    }

    /// Records at `position` assignable to `T`, decoded.
    pub fn candidates<T: RecordState>(
        &self,
        position: Position,
    ) -> Result<Vec<VersionedRecord<T>>, TypeError> {
        self.records(position)
            .iter()
            .filter(|r| r.is_assignable_to(&T::RECORD_TYPE))
            .map(StoredRecord::decode::<T>)
            .collect()
    }
}

/// Where a resolution runs.
#[derive(Clone)]
pub enum QueryContext<'a> {
    /// A client talking to a vault over the wire.
    Remote(Arc<dyn QueryBackend>),
    /// Code running on the node hosting the vault.
    Host(Arc<dyn QueryBackend>),
    /// A transaction being built, scoped to one position.
    Draft(&'a DraftTransaction, Position),
}

impl QueryContext<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Host(_) => "host",
            Self::Draft(..) => "draft",
        }
    }
}
