use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::identity::{LinearId, Party};
use crate::reference::RecordRef;

/// Explicit descriptor of a record type.
///
/// Record types are declared by [`RecordState::RECORD_TYPE`] and carried by
/// every stored record together with its supertypes, so assignability is a
/// set-membership check rather than runtime reflection.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType(Cow<'static, str>);

impl RecordType {
    /// Root of every lineage. A query bound to `ANY` sees all records.
    pub const ANY: RecordType = RecordType::new("*");

    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Descriptor with a runtime-built name.
    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordType({})", self.0)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static ANY_TYPE: RecordType = RecordType::ANY;

/// Lifecycle status of a stored record version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Current version; not yet superseded.
    Unconsumed,
    /// Superseded by a later transaction.
    Consumed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconsumed => write!(f, "Unconsumed"),
            Self::Consumed => write!(f, "Consumed"),
        }
    }
}

/// A typed record payload.
///
/// Supertypes are other record types this one may be viewed as. A supertype
/// view is itself a `RecordState` whose fields are a subset of the concrete
/// payload, so decoding a concrete payload as its supertype simply ignores the
/// extra fields.
pub trait RecordState:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const RECORD_TYPE: RecordType;

    fn supertypes() -> Vec<RecordType> {
        Vec::new()
    }

    /// The record type followed by its supertypes, always ending in
    /// [`RecordType::ANY`].
    fn lineage() -> Vec<RecordType> {
        let mut lineage = vec![Self::RECORD_TYPE];
        for supertype in Self::supertypes() {
            if !lineage.contains(&supertype) {
                lineage.push(supertype);
            }
        }
        if !lineage.contains(&RecordType::ANY) {
            lineage.push(RecordType::ANY);
        }
        lineage
    }

    fn participants(&self) -> Vec<Party> {
        Vec::new()
    }

    fn linear_id(&self) -> Option<LinearId> {
        None
    }
}

/// Untyped view that every record is assignable to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyRecord(pub Value);

impl RecordState for AnyRecord {
    const RECORD_TYPE: RecordType = RecordType::ANY;
}

/// A record as held by a store: payload kept as JSON, type carried as lineage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub reference: RecordRef,
    pub back_reference: Option<RecordRef>,
    /// Concrete type first, then supertypes, then [`RecordType::ANY`].
    pub lineage: Vec<RecordType>,
    #[serde(with = "json_text")]
    pub payload: Value,
    pub participants: Vec<Party>,
    pub linear_id: Option<LinearId>,
    pub relevant: bool,
    pub status: RecordStatus,
    pub recorded_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    /// Build an unconsumed record from a typed state.
    pub fn from_state<T: RecordState>(
        reference: RecordRef,
        back_reference: Option<RecordRef>,
        state: &T,
    ) -> Result<Self, TypeError> {
        let payload =
            serde_json::to_value(state).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Ok(Self {
            reference,
            back_reference,
            lineage: T::lineage(),
            payload,
            participants: state.participants(),
            linear_id: state.linear_id(),
            relevant: true,
            status: RecordStatus::Unconsumed,
            recorded_at: Utc::now(),
            consumed_at: None,
        })
    }

    /// The concrete record type.
    pub fn record_type(&self) -> &RecordType {
        self.lineage.first().unwrap_or(&ANY_TYPE)
    }

    /// Exact match or supertype match.
    pub fn is_assignable_to(&self, record_type: &RecordType) -> bool {
        *record_type == RecordType::ANY || self.lineage.contains(record_type)
    }

    /// Look up a payload value by dotted path. Numeric segments index arrays.
    pub fn field(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.payload, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Decode into a typed view, failing if the type is not assignable.
    pub fn decode<T: RecordState>(&self) -> Result<VersionedRecord<T>, TypeError> {
        if !self.is_assignable_to(&T::RECORD_TYPE) {
            return Err(TypeError::NotAssignable {
                expected: T::RECORD_TYPE.to_string(),
                found: self.record_type().to_string(),
            });
        }
        let state: T = serde_json::from_value(self.payload.clone())
            .map_err(|e| TypeError::Serialization(e.to_string()))?;
        Ok(VersionedRecord {
            reference: self.reference,
            back_reference: self.back_reference,
            state,
            record_type: self.record_type().clone(),
            participants: self.participants.clone(),
            linear_id: self.linear_id.clone(),
            status: self.status,
            recorded_at: self.recorded_at,
            consumed_at: self.consumed_at,
        })
    }
}

/// Typed view of one immutable record version.
///
/// Equality and hashing use the reference alone: a reference identifies
/// exactly one immutable version.
#[derive(Clone, Debug)]
pub struct VersionedRecord<T> {
    pub reference: RecordRef,
    pub back_reference: Option<RecordRef>,
    pub state: T,
    /// The concrete type of the underlying record, which may be a subtype of `T`.
    pub record_type: RecordType,
    pub participants: Vec<Party>,
    pub linear_id: Option<LinearId>,
    pub status: RecordStatus,
    pub recorded_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl<T> VersionedRecord<T> {
    pub fn is_consumed(&self) -> bool {
        self.status == RecordStatus::Consumed
    }
}

impl<T> PartialEq for VersionedRecord<T> {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl<T> Eq for VersionedRecord<T> {}

impl<T> Hash for VersionedRecord<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

/// Payloads travel as JSON text so that non-self-describing codecs
/// (bincode) can carry them.
mod json_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        let text = String::deserialize(deserializer)?;
        serde_json::from_str(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TransactionId;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Named {
        name: String,
    }

    impl RecordState for Named {
        const RECORD_TYPE: RecordType = RecordType::new("test.Named");
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        name: String,
        balance: i64,
        owner: Party,
    }

    impl RecordState for Account {
        const RECORD_TYPE: RecordType = RecordType::new("test.Account");

        fn supertypes() -> Vec<RecordType> {
            vec![Named::RECORD_TYPE]
        }

        fn participants(&self) -> Vec<Party> {
            vec![self.owner.clone()]
        }
    }

    fn account_record() -> StoredRecord {
        let reference = RecordRef::new(TransactionId::from_bytes(b"acct"), 0);
        let account = Account {
            name: "savings".into(),
            balance: 40,
            owner: Party::new("alice"),
        };
        StoredRecord::from_state(reference, None, &account).unwrap()
    }

    #[test]
    fn lineage_ends_in_any() {
        assert_eq!(
            Account::lineage(),
            vec![Account::RECORD_TYPE, Named::RECORD_TYPE, RecordType::ANY]
        );
        assert_eq!(AnyRecord::lineage(), vec![RecordType::ANY]);
    }

    #[test]
    fn from_state_captures_participants() {
        let record = account_record();
        assert_eq!(record.participants, vec![Party::new("alice")]);
        assert_eq!(record.status, RecordStatus::Unconsumed);
        assert_eq!(record.record_type(), &Account::RECORD_TYPE);
    }

    #[test]
    fn decode_as_supertype_ignores_extra_fields() {
        let record = account_record();
        let named = record.decode::<Named>().unwrap();
        assert_eq!(named.state.name, "savings");
        assert_eq!(named.record_type, Account::RECORD_TYPE);
    }

    #[test]
    fn decode_as_unrelated_type_fails() {
        #[derive(Clone, Debug, Serialize, Deserialize)]
        struct Other;
        impl RecordState for Other {
            const RECORD_TYPE: RecordType = RecordType::new("test.Other");
        }

        let error = account_record().decode::<Other>().unwrap_err();
        assert!(matches!(error, TypeError::NotAssignable { .. }));
    }

    #[test]
    fn any_record_sees_raw_payload() {
        let any = account_record().decode::<AnyRecord>().unwrap();
        assert_eq!(any.state.0["balance"], Value::from(40));
    }

    #[test]
    fn field_lookup_follows_dotted_paths() {
        let mut record = account_record();
        record.payload = serde_json::json!({
            "terms": { "rate": 5, "tags": ["a", "b"] }
        });
        assert_eq!(record.field("terms.rate"), Some(&Value::from(5)));
        assert_eq!(record.field("terms.tags.1"), Some(&Value::from("b")));
        assert_eq!(record.field("terms.missing"), None);
        assert_eq!(record.field("terms.rate.deeper"), None);
    }

    #[test]
    fn versioned_equality_is_by_reference() {
        let record = account_record();
        let a = record.decode::<Account>().unwrap();
        let mut b = a.clone();
        b.state.balance = 1_000;
        assert_eq!(a, b);
    }

    #[test]
    fn stored_record_survives_bincode() {
        let record = account_record();
        let bytes = bincode::serialize(&record).unwrap();
        let back: StoredRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, record);
    }
}
