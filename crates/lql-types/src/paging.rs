use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// One page of a query: 1-based page number and page size. Both are
/// non-zero, including after deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PageParts")]
pub struct PageSpec {
    number: u32,
    size: u32,
}

#[derive(Deserialize)]
struct PageParts {
    number: u32,
    size: u32,
}

impl TryFrom<PageParts> for PageSpec {
    type Error = TypeError;

    fn try_from(parts: PageParts) -> Result<Self, Self::Error> {
        Self::new(parts.number, parts.size)
    }
}

impl PageSpec {
    pub fn new(number: u32, size: u32) -> Result<Self, TypeError> {
        if number == 0 || size == 0 {
            return Err(TypeError::InvalidPage { number, size });
        }
        Ok(Self { number, size })
    }

    /// First page of the given size.
    pub fn first(size: u32) -> Result<Self, TypeError> {
        Self::new(1, size)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of records skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            number: self.number.saturating_add(1),
            size: self.size,
        }
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Records returned by one query, plus how many matched in total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub total_available: u64,
}

impl<R> Page<R> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total_available: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Convert every record, stopping at the first error.
    pub fn try_map<U, E>(self, f: impl FnMut(R) -> Result<U, E>) -> Result<Page<U>, E> {
        let records = self.records.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            records,
            total_available: self.total_available,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// What a sort column orders by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    RecordedAt,
    ConsumedAt,
    Reference,
    /// Dotted payload path.
    Field(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortColumn {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Ordered list of sort columns; earlier columns take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub columns: Vec<SortColumn>,
}

impl Sort {
    pub fn by(key: SortKey, direction: SortDirection) -> Self {
        Self {
            columns: vec![SortColumn { key, direction }],
        }
    }

    pub fn then_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.columns.push(SortColumn { key, direction });
        self
    }

    pub fn is_unsorted(&self) -> bool {
        self.columns.is_empty()
    }
}
