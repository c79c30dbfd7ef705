//! Query predicates and statement generation.
//!
//! Filters are built with [`Field`] and combined into a [`Predicate`].
//! Every operand becomes a bound parameter; only validated, quoted
//! identifiers and fixed operators are written into the SQL text.

mod filter;
mod statement;

pub use filter::{Comparison, Field, Filter};
pub use statement::Statement;

/// What a query selects.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    /// Every row.
    #[default]
    All,
    /// Rows matching all filters. An empty list selects every row.
    Filters(Vec<Filter>),
    /// A trusted WHERE clause body, inserted verbatim.
    Raw(String),
}

impl Predicate {
    /// Wraps a trusted WHERE clause body.
    ///
    /// The text is not validated or escaped. Only pass clauses written by
    /// the program itself, never user input.
    pub fn raw(clause: impl Into<String>) -> Self {
        Predicate::Raw(clause.into())
    }

    /// Adds a filter, turning `All` into a single-filter conjunction.
    ///
    /// Raw clauses cannot be combined with filters and are returned as is.
    pub fn and(self, filter: Filter) -> Self {
        match self {
            Predicate::All => Predicate::Filters(vec![filter]),
            Predicate::Filters(mut filters) => {
                filters.push(filter);
                Predicate::Filters(filters)
            }
            raw @ Predicate::Raw(_) => raw,
        }
    }

    /// Returns the structured filters; empty for `All` and raw clauses.
    pub fn filters(&self) -> &[Filter] {
        match self {
            Predicate::Filters(filters) => filters,
            Predicate::All | Predicate::Raw(_) => &[],
        }
    }

    /// Returns true if the predicate selects every row.
    pub fn is_all(&self) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Filters(filters) => filters.is_empty(),
            Predicate::Raw(_) => false,
        }
    }
}

impl From<Filter> for Predicate {
    fn from(filter: Filter) -> Self {
        Predicate::Filters(vec![filter])
    }
}

impl From<Vec<Filter>> for Predicate {
    fn from(filters: Vec<Filter>) -> Self {
        Predicate::Filters(filters)
    }
}

impl<const N: usize> From<[Filter; N]> for Predicate {
    fn from(filters: [Filter; N]) -> Self {
        Predicate::Filters(filters.into())
    }
}

impl From<&str> for Predicate {
    fn from(clause: &str) -> Self {
        Predicate::raw(clause)
    }
}

impl From<String> for Predicate {
    fn from(clause: String) -> Self {
        Predicate::Raw(clause)
    }
}
