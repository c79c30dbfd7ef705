//! Field comparisons.

use std::fmt;

use docstore_common::Value;

/// A comparison applied to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `field = value`
    Equals,
    /// `field > value`
    GreaterThan,
    /// `field < value`
    LessThan,
    /// `field >= value`
    GreaterOrEqual,
    /// `field <= value`
    LessOrEqual,
    /// The field is set and not an empty string.
    Exists,
}

impl Comparison {
    /// Returns the SQL operator, or `None` for [`Comparison::Exists`].
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Comparison::Equals => Some("="),
            Comparison::GreaterThan => Some(">"),
            Comparison::LessThan => Some("<"),
            Comparison::GreaterOrEqual => Some(">="),
            Comparison::LessOrEqual => Some("<="),
            Comparison::Exists => None,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator().unwrap_or("exists"))
    }
}

/// Names a field to compare.
///
/// Each comparison method produces a new [`Filter`] and leaves the field
/// untouched, so one `Field` can seed several filters.
///
/// ```
/// use docstore_client::{Comparison, Field};
///
/// let price = Field::new("price");
/// let low = price.greater_or_equal(10);
/// let high = price.less_than(20);
/// assert_eq!(low.comparison(), Comparison::GreaterOrEqual);
/// assert_eq!(high.field(), "price");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
}

impl Field {
    /// Creates a field reference. The name is validated when the filter runs.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matches rows where the field equals `value`.
    pub fn equals(&self, value: impl Into<Value>) -> Filter {
        self.compare(Comparison::Equals, Some(value.into()))
    }

    /// Matches rows where the field is greater than `value`.
    pub fn greater_than(&self, value: impl Into<Value>) -> Filter {
        self.compare(Comparison::GreaterThan, Some(value.into()))
    }

    /// Matches rows where the field is less than `value`.
    pub fn less_than(&self, value: impl Into<Value>) -> Filter {
        self.compare(Comparison::LessThan, Some(value.into()))
    }

    /// Matches rows where the field is greater than or equal to `value`.
    pub fn greater_or_equal(&self, value: impl Into<Value>) -> Filter {
        self.compare(Comparison::GreaterOrEqual, Some(value.into()))
    }

    /// Matches rows where the field is less than or equal to `value`.
    pub fn less_or_equal(&self, value: impl Into<Value>) -> Filter {
        self.compare(Comparison::LessOrEqual, Some(value.into()))
    }

    /// Matches rows where the field is not null and not the empty string.
    pub fn exists(&self) -> Filter {
        self.compare(Comparison::Exists, None)
    }

    fn compare(&self, comparison: Comparison, operand: Option<Value>) -> Filter {
        Filter {
            field: self.name.clone(),
            comparison,
            operand,
        }
    }
}

/// An immutable condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    comparison: Comparison,
    operand: Option<Value>,
}

impl Filter {
    /// Returns the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the comparison.
    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// Returns the operand; `None` for existence checks.
    pub fn operand(&self) -> Option<&Value> {
        self.operand.as_ref()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Some(operand) => write!(f, "{} {} {}", self.field, self.comparison, operand),
            None => write!(f, "{} {}", self.field, self.comparison),
        }
    }
}
