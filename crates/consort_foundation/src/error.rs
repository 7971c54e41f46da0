//! Error types for the Consort system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every [`ErrorKind`] belongs to one [`ErrorCategory`]: configuration
//! problems are found when schemas and rules are loaded, schema validation
//! problems before an item is evaluated, and evaluation problems while
//! operators run.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// The main error type for Consort operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}{}", render_context(.context))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Replaces the context of this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Records the item the error concerns, unless one is already recorded.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        if ctx.item.is_none() {
            ctx.item = Some(item.into());
        }
        self
    }

    /// Records the pair of items the error concerns, unless already recorded.
    #[must_use]
    pub fn with_pair(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        if ctx.item.is_none() {
            ctx.item = Some(first.into());
            ctx.other_item = Some(second.into());
        }
        self
    }

    /// Records the rule the error occurred in, unless one is already recorded.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        if ctx.rule.is_none() {
            ctx.rule = Some(rule.into());
        }
        self
    }

    /// Records the operator the error occurred in, unless one is already recorded.
    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        if ctx.operator.is_none() {
            ctx.operator = Some(operator.into());
        }
        self
    }

    /// Prepends a frame to the condition path of this error.
    ///
    /// Frames are added while unwinding, so the outermost node ends up first.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.stack.insert(0, frame.into());
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Returns true if this is a schema validation error.
    #[must_use]
    pub fn is_schema_validation(&self) -> bool {
        self.category() == ErrorCategory::SchemaValidation
    }

    /// Returns true if this is an evaluation error.
    #[must_use]
    pub fn is_evaluation(&self) -> bool {
        self.category() == ErrorCategory::Evaluation
    }

    /// Creates an unknown operator error.
    #[must_use]
    pub fn unknown_operator(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperator { name: name.into() })
    }

    /// Creates a malformed condition error.
    #[must_use]
    pub fn malformed_condition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedCondition(message.into()))
    }

    /// Creates a malformed schema document error.
    #[must_use]
    pub fn malformed_schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedSchema(message.into()))
    }

    /// Creates an invalid operator parameter error.
    #[must_use]
    pub fn invalid_parameter(
        operator: impl Into<String>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::InvalidParameter {
            operator: operator.into(),
            parameter: parameter.into(),
            message: message.into(),
        })
    }

    /// Creates an invalid cluster size bounds error.
    #[must_use]
    pub fn invalid_cluster_bounds(min: usize, max: usize) -> Self {
        Self::new(ErrorKind::InvalidClusterBounds { min, max })
    }

    /// Creates an unknown field error.
    #[must_use]
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownField {
            field: field.into(),
        })
    }

    /// Creates a schema violation error for a dimension.
    #[must_use]
    pub fn schema_violation(dimension: impl Into<String>, violation: Violation) -> Self {
        Self::new(ErrorKind::SchemaViolation {
            dimension: dimension.into(),
            violation,
        })
    }

    /// Creates a runtime type mismatch error.
    #[must_use]
    pub fn type_mismatch(field: impl Into<String>, expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            field: field.into(),
            expected,
            actual,
        })
    }

    /// Creates an empty item set error.
    #[must_use]
    pub fn empty_item_set(operator: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyItemSet {
            operator: operator.into(),
        })
    }
}

fn render_context(context: &Option<ErrorContext>) -> String {
    match context {
        Some(ctx) => format!(" ({ctx})"),
        None => String::new(),
    }
}

/// Broad error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad schema, rule, or engine configuration.
    Configuration,
    /// An item's attributes do not satisfy its schema.
    SchemaValidation,
    /// An operator could not be evaluated against the bound items.
    Evaluation,
    /// A bug in Consort.
    Internal,
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// No operator with this name is registered.
    #[error("unknown operator: {name}")]
    UnknownOperator {
        /// The operator name that was looked up.
        name: String,
    },

    /// A condition document does not follow the condition grammar.
    #[error("malformed condition: {0}")]
    MalformedCondition(String),

    /// A schema document is not a valid schema declaration.
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// An operator parameter is missing or has the wrong shape.
    #[error("invalid parameter `{parameter}` for operator {operator}: {message}")]
    InvalidParameter {
        /// The operator being configured.
        operator: String,
        /// The offending parameter name.
        parameter: String,
        /// What is wrong with it.
        message: String,
    },

    /// Minimum cluster size exceeds the maximum.
    #[error("invalid cluster bounds: min_cluster_size {min} > max_cluster_size {max}")]
    InvalidClusterBounds {
        /// The configured minimum.
        min: usize,
        /// The configured maximum.
        max: usize,
    },

    /// A rule references a field the schema does not declare.
    #[error("unknown field: {field}")]
    UnknownField {
        /// The field name.
        field: String,
    },

    /// An operator is applied to a dimension of an unsuitable kind.
    #[error("operator {operator} cannot use field {field}: {message}")]
    IncompatibleField {
        /// The operator name.
        operator: String,
        /// The field name.
        field: String,
        /// Why the field does not fit.
        message: String,
    },

    /// A schema declares the same dimension twice.
    #[error("duplicate dimension: {0}")]
    DuplicateDimension(String),

    /// A rule set declares the same rule name twice.
    #[error("duplicate rule: {0}")]
    DuplicateRule(String),

    /// A catalog contains the same item id twice.
    #[error("duplicate item: {0}")]
    DuplicateItem(String),

    /// An item id does not exist in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// An item attribute fails its dimension's checks.
    #[error("schema violation on dimension {dimension}: {violation}")]
    SchemaViolation {
        /// The offending dimension (or attribute) name.
        dimension: String,
        /// What was violated.
        violation: Violation,
    },

    /// A field required by an operator is absent from every bound item.
    #[error("missing field: {field}")]
    MissingField {
        /// The field name.
        field: String,
    },

    /// A value has the wrong runtime type for an operator.
    #[error("type mismatch on field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The field name.
        field: String,
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// An aggregate operator was invoked on an empty item set.
    #[error("operator {operator} evaluated on an empty item set")]
    EmptyItemSet {
        /// The operator name.
        operator: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the category of this error kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownOperator { .. }
            | Self::MalformedCondition(_)
            | Self::MalformedSchema(_)
            | Self::InvalidParameter { .. }
            | Self::InvalidClusterBounds { .. }
            | Self::UnknownField { .. }
            | Self::IncompatibleField { .. }
            | Self::DuplicateDimension(_)
            | Self::DuplicateRule(_)
            | Self::DuplicateItem(_)
            | Self::UnknownItem(_) => ErrorCategory::Configuration,
            Self::SchemaViolation { .. } => ErrorCategory::SchemaValidation,
            Self::MissingField { .. } | Self::TypeMismatch { .. } | Self::EmptyItemSet { .. } => {
                ErrorCategory::Evaluation
            }
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// A single schema check that an attribute value failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A required dimension has no value.
    Missing,
    /// The value has the wrong type.
    WrongType {
        /// The type the dimension declares.
        expected: Type,
        /// The type that was found.
        actual: Type,
    },
    /// A numeric value is below the dimension minimum.
    BelowMinimum {
        /// The offending value.
        value: f64,
        /// The declared minimum.
        min: f64,
    },
    /// A numeric value is above the dimension maximum.
    AboveMaximum {
        /// The offending value.
        value: f64,
        /// The declared maximum.
        max: f64,
    },
    /// An enum value is not one of the allowed values.
    NotAllowed {
        /// The offending value.
        value: String,
        /// The allowed values.
        allowed: Vec<String>,
    },
    /// A list element has the wrong type.
    ListItem {
        /// Position of the element in the list.
        index: usize,
        /// The declared element type.
        expected: Type,
        /// The type that was found.
        actual: Type,
    },
    /// A coverage-layer entry is malformed.
    CoverageShape {
        /// Position of the entry in the coverage list.
        index: usize,
        /// What is wrong with it.
        message: String,
    },
    /// A coverage part is outside an enforced vocabulary.
    UnknownPart {
        /// The part name.
        part: String,
    },
    /// The attribute is not declared by the schema.
    UndeclaredAttribute,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "required value is missing"),
            Self::WrongType { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Self::BelowMinimum { value, min } => write!(f, "{value} is below minimum {min}"),
            Self::AboveMaximum { value, max } => write!(f, "{value} is above maximum {max}"),
            Self::NotAllowed { value, allowed } => {
                write!(f, "{value:?} is not one of [{}]", allowed.join(", "))
            }
            Self::ListItem {
                index,
                expected,
                actual,
            } => write!(f, "list item {index}: expected {expected}, got {actual}"),
            Self::CoverageShape { index, message } => {
                write!(f, "coverage entry {index}: {message}")
            }
            Self::UnknownPart { part } => write!(f, "unknown coverage part {part:?}"),
            Self::UndeclaredAttribute => write!(f, "attribute is not declared by the schema"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Item the error concerns.
    pub item: Option<String>,
    /// Second item, for pairwise evaluation.
    pub other_item: Option<String>,
    /// Rule being evaluated or compiled.
    pub rule: Option<String>,
    /// Operator being evaluated or compiled.
    pub operator: Option<String>,
    /// Path of condition nodes leading to the error.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the item.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Sets the second item.
    #[must_use]
    pub fn with_other_item(mut self, item: impl Into<String>) -> Self {
        self.other_item = Some(item.into());
        self
    }

    /// Sets the rule.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Sets the operator.
    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        match (&self.item, &self.other_item) {
            (Some(a), Some(b)) => parts.push(format!("items {a}, {b}")),
            (Some(a), None) => parts.push(format!("item {a}")),
            _ => {}
        }
        if let Some(rule) = &self.rule {
            parts.push(format!("rule {rule}"));
        }
        if let Some(op) = &self.operator {
            parts.push(format!("operator {op}"));
        }
        if !self.stack.is_empty() {
            parts.push(format!("at {}", self.stack.join(" > ")));
        }
        write!(f, "{}", parts.join(", "))
    }
}
