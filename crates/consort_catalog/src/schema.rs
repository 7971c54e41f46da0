//! Schema definitions for catalog items.
//!
//! A schema is an ordered set of uniquely named [`Dimension`]s. Item
//! attributes are checked dimension by dimension, in declaration order, so the
//! first reported violation is stable.

use consort_foundation::{Error, ErrorKind, Result, Violation};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::item::{Attributes, Item};

/// What happens to attributes the schema does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnknownAttributes {
    /// Undeclared attributes fail validation.
    #[default]
    Reject,
    /// Undeclared attributes are carried along unchecked.
    Allow,
}

/// A coverage part outside an advisory vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advisory {
    /// Dimension holding the coverage value.
    pub dimension: String,
    /// The unknown part.
    pub part: String,
}

/// Schema definition for the items of a catalog.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "SchemaDecl", into = "SchemaDecl")
)]
pub struct Schema {
    name: String,
    version: String,
    dimensions: Vec<Dimension>,
    unknown_attributes: UnknownAttributes,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dimensions: Vec::new(),
            unknown_attributes: UnknownAttributes::default(),
        }
    }

    /// Creates a schema from a list of dimensions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if two dimensions share a name.
    pub fn from_dimensions(
        name: impl Into<String>,
        version: impl Into<String>,
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> Result<Self> {
        dimensions
            .into_iter()
            .try_fold(Self::new(name, version), Self::with_dimension)
    }

    /// Adds a dimension.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a dimension with the same name exists.
    pub fn with_dimension(mut self, dimension: Dimension) -> Result<Self> {
        if self.dimension(&dimension.name).is_some() {
            return Err(Error::new(ErrorKind::DuplicateDimension(
                dimension.name.to_string(),
            )));
        }
        self.dimensions.push(dimension);
        Ok(self)
    }

    /// Sets the policy for undeclared attributes.
    #[must_use]
    pub fn with_unknown_attributes(mut self, policy: UnknownAttributes) -> Self {
        self.unknown_attributes = policy;
        self
    }

    /// Returns the schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the dimensions in declaration order.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Returns the dimension with the given name.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| &*d.name == name)
    }

    /// Returns the policy for undeclared attributes.
    #[must_use]
    pub fn unknown_attributes(&self) -> UnknownAttributes {
        self.unknown_attributes
    }

    /// Validates an attribute mapping.
    ///
    /// Coverage parts outside an advisory vocabulary are logged, not rejected.
    ///
    /// # Errors
    ///
    /// Returns a schema validation error naming the first offending dimension.
    pub fn validate_item(&self, attributes: &Attributes) -> Result<()> {
        if let Some(first) = self.violations(attributes).into_iter().next() {
            return Err(first);
        }
        for advisory in self.advisories(attributes) {
            tracing::warn!(
                schema = %self.name,
                dimension = %advisory.dimension,
                part = %advisory.part,
                "coverage part outside advisory vocabulary"
            );
        }
        Ok(())
    }

    /// Validates an item, recording its id in the error context.
    ///
    /// # Errors
    ///
    /// Returns a schema validation error naming the item and dimension.
    pub fn validate(&self, item: &Item) -> Result<()> {
        self.validate_item(&item.attributes)
            .map_err(|e| e.with_item(item.id.as_str()))
    }

    /// Collects every violation of an attribute mapping.
    #[must_use]
    pub fn violations(&self, attributes: &Attributes) -> Vec<Error> {
        let mut errors = Vec::new();

        for dim in &self.dimensions {
            match attributes.get(&*dim.name).filter(|v| !v.is_nil()) {
                None if dim.required => {
                    errors.push(Error::schema_violation(&*dim.name, Violation::Missing));
                }
                None => {}
                Some(value) => {
                    if let Err(violation) = dim.check(value) {
                        errors.push(Error::schema_violation(&*dim.name, violation));
                    }
                }
            }
        }

        if self.unknown_attributes == UnknownAttributes::Reject {
            for key in attributes.keys() {
                if self.dimension(key).is_none() {
                    errors.push(Error::schema_violation(
                        &**key,
                        Violation::UndeclaredAttribute,
                    ));
                }
            }
        }

        errors
    }

    /// Lists coverage parts outside advisory vocabularies.
    #[must_use]
    pub fn advisories(&self, attributes: &Attributes) -> Vec<Advisory> {
        self.dimensions
            .iter()
            .filter_map(|dim| attributes.get(&*dim.name).map(|value| (dim, value)))
            .flat_map(|(dim, value)| {
                dim.advisory_misses(value)
                    .into_iter()
                    .map(move |part| Advisory {
                        dimension: dim.name.to_string(),
                        part,
                    })
            })
            .collect()
    }
}

/// Document form of a [`Schema`]. Unknown keys are rejected, here and in
/// each dimension.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    /// Schema name.
    pub name: String,
    /// Schema version.
    #[serde(default)]
    pub version: String,
    /// Dimensions in declaration order.
    pub dimensions: Vec<Dimension>,
    /// Policy for undeclared attributes.
    #[serde(default)]
    pub unknown_attributes: UnknownAttributes,
}

#[cfg(feature = "serde")]
impl Schema {
    /// Deserializes and builds a schema document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a document that does not match
    /// [`SchemaDecl`] (including misspelled keys and constraints that do not
    /// fit a dimension's type) or that declares a dimension twice.
    pub fn from_json(doc: &serde_json::Value) -> Result<Self> {
        let decl = SchemaDecl::deserialize(doc)
            .map_err(|e| Error::malformed_schema(format!("invalid schema document: {e}")))?;
        Self::try_from(decl)
    }
}

#[cfg(feature = "serde")]
impl TryFrom<SchemaDecl> for Schema {
    type Error = Error;

    fn try_from(decl: SchemaDecl) -> Result<Self> {
        Ok(Self::from_dimensions(decl.name, decl.version, decl.dimensions)?
            .with_unknown_attributes(decl.unknown_attributes))
    }
}

#[cfg(feature = "serde")]
impl From<Schema> for SchemaDecl {
    fn from(schema: Schema) -> Self {
        Self {
            name: schema.name,
            version: schema.version,
            dimensions: schema.dimensions,
            unknown_attributes: schema.unknown_attributes,
        }
    }
}
