//! Column definitions.
//!
//! A column carries a semantic category, nullability, primary-key
//! membership and an optional foreign-key reference. A foreign key may name
//! several target tables: the value must match a primary key in any one of
//! them.

use serde::{Deserialize, Serialize};

// ── Column Category ─────────────────────────────────────────────────

/// Semantic category of a column value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnCategory {
    Text,
    UpperCase,
    LowerCase,
    Integer,
    DoubleInteger,
    TimeDate,
    Identifier,
    Property,
    Filename,
    WildCardFilename,
    Path,
    Paths,
    AnyPath,
    DefaultDir,
    RegPath,
    Formatted,
    FormattedSddl,
    Template,
    Condition,
    Guid,
    Version,
    Language,
    Binary,
    CustomSource,
    Cabinet,
    Shortcut,
    Unknown,
}

impl ColumnCategory {
    /// Whether values of this category are stored as integers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::DoubleInteger | Self::TimeDate)
    }
}

impl std::fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::UpperCase => "upper-case",
            Self::LowerCase => "lower-case",
            Self::Integer => "integer",
            Self::DoubleInteger => "double-integer",
            Self::TimeDate => "time-date",
            Self::Identifier => "identifier",
            Self::Property => "property",
            Self::Filename => "filename",
            Self::WildCardFilename => "wildcard-filename",
            Self::Path => "path",
            Self::Paths => "paths",
            Self::AnyPath => "any-path",
            Self::DefaultDir => "default-dir",
            Self::RegPath => "reg-path",
            Self::Formatted => "formatted",
            Self::FormattedSddl => "formatted-sddl",
            Self::Template => "template",
            Self::Condition => "condition",
            Self::Guid => "guid",
            Self::Version => "version",
            Self::Language => "language",
            Self::Binary => "binary",
            Self::CustomSource => "custom-source",
            Self::Cabinet => "cabinet",
            Self::Shortcut => "shortcut",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

// ── Column Definition ───────────────────────────────────────────────

/// Definition of a single column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub category: ColumnCategory,
    pub nullable: bool,
    pub primary_key: bool,
    /// Tables this column may reference. Empty when the column is not a
    /// foreign key.
    #[serde(default)]
    pub key_tables: Vec<String>,
    /// 1-based position of the referenced column in the target table.
    #[serde(default)]
    pub key_column: Option<u8>,
}

impl ColumnDefinition {
    /// A non-null, non-key column.
    pub fn new(name: &str, category: ColumnCategory) -> Self {
        Self {
            name: name.into(),
            category,
            nullable: false,
            primary_key: false,
            key_tables: Vec::new(),
            key_column: None,
        }
    }

    /// Mark the column as part of the primary key.
    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allow null values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declare a foreign key into one or more tables (first column).
    pub fn references(mut self, tables: &[&str]) -> Self {
        self.key_tables = tables.iter().map(|t| t.to_string()).collect();
        self.key_column = Some(1);
        self
    }

    /// Override the referenced column position.
    pub fn at_key_column(mut self, position: u8) -> Self {
        self.key_column = Some(position);
        self
    }

    /// Whether this column declares any foreign-key target.
    pub fn is_foreign_key(&self) -> bool {
        !self.key_tables.is_empty()
    }
}
