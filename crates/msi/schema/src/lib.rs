//! # msi-schema
//!
//! Schema model for installer package databases. An installer database is
//! a set of relational tables whose columns carry a semantic category,
//! nullability, primary-key membership and optional foreign-key targets.
//!
//! The decompiler never parses the binary package itself; an external
//! extraction step hands it a [`TableSet`] (definitions plus rows) that this
//! crate models.
//!
//! ## Key Types
//!
//! - [`ColumnDefinition`] — One column, with its [`ColumnCategory`] and key metadata
//! - [`TableDefinition`] — Ordered columns of one table
//! - [`SchemaSet`] — Every table definition known for a run
//! - [`Row`] / [`FieldValue`] — One tuple of a table
//! - [`TableSet`] — The full table dump of one package
//! - [`catalog`] — Built-in definitions for the tables the decompiler understands

#![deny(unsafe_code)]

pub mod catalog;
pub mod column;
pub mod error;
pub mod row;
pub mod table;

pub use column::{ColumnCategory, ColumnDefinition};
pub use error::{SchemaError, SchemaResult};
pub use row::{FieldValue, Row, Table, TableSet, KEY_DELIMITER};
pub use table::{SchemaSet, TableDefinition};
