//! Filter expression system
//!
//! Parses filter expressions into a [`RuleNode`] tree, compiles the tree
//! against entity field metadata into a [`Predicate`], and renders the
//! predicate as a SQL WHERE fragment.
//!
//! ## Usage
//!
//! ```no_run
//! use filterable::data::filters::{
//!     EntitySchema, FieldMetadata, FieldType, FilterCompiler, GuesserChain, SqlParams, parse,
//! };
//! use filterable::data::sql::Backend;
//!
//! let schema = EntitySchema::new("ticket")
//!     .with_field(FieldMetadata::new("priority", FieldType::Integer));
//! let guessers = GuesserChain::default();
//!
//! let tree = parse("priority >= 3").unwrap();
//! let predicate = FilterCompiler::new(&schema, &guessers).compile(&tree).unwrap();
//! let mut params = SqlParams::default();
//! let sql = predicate.to_sql(Backend::Postgres.dialect(), &mut params);
//! ```

mod ast;
mod builder;
mod compiler;
mod error;
mod guess;
mod lexer;
mod metadata;
mod parser;

pub use ast::{Combinator, Group, Leaf, Operand, OperandShape, OperatorKind, RuleNode, Value};
pub use builder::SqlParams;
pub use compiler::{Condition, FilterCompiler, FormSummary, Predicate};
pub use error::FilterError;
pub use guess::{
    FieldTypeGuesser, FilterFormConfig, FormGuesser, GuesserChain, MetadataGuesser,
    OperatorGuesser,
};
pub use metadata::{EntitySchema, FieldMetadata, FieldMetadataProvider, FieldType};
pub use parser::{
    MAX_CONDITIONS, MAX_DEPTH, MAX_EXPRESSION_BYTES, ParseLimits, parse, parse_json,
    parse_json_str, parse_json_with_limits, parse_with_limits,
};
