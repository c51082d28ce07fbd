//! Thin Compiler - Intermediate Representation
//!
//! This crate defines the typed instruction tree shared by the frontend and
//! both backends:
//! - `types` - the two-valued type system and call signatures
//! - `kind` - the closed set of node kinds with their fixed result type and arity
//! - `node` - the instruction tree and its constructors
//! - `module` - functions, imports and the module with its data segment
//! - `validate` - the structural/type checker every module passes before codegen
//! - `display` - a readable s-expression listing of a module

pub mod display;
pub mod kind;
pub mod module;
pub mod node;
pub mod types;
pub mod validate;

pub use kind::{Arity, Kind};
pub use module::{Function, Import, Module};
pub use node::Node;
pub use types::{Signature, Type};
pub use validate::{validate, Mapping, ValidationError};
