//! Weft Type Model
//!
//! Interned type representation, named declarations, method objects and
//! method-set enumeration, as consumed by the IR builder.

pub mod context;
pub mod method_set;
pub mod ty;

pub use context::TypeContext;
pub use method_set::Selection;
pub use ty::{
    BasicKind, ChanDir, Field, FuncId, FuncObj, InterfaceType, NamedType, Pos, Signature,
    StructType, Type, TypeId, Var,
};
