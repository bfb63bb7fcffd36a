//! IR Values
//!
//! Every value has exactly one static type. Values are owned by their
//! function and addressed by `ValueId`.

use super::instr::InstrId;
use std::fmt;
use weft_types::TypeId;

/// Function-local value identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Abstract value of a literal constant
///
/// The representation is independent of the constant's type; converting a
/// constant relabels it without touching the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(f64, f64),
    String(String),
    /// The zero value of a pointer, interface, slice, map, chan or func type
    Nil,
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Float(x) => write!(f, "{}", x),
            ConstValue::Complex(re, im) => write!(f, "({}+{}i)", re, im),
            ConstValue::String(s) => write!(f, "{:?}", s),
            ConstValue::Nil => write!(f, "nil"),
        }
    }
}

/// Where a value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Formal parameter (the receiver, if any, comes first)
    Param { index: usize, name: String },
    /// Captured variable of a closure
    FreeVar { index: usize, name: String },
    /// Literal constant
    Const(ConstValue),
    /// Result of an instruction
    Instr(InstrId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub ty: TypeId,
    pub kind: ValueKind,
}

impl ValueData {
    pub fn new(ty: TypeId, kind: ValueKind) -> Self {
        Self { ty, kind }
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, ValueKind::Const(_))
    }

    pub fn as_const(&self) -> Option<&ConstValue> {
        match &self.kind {
            ValueKind::Const(c) => Some(c),
            _ => None,
        }
    }
}
