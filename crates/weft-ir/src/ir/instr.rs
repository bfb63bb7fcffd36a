//! IR Instructions
//!
//! Non-terminating instructions of the SSA form. Block terminators live in
//! [`Terminator`](super::block::Terminator).

use super::block::BasicBlockId;
use super::value::ValueId;
use std::fmt;
use weft_types::{FuncId, Pos, TypeId};

/// Program-wide function identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// Function-local instruction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(pub u32);

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    AndNot,
    ShiftLeft,
    ShiftRight,

    // Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logical (short-circuit, lowered to control flow)
    And,
    Or,
}

impl BinaryOp {
    /// Check if this is a shift operator
    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::ShiftLeft | BinaryOp::ShiftRight)
    }

    /// Check if this is an eagerly evaluated arithmetic or bitwise operator
    /// other than a shift
    pub fn is_eager_arith(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::AndNot
        )
    }

    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    /// Check if this is a logical operator
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::AndNot => "&^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// Call target
///
/// Dispatch is decided by the executor: a direct callee is a known
/// function, an invoke selects the method dynamically from the interface
/// value `recv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    Direct(FunctionId),
    Invoke { recv: ValueId, method: FuncId },
}

/// Target and arguments of a call
///
/// For a direct call to a method the receiver is the first argument. For
/// an invoke the receiver is carried by the callee and `args` holds only
/// the formal parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallCommon {
    pub callee: Callee,
    pub args: Vec<ValueId>,
}

impl CallCommon {
    pub fn direct(func: FunctionId, args: Vec<ValueId>) -> Self {
        Self {
            callee: Callee::Direct(func),
            args,
        }
    }

    pub fn invoke(recv: ValueId, method: FuncId, args: Vec<ValueId>) -> Self {
        Self {
            callee: Callee::Invoke { recv, method },
            args,
        }
    }

    pub fn is_invoke(&self) -> bool {
        matches!(self.callee, Callee::Invoke { .. })
    }
}

/// Debugger events marked by `Trace` instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    Statement,
    Expression,
    Call,
    Return,
    Panic,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceEvent::Statement => "STATEMENT",
            TraceEvent::Expression => "EXPRESSION",
            TraceEvent::Call => "CALL",
            TraceEvent::Return => "RETURN",
            TraceEvent::Panic => "PANIC",
        };
        write!(f, "{}", s)
    }
}

/// Instruction payload
#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    /// Allocate a zeroed variable; the result is a pointer to it
    Alloc { heap: bool },
    Load { addr: ValueId },
    Store { addr: ValueId, val: ValueId },
    BinOp { op: BinaryOp, x: ValueId, y: ValueId },
    /// Address of field `field` of the struct `*x` points to
    FieldAddr { x: ValueId, field: usize },
    /// Field `field` of the struct value `x`
    Field { x: ValueId, field: usize },
    /// Relabel between types with the same representation
    ChangeType { x: ValueId },
    /// Reinterpret one interface value as another interface type
    ChangeInterface { x: ValueId },
    /// Representation-changing conversion
    Convert { x: ValueId },
    /// Box a concrete value in an interface
    MakeInterface { x: ValueId },
    Call(CallCommon),
    Extract { tuple: ValueId, index: usize },
    /// `x.(T)`; with `comma_ok` the result is a `(value, ok)` tuple
    TypeAssert {
        x: ValueId,
        asserted: TypeId,
        comma_ok: bool,
    },
    /// Debug-only marker relating a value to a source position
    DebugRef { x: ValueId, pos: Pos, is_addr: bool },
    /// Debug-only marker for the debugger's stepping events
    Trace {
        event: TraceEvent,
        start: Pos,
        end: Pos,
    },
}

impl InstrKind {
    /// Short mnemonic, used by the pretty printer and in tests
    pub fn mnemonic(&self) -> &'static str {
        match self {
            InstrKind::Alloc { heap: true } => "new",
            InstrKind::Alloc { heap: false } => "local",
            InstrKind::Load { .. } => "load",
            InstrKind::Store { .. } => "store",
            InstrKind::BinOp { .. } => "binop",
            InstrKind::FieldAddr { .. } => "fieldaddr",
            InstrKind::Field { .. } => "field",
            InstrKind::ChangeType { .. } => "changetype",
            InstrKind::ChangeInterface { .. } => "changeinterface",
            InstrKind::Convert { .. } => "convert",
            InstrKind::MakeInterface { .. } => "makeinterface",
            InstrKind::Call(call) if call.is_invoke() => "invoke",
            InstrKind::Call(_) => "call",
            InstrKind::Extract { .. } => "extract",
            InstrKind::TypeAssert { .. } => "typeassert",
            InstrKind::DebugRef { .. } => "debugref",
            InstrKind::Trace { .. } => "trace",
        }
    }

    /// Values read by this instruction
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            InstrKind::Alloc { .. } | InstrKind::Trace { .. } => vec![],
            InstrKind::Load { addr } => vec![*addr],
            InstrKind::Store { addr, val } => vec![*addr, *val],
            InstrKind::BinOp { x, y, .. } => vec![*x, *y],
            InstrKind::FieldAddr { x, .. }
            | InstrKind::Field { x, .. }
            | InstrKind::ChangeType { x }
            | InstrKind::ChangeInterface { x }
            | InstrKind::Convert { x }
            | InstrKind::MakeInterface { x }
            | InstrKind::TypeAssert { x, .. }
            | InstrKind::DebugRef { x, .. } => vec![*x],
            InstrKind::Extract { tuple, .. } => vec![*tuple],
            InstrKind::Call(call) => {
                let mut ops = Vec::with_capacity(call.args.len() + 1);
                if let Callee::Invoke { recv, .. } = &call.callee {
                    ops.push(*recv);
                }
                ops.extend_from_slice(&call.args);
                ops
            }
        }
    }
}

/// An instruction placed in a block
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub block: BasicBlockId,
    pub kind: InstrKind,
    /// The value defined by this instruction, if any
    pub result: Option<ValueId>,
    pub pos: Pos,
}
