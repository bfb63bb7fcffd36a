//! Intermediate Representation
//!
//! SSA-form functions produced by the builder: arenas of blocks,
//! instructions and values addressed by index.

pub mod block;
pub mod function;
pub mod instr;
pub mod pretty;
pub mod value;

pub use block::{BasicBlock, BasicBlockId, Terminator};
pub use function::Function;
pub use instr::{
    BinaryOp, CallCommon, Callee, FunctionId, InstrId, InstrKind, Instruction, TraceEvent,
};
pub use pretty::PrettyPrint;
pub use value::{ConstValue, ValueData, ValueId, ValueKind};
