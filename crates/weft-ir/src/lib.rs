//! Weft IR Construction
//!
//! Turns the typed program model into SSA-form functions and synthesizes
//! the wrapper functions that make every method access resolve to one
//! concrete, callable function:
//!
//! - `ir`: the function/block/instruction/value graph
//! - `builder`: the function-local instruction emitter
//! - `program`: the shared context holding functions and method caches
//! - method-set resolution and wrapper synthesis, as methods on `Program`

pub mod builder;
pub mod error;
pub mod ir;
pub mod program;

mod method_sets;
mod wrappers;

pub use builder::FunctionBuilder;
pub use error::{BuildError, BuildResult};
pub use ir::{
    BasicBlock, BasicBlockId, BinaryOp, CallCommon, Callee, ConstValue, Function, FunctionId,
    InstrId, InstrKind, Instruction, PrettyPrint, Terminator, TraceEvent, ValueData, ValueId,
    ValueKind,
};
pub use program::{BuildMode, MethodSet, Program};
