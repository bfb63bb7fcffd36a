//! Basic Blocks and Control Flow
//!
//! Basic blocks are sequences of instructions with a single entry point
//! and a single exit point (the terminator). Edges are recorded on both
//! ends: `succs` mirrors the terminator and `preds` lists every block whose
//! terminator targets this one.

use super::instr::InstrId;
use super::value::ValueId;

/// Basic block identifier, the block's index in its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasicBlockId(pub u32);

impl BasicBlockId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BasicBlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A basic block: sequence of instructions with single entry and exit
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique identifier for this block
    pub id: BasicBlockId,
    /// Label for debugging ("entry", "recover", ...)
    pub label: Option<String>,
    /// Instructions in this block (excluding terminator)
    pub instrs: Vec<InstrId>,
    /// How this block exits
    pub terminator: Terminator,
    pub preds: Vec<BasicBlockId>,
    pub succs: Vec<BasicBlockId>,
}

impl BasicBlock {
    /// Create a new empty basic block
    pub fn new(id: BasicBlockId) -> Self {
        Self {
            id,
            label: None,
            instrs: Vec::new(),
            terminator: Terminator::Unreachable,
            preds: Vec::new(),
            succs: Vec::new(),
        }
    }

    /// Create a new basic block with a label
    pub fn with_label(id: BasicBlockId, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(id)
        }
    }

    /// Check if this block is terminated (closed for appending)
    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator, Terminator::Unreachable)
    }

    /// Get the number of instructions (excluding terminator)
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}

/// Control flow terminator (ends a basic block)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Unconditional jump to target block
    Jump(BasicBlockId),

    /// Two-way branch on a boolean value
    If {
        cond: ValueId,
        then_block: BasicBlockId,
        else_block: BasicBlockId,
    },

    /// Return from function with the full result list
    Return(Vec<ValueId>),

    /// Unreachable (placeholder before terminator is set)
    Unreachable,
}

impl Terminator {
    /// Get all successor blocks
    pub fn successors(&self) -> Vec<BasicBlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::If {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Unreachable => vec![],
        }
    }

    /// Values read by this terminator
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Terminator::If { cond, .. } => vec![*cond],
            Terminator::Return(results) => results.clone(),
            Terminator::Jump(_) | Terminator::Unreachable => vec![],
        }
    }
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Jump(target) => write!(f, "jump {}", target),
            Terminator::If {
                cond,
                then_block,
                else_block,
            } => write!(f, "if {} then {} else {}", cond, then_block, else_block),
            Terminator::Return(results) => {
                if results.is_empty() {
                    write!(f, "return")
                } else {
                    let results: Vec<String> = results.iter().map(|v| v.to_string()).collect();
                    write!(f, "return {}", results.join(", "))
                }
            }
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}
