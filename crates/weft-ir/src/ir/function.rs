//! IR Functions
//!
//! A function owns its blocks, instructions and values in flat arenas;
//! everything inside refers to everything else by index. Once handed to
//! the [`Program`](crate::Program) a function is frozen.

use super::block::{BasicBlock, BasicBlockId, Terminator};
use super::instr::{InstrId, Instruction};
use super::value::{ValueData, ValueId};
use crate::error::{BuildError, BuildResult};
use weft_types::{FuncId, Pos, Selection, TypeId};

/// An IR function
#[derive(Debug, Clone)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Signature type, including the receiver for methods
    pub signature: TypeId,
    /// Description of a synthesized function, `None` for source functions
    pub synthetic: Option<String>,
    pub pos: Pos,
    /// The method object this function implements, if any
    pub object: Option<FuncId>,
    /// The selection a promotion wrapper was built for
    pub method: Option<Selection>,
    /// Parameter values (receiver first)
    pub params: Vec<ValueId>,
    /// Captured variables, bound when a closure is created
    pub free_vars: Vec<ValueId>,
    /// Stack allocations (`Alloc` results)
    pub locals: Vec<ValueId>,
    /// Addresses of named result variables
    pub named_results: Vec<ValueId>,
    /// Basic blocks; `blocks[i].id == BasicBlockId(i)`
    pub blocks: Vec<BasicBlock>,
    /// Landing block reached after a recovered panic
    pub recover: Option<BasicBlockId>,
    values: Vec<ValueData>,
    instrs: Vec<Instruction>,
}

impl Function {
    /// Create a new function with no blocks
    pub fn new(name: impl Into<String>, signature: TypeId) -> Self {
        Self {
            name: name.into(),
            signature,
            synthetic: None,
            pos: Pos::NONE,
            object: None,
            method: None,
            params: Vec::new(),
            free_vars: Vec::new(),
            locals: Vec::new(),
            named_results: Vec::new(),
            blocks: Vec::new(),
            recover: None,
            values: Vec::new(),
            instrs: Vec::new(),
        }
    }

    /// The entry block is always the first one created
    pub fn entry(&self) -> BasicBlockId {
        BasicBlockId(0)
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic.is_some()
    }

    /// Create and add a new empty block
    pub fn add_block(&mut self, label: Option<&str>) -> BasicBlockId {
        let id = BasicBlockId(self.blocks.len() as u32);
        let block = match label {
            Some(label) => BasicBlock::with_label(id, label),
            None => BasicBlock::new(id),
        };
        self.blocks.push(block);
        id
    }

    /// Get a block by ID
    pub fn block(&self, id: BasicBlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub(crate) fn block_mut(&mut self, id: BasicBlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub(crate) fn add_value(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(data);
        id
    }

    pub(crate) fn add_instr(&mut self, instr: Instruction) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        let block = instr.block;
        self.instrs.push(instr);
        self.block_mut(block).instrs.push(id);
        id
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    pub fn value_type(&self, id: ValueId) -> TypeId {
        self.value(id).ty
    }

    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.0 as usize]
    }

    /// Instructions of a block in order
    pub fn block_instrs(&self, id: BasicBlockId) -> impl Iterator<Item = &Instruction> + '_ {
        self.block(id).instrs.iter().map(move |&i| self.instr(i))
    }

    /// The instruction defining `value`, if it is an instruction result
    pub fn defining_instr(&self, value: ValueId) -> Option<&Instruction> {
        match self.value(value).kind {
            super::value::ValueKind::Instr(id) => Some(self.instr(id)),
            _ => None,
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Compute the total number of instructions across all blocks
    pub fn instruction_count(&self) -> usize {
        self.instrs.len()
    }

    /// Validate the function structure
    pub fn validate(&self) -> BuildResult<()> {
        let malformed = |message: String| BuildError::Malformed {
            function: self.name.clone(),
            message,
        };

        if self.blocks.is_empty() {
            return Err(malformed("function has no blocks".to_string()));
        }

        for (i, block) in self.blocks.iter().enumerate() {
            if block.id.index() != i {
                return Err(malformed(format!("block {} stored at index {}", block.id, i)));
            }
            if !block.is_terminated() {
                return Err(BuildError::Unterminated {
                    function: self.name.clone(),
                    block: block.id.to_string(),
                });
            }

            let succs = block.terminator.successors();
            if succs != block.succs {
                return Err(malformed(format!(
                    "block {} successor list does not match its terminator",
                    block.id
                )));
            }
            for succ in succs {
                let Some(target) = self.blocks.get(succ.index()) else {
                    return Err(malformed(format!(
                        "block {} references non-existent successor {}",
                        block.id, succ
                    )));
                };
                if !target.preds.contains(&block.id) {
                    return Err(malformed(format!(
                        "block {} is missing predecessor {}",
                        succ, block.id
                    )));
                }
            }
            for pred in &block.preds {
                let has_edge = self
                    .blocks
                    .get(pred.index())
                    .is_some_and(|p| p.succs.contains(&block.id));
                if !has_edge {
                    return Err(malformed(format!(
                        "block {} lists {} as predecessor without an edge",
                        block.id, pred
                    )));
                }
            }

            for &instr in &block.instrs {
                let owner = self.instr(instr).block;
                if owner != block.id {
                    return Err(malformed(format!(
                        "instruction {} listed in {} but placed in {}",
                        instr, block.id, owner
                    )));
                }
            }
        }

        if let Some(recover) = self.recover {
            if !matches!(self.block(recover).terminator, Terminator::Return(_)) {
                return Err(malformed("recover block does not return".to_string()));
            }
        }

        Ok(())
    }
}
