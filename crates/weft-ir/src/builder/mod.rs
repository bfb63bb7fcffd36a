//! Function builder
//!
//! Function-local construction state: the function being built, the block
//! currently open for appending, and the handful of memoized values.
//! Instruction emission helpers live in [`emit`].

pub mod emit;

use crate::error::{BuildError, BuildResult};
use crate::ir::{
    BasicBlockId, ConstValue, Function, InstrId, InstrKind, Instruction, Terminator, ValueData,
    ValueId, ValueKind,
};
use crate::program::Program;
use weft_types::{BasicKind, FuncId, Pos, Selection, TypeContext, TypeId};

/// Builds the body of a single function
///
/// At most one block is open at a time. Terminating it closes it; emitting
/// while no block is open is a builder bug and panics.
pub struct FunctionBuilder<'p> {
    prog: &'p Program,
    func: Function,
    current: Option<BasicBlockId>,
    true_const: Option<ValueId>,
}

impl<'p> FunctionBuilder<'p> {
    /// Start a function whose entry block is open
    pub fn new(prog: &'p Program, name: impl Into<String>, signature: TypeId) -> Self {
        let mut func = Function::new(name, signature);
        let entry = func.add_block(Some("entry"));
        Self {
            prog,
            func,
            current: Some(entry),
            true_const: None,
        }
    }

    pub fn prog(&self) -> &'p Program {
        self.prog
    }

    pub fn types(&self) -> &'p TypeContext {
        self.prog.types()
    }

    /// The function under construction
    pub fn func(&self) -> &Function {
        &self.func
    }

    pub fn set_synthetic(&mut self, description: impl Into<String>) {
        self.func.synthetic = Some(description.into());
    }

    pub fn set_pos(&mut self, pos: Pos) {
        self.func.pos = pos;
    }

    pub fn set_object(&mut self, obj: FuncId) {
        self.func.object = Some(obj);
    }

    pub fn set_method(&mut self, sel: Selection) {
        self.func.method = Some(sel);
    }

    pub fn value_type(&self, v: ValueId) -> TypeId {
        self.func.value_type(v)
    }

    // ------------------------------------------------------------------
    // Parameters and locals
    // ------------------------------------------------------------------

    /// Append a formal parameter
    pub fn add_param(&mut self, name: impl Into<String>, ty: TypeId) -> ValueId {
        let index = self.func.params.len();
        let v = self.func.add_value(ValueData::new(
            ty,
            ValueKind::Param {
                index,
                name: name.into(),
            },
        ));
        self.func.params.push(v);
        v
    }

    /// Append a captured variable
    pub fn add_free_var(&mut self, name: impl Into<String>, ty: TypeId) -> ValueId {
        let index = self.func.free_vars.len();
        let v = self.func.add_value(ValueData::new(
            ty,
            ValueKind::FreeVar {
                index,
                name: name.into(),
            },
        ));
        self.func.free_vars.push(v);
        v
    }

    /// Create the formal parameters of the function's signature
    ///
    /// The receiver is not included. A variadic final parameter is
    /// materialized as a slice of its element type.
    pub fn create_params(&mut self) -> Vec<ValueId> {
        let types = self.types();
        let sig = types.signature_of(self.func.signature);
        let last = sig.params.len().saturating_sub(1);
        sig.params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let ty = if sig.variadic && i == last {
                    types.slice(p.ty)
                } else {
                    p.ty
                };
                self.add_param(p.name.clone(), ty)
            })
            .collect()
    }

    /// Allocate a stack variable of type `ty`, returning its address
    pub fn add_local(&mut self, ty: TypeId) -> ValueId {
        let ptr = self.types().pointer(ty);
        let addr = self.emit_value(InstrKind::Alloc { heap: false }, ptr);
        self.func.locals.push(addr);
        addr
    }

    /// Copy a parameter into a fresh local, returning the local's address
    pub fn spill_param(&mut self, param: ValueId) -> ValueId {
        let addr = self.add_local(self.value_type(param));
        self.store(addr, param);
        addr
    }

    /// Give every named result its own local so the recover path can
    /// reload it
    ///
    /// Repeated calls return the locals of the first.
    pub fn declare_named_results(&mut self) -> Vec<ValueId> {
        if !self.func.named_results.is_empty() {
            return self.func.named_results.clone();
        }
        let sig = self.types().signature_of(self.func.signature);
        for result in sig.results.iter().filter(|r| !r.name.is_empty()) {
            let addr = self.add_local(result.ty);
            self.func.named_results.push(addr);
        }
        self.func.named_results.clone()
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Create a block without opening it
    pub fn new_block(&mut self, label: &str) -> BasicBlockId {
        self.func.add_block(Some(label))
    }

    /// Open `block` for appending
    ///
    /// # Panics
    ///
    /// Panics if the block is already terminated.
    pub fn set_current(&mut self, block: BasicBlockId) {
        assert!(
            !self.func.block(block).is_terminated(),
            "block {} is already closed",
            block
        );
        self.current = Some(block);
    }

    pub fn current_block(&self) -> Option<BasicBlockId> {
        self.current
    }

    fn open_block(&self) -> BasicBlockId {
        self.current.expect("emission with no open block")
    }

    // ------------------------------------------------------------------
    // Raw emission
    // ------------------------------------------------------------------

    fn push(&mut self, kind: InstrKind, result_ty: Option<TypeId>, pos: Pos) -> (InstrId, Option<ValueId>) {
        let block = self.open_block();
        let instr_id = InstrId(self.func.instruction_count() as u32);
        let result = result_ty.map(|ty| {
            self.func
                .add_value(ValueData::new(ty, ValueKind::Instr(instr_id)))
        });
        let id = self.func.add_instr(Instruction {
            block,
            kind,
            result,
            pos,
        });
        (id, result)
    }

    /// Append an instruction that defines no value
    pub fn emit_instr(&mut self, kind: InstrKind) -> InstrId {
        self.push(kind, None, Pos::NONE).0
    }

    /// Append an instruction defining a value of type `ty`
    pub fn emit_value(&mut self, kind: InstrKind, ty: TypeId) -> ValueId {
        self.emit_value_at(kind, ty, Pos::NONE)
    }

    pub fn emit_value_at(&mut self, kind: InstrKind, ty: TypeId, pos: Pos) -> ValueId {
        match self.push(kind, Some(ty), pos).1 {
            Some(v) => v,
            None => unreachable!("push with a result type defines a value"),
        }
    }

    /// Close the open block with `term` and record its edges
    pub fn terminate(&mut self, term: Terminator) {
        let block = self.open_block();
        let succs = term.successors();
        for &succ in &succs {
            self.func.block_mut(succ).preds.push(block);
        }
        let b = self.func.block_mut(block);
        b.succs = succs;
        b.terminator = term;
        self.current = None;
    }

    // ------------------------------------------------------------------
    // Constants
    // ------------------------------------------------------------------

    pub fn const_value(&mut self, value: ConstValue, ty: TypeId) -> ValueId {
        self.func.add_value(ValueData::new(ty, ValueKind::Const(value)))
    }

    /// The shared boolean `true` constant of this function
    pub fn const_true(&mut self) -> ValueId {
        if let Some(v) = self.true_const {
            return v;
        }
        let ty = self.types().basic(BasicKind::Bool);
        let v = self.const_value(ConstValue::Bool(true), ty);
        self.true_const = Some(v);
        v
    }

    pub(crate) fn is_true_const(&self, v: ValueId) -> bool {
        self.true_const == Some(v)
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    /// Freeze the function
    ///
    /// Fails if a block is still open, or, when sanity checking is enabled,
    /// if the function is structurally malformed.
    pub fn finish(self) -> BuildResult<Function> {
        if let Some(open) = self.current {
            return Err(BuildError::Unterminated {
                function: self.func.name.clone(),
                block: open.to_string(),
            });
        }
        if self.prog.mode().sanity_check {
            self.func.validate()?;
        }
        tracing::trace!(
            function = %self.func.name,
            blocks = self.func.block_count(),
            instrs = self.func.instruction_count(),
            "finished function"
        );
        Ok(self.func)
    }
}
