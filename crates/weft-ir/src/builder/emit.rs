//! Instruction emission helpers
//!
//! Each helper appends to the open block and applies the implicit
//! conversions that keep operand types exactly matched.

use super::FunctionBuilder;
use crate::error::{BuildError, BuildResult};
use crate::ir::{
    BasicBlockId, BinaryOp, CallCommon, ConstValue, InstrId, InstrKind, Terminator, TraceEvent,
    ValueId,
};
use weft_types::{BasicKind, Field, Pos, Type, TypeContext, TypeId, Var};

/// Whether converting between the two underlying types is a pure relabel
fn is_value_preserving(types: &TypeContext, ut_src: TypeId, ut_dst: TypeId) -> bool {
    if types.is_identical(ut_src, ut_dst) {
        return true;
    }
    matches!(
        (&*types.get(ut_src), &*types.get(ut_dst)),
        (Type::Chan { .. }, Type::Chan { .. })
            | (Type::Pointer(_), Type::Pointer(_))
            | (Type::Signature(_), Type::Signature(_))
    )
}

impl FunctionBuilder<'_> {
    /// `*addr`; the result has the pointee type
    pub fn load(&mut self, addr: ValueId) -> ValueId {
        let types = self.types();
        let addr_ty = self.value_type(addr);
        debug_assert!(types.is_pointer(addr_ty), "load from non-pointer");
        self.emit_value(InstrKind::Load { addr }, types.deref(addr_ty))
    }

    /// `*addr = val`, converting `val` to the pointee type first
    pub fn store(&mut self, addr: ValueId, val: ValueId) -> InstrId {
        let elem = self.types().deref(self.value_type(addr));
        let val = self.convert(val, elem);
        self.emit_instr(InstrKind::Store { addr, val })
    }

    /// Heap-allocate a zeroed `ty`, returning `*ty`
    pub fn new_heap(&mut self, ty: TypeId) -> ValueId {
        let ptr = self.types().pointer(ty);
        self.emit_value(InstrKind::Alloc { heap: true }, ptr)
    }

    /// Eager arithmetic, bitwise or shift operation with result type `ty`
    ///
    /// Shift counts that are not already unsigned are widened to `uint64`.
    /// Comparisons and the logical operators are not accepted here.
    pub fn arith(&mut self, op: BinaryOp, x: ValueId, y: ValueId, ty: TypeId) -> BuildResult<ValueId> {
        let types = self.types();
        let (x, y) = if op.is_shift() {
            let x = self.convert(x, ty);
            let y_ty = self.value_type(y);
            let y = if types.is_basic(y_ty, |k| !k.is_unsigned()) {
                self.convert(y, types.basic(BasicKind::Uint64))
            } else {
                y
            };
            (x, y)
        } else if op.is_eager_arith() {
            (self.convert(x, ty), self.convert(y, ty))
        } else {
            return Err(BuildError::IllegalArithOp { op: op.to_string() });
        };
        Ok(self.emit_value(InstrKind::BinOp { op, x, y }, ty))
    }

    /// Comparison `x op y` with a boolean result
    ///
    /// `true == b` (either way round) for a boolean `b` yields `b` itself.
    pub fn compare(&mut self, op: BinaryOp, x: ValueId, y: ValueId) -> ValueId {
        let types = self.types();
        let (xt, yt) = (self.value_type(x), self.value_type(y));

        if op == BinaryOp::Equal {
            if self.is_true_const(x) && types.is_basic(yt, BasicKind::is_boolean) {
                return y;
            }
            if self.is_true_const(y) && types.is_basic(xt, BasicKind::is_boolean) {
                return x;
            }
        }

        let (uxt, uyt) = (types.underlying(xt), types.underlying(yt));
        let (mut x, mut y) = (x, y);
        if types.is_identical(uxt, uyt) {
            // no conversion necessary
        } else if types.is_interface(uxt) {
            y = self.convert(y, xt);
        } else if types.is_interface(uyt) {
            x = self.convert(x, yt);
        } else if self.func.value(x).is_const() {
            x = self.convert(x, yt);
        } else if self.func.value(y).is_const() {
            y = self.convert(y, xt);
        }
        // Otherwise (e.g. channels of different direction) compare as is.

        self.emit_value(InstrKind::BinOp { op, x, y }, types.bool_type())
    }

    /// Convert `val` to type `target`
    pub fn convert(&mut self, val: ValueId, target: TypeId) -> ValueId {
        let types = self.types();
        let src = self.value_type(val);
        if types.is_identical(src, target) {
            return val;
        }

        let (ut_src, ut_dst) = (types.underlying(src), types.underlying(target));
        if is_value_preserving(types, ut_src, ut_dst) {
            return self.emit_value(InstrKind::ChangeType { x: val }, target);
        }

        if types.is_interface(ut_dst) {
            if types.is_interface(ut_src) {
                return self.emit_value(InstrKind::ChangeInterface { x: val }, target);
            }
            if types.get(src).as_basic() == Some(BasicKind::UntypedNil) {
                return self.const_value(ConstValue::Nil, target);
            }
            let mut val = val;
            if types.is_basic(ut_src, BasicKind::is_untyped) {
                val = self.convert(val, types.default_type(ut_src));
            }
            self.prog().need_methods_of(self.value_type(val));
            return self.emit_value(InstrKind::MakeInterface { x: val }, target);
        }

        if let Some(c) = self.func.value(val).as_const().cloned() {
            return self.const_value(c, target);
        }

        self.emit_value(InstrKind::Convert { x: val }, target)
    }

    fn struct_field(&self, v: ValueId, index: usize) -> BuildResult<Field> {
        let types = self.types();
        let ty = self.value_type(v);
        if types.underlying_type(types.deref(ty)).as_struct().is_none() {
            return Err(BuildError::NotAStruct {
                ty: types.type_string(ty),
            });
        }
        types
            .struct_field(ty, index)
            .ok_or_else(|| BuildError::NoSuchField {
                ty: types.type_string(ty),
                index,
            })
    }

    /// Apply the implicit field selections of an embedding path to `v`
    ///
    /// Through a pointer each step takes the field's address, loading
    /// through it only when the field itself is pointer-typed; on a struct
    /// value each step extracts the field.
    pub fn implicit_selections(&mut self, mut v: ValueId, indices: &[usize]) -> BuildResult<ValueId> {
        let types = self.types();
        for &index in indices {
            let field = self.struct_field(v, index)?;
            if types.is_pointer(self.value_type(v)) {
                let addr = self.emit_value(
                    InstrKind::FieldAddr { x: v, field: index },
                    types.pointer(field.ty),
                );
                v = if types.is_pointer(field.ty) {
                    self.load(addr)
                } else {
                    addr
                };
            } else {
                v = self.emit_value(InstrKind::Field { x: v, field: index }, field.ty);
            }
        }
        Ok(v)
    }

    /// Explicit selection of field `index` of `v`
    ///
    /// Through a pointer this yields the field's address when `want_addr`
    /// and its value otherwise.
    pub fn field_selection(&mut self, v: ValueId, index: usize, want_addr: bool) -> BuildResult<ValueId> {
        let types = self.types();
        let field = self.struct_field(v, index)?;
        if types.is_pointer(self.value_type(v)) {
            let addr = self.emit_value(
                InstrKind::FieldAddr { x: v, field: index },
                types.pointer(field.ty),
            );
            Ok(if want_addr { addr } else { self.load(addr) })
        } else {
            Ok(self.emit_value(InstrKind::Field { x: v, field: index }, field.ty))
        }
    }

    /// Component `index` of a tuple-typed value
    ///
    /// # Panics
    ///
    /// Panics if `tuple` is not tuple-typed or has no such component.
    pub fn extract(&mut self, tuple: ValueId, index: usize) -> ValueId {
        let ty = match &*self.types().get(self.value_type(tuple)) {
            Type::Tuple(vars) => vars[index].ty,
            other => panic!("extract from non-tuple {}", other),
        };
        self.emit_value(InstrKind::Extract { tuple, index }, ty)
    }

    /// `x.(t)`; panics at run time if the dynamic type does not match
    pub fn type_assert(&mut self, x: ValueId, t: TypeId, pos: Pos) -> ValueId {
        self.emit_value_at(
            InstrKind::TypeAssert {
                x,
                asserted: t,
                comma_ok: false,
            },
            t,
            pos,
        )
    }

    /// `x.(t)` in comma-ok form; the result is a `(value t, ok bool)` tuple
    pub fn type_test(&mut self, x: ValueId, t: TypeId, pos: Pos) -> ValueId {
        let types = self.types();
        let tuple = types.tuple(vec![Var::new("value", t), Var::new("ok", types.bool_type())]);
        self.emit_value_at(
            InstrKind::TypeAssert {
                x,
                asserted: t,
                comma_ok: true,
            },
            tuple,
            pos,
        )
    }

    /// Relate `v` to a source position; nothing is emitted without debug info
    pub fn debug_ref(&mut self, v: ValueId, pos: Pos, is_addr: bool) -> Option<InstrId> {
        if !self.prog().mode().debug_info {
            return None;
        }
        Some(self.emit_instr(InstrKind::DebugRef { x: v, pos, is_addr }))
    }

    /// Mark a stepping event for the debugger
    pub fn trace(&mut self, event: TraceEvent, start: Pos, end: Pos) -> InstrId {
        self.push(InstrKind::Trace { event, start, end }, None, start).0
    }

    /// Emit `call` in tail position and return its results
    ///
    /// The call's result type comes from this function's own signature, so
    /// no conversion is applied. Leaves no block open.
    pub fn tail_call(&mut self, call: CallCommon) {
        let types = self.types();
        let results = types.signature_of(self.func.signature).results;
        match results.len() {
            0 => {
                self.emit_instr(InstrKind::Call(call));
                self.ret(vec![]);
            }
            1 => {
                let v = self.emit_value(InstrKind::Call(call), results[0].ty);
                self.ret(vec![v]);
            }
            n => {
                let tuple = self.emit_value(InstrKind::Call(call), types.tuple(results));
                let values: Vec<ValueId> = (0..n).map(|i| self.extract(tuple, i)).collect();
                self.ret(values);
            }
        }
    }

    pub fn jump(&mut self, target: BasicBlockId) {
        self.terminate(Terminator::Jump(target));
    }

    pub fn branch(&mut self, cond: ValueId, then_block: BasicBlockId, else_block: BasicBlockId) {
        self.terminate(Terminator::If {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn ret(&mut self, results: Vec<ValueId>) {
        self.terminate(Terminator::Return(results));
    }

    /// The block a recovered panic resumes in
    ///
    /// Created on first request; it returns the named results if the
    /// function declared them and zero values otherwise. The open block is
    /// left untouched.
    pub fn create_recover_block(&mut self) -> BasicBlockId {
        if let Some(block) = self.func.recover {
            return block;
        }

        let saved = self.current;
        let block = self.new_block("recover");
        self.func.recover = Some(block);
        self.current = Some(block);

        let results: Vec<ValueId> = if self.func.named_results.is_empty() {
            let sig = self.types().signature_of(self.func.signature);
            sig.results.iter().map(|r| self.zero_value(r.ty)).collect()
        } else {
            let named = self.func.named_results.clone();
            named.into_iter().map(|r| self.load(r)).collect()
        };
        self.ret(results);

        self.current = saved;
        block
    }

    /// The zero value of `ty`; aggregates come from a fresh local
    pub fn zero_value(&mut self, ty: TypeId) -> ValueId {
        let aggregate = matches!(
            &*self.types().underlying_type(ty),
            Type::Struct(_) | Type::Array { .. }
        );
        if aggregate {
            let addr = self.add_local(ty);
            self.load(addr)
        } else {
            self.zero_const(ty)
        }
    }

    /// The zero constant of a non-aggregate type
    pub fn zero_const(&mut self, ty: TypeId) -> ValueId {
        let value = match self.types().underlying_type(ty).as_basic() {
            Some(k) if k.is_boolean() => ConstValue::Bool(false),
            Some(k) if k.is_integer() => ConstValue::Int(0),
            Some(k) if k.is_float() => ConstValue::Float(0.0),
            Some(k) if k.is_complex() => ConstValue::Complex(0.0, 0.0),
            Some(k) if k.is_string() => ConstValue::String(String::new()),
            _ => ConstValue::Nil,
        };
        self.const_value(value, ty)
    }
}
