//! Wrapper synthesis
//!
//! Three kinds of synthetic functions stand in for method accesses that
//! have no source-built function of their own:
//!
//! - promotion/indirection wrappers for methods reached through embedded
//!   fields or through a receiver of the other addressing mode;
//! - interface method wrappers, making `I.f` callable as `f(i, ...)`;
//! - bound method wrappers, the code of `x.f` closures, whose single free
//!   variable is the receiver.
//!
//! Every wrapper body is a single block ending in a tail call.

use crate::builder::FunctionBuilder;
use crate::error::{BuildError, BuildResult};
use crate::ir::{CallCommon, Function, FunctionId};
use crate::program::Program;
use tracing::span::EnteredSpan;
use weft_types::{FuncId, Selection, Signature, TypeId, Var};

impl Program {
    fn synthesis_span(&self, description: &str) -> Option<EnteredSpan> {
        self.mode()
            .log_source
            .then(|| tracing::info_span!("synthesize", wrapper = %description).entered())
    }

    fn add_synthesized(&self, func: Function) -> FunctionId {
        let id = self.add_function(func);
        self.note_synthesized();
        let func = self.function(id);
        tracing::debug!(
            function = %id,
            name = %func.name,
            description = func.synthetic.as_deref().unwrap_or_default(),
            "synthesized wrapper"
        );
        id
    }

    /// Build the wrapper for a promoted or indirected method selection
    ///
    /// Given `type A struct{ B }`, `type B struct{ *C }` and `func (*C) f()`,
    /// the selection `A.f` with path `[0, 0, f]` yields the equivalent of
    /// `func (recv A) f() { return recv.B.C.f() }`.
    ///
    /// Requires the method-set lock.
    pub(crate) fn make_wrapper(&self, sel: &Selection) -> BuildResult<FunctionId> {
        let types = self.types();
        let obj = types.func(sel.obj);
        let old = types.signature_of(obj.sig);
        let sig = types.signature(Signature {
            recv: Some(Var::new("recv", sel.recv)),
            ..old
        });

        let description = format!("wrapper for {}", types.func_string(sel.obj));
        let _span = self.synthesis_span(&description);

        let mut b = FunctionBuilder::new(self, obj.name.clone(), sig);
        b.set_synthetic(description);
        b.set_method(sel.clone());
        b.set_pos(obj.pos);
        let recv = b.add_param("recv", sel.recv);
        let params = b.create_params();

        // From here on `v` is a pointer: the receiver itself, or the
        // address of its spilled copy.
        let mut v = if types.is_pointer(sel.recv) {
            recv
        } else {
            b.spill_param(recv)
        };
        v = b.implicit_selections(v, sel.field_path())?;

        let call = if types.is_abstract(sel.obj) {
            let iface = b.load(v);
            CallCommon::invoke(iface, sel.obj, params)
        } else {
            if !types.has_pointer_recv(sel.obj) {
                v = b.load(v);
            }
            let mut args = Vec::with_capacity(params.len() + 1);
            args.push(v);
            args.extend(params);
            CallCommon::direct(self.concrete_method(sel.obj)?, args)
        };
        b.tail_call(call);

        Ok(self.add_synthesized(b.finish()?))
    }

    /// The wrapper making abstract method `obj` callable as a function whose
    /// first parameter is the receiver, e.g. `I.f(i, x)`
    ///
    /// Built once per method object. Interfaces that share the method
    /// object (one embedding the other) share the wrapper, whose receiver is
    /// typed as the interface of the first request.
    pub fn interface_method_wrapper(&self, recv: TypeId, obj: FuncId) -> BuildResult<FunctionId> {
        let mut wrappers = self.iface_wrappers.lock();
        if let Some(&func) = wrappers.get(&obj) {
            tracing::trace!(function = %func, "interface method wrapper hit");
            return Ok(func);
        }

        let types = self.types();
        let m = types.func(obj);
        let description = format!(
            "interface method wrapper for {}.{}",
            types.type_string(recv),
            m.name
        );
        let _span = self.synthesis_span(&description);

        let sig = types.signature(Signature {
            recv: Some(Var::new("recv", recv)),
            ..types.signature_of(m.sig)
        });
        let mut b = FunctionBuilder::new(self, m.name.clone(), sig);
        b.set_synthetic(description);
        b.set_object(obj);
        b.set_pos(m.pos);
        let recv = b.add_param("recv", recv);
        let params = b.create_params();
        b.tail_call(CallCommon::invoke(recv, obj, params));

        let id = self.add_synthesized(b.finish()?);
        wrappers.insert(obj, id);
        Ok(id)
    }

    /// The code of bound method closures `x.f` for method `obj`
    ///
    /// The wrapper takes the method's formals and has one free variable,
    /// the receiver, which the caller binds when creating the closure.
    /// Built once per method object, whatever receiver is later bound.
    pub fn bound_method_wrapper(&self, obj: FuncId) -> BuildResult<FunctionId> {
        let mut wrappers = self.bound_wrappers.lock();
        if let Some(&func) = wrappers.get(&obj) {
            tracing::trace!(function = %func, "bound method wrapper hit");
            return Ok(func);
        }

        let types = self.types();
        let m = types.func(obj);
        let old = types.signature_of(m.sig);
        let Some(recv_ty) = old.recv.as_ref().map(|r| r.ty) else {
            return Err(BuildError::NotAMethod {
                func: types.func_string(obj),
            });
        };

        let description = format!("bound method wrapper for {}", types.func_string(obj));
        let _span = self.synthesis_span(&description);

        let sig = types.signature(Signature { recv: None, ..old });
        let name = format!("bound${}", types.func_full_name(obj));
        let mut b = FunctionBuilder::new(self, name, sig);
        b.set_synthetic(description);
        b.set_pos(m.pos);
        let recv = b.add_free_var("recv", recv_ty);
        let params = b.create_params();

        let call = if types.is_interface(recv_ty) {
            CallCommon::invoke(recv, obj, params)
        } else {
            let mut args = Vec::with_capacity(params.len() + 1);
            args.push(recv);
            args.extend(params);
            CallCommon::direct(self.concrete_method(obj)?, args)
        };
        b.tail_call(call);

        let id = self.add_synthesized(b.finish()?);
        wrappers.insert(obj, id);
        Ok(id)
    }
}
