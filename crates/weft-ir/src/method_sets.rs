//! Method-set registry
//!
//! Maps a receiver type to the callable function behind each of its
//! methods, synthesizing wrappers on first use. Entries are permanent.

use crate::error::BuildResult;
use crate::ir::FunctionId;
use crate::program::{MethodSet, Program};
use weft_types::{Selection, TypeId};

impl Program {
    /// The complete resolved method set of `ty`
    ///
    /// Only call this when every method is needed (e.g. for a type boxed
    /// into an interface). For a single method use
    /// [`lookup_method`](Program::lookup_method), which avoids synthesizing
    /// the rest.
    pub fn method_set(&self, ty: TypeId) -> BuildResult<MethodSet> {
        let mut sets = self.method_sets.lock();
        let entry = sets.entry(ty).or_default();
        if entry.complete {
            return Ok(entry.methods.clone());
        }

        for sel in self.types().method_set(ty) {
            let id = self.types().func(sel.obj).id();
            if entry.methods.contains_key(&id) {
                continue;
            }
            let func = self.resolve(&sel)?;
            entry.methods.insert(id, func);
        }
        entry.complete = true;

        tracing::debug!(
            ty = %self.types().type_string(ty),
            methods = entry.methods.len(),
            "populated method set"
        );
        Ok(entry.methods.clone())
    }

    /// The function for a single selection, synthesizing it if needed
    ///
    /// Shares the memo table with [`method_set`](Program::method_set).
    /// Selections outside the receiver's method set (a pointer method on an
    /// addressable value) are memoized apart and never show up there.
    pub fn lookup_method(&self, sel: &Selection) -> BuildResult<FunctionId> {
        let id = self.types().func(sel.obj).id();
        let in_set = self.types().in_method_set(sel);
        let mut sets = self.method_sets.lock();
        let entry = sets.entry(sel.recv).or_default();
        let table = if in_set {
            &mut entry.methods
        } else {
            &mut entry.addressable
        };
        if let Some(&func) = table.get(&id) {
            tracing::trace!(method = %id, function = %func, in_set, "method set hit");
            return Ok(func);
        }

        let func = self.resolve(sel)?;
        table.insert(id, func);
        Ok(func)
    }

    /// Decide which function implements `sel`
    ///
    /// Requires the method-set lock.
    fn resolve(&self, sel: &Selection) -> BuildResult<FunctionId> {
        let types = self.types();
        let needs_promotion = sel.is_promoted();
        let needs_indirection = types
            .recv_type(sel.obj)
            .is_some_and(|decl| types.is_pointer(decl) != types.is_pointer(sel.recv));

        if needs_promotion || needs_indirection {
            return self.make_wrapper(sel);
        }
        if types.is_interface(sel.recv) {
            return self.interface_method_wrapper(sel.recv, sel.obj);
        }
        self.concrete_method(sel.obj)
    }
}
