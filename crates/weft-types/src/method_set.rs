//! Method-set enumeration and selections
//!
//! A method set is computed by a breadth-first walk over embedded fields.
//! Entries found at a shallower depth shadow deeper ones; two entries with
//! the same identifier at the same depth (or a method and a field) collide
//! and neither is promoted.

use crate::context::TypeContext;
use crate::ty::{FuncId, Type, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// A resolved `receiver.method` access
///
/// `index` is the embedding path: the field indices of each implicitly
/// selected embedded field followed by the method's index in its declaring
/// type. A path of length one is a direct access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    /// Receiver type the method is selected from
    pub recv: TypeId,
    /// Target method object
    pub obj: FuncId,
    /// Embedding path, never empty
    pub index: Vec<usize>,
    /// Whether a pointer indirection was crossed on the way to the method
    pub indirect: bool,
}

impl Selection {
    pub fn new(recv: TypeId, obj: FuncId, index: Vec<usize>, indirect: bool) -> Self {
        debug_assert!(!index.is_empty(), "selection with an empty embedding path");
        Self {
            recv,
            obj,
            index,
            indirect,
        }
    }

    /// Whether the method is reached through at least one embedded field
    pub fn is_promoted(&self) -> bool {
        self.index.len() > 1
    }

    /// The implicit field selections preceding the method
    pub fn field_path(&self) -> &[usize] {
        &self.index[..self.index.len() - 1]
    }
}

/// An embedded type reached during the walk
#[derive(Debug, Clone)]
struct Embedded {
    ty: TypeId,
    index: Vec<usize>,
    indirect: bool,
    /// The type was reached along more than one path at this depth
    multiples: bool,
}

/// Entries found at one depth; `None` marks a collision
type Found = FxHashMap<String, Option<Selection>>;

impl TypeContext {
    /// Enumerate the complete method set of `recv`, sorted by method id
    ///
    /// Pointer-receiver methods are included only when reached through an
    /// indirection. A pointer to an interface has no methods.
    pub fn method_set(&self, recv: TypeId) -> Vec<Selection> {
        let (base_ty, is_ptr) = match &*self.get(recv) {
            Type::Pointer(elem) => (*elem, true),
            _ => (recv, false),
        };
        if is_ptr && self.is_interface(base_ty) {
            return Vec::new();
        }

        let mut base: Found = FxHashMap::default();
        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        let mut current = vec![Embedded {
            ty: base_ty,
            index: Vec::new(),
            indirect: is_ptr,
            multiples: false,
        }];

        while !current.is_empty() {
            let mut next = Vec::new();
            let mut found: Found = FxHashMap::default();
            let mut fields: FxHashSet<String> = FxHashSet::default();

            for e in &current {
                let mut ty = e.ty;
                if self.get(ty).is_named() {
                    if !seen.insert(ty) {
                        // Already walked at a shallower depth.
                        continue;
                    }
                    let declared = self.declared_methods(ty);
                    self.add_found(&mut found, recv, &declared, &e.index, e.indirect, e.multiples);
                    ty = self.underlying(ty);
                }

                match &*self.get(ty) {
                    Type::Struct(s) => {
                        for (i, f) in s.fields.iter().enumerate() {
                            fields.insert(f.id());
                            if f.embedded {
                                let (fty, ptr) = match &*self.get(f.ty) {
                                    Type::Pointer(elem) => (*elem, true),
                                    _ => (f.ty, false),
                                };
                                next.push(Embedded {
                                    ty: fty,
                                    index: concat(&e.index, i),
                                    indirect: e.indirect || ptr,
                                    multiples: e.multiples,
                                });
                            }
                        }
                    }
                    Type::Interface(iface) => {
                        self.add_found(&mut found, recv, &iface.methods, &e.index, true, e.multiples);
                    }
                    _ => {}
                }
            }

            for (key, entry) in found {
                if !base.contains_key(&key) {
                    // A field at the same depth hides the method.
                    let entry = if fields.contains(&key) { None } else { entry };
                    base.insert(key, entry);
                }
            }
            for key in fields {
                base.entry(key).or_insert(None);
            }

            current = consolidate_multiples(next);
        }

        let mut list: Vec<(String, Selection)> = base
            .into_iter()
            .filter_map(|(key, sel)| sel.map(|s| (key, s)))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list.into_iter().map(|(_, s)| s).collect()
    }

    /// Whether `sel` belongs to the method set of its receiver type
    ///
    /// A pointer-receiver method selected on a value without indirection
    /// (`c.Get()` on an addressable `C` variable) is callable but outside
    /// the method set.
    pub fn in_method_set(&self, sel: &Selection) -> bool {
        sel.indirect || !self.has_pointer_recv(sel.obj)
    }

    /// Find the selection for method `id` in the method set of `recv`
    pub fn lookup_method(&self, recv: TypeId, id: &str) -> Option<Selection> {
        self.method_set(recv)
            .into_iter()
            .find(|sel| self.func(sel.obj).id() == id)
    }

    fn add_found(
        &self,
        found: &mut Found,
        recv: TypeId,
        methods: &[FuncId],
        index: &[usize],
        indirect: bool,
        multiples: bool,
    ) {
        for (i, &m) in methods.iter().enumerate() {
            let key = self.func(m).id();
            if !multiples
                && !found.contains_key(&key)
                && (indirect || !self.has_pointer_recv(m))
            {
                found.insert(key, Some(Selection::new(recv, m, concat(index, i), indirect)));
                continue;
            }
            found.insert(key, None);
        }
    }
}

fn concat(path: &[usize], i: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.extend_from_slice(path);
    out.push(i);
    out
}

/// Merge entries for the same type, marking them as reached more than once
fn consolidate_multiples(list: Vec<Embedded>) -> Vec<Embedded> {
    if list.len() <= 1 {
        return list;
    }
    let mut out: Vec<Embedded> = Vec::with_capacity(list.len());
    let mut at: FxHashMap<TypeId, usize> = FxHashMap::default();
    for e in list {
        match at.get(&e.ty) {
            Some(&i) => out[i].multiples = true,
            None => {
                at.insert(e.ty, out.len());
                out.push(e);
            }
        }
    }
    out
}
