//! Type context for managing types, named declarations and method objects

use crate::ty::{
    BasicKind, ChanDir, Field, FuncId, FuncObj, NamedType, Signature, Type, TypeId, Var,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Per-declaration data of a named type
#[derive(Debug, Clone)]
struct NamedData {
    id: TypeId,
    underlying: TypeId,
    methods: Vec<FuncId>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Storage for all types, indexed by TypeId
    types: Vec<Arc<Type>>,
    /// Reverse mapping from Type to TypeId for interning
    type_to_id: FxHashMap<Type, TypeId>,
    /// Named declarations, indexed by `NamedType::decl`
    named: Vec<NamedData>,
    /// Method and function objects, indexed by FuncId
    funcs: Vec<Arc<FuncObj>>,
}

fn intern_locked(inner: &mut Inner, ty: Type) -> TypeId {
    if let Some(&id) = inner.type_to_id.get(&ty) {
        return id;
    }
    let id = TypeId(inner.types.len() as u32);
    inner.types.push(Arc::new(ty.clone()));
    inner.type_to_id.insert(ty, id);
    id
}

/// Type context that manages all types in a program
///
/// Identical types are interned to the same `TypeId`, so identity checks
/// are id comparisons. The context is internally synchronized and is shared
/// by every thread that builds IR for the program.
#[derive(Debug)]
pub struct TypeContext {
    inner: RwLock<Inner>,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    /// Create a context with every basic type pre-interned
    pub fn new() -> Self {
        let ctx = TypeContext {
            inner: RwLock::new(Inner::default()),
        };
        // `basic()` relies on these ids matching the kind discriminants.
        for kind in BasicKind::ALL {
            ctx.intern(Type::Basic(kind));
        }
        ctx
    }

    /// Intern a type, returning its TypeId
    pub fn intern(&self, ty: Type) -> TypeId {
        if let Some(&id) = self.inner.read().type_to_id.get(&ty) {
            return id;
        }
        intern_locked(&mut self.inner.write(), ty)
    }

    /// Get a type by its TypeId
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this context.
    pub fn get(&self, id: TypeId) -> Arc<Type> {
        self.inner
            .read()
            .types
            .get(id.0 as usize)
            .cloned()
            .expect("TypeId from a different context")
    }

    /// Look up a type's ID without interning
    pub fn lookup(&self, ty: &Type) -> Option<TypeId> {
        self.inner.read().type_to_id.get(ty).copied()
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        TypeId(kind as u32)
    }

    pub fn bool_type(&self) -> TypeId {
        self.basic(BasicKind::Bool)
    }

    pub fn pointer(&self, elem: TypeId) -> TypeId {
        self.intern(Type::Pointer(elem))
    }

    pub fn slice(&self, elem: TypeId) -> TypeId {
        self.intern(Type::Slice(elem))
    }

    pub fn array(&self, elem: TypeId, len: u64) -> TypeId {
        self.intern(Type::Array { elem, len })
    }

    pub fn map(&self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(Type::Map { key, value })
    }

    pub fn chan(&self, elem: TypeId, dir: ChanDir) -> TypeId {
        self.intern(Type::Chan { elem, dir })
    }

    pub fn struct_type(&self, fields: Vec<Field>) -> TypeId {
        self.intern(Type::Struct(crate::ty::StructType { fields }))
    }

    pub fn interface(&self, methods: Vec<FuncId>) -> TypeId {
        self.intern(Type::Interface(crate::ty::InterfaceType { methods }))
    }

    pub fn signature(&self, sig: Signature) -> TypeId {
        self.intern(Type::Signature(sig))
    }

    pub fn tuple(&self, vars: Vec<Var>) -> TypeId {
        self.intern(Type::Tuple(vars))
    }

    /// Declare a fresh named type
    ///
    /// The underlying type is set afterwards with [`set_underlying`], which
    /// lets field and method types refer back to the declaration.
    ///
    /// [`set_underlying`]: TypeContext::set_underlying
    pub fn new_named(&self, name: impl Into<String>, pkg: Option<&str>) -> TypeId {
        let mut inner = self.inner.write();
        let decl = inner.named.len() as u32;
        let id = intern_locked(
            &mut inner,
            Type::Named(NamedType {
                name: name.into(),
                pkg: pkg.map(str::to_string),
                decl,
            }),
        );
        inner.named.push(NamedData {
            id,
            underlying: id,
            methods: Vec::new(),
        });
        id
    }

    /// Complete a named declaration with its underlying type
    pub fn set_underlying(&self, named: TypeId, underlying: TypeId) {
        let underlying = self.underlying(underlying);
        let decl = self.named_decl(named);
        self.inner.write().named[decl].underlying = underlying;
    }

    /// Attach a declared method to a named type
    pub fn add_method(&self, named: TypeId, func: FuncId) {
        let decl = self.named_decl(named);
        self.inner.write().named[decl].methods.push(func);
    }

    /// Methods declared directly on a named type (empty for other types)
    pub fn declared_methods(&self, ty: TypeId) -> Vec<FuncId> {
        match &*self.get(ty) {
            Type::Named(n) => self.inner.read().named[n.decl as usize].methods.clone(),
            _ => Vec::new(),
        }
    }

    fn named_decl(&self, named: TypeId) -> usize {
        match &*self.get(named) {
            Type::Named(n) => n.decl as usize,
            other => panic!("{} is not a named type", other),
        }
    }

    /// Register a method or function object
    pub fn new_func(&self, func: FuncObj) -> FuncId {
        let mut inner = self.inner.write();
        let id = FuncId(inner.funcs.len() as u32);
        inner.funcs.push(Arc::new(func));
        id
    }

    /// Get a method or function object
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this context.
    pub fn func(&self, id: FuncId) -> Arc<FuncObj> {
        self.inner
            .read()
            .funcs
            .get(id.0 as usize)
            .cloned()
            .expect("FuncId from a different context")
    }

    // ------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------

    pub fn is_identical(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// The underlying (structural) type of `ty`
    pub fn underlying(&self, ty: TypeId) -> TypeId {
        match &*self.get(ty) {
            Type::Named(n) => self.inner.read().named[n.decl as usize].underlying,
            _ => ty,
        }
    }

    pub fn underlying_type(&self, ty: TypeId) -> Arc<Type> {
        self.get(self.underlying(ty))
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        matches!(&*self.underlying_type(ty), Type::Pointer(_))
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        matches!(&*self.underlying_type(ty), Type::Interface(_))
    }

    pub fn is_basic(&self, ty: TypeId, pred: impl Fn(BasicKind) -> bool) -> bool {
        self.underlying_type(ty).as_basic().is_some_and(pred)
    }

    /// The pointee of a pointer type, or `ty` itself
    pub fn deref(&self, ty: TypeId) -> TypeId {
        match &*self.underlying_type(ty) {
            Type::Pointer(elem) => *elem,
            _ => ty,
        }
    }

    /// The natural concrete type of an untyped constant type
    pub fn default_type(&self, ty: TypeId) -> TypeId {
        match self.get(ty).as_basic() {
            Some(kind) => self.basic(kind.default_kind()),
            None => ty,
        }
    }

    /// Field `index` of the struct `ty` (or of the struct it points to)
    pub fn struct_field(&self, ty: TypeId, index: usize) -> Option<Field> {
        let base = self.deref(ty);
        self.underlying_type(base)
            .as_struct()
            .and_then(|s| s.fields.get(index).cloned())
    }

    /// The signature behind a signature-typed id
    ///
    /// # Panics
    ///
    /// Panics if `sig` is not a signature type.
    pub fn signature_of(&self, sig: TypeId) -> Signature {
        match &*self.underlying_type(sig) {
            Type::Signature(s) => s.clone(),
            other => panic!("{} is not a signature", other),
        }
    }

    /// Receiver type of a method object, `None` for plain functions
    pub fn recv_type(&self, func: FuncId) -> Option<TypeId> {
        let sig = self.signature_of(self.func(func).sig);
        sig.recv.map(|r| r.ty)
    }

    /// Whether `func` is an abstract (interface) method
    pub fn is_abstract(&self, func: FuncId) -> bool {
        self.recv_type(func).is_some_and(|r| self.is_interface(r))
    }

    /// Whether `func` declares a pointer receiver
    pub fn has_pointer_recv(&self, func: FuncId) -> bool {
        self.recv_type(func).is_some_and(|r| self.is_pointer(r))
    }

    // ------------------------------------------------------------------
    // Formatting
    // ------------------------------------------------------------------

    /// Human-readable rendering of a type
    pub fn type_string(&self, ty: TypeId) -> String {
        match &*self.get(ty) {
            Type::Basic(b) => b.name().to_string(),
            Type::Pointer(elem) => format!("*{}", self.type_string(*elem)),
            Type::Slice(elem) => format!("[]{}", self.type_string(*elem)),
            Type::Array { elem, len } => format!("[{}]{}", len, self.type_string(*elem)),
            Type::Map { key, value } => {
                format!("map[{}]{}", self.type_string(*key), self.type_string(*value))
            }
            Type::Chan { elem, dir } => {
                let elem = self.type_string(*elem);
                match dir {
                    ChanDir::Both => format!("chan {}", elem),
                    ChanDir::Send => format!("chan<- {}", elem),
                    ChanDir::Recv => format!("<-chan {}", elem),
                }
            }
            Type::Struct(s) => {
                let fields: Vec<String> = s
                    .fields
                    .iter()
                    .map(|f| {
                        if f.embedded {
                            self.type_string(f.ty)
                        } else {
                            format!("{} {}", f.name, self.type_string(f.ty))
                        }
                    })
                    .collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            Type::Interface(i) => {
                let methods: Vec<String> = i
                    .methods
                    .iter()
                    .map(|&m| {
                        let obj = self.func(m);
                        format!("{}{}", obj.name, self.params_string(&self.signature_of(obj.sig)))
                    })
                    .collect();
                format!("interface{{{}}}", methods.join("; "))
            }
            Type::Signature(s) => format!("func{}", self.params_string(s)),
            Type::Tuple(vars) => self.vars_string(vars, false),
            Type::Named(n) => match &n.pkg {
                Some(pkg) => format!("{}.{}", pkg, n.name),
                None => n.name.clone(),
            },
        }
    }

    fn params_string(&self, sig: &Signature) -> String {
        let params = self.vars_string(&sig.params, sig.variadic);
        match sig.results.len() {
            0 => params,
            1 if sig.results[0].name.is_empty() => {
                format!("{} {}", params, self.type_string(sig.results[0].ty))
            }
            _ => format!("{} {}", params, self.vars_string(&sig.results, false)),
        }
    }

    fn vars_string(&self, vars: &[Var], variadic: bool) -> String {
        let parts: Vec<String> = vars
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let dots = if variadic && i + 1 == vars.len() { "..." } else { "" };
                let ty = self.type_string(v.ty);
                if v.name.is_empty() {
                    format!("{}{}", dots, ty)
                } else {
                    format!("{} {}{}", v.name, dots, ty)
                }
            })
            .collect();
        format!("({})", parts.join(", "))
    }

    /// Qualified method name, e.g. `(*p.C).Get` or `p.helper`
    pub fn func_full_name(&self, func: FuncId) -> String {
        let obj = self.func(func);
        match self.recv_type(func) {
            Some(recv) => format!("({}).{}", self.type_string(recv), obj.name),
            None => match &obj.pkg {
                Some(pkg) => format!("{}.{}", pkg, obj.name),
                None => obj.name.clone(),
            },
        }
    }

    /// Full rendering of a method object, e.g. `func (*p.C).Get() int`
    pub fn func_string(&self, func: FuncId) -> String {
        let sig = self.signature_of(self.func(func).sig);
        format!("func {}{}", self.func_full_name(func), self.params_string(&sig))
    }

    /// All named types declared so far, in declaration order
    pub fn named_types(&self) -> Vec<TypeId> {
        self.inner.read().named.iter().map(|n| n.id).collect()
    }
}
