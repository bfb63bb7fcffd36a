//! Program context
//!
//! The single object every construction call goes through: the type model,
//! the arena of finished functions and the program-wide method caches.

use crate::error::{BuildError, BuildResult};
use crate::ir::{Function, FunctionId};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weft_types::{FuncId, TypeContext, TypeId};

/// Resolved method set: method id → callable function
pub type MethodSet = FxHashMap<String, FunctionId>;

/// Build options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildMode {
    /// Open a tracing span around every synthesized function
    pub log_source: bool,
    /// Emit `DebugRef` markers
    pub debug_info: bool,
    /// Validate every function when it is frozen
    pub sanity_check: bool,
}

impl BuildMode {
    /// All checks and debug output enabled
    pub fn debug() -> Self {
        Self {
            log_source: true,
            debug_info: true,
            sanity_check: true,
        }
    }
}

/// Method-set table entry for one receiver type
#[derive(Debug, Default)]
pub(crate) struct MethodSetEntry {
    pub(crate) methods: MethodSet,
    /// Every method of the type has been resolved
    pub(crate) complete: bool,
    /// Pointer methods selected on addressable values; callable, but not
    /// part of the type's method set
    pub(crate) addressable: MethodSet,
}

/// A whole program under construction
///
/// Shared by reference across threads. Each cache has its own lock; a
/// cache's check, synthesis and insertion all happen under that lock, so
/// no key is ever synthesized twice.
#[derive(Debug)]
pub struct Program {
    types: TypeContext,
    mode: BuildMode,
    /// Function arena, indexed by FunctionId
    functions: RwLock<Vec<Arc<Function>>>,
    /// Method object → its source-built concrete function
    concrete_methods: RwLock<FxHashMap<FuncId, FunctionId>>,
    pub(crate) method_sets: Mutex<FxHashMap<TypeId, MethodSetEntry>>,
    pub(crate) iface_wrappers: Mutex<FxHashMap<FuncId, FunctionId>>,
    pub(crate) bound_wrappers: Mutex<FxHashMap<FuncId, FunctionId>>,
    /// Concrete types boxed into interfaces; their method sets are needed
    /// at run time
    runtime_types: Mutex<FxHashSet<TypeId>>,
    /// Number of wrapper functions synthesized so far
    synthesized: AtomicUsize,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    /// Create an empty program with the default build mode
    pub fn new() -> Self {
        Self::with_mode(BuildMode::default())
    }

    pub fn with_mode(mode: BuildMode) -> Self {
        Program {
            types: TypeContext::new(),
            mode,
            functions: RwLock::new(Vec::new()),
            concrete_methods: RwLock::new(FxHashMap::default()),
            method_sets: Mutex::new(FxHashMap::default()),
            iface_wrappers: Mutex::new(FxHashMap::default()),
            bound_wrappers: Mutex::new(FxHashMap::default()),
            runtime_types: Mutex::new(FxHashSet::default()),
            synthesized: AtomicUsize::new(0),
        }
    }

    pub fn types(&self) -> &TypeContext {
        &self.types
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Freeze a finished function and add it to the arena
    pub fn add_function(&self, func: Function) -> FunctionId {
        let mut functions = self.functions.write();
        let id = FunctionId(functions.len() as u32);
        functions.push(Arc::new(func));
        id
    }

    /// Get a finished function
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this program.
    pub fn function(&self, id: FunctionId) -> Arc<Function> {
        self.functions
            .read()
            .get(id.0 as usize)
            .cloned()
            .expect("FunctionId from a different program")
    }

    pub fn function_count(&self) -> usize {
        self.functions.read().len()
    }

    /// Register the concrete function the front end built for a method
    pub fn declare_method(&self, obj: FuncId, func: Function) -> FunctionId {
        let id = self.add_function(func);
        self.concrete_methods.write().insert(obj, id);
        id
    }

    /// The concrete function of a method object
    ///
    /// Fails if the front end never declared one; that is an internal
    /// inconsistency, not a user error.
    pub fn concrete_method(&self, obj: FuncId) -> BuildResult<FunctionId> {
        self.concrete_methods
            .read()
            .get(&obj)
            .copied()
            .ok_or_else(|| BuildError::NoConcreteMethod {
                method: self.types.func_string(obj),
            })
    }

    /// Record that the method set of `ty` is needed at run time
    ///
    /// Only records the type: boxing happens during function construction,
    /// possibly while a method-set lock is held, so the set itself is
    /// materialized later through [`Program::method_set`].
    pub fn need_methods_of(&self, ty: TypeId) {
        if self.runtime_types.lock().insert(ty) {
            tracing::trace!(ty = %self.types.type_string(ty), "runtime type");
        }
    }

    /// Types whose method sets were requested by interface boxing
    pub fn runtime_types(&self) -> Vec<TypeId> {
        let mut types: Vec<TypeId> = self.runtime_types.lock().iter().copied().collect();
        types.sort();
        types
    }

    /// Number of wrapper functions synthesized so far
    pub fn synthesized_count(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }

    pub(crate) fn note_synthesized(&self) {
        self.synthesized.fetch_add(1, Ordering::Relaxed);
    }
}
