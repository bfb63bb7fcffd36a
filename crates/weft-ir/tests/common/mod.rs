//! Shared fixtures for the integration tests
//!
//! `fixture()` declares a small package `p`:
//!
//! ```text
//! type C struct{ n int }
//! func (c *C) Get() int                 { return c.n }
//! func (c C) Val() int                  { return c.n }
//! func (c *C) Pair(k int) (int, bool)   { return c.n + k, true }
//! func (c *C) Reset()                   { c.n = 0 }
//! func (c C) Count(xs ...int) int       { return c.n }
//!
//! type B struct{ *C; tag string }
//! func (b B) Tag() string               { return b.tag }
//!
//! type A struct{ B }
//! type D struct{ *A }
//!
//! type Getter interface{ Get() int }
//! type Tagger interface{ Getter; Tag() string }
//! type S struct{ Getter }
//! ```
//!
//! `Evaluator` is a small reference interpreter over the built IR, used to
//! check that wrappers behave like the calls they stand for.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use weft_ir::{
    BinaryOp, BuildMode, Callee, ConstValue, Function, FunctionBuilder, FunctionId, InstrKind,
    Instruction, Program, Terminator, ValueId, ValueKind,
};
use weft_types::{
    BasicKind, Field, FuncId, FuncObj, Selection, Signature, Type, TypeContext, TypeId, Var,
};

pub struct Fixture {
    pub prog: Program,
    pub int: TypeId,
    pub string: TypeId,
    pub c: TypeId,
    pub b: TypeId,
    pub a: TypeId,
    pub d: TypeId,
    pub getter: TypeId,
    pub tagger: TypeId,
    pub s: TypeId,
    pub get: FuncId,
    pub val: FuncId,
    pub pair: FuncId,
    pub reset: FuncId,
    pub count: FuncId,
    pub tag: FuncId,
    pub iget: FuncId,
    pub itag: FuncId,
}

impl Fixture {
    pub fn types(&self) -> &TypeContext {
        self.prog.types()
    }

    pub fn ptr(&self, ty: TypeId) -> TypeId {
        self.types().pointer(ty)
    }

    /// The selection of method `id` in the method set of `recv`
    pub fn select(&self, recv: TypeId, id: &str) -> Selection {
        self.types()
            .lookup_method(recv, id)
            .unwrap_or_else(|| panic!("{} has no method {}", self.types().type_string(recv), id))
    }

    /// Resolve `recv.id` to its function
    pub fn lookup(&self, recv: TypeId, id: &str) -> FunctionId {
        self.prog
            .lookup_method(&self.select(recv, id))
            .expect("method resolves")
    }
}

pub fn method(
    types: &TypeContext,
    recv: TypeId,
    name: &str,
    params: Vec<Var>,
    results: Vec<Var>,
) -> FuncId {
    let sig = Signature::new(params, results).with_recv(Var::new("r", recv));
    types.new_func(FuncObj::new(name, types.signature(sig)).in_package("p"))
}

/// Build and register the concrete function of method `obj`
pub fn declare(
    prog: &Program,
    obj: FuncId,
    body: impl FnOnce(&mut FunctionBuilder<'_>, ValueId, Vec<ValueId>),
) -> FunctionId {
    let types = prog.types();
    let m = types.func(obj);
    let mut b = FunctionBuilder::new(prog, m.name.clone(), m.sig);
    b.set_object(obj);
    let recv = b.add_param("r", types.recv_type(obj).expect("method has a receiver"));
    let params = b.create_params();
    body(&mut b, recv, params);
    prog.declare_method(obj, b.finish().expect("fixture method builds"))
}

pub fn fixture() -> Fixture {
    fixture_with_mode(BuildMode {
        sanity_check: true,
        ..BuildMode::default()
    })
}

pub fn fixture_with_mode(mode: BuildMode) -> Fixture {
    let prog = Program::with_mode(mode);
    let t = prog.types();
    let int = t.basic(BasicKind::Int);
    let string = t.basic(BasicKind::String);
    let boolean = t.bool_type();

    let c = t.new_named("C", Some("p"));
    t.set_underlying(c, t.struct_type(vec![Field::new("n", int).in_package("p")]));
    let pc = t.pointer(c);
    let get = method(t, pc, "Get", vec![], vec![Var::new("", int)]);
    let val = method(t, c, "Val", vec![], vec![Var::new("", int)]);
    let pair = method(
        t,
        pc,
        "Pair",
        vec![Var::new("k", int)],
        vec![Var::new("", int), Var::new("", boolean)],
    );
    let reset = method(t, pc, "Reset", vec![], vec![]);
    let count = {
        let sig = Signature::new(vec![Var::new("xs", int)], vec![Var::new("", int)])
            .with_recv(Var::new("r", c))
            .variadic();
        t.new_func(FuncObj::new("Count", t.signature(sig)).in_package("p"))
    };
    for m in [get, val, pair, reset, count] {
        t.add_method(c, m);
    }

    let b = t.new_named("B", Some("p"));
    t.set_underlying(
        b,
        t.struct_type(vec![
            Field::embedded("C", pc),
            Field::new("tag", string).in_package("p"),
        ]),
    );
    let tag = method(t, b, "Tag", vec![], vec![Var::new("", string)]);
    t.add_method(b, tag);

    let a = t.new_named("A", Some("p"));
    t.set_underlying(a, t.struct_type(vec![Field::embedded("B", b)]));
    let d = t.new_named("D", Some("p"));
    t.set_underlying(d, t.struct_type(vec![Field::embedded("A", t.pointer(a))]));

    let getter = t.new_named("Getter", Some("p"));
    let iget = method(t, getter, "Get", vec![], vec![Var::new("", int)]);
    t.set_underlying(getter, t.interface(vec![iget]));
    let tagger = t.new_named("Tagger", Some("p"));
    let itag = method(t, tagger, "Tag", vec![], vec![Var::new("", string)]);
    t.set_underlying(tagger, t.interface(vec![iget, itag]));
    let s = t.new_named("S", Some("p"));
    t.set_underlying(s, t.struct_type(vec![Field::embedded("Getter", getter)]));

    declare(&prog, get, |b, r, _| {
        let n = b.field_selection(r, 0, false).unwrap();
        b.ret(vec![n]);
    });
    declare(&prog, val, |b, r, _| {
        let n = b.field_selection(r, 0, false).unwrap();
        b.ret(vec![n]);
    });
    declare(&prog, pair, |b, r, params| {
        let n = b.field_selection(r, 0, false).unwrap();
        let int = b.types().basic(BasicKind::Int);
        let sum = b.arith(BinaryOp::Add, n, params[0], int).unwrap();
        let ok = b.const_true();
        b.ret(vec![sum, ok]);
    });
    declare(&prog, reset, |b, r, _| {
        let addr = b.field_selection(r, 0, true).unwrap();
        let int = b.types().basic(BasicKind::Int);
        let zero = b.const_value(ConstValue::Int(0), int);
        b.store(addr, zero);
        b.ret(vec![]);
    });
    declare(&prog, count, |b, r, _| {
        let n = b.field_selection(r, 0, false).unwrap();
        b.ret(vec![n]);
    });
    declare(&prog, tag, |b, r, _| {
        let s = b.field_selection(r, 1, false).unwrap();
        b.ret(vec![s]);
    });

    Fixture {
        prog,
        int,
        string,
        c,
        b,
        a,
        d,
        getter,
        tagger,
        s,
        get,
        val,
        pair,
        reset,
        count,
        tag,
        iget,
        itag,
    }
}

/// Mnemonics of the instructions in a function's entry block
pub fn entry_kinds(func: &Function) -> Vec<&'static str> {
    func.block_instrs(func.entry())
        .map(|i| i.kind.mnemonic())
        .collect()
}

// ----------------------------------------------------------------------
// Reference evaluator
// ----------------------------------------------------------------------

/// A run-time value
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Nil,
    /// Pointer into a heap cell, `path` selecting nested struct fields
    Ptr(Rc<RefCell<Val>>, Vec<usize>),
    Struct(Vec<Val>),
    /// Interface value: dynamic type and payload
    Iface(TypeId, Box<Val>),
    Tuple(Vec<Val>),
}

impl Val {
    pub fn ptr(v: Val) -> Val {
        Val::Ptr(Rc::new(RefCell::new(v)), Vec::new())
    }

    pub fn load(&self) -> Val {
        let Val::Ptr(cell, path) = self else {
            panic!("load through {:?}", self);
        };
        let root = cell.borrow();
        let mut v = &*root;
        for &i in path {
            let Val::Struct(fields) = v else {
                panic!("field path through {:?}", v);
            };
            v = &fields[i];
        }
        v.clone()
    }

    pub fn store(&self, new: Val) {
        let Val::Ptr(cell, path) = self else {
            panic!("store through {:?}", self);
        };
        let mut root = cell.borrow_mut();
        let mut v = &mut *root;
        for &i in path {
            let Val::Struct(fields) = v else {
                panic!("field path through non-struct");
            };
            v = &mut fields[i];
        }
        *v = new;
    }

    fn as_int(&self) -> i128 {
        match self {
            Val::Int(i) => *i,
            other => panic!("expected int, got {:?}", other),
        }
    }

    fn as_bool(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            other => panic!("expected bool, got {:?}", other),
        }
    }
}

pub fn zero(types: &TypeContext, ty: TypeId) -> Val {
    match &*types.underlying_type(ty) {
        Type::Basic(k) if k.is_boolean() => Val::Bool(false),
        Type::Basic(k) if k.is_integer() => Val::Int(0),
        Type::Basic(k) if k.is_float() => Val::Float(0.0),
        Type::Basic(k) if k.is_string() => Val::Str(String::new()),
        Type::Struct(s) => Val::Struct(s.fields.iter().map(|f| zero(types, f.ty)).collect()),
        _ => Val::Nil,
    }
}

pub struct Evaluator<'p> {
    prog: &'p Program,
}

impl<'p> Evaluator<'p> {
    pub fn new(prog: &'p Program) -> Self {
        Self { prog }
    }

    /// Call a function with its parameters and free variables
    pub fn call(&self, f: FunctionId, args: Vec<Val>, free: Vec<Val>) -> Vec<Val> {
        let func = self.prog.function(f);
        assert_eq!(func.params.len(), args.len(), "arity of {}", func.name);
        assert_eq!(func.free_vars.len(), free.len(), "captures of {}", func.name);

        let mut env: HashMap<ValueId, Val> = HashMap::new();
        env.extend(func.params.iter().copied().zip(args));
        env.extend(func.free_vars.iter().copied().zip(free));

        let mut block = func.entry();
        loop {
            for instr in func.block_instrs(block) {
                if let Some(v) = self.step(&func, &env, instr) {
                    if let Some(r) = instr.result {
                        env.insert(r, v);
                    }
                }
            }
            match &func.block(block).terminator {
                Terminator::Jump(target) => block = *target,
                Terminator::If {
                    cond,
                    then_block,
                    else_block,
                } => {
                    block = if self.get(&func, &env, *cond).as_bool() {
                        *then_block
                    } else {
                        *else_block
                    };
                }
                Terminator::Return(results) => {
                    return results.iter().map(|&v| self.get(&func, &env, v)).collect();
                }
                Terminator::Unreachable => panic!("{}: fell off {}", func.name, block),
            }
        }
    }

    fn get(&self, func: &Function, env: &HashMap<ValueId, Val>, v: ValueId) -> Val {
        match &func.value(v).kind {
            ValueKind::Const(c) => match c {
                ConstValue::Bool(b) => Val::Bool(*b),
                ConstValue::Int(i) => Val::Int(*i),
                ConstValue::Float(x) => Val::Float(*x),
                ConstValue::String(s) => Val::Str(s.clone()),
                ConstValue::Nil => Val::Nil,
                ConstValue::Complex(..) => panic!("complex constants are not evaluated"),
            },
            _ => env
                .get(&v)
                .cloned()
                .unwrap_or_else(|| panic!("{}: {} used before definition", func.name, v)),
        }
    }

    fn step(&self, func: &Function, env: &HashMap<ValueId, Val>, instr: &Instruction) -> Option<Val> {
        let types = self.prog.types();
        let get = |v: &ValueId| self.get(func, env, *v);
        let v = match &instr.kind {
            InstrKind::Alloc { .. } => {
                let addr = instr.result.expect("allocation has a result");
                Val::ptr(zero(types, types.deref(func.value_type(addr))))
            }
            InstrKind::Load { addr } => get(addr).load(),
            InstrKind::Store { addr, val } => {
                get(addr).store(get(val));
                return None;
            }
            InstrKind::BinOp { op, x, y } => {
                let (x, y) = (get(x), get(y));
                match op {
                    BinaryOp::Add => Val::Int(x.as_int() + y.as_int()),
                    BinaryOp::Sub => Val::Int(x.as_int() - y.as_int()),
                    BinaryOp::Mul => Val::Int(x.as_int() * y.as_int()),
                    BinaryOp::Equal => Val::Bool(x == y),
                    BinaryOp::NotEqual => Val::Bool(x != y),
                    BinaryOp::Less => Val::Bool(x.as_int() < y.as_int()),
                    other => panic!("operator {} is not evaluated", other),
                }
            }
            InstrKind::FieldAddr { x, field } => match get(x) {
                Val::Ptr(cell, mut path) => {
                    path.push(*field);
                    Val::Ptr(cell, path)
                }
                other => panic!("field address through {:?}", other),
            },
            InstrKind::Field { x, field } => match get(x) {
                Val::Struct(mut fields) => fields.swap_remove(*field),
                other => panic!("field of {:?}", other),
            },
            InstrKind::ChangeType { x }
            | InstrKind::ChangeInterface { x }
            | InstrKind::Convert { x } => get(x),
            InstrKind::MakeInterface { x } => {
                Val::Iface(func.value_type(*x), Box::new(get(x)))
            }
            InstrKind::Call(call) => {
                let args: Vec<Val> = call.args.iter().map(get).collect();
                let results = match &call.callee {
                    Callee::Direct(f) => self.call(*f, args, vec![]),
                    Callee::Invoke { recv, method } => {
                        let Val::Iface(dyn_ty, payload) = get(recv) else {
                            panic!("invoke on non-interface");
                        };
                        let id = types.func(*method).id();
                        let sel = types
                            .lookup_method(dyn_ty, &id)
                            .expect("dynamic type implements the method");
                        let f = self.prog.lookup_method(&sel).expect("method resolves");
                        let mut full = vec![*payload];
                        full.extend(args);
                        self.call(f, full, vec![])
                    }
                };
                if results.len() == 1 {
                    results.into_iter().next()?
                } else {
                    Val::Tuple(results)
                }
            }
            InstrKind::Extract { tuple, index } => match get(tuple) {
                Val::Tuple(mut vals) => vals.swap_remove(*index),
                other => panic!("extract from {:?}", other),
            },
            InstrKind::TypeAssert {
                x,
                asserted,
                comma_ok,
            } => {
                let Val::Iface(dyn_ty, payload) = get(x) else {
                    panic!("type assertion on non-interface");
                };
                let matches = dyn_ty == *asserted;
                if *comma_ok {
                    let value = if matches {
                        *payload
                    } else {
                        zero(types, *asserted)
                    };
                    Val::Tuple(vec![value, Val::Bool(matches)])
                } else {
                    assert!(matches, "type assertion failed");
                    *payload
                }
            }
            InstrKind::DebugRef { .. } | InstrKind::Trace { .. } => return None,
        };
        Some(v)
    }
}
