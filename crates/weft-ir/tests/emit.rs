//! Function construction through the builder
//!
//! Covers control flow, the recover block, field selection on values and
//! the debug markers, evaluated where the behavior is observable.

mod common;

use common::{entry_kinds, fixture, fixture_with_mode, Evaluator, Val};
use weft_ir::{
    BinaryOp, BuildError, BuildMode, ConstValue, FunctionBuilder, InstrKind, PrettyPrint,
    Terminator, TraceEvent,
};
use weft_types::{ChanDir, Pos, Signature, Var};

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_branching_max_function() {
    let fx = fixture();
    let t = fx.types();
    let sig = t.signature(Signature::new(
        vec![Var::new("x", fx.int), Var::new("y", fx.int)],
        vec![Var::new("", fx.int)],
    ));

    let mut b = FunctionBuilder::new(&fx.prog, "max", sig);
    let p = b.create_params();
    let then_block = b.new_block("if.then");
    let else_block = b.new_block("if.else");
    let cond = b.compare(BinaryOp::Less, p[0], p[1]);
    b.branch(cond, then_block, else_block);
    b.set_current(then_block);
    b.ret(vec![p[1]]);
    b.set_current(else_block);
    b.ret(vec![p[0]]);
    let func = b.finish().unwrap();

    assert_eq!(func.block(func.entry()).succs, vec![then_block, else_block]);
    assert_eq!(func.block(then_block).preds, vec![func.entry()]);
    let f = fx.prog.add_function(func);

    let eval = Evaluator::new(&fx.prog);
    assert_eq!(eval.call(f, vec![Val::Int(2), Val::Int(9)], vec![]), vec![Val::Int(9)]);
    assert_eq!(eval.call(f, vec![Val::Int(4), Val::Int(1)], vec![]), vec![Val::Int(4)]);
}

#[test]
fn test_true_comparison_folds_to_operand() {
    let fx = fixture();
    let t = fx.types();
    let boolean = t.bool_type();
    let sig = t.signature(Signature::new(
        vec![Var::new("b", boolean)],
        vec![Var::new("", boolean)],
    ));

    let mut b = FunctionBuilder::new(&fx.prog, "is_true", sig);
    let p = b.create_params();
    let tru = b.const_true();
    let r = b.compare(BinaryOp::Equal, tru, p[0]);
    assert_eq!(r, p[0]);
    b.ret(vec![r]);
    let func = b.finish().unwrap();
    assert_eq!(func.instruction_count(), 0);
}

#[test]
fn test_illegal_arith_operator() {
    let fx = fixture();
    let sig = fx.types().signature(Signature::new(vec![], vec![]));
    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let one = b.const_value(ConstValue::Int(1), fx.int);
    let err = b.arith(BinaryOp::Equal, one, one, fx.int).unwrap_err();
    assert!(matches!(err, BuildError::IllegalArithOp { .. }));
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_channel_direction_conversion_is_change_type() {
    let fx = fixture();
    let t = fx.types();
    let both = t.chan(fx.int, ChanDir::Both);
    let send = t.chan(fx.int, ChanDir::Send);
    let sig = t.signature(Signature::new(vec![Var::new("ch", both)], vec![]));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let p = b.create_params();
    let out = b.convert(p[0], send);
    assert_eq!(b.value_type(out), send);
    b.ret(vec![]);
    assert_eq!(entry_kinds(&b.finish().unwrap()), ["changetype"]);
}

#[test]
fn test_signature_conversion_is_change_type() {
    let fx = fixture();
    let t = fx.types();
    // Parameter names are part of a signature, so these two differ.
    let from = t.signature(Signature::new(
        vec![Var::new("x", fx.int)],
        vec![Var::new("", fx.int)],
    ));
    let to = t.signature(Signature::new(
        vec![Var::new("y", fx.int)],
        vec![Var::new("", fx.int)],
    ));
    assert_ne!(from, to);
    let sig = t.signature(Signature::new(vec![Var::new("fn", from)], vec![]));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let p = b.create_params();
    let out = b.convert(p[0], to);
    assert_eq!(b.value_type(out), to);
    b.ret(vec![]);
    assert_eq!(entry_kinds(&b.finish().unwrap()), ["changetype"]);
}

#[test]
fn test_interface_to_interface_is_change_interface() {
    let fx = fixture();
    let t = fx.types();
    let sig = t.signature(Signature::new(vec![Var::new("x", fx.tagger)], vec![]));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let p = b.create_params();
    let out = b.convert(p[0], fx.getter);
    assert_eq!(b.value_type(out), fx.getter);
    b.ret(vec![]);
    assert_eq!(entry_kinds(&b.finish().unwrap()), ["changeinterface"]);
    // Interface values carry their own methods.
    assert!(fx.prog.runtime_types().is_empty());
}

#[test]
fn test_compare_channels_of_different_direction_as_is() {
    let fx = fixture();
    let t = fx.types();
    let both = t.chan(fx.int, ChanDir::Both);
    let recv = t.chan(fx.int, ChanDir::Recv);
    let sig = t.signature(Signature::new(
        vec![Var::new("x", both), Var::new("y", recv)],
        vec![],
    ));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let p = b.create_params();
    b.compare(BinaryOp::Equal, p[0], p[1]);
    b.ret(vec![]);
    let func = b.finish().unwrap();

    assert_eq!(entry_kinds(&func), ["binop"]);
    let instr = func.block_instrs(func.entry()).next().unwrap();
    let InstrKind::BinOp { x, y, .. } = &instr.kind else {
        panic!("comparison must be a binop");
    };
    assert_eq!((*x, *y), (p[0], p[1]));
}

#[test]
fn test_zero_array_comes_from_local() {
    let fx = fixture();
    let t = fx.types();
    let arr = t.array(fx.int, 3);
    let sig = t.signature(Signature::new(vec![], vec![Var::new("", arr)]));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let zero = b.zero_value(arr);
    assert_eq!(b.value_type(zero), arr);
    b.ret(vec![zero]);
    assert_eq!(entry_kinds(&b.finish().unwrap()), ["local", "load"]);
}

// ============================================================================
// Field selection
// ============================================================================

#[test]
fn test_implicit_selections_on_value_extract_fields() {
    let fx = fixture();
    let t = fx.types();
    let pc = t.pointer(fx.c);
    let sig = t.signature(Signature::new(vec![Var::new("a", fx.a)], vec![Var::new("", pc)]));

    let mut b = FunctionBuilder::new(&fx.prog, "inner", sig);
    let p = b.create_params();
    let c = b.implicit_selections(p[0], &[0, 0]).unwrap();
    assert_eq!(b.value_type(c), pc);
    b.ret(vec![c]);
    let func = b.finish().unwrap();
    assert_eq!(entry_kinds(&func), ["field", "field"]);
}

#[test]
fn test_field_selection_on_non_struct_fails() {
    let fx = fixture();
    let sig = fx.types().signature(Signature::new(vec![Var::new("x", fx.int)], vec![]));
    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let p = b.create_params();
    let err = b.field_selection(p[0], 0, false).unwrap_err();
    assert_eq!(err.to_string(), "Field selection on non-struct type int");

    let sig = fx.types().signature(Signature::new(vec![Var::new("c", fx.c)], vec![]));
    let mut b = FunctionBuilder::new(&fx.prog, "g", sig);
    let p = b.create_params();
    let err = b.field_selection(p[0], 3, false).unwrap_err();
    assert!(matches!(err, BuildError::NoSuchField { index: 3, .. }));
}

// ============================================================================
// Recover block
// ============================================================================

#[test]
fn test_recover_block_returns_zero_values() {
    let fx = fixture();
    let t = fx.types();
    let sig = t.signature(Signature::new(
        vec![],
        vec![Var::new("", fx.int), Var::new("", fx.c)],
    ));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let entry = b.current_block();
    let recover = b.create_recover_block();
    assert_eq!(b.create_recover_block(), recover);
    assert_eq!(b.current_block(), entry);

    let zero = b.const_value(ConstValue::Int(0), fx.int);
    let local = b.add_local(fx.c);
    let c = b.load(local);
    b.ret(vec![zero, c]);
    let func = b.finish().unwrap();

    assert_eq!(func.recover, Some(recover));
    assert_eq!(entry_kinds(&func), ["local", "load"]);
    let Terminator::Return(results) = &func.block(recover).terminator else {
        panic!("recover block must return");
    };
    assert_eq!(results.len(), 2);
    assert!(func.value(results[0]).is_const());
    assert_eq!(func.value_type(results[1]), fx.c);

    let f = fx.prog.add_function(func);
    let eval = Evaluator::new(&fx.prog);
    assert_eq!(
        eval.call(f, vec![], vec![]),
        vec![Val::Int(0), Val::Struct(vec![Val::Int(0)])]
    );
}

#[test]
fn test_recover_block_reloads_named_results() {
    let fx = fixture();
    let t = fx.types();
    let sig = t.signature(Signature::new(
        vec![],
        vec![Var::new("n", fx.int), Var::new("err", fx.string)],
    ));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let named = b.declare_named_results();
    assert_eq!(named.len(), 2);
    let recover = b.create_recover_block();
    let one = b.const_value(ConstValue::Int(1), fx.int);
    b.store(named[0], one);
    let err = b.load(named[1]);
    b.ret(vec![one, err]);
    let func = b.finish().unwrap();

    let kinds: Vec<_> = func
        .block_instrs(recover)
        .map(|i| i.kind.mnemonic())
        .collect();
    assert_eq!(kinds, ["load", "load"]);
}

// ============================================================================
// Debug markers and printing
// ============================================================================

#[test]
fn test_debug_ref_only_with_debug_info() {
    let fx = fixture();
    let sig = fx.types().signature(Signature::new(vec![Var::new("x", fx.int)], vec![]));

    let mut b = FunctionBuilder::new(&fx.prog, "f", sig);
    let p = b.create_params();
    assert!(b.debug_ref(p[0], Pos(3), false).is_none());

    let dbg = fixture_with_mode(BuildMode::debug());
    let sig = dbg.types().signature(Signature::new(vec![Var::new("x", dbg.int)], vec![]));
    let mut b = FunctionBuilder::new(&dbg.prog, "f", sig);
    let p = b.create_params();
    assert!(b.debug_ref(p[0], Pos(3), false).is_some());
    b.trace(TraceEvent::Statement, Pos(3), Pos(4));
    b.ret(vec![]);
    let func = b.finish().unwrap();
    assert_eq!(entry_kinds(&func), ["debugref", "trace"]);
}

#[test]
fn test_pretty_print_inlines_constants() {
    let fx = fixture();
    let sig = fx.types().signature(Signature::new(
        vec![Var::new("x", fx.int)],
        vec![Var::new("", fx.int)],
    ));
    let mut b = FunctionBuilder::new(&fx.prog, "inc", sig);
    let p = b.create_params();
    let one = b.const_value(ConstValue::Int(1), fx.int);
    let sum = b.arith(BinaryOp::Add, p[0], one, fx.int).unwrap();
    b.ret(vec![sum]);
    let text = b.finish().unwrap().pretty_print(fx.types());

    assert!(text.starts_with("fn inc("));
    assert!(text.contains("+ 1:int"));
    assert!(text.contains("return v"));
}
