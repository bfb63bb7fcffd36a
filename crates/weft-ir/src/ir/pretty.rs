//! Pretty-printing for IR
//!
//! Provides human-readable output for debugging IR structures. Types are
//! rendered through the program's [`TypeContext`].

use super::block::BasicBlock;
use super::function::Function;
use super::instr::{Callee, InstrKind, Instruction};
use super::value::{ValueId, ValueKind};
use std::fmt::Write;
use weft_types::TypeContext;

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self, types: &TypeContext) -> String;
}

impl PrettyPrint for Function {
    fn pretty_print(&self, types: &TypeContext) -> String {
        let mut output = String::new();

        if let Some(desc) = &self.synthetic {
            writeln!(output, "; {}", desc).unwrap();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|&p| format!("{} {}", p, types.type_string(self.value_type(p))))
            .collect();
        writeln!(
            output,
            "fn {}({}) : {} {{",
            self.name,
            params.join(", "),
            types.type_string(self.signature)
        )
        .unwrap();

        if !self.free_vars.is_empty() {
            let free: Vec<String> = self
                .free_vars
                .iter()
                .map(|&v| match &self.value(v).kind {
                    ValueKind::FreeVar { name, .. } => {
                        format!("{} {} {}", v, name, types.type_string(self.value_type(v)))
                    }
                    _ => v.to_string(),
                })
                .collect();
            writeln!(output, "  ; free: {}", free.join(", ")).unwrap();
        }
        if !self.locals.is_empty() {
            let locals: Vec<String> = self.locals.iter().map(|l| l.to_string()).collect();
            writeln!(output, "  ; locals: {}", locals.join(", ")).unwrap();
        }
        if let Some(recover) = self.recover {
            writeln!(output, "  ; recover: {}", recover).unwrap();
        }

        for block in &self.blocks {
            output.push_str(&pretty_print_block(self, block, types));
        }

        writeln!(output, "}}").unwrap();
        output
    }
}

fn pretty_print_block(func: &Function, block: &BasicBlock, types: &TypeContext) -> String {
    let mut output = String::new();

    match &block.label {
        Some(label) => writeln!(output, "  {}: ; {}", block.id, label).unwrap(),
        None => writeln!(output, "  {}:", block.id).unwrap(),
    }
    if !block.preds.is_empty() {
        let preds: Vec<String> = block.preds.iter().map(|p| p.to_string()).collect();
        writeln!(output, "    ; preds: {}", preds.join(", ")).unwrap();
    }

    for instr in func.block_instrs(block.id) {
        writeln!(output, "    {}", format_instr(func, instr, types)).unwrap();
    }

    let term = match &block.terminator {
        super::block::Terminator::Return(results) if !results.is_empty() => {
            let results: Vec<String> = results.iter().map(|&v| operand(func, v, types)).collect();
            format!("return {}", results.join(", "))
        }
        other => other.to_string(),
    };
    writeln!(output, "    {}", term).unwrap();

    output
}

/// A value as it appears in operand position; constants are printed inline
fn operand(func: &Function, v: ValueId, types: &TypeContext) -> String {
    match &func.value(v).kind {
        ValueKind::Const(c) => format!("{}:{}", c, types.type_string(func.value_type(v))),
        _ => v.to_string(),
    }
}

fn format_instr(func: &Function, instr: &Instruction, types: &TypeContext) -> String {
    let op = |v: &ValueId| operand(func, *v, types);
    let body = match &instr.kind {
        InstrKind::Alloc { heap } => {
            let ty = instr
                .result
                .map(|r| types.type_string(types.deref(func.value_type(r))))
                .unwrap_or_default();
            if *heap {
                format!("new {}", ty)
            } else {
                format!("local {}", ty)
            }
        }
        InstrKind::Load { addr } => format!("*{}", op(addr)),
        InstrKind::Store { addr, val } => format!("*{} = {}", op(addr), op(val)),
        InstrKind::BinOp { op: bin, x, y } => format!("{} {} {}", op(x), bin, op(y)),
        InstrKind::FieldAddr { x, field } => format!("&{}.#{}", op(x), field),
        InstrKind::Field { x, field } => format!("{}.#{}", op(x), field),
        InstrKind::ChangeType { x }
        | InstrKind::ChangeInterface { x }
        | InstrKind::Convert { x }
        | InstrKind::MakeInterface { x } => format!("{} {}", instr.kind.mnemonic(), op(x)),
        InstrKind::Call(call) => {
            let args: Vec<String> = call.args.iter().map(op).collect();
            match &call.callee {
                Callee::Direct(f) => format!("call {}({})", f, args.join(", ")),
                Callee::Invoke { recv, method } => format!(
                    "invoke {}.{}({})",
                    op(recv),
                    types.func(*method).name,
                    args.join(", ")
                ),
            }
        }
        InstrKind::Extract { tuple, index } => format!("extract {} #{}", op(tuple), index),
        InstrKind::TypeAssert {
            x,
            asserted,
            comma_ok,
        } => {
            let ok = if *comma_ok { ",ok" } else { "" };
            format!("typeassert{} {}.({})", ok, op(x), types.type_string(*asserted))
        }
        InstrKind::DebugRef { x, pos, is_addr } => {
            let addr = if *is_addr { "&" } else { "" };
            format!("; {}{} @ {}", addr, op(x), pos)
        }
        InstrKind::Trace { event, start, end } => format!("trace {} {}..{}", event, start, end),
    };

    match instr.result {
        Some(r) => format!("{} = {} : {}", r, body, types.type_string(func.value_type(r))),
        None => body,
    }
}
