//! Renders validator plans into Rust source.
//!
//! Identical plans yield byte-identical output: everything is driven by the
//! plan order the traversal fixed, and no map iteration leaks in. The
//! generated file expects to live as a module next to the schema types it
//! validates (`use super::*`) and calls back into this crate's runtime
//! validation library.

use crate::gen::names::snake_case;
use crate::gen::traverse::{FieldPlan, TypePlan, DELEGATE_CALLEE};
use crate::schema::TypeName;
use crate::tags::emission::{
    Arg, BindKind, EquivKind, Flags, FunctionGen, Subfield, ValidatorRef, VariableGen,
};

/// How a short-circuit leaves the enclosing call chain.
#[derive(Clone, Copy)]
enum Exit<'a> {
    /// `break 'label` out of a labeled field block.
    Break(&'a str),
    /// `return errs` out of an inline validator closure.
    Return,
}

struct CodeBuf {
    out: String,
    indent: usize,
}

impl CodeBuf {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: &str) {
        self.indent -= 1;
        self.line(text);
    }
}

/// Renders the full generated file for the given plans. `roots` names the
/// types wired into the emitted `register` function; when empty, every
/// planned type is registered.
pub fn emit(plans: &[TypePlan], roots: &[TypeName]) -> String {
    let mut buf = CodeBuf::new();
    buf.line("// Code generated by niyama from schema declarations. DO NOT EDIT.");
    buf.line("");
    buf.line("#![allow(unused_imports, unused_variables, unused_labels, clippy::all)]");
    buf.line("");
    buf.line("use std::sync::LazyLock;");
    buf.line("");
    buf.line("use niyama::validate::path::FieldPath;");
    buf.line("use niyama::validate::{each, limits, presence, ratchet, union};");
    buf.line("use niyama::validate::{ErrorList, OperationContext};");
    buf.line("");
    buf.line("use super::*;");

    for plan in plans {
        for var in &plan.variables {
            buf.line("");
            emit_variable(&mut buf, var);
        }
        buf.line("");
        emit_validator(&mut buf, plan);
    }

    buf.line("");
    emit_register(&mut buf, plans, roots);
    buf.out
}

fn emit_variable(buf: &mut CodeBuf, var: &VariableGen) {
    let ctor = &var.init.callee;
    let ty = ctor
        .rsplit_once("::")
        .map(|(head, _)| head)
        .unwrap_or(ctor.as_str());
    let args: Vec<String> = var.init.args.iter().map(|a| render_arg(a, "")).collect();
    buf.open(&format!("static {}: LazyLock<{}> =", var.ident, ty));
    buf.line(&format!("LazyLock::new(|| {}({}));", ctor, args.join(", ")));
    buf.indent -= 1;
}

fn emit_register(buf: &mut CodeBuf, plans: &[TypePlan], roots: &[TypeName]) {
    let registered: Vec<&TypePlan> = if roots.is_empty() {
        plans.iter().collect()
    } else {
        plans.iter().filter(|p| roots.contains(&p.type_name)).collect()
    };
    buf.open("pub fn register(scheme: &mut niyama::dispatch::Scheme) {");
    for plan in registered {
        buf.line(&format!(
            "scheme.add_validation::<{}>({});",
            plan.rust_ty, plan.fn_name
        ));
    }
    buf.close("}");
}

fn emit_validator(buf: &mut CodeBuf, plan: &TypePlan) {
    buf.open(&format!("pub(crate) fn {}(", plan.fn_name));
    buf.line("op: &OperationContext,");
    buf.line("fld: &FieldPath,");
    buf.line(&format!("new: Option<&{}>,", plan.rust_ty));
    buf.line(&format!("old: Option<&{}>,", plan.rust_ty));
    buf.close(") -> ErrorList {");
    buf.indent += 1;
    buf.line("let mut errs = ErrorList::new();");
    if plan.ratchet {
        buf.open("if op.is_update() && ratchet::deep_equal_opt(new, old) {");
        buf.line("return errs;");
        buf.close("}");
    }

    if !plan.type_calls.is_empty() {
        let (new_expr, old_expr) = match plan.self_bind {
            BindKind::Slice => {
                buf.line("let new_v = new.map(|v| v.as_slice());");
                buf.line("let old_v = old.map(|v| v.as_slice());");
                ("new_v", "old_v")
            }
            BindKind::Direct => ("new", "old"),
        };
        buf.open("'value: {");
        for call in &plan.type_calls {
            emit_call(
                buf,
                call,
                new_expr,
                old_expr,
                "fld",
                &plan.rust_ty,
                Exit::Break("'value"),
            );
        }
        buf.close("}");
    }

    for field in &plan.fields {
        emit_field(buf, field);
    }

    buf.line("errs");
    buf.close("}");
}

fn emit_field(buf: &mut CodeBuf, field: &FieldPlan) {
    let wants_value = field
        .calls
        .iter()
        .any(|c| !c.flags.contains(Flags::PTR_OK));
    let wants_option = field.calls.iter().any(|c| c.flags.contains(Flags::PTR_OK));

    buf.line(&format!("// {}", field.json_name));
    buf.open("{");
    buf.line(&format!("let fld = fld.child({:?});", field.json_name));

    let val = format!("new_{}", field.rust_name);
    let old_val = format!("old_{}", field.rust_name);
    if wants_value {
        buf.line(&format!(
            "let {val} = {};",
            field_binding("new", &field.rust_name, field.optional, field.bind)
        ));
        buf.line(&format!(
            "let {old_val} = {};",
            field_binding("old", &field.rust_name, field.optional, field.bind)
        ));
    }
    let ptr = format!("new_{}_p", field.rust_name);
    let old_ptr = format!("old_{}_p", field.rust_name);
    if wants_option {
        buf.line(&format!("let {ptr} = new.map(|v| &v.{});", field.rust_name));
        buf.line(&format!("let {old_ptr} = old.map(|v| &v.{});", field.rust_name));
    }

    let label = format!("'fld_{}", snake_case(&field.rust_name));
    buf.open(&format!("{label}: {{"));
    for call in &field.calls {
        let (n, o) = if call.flags.contains(Flags::PTR_OK) {
            (ptr.as_str(), old_ptr.as_str())
        } else {
            (val.as_str(), old_val.as_str())
        };
        emit_call(buf, call, n, o, "&fld", "", Exit::Break(&label));
    }
    buf.close("}");
    buf.close("}");
}

// The binding that adapts a struct field to the canonical Option<&T>
// argument shape.
fn field_binding(src: &str, rust_name: &str, optional: bool, bind: BindKind) -> String {
    match (optional, bind) {
        (true, BindKind::Slice) => format!("{src}.and_then(|v| v.{rust_name}.as_deref())"),
        (true, BindKind::Direct) => format!("{src}.and_then(|v| v.{rust_name}.as_ref())"),
        (false, BindKind::Slice) => format!("{src}.map(|v| v.{rust_name}.as_slice())"),
        (false, BindKind::Direct) => format!("{src}.map(|v| &v.{rust_name})"),
    }
}

fn emit_call(
    buf: &mut CodeBuf,
    call: &FunctionGen,
    new_expr: &str,
    old_expr: &str,
    fld_expr: &str,
    self_ty: &str,
    exit: Exit,
) {
    let guarded = !call.cond.is_empty();
    if let Some(opt) = &call.cond.option_enabled {
        buf.open(&format!("if op.has_option({opt:?}) {{"));
    }
    if let Some(opt) = &call.cond.option_disabled {
        buf.open(&format!("if !op.has_option({opt:?}) {{"));
    }

    if call.subfield.is_empty() {
        emit_plain_call(buf, call, new_expr, old_expr, fld_expr, self_ty, exit);
    } else {
        emit_subfield_call(buf, call, new_expr, old_expr, exit);
    }

    if guarded {
        buf.close("}");
    }
}

fn emit_subfield_call(
    buf: &mut CodeBuf,
    call: &FunctionGen,
    new_expr: &str,
    old_expr: &str,
    exit: Exit,
) {
    buf.open("{");
    let mut new_cur = new_expr.to_string();
    let mut old_cur = old_expr.to_string();
    let last = call.subfield.len() - 1;
    for (i, hop) in call.subfield.iter().enumerate() {
        let bind = if i == last { hop.bind } else { BindKind::Direct };
        buf.line(&format!("let fld = fld.child({:?});", hop.json_name));
        let (new_next, old_next) = (format!("new_sub{i}"), format!("old_sub{i}"));
        if call.flags.contains(Flags::PTR_OK) && i == last {
            buf.line(&format!("let {new_next} = {new_cur}.map(|v| &v.{});", hop.rust_name));
            buf.line(&format!("let {old_next} = {old_cur}.map(|v| &v.{});", hop.rust_name));
        } else {
            buf.line(&format!(
                "let {new_next} = {};",
                field_binding(&new_cur, &hop.rust_name, hop.optional, bind)
            ));
            buf.line(&format!(
                "let {old_next} = {};",
                field_binding(&old_cur, &hop.rust_name, hop.optional, bind)
            ));
        }
        new_cur = new_next;
        old_cur = old_next;
    }
    let mut inner = call.clone();
    inner.subfield = Vec::new();
    emit_plain_call(buf, &inner, &new_cur, &old_cur, "&fld", "", exit);
    buf.close("}");
}

fn emit_plain_call(
    buf: &mut CodeBuf,
    call: &FunctionGen,
    new_expr: &str,
    old_expr: &str,
    fld_expr: &str,
    self_ty: &str,
    exit: Exit,
) {
    // Delegation to another generated validator is a plain call.
    if call.callee == DELEGATE_CALLEE {
        if let Some(Arg::Validator {
            vref: ValidatorRef::Named(name),
            ..
        }) = call.args.first()
        {
            buf.line(&format!(
                "errs.extend({name}(op, {fld_expr}, {new_expr}, {old_expr}));"
            ));
        }
        return;
    }

    let turbofish = if call.type_args.is_empty() {
        String::new()
    } else {
        format!("::<{}>", call.type_args.join(", "))
    };
    let mut rendered = format!("{}{}(op, {}, {}, {}", call.callee, turbofish, fld_expr, new_expr, old_expr);
    let mut inline_args: Vec<&FunctionGen> = Vec::new();
    for arg in &call.args {
        rendered.push_str(", ");
        match arg {
            Arg::Validator {
                vref: ValidatorRef::Inline(fns),
                ..
            } => {
                rendered.push_str("#CLOSURE#");
                inline_args.extend(fns.iter());
            }
            other => rendered.push_str(&render_arg(other, self_ty)),
        }
    }
    rendered.push(')');

    // Inline validator closures need multi-line rendering; split around the
    // placeholder when one is present.
    let closure_bind = call.args.iter().find_map(|a| match a {
        Arg::Validator {
            vref: ValidatorRef::Inline(_),
            bind,
        } => Some(*bind),
        _ => None,
    });

    match closure_bind {
        None => emit_statement(buf, call.flags, &rendered, exit),
        Some(bind) => {
            let (head, tail) = rendered
                .split_once("#CLOSURE#")
                .expect("placeholder present");
            let opener = statement_opener(call.flags);
            buf.open(&format!("{opener}{}", head.trim_end()));
            buf.open("|op, fld, new, old| {");
            buf.line("let mut errs = ErrorList::new();");
            if bind == BindKind::Slice {
                buf.line("let new = new.map(|v| v.as_slice());");
                buf.line("let old = old.map(|v| v.as_slice());");
            }
            for inner in inline_args {
                emit_call(buf, inner, "new", "old", "fld", "", Exit::Return);
            }
            buf.line("errs");
            buf.close("},");
            buf.indent -= 1;
            finish_statement(buf, call.flags, tail, exit);
        }
    }
}

// Single-line statement for a call with no inline closure argument.
fn emit_statement(buf: &mut CodeBuf, flags: Flags, rendered: &str, exit: Exit) {
    let leave = match exit {
        Exit::Break(label) => format!("break {label};"),
        Exit::Return => "return errs;".to_string(),
    };
    if flags.contains(Flags::SHORT_CIRCUIT | Flags::NON_ERROR) {
        buf.open(&format!("if !{rendered}.is_empty() {{"));
        buf.line(&leave);
        buf.close("}");
    } else if flags.contains(Flags::SHORT_CIRCUIT) {
        buf.line(&format!("let e = {rendered};"));
        buf.open("if !e.is_empty() {");
        buf.line("errs.extend(e);");
        buf.line(&leave);
        buf.close("}");
    } else {
        buf.line(&format!("errs.extend({rendered});"));
    }
}

fn statement_opener(flags: Flags) -> &'static str {
    if flags.contains(Flags::SHORT_CIRCUIT | Flags::NON_ERROR) {
        "let probe = "
    } else if flags.contains(Flags::SHORT_CIRCUIT) {
        "let e = "
    } else {
        "errs.extend("
    }
}

fn finish_statement(buf: &mut CodeBuf, flags: Flags, tail: &str, exit: Exit) {
    let leave = match exit {
        Exit::Break(label) => format!("break {label};"),
        Exit::Return => "return errs;".to_string(),
    };
    if flags.contains(Flags::SHORT_CIRCUIT | Flags::NON_ERROR) {
        buf.line(&format!("{tail};"));
        buf.open("if !probe.is_empty() {");
        buf.line(&leave);
        buf.close("}");
    } else if flags.contains(Flags::SHORT_CIRCUIT) {
        buf.line(&format!("{tail};"));
        buf.open("if !e.is_empty() {");
        buf.line("errs.extend(e);");
        buf.line(&leave);
        buf.close("}");
    } else {
        buf.line(&format!("{tail});"));
    }
}

fn render_arg(arg: &Arg, self_ty: &str) -> String {
    match arg {
        Arg::Str(s) => format!("{s:?}"),
        Arg::Int(i) => i.to_string(),
        Arg::Bool(b) => b.to_string(),
        Arg::StrList(items) => {
            let quoted: Vec<String> = items.iter().map(|s| format!("{s:?}")).collect();
            format!("&[{}]", quoted.join(", "))
        }
        Arg::PairList(pairs) => {
            let rendered: Vec<String> = pairs
                .iter()
                .map(|(a, b)| format!("({a:?}, {b:?})"))
                .collect();
            format!("&[{}]", rendered.join(", "))
        }
        Arg::Ident(id) => format!("&*{id}"),
        Arg::NoneLit => "None".to_string(),
        Arg::KeyMatch { rust_fields, wrapped } => {
            let clauses: Vec<String> = rust_fields
                .iter()
                .map(|f| format!("a.{f} == b.{f}"))
                .collect();
            let matcher = format!("|a, b| {}", clauses.join(" && "));
            if *wrapped {
                format!("Some({matcher})")
            } else {
                matcher
            }
        }
        Arg::Equiv { kind, .. } => match kind {
            EquivKind::None => "None".to_string(),
            EquivKind::Direct => "Some(ratchet::direct_equal)".to_string(),
            EquivKind::Deep => "Some(ratchet::deep_equal)".to_string(),
        },
        Arg::ExtractorList(members) => {
            let rendered: Vec<String> = members
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    let body = if m.optional {
                        format!("|v: &{self_ty}| v.{}.is_some()", m.rust_name)
                    } else {
                        format!("|v: &{self_ty}| v.{} != Default::default()", m.rust_name)
                    };
                    if i == 0 {
                        format!("({body}) as fn(&{self_ty}) -> bool")
                    } else {
                        body
                    }
                })
                .collect();
            format!("&[{}]", rendered.join(", "))
        }
        Arg::DiscriminatorFn { rust_field } => {
            format!("|v: &{self_ty}| v.{rust_field}.to_string()")
        }
        Arg::Validator {
            vref: ValidatorRef::Named(name),
            ..
        } => name.clone(),
        Arg::Validator {
            vref: ValidatorRef::Inline(_),
            ..
        } => unreachable!("inline validators are rendered by emit_plain_call"),
    }
}
