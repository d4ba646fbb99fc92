//! Token tree → flat instruction list (spec §4.2). Single-pass, recursive
//! walk resolving every identifier against a [`Declarations`] scope stack.
//! Grounded on `examples/original_source/Rasp/src/parser.cpp` for the
//! recursive-descent shape and the call/while/if/var/set/defun codegen, with
//! `if`/`else`, `inc`, `type`, and `MemberAccess` added per spec.md (the
//! original snapshot predates those forms).

use std::collections::HashSet;

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::instruction::{Instruction, Opcode};
use crate::location::SourceLocation;
use crate::scope::{Classification, Declarations};
use crate::token::{Token, TokenKind};
use crate::value::{InternalFunction, TypeDefinition, Value};

const PRIMITIVE_TYPES: &[&str] = &["number", "string", "boolean"];

fn check_primitive_type(name: &str, location: &SourceLocation) -> Result<(), Traced> {
    if PRIMITIVE_TYPES.contains(&name) {
        Ok(())
    } else {
        Err(RaspError::parse(location.clone(), format!("Unknown type '{name}'")).into())
    }
}

fn ref_opcode(classification: Classification, identifier: Identifier) -> Option<Opcode> {
    match classification {
        Classification::Local => Some(Opcode::RefLocal(identifier)),
        Classification::Closure => Some(Opcode::RefClosure(identifier)),
        Classification::Global => Some(Opcode::RefGlobal(identifier)),
        Classification::Undefined => None,
    }
}

fn init_opcode(classification: Classification, identifier: Identifier) -> Option<Opcode> {
    match classification {
        Classification::Local => Some(Opcode::InitLocal(identifier)),
        Classification::Global => Some(Opcode::InitGlobal(identifier)),
        Classification::Closure | Classification::Undefined => None,
    }
}

fn assign_opcode(classification: Classification, identifier: Identifier) -> Option<Opcode> {
    match classification {
        Classification::Local => Some(Opcode::AssignLocal(identifier)),
        Classification::Closure => Some(Opcode::AssignClosure(identifier)),
        Classification::Global => Some(Opcode::AssignGlobal(identifier)),
        Classification::Undefined => None,
    }
}

/// Compiles a lexed root token into a flat instruction list. `declarations`
/// is mutated as top-level `var`/`defun`/`type` forms declare new names, so
/// a REPL can reuse the same scope stack across successive inputs.
pub fn compile(root: &Token, declarations: &mut Declarations) -> Result<Vec<Instruction>, Traced> {
    assert_eq!(root.kind, TokenKind::Root);
    let mut out = Vec::new();
    for child in &root.children {
        compile_token(child, declarations, &mut out)?;
    }
    Ok(out)
}

fn compile_token(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    match token.kind {
        TokenKind::Nil => out.push(Instruction::new(Opcode::Push(Value::Nil), token.location.clone())),
        TokenKind::True => {
            out.push(Instruction::new(Opcode::Push(Value::Boolean(true)), token.location.clone()))
        }
        TokenKind::False => {
            out.push(Instruction::new(Opcode::Push(Value::Boolean(false)), token.location.clone()))
        }
        TokenKind::Number => {
            let n: i64 = token.text.parse().map_err(|_| {
                RaspError::internal(format!("lexer produced a non-numeric Number token '{}'", token.text))
            })?;
            out.push(Instruction::new(Opcode::Push(Value::Number(n)), token.location.clone()));
        }
        TokenKind::String => out.push(Instruction::new(
            Opcode::Push(Value::String(token.text.clone())),
            token.location.clone(),
        )),
        TokenKind::Declaration => compile_identifier_like(&token.children[0], declarations, out)?,
        TokenKind::Identifier => compile_identifier_like(token, declarations, out)?,
        TokenKind::List => compile_list(token, declarations, out)?,
        TokenKind::Root => unreachable!("Root only appears at the top of the tree"),
        TokenKind::While => {
            return Err(RaspError::parse(token.location.clone(), "'while' must be first element of a list").into())
        }
        TokenKind::If => {
            return Err(RaspError::parse(token.location.clone(), "'if' must be first element of a list").into())
        }
        TokenKind::Else => {
            return Err(RaspError::parse(token.location.clone(), "'else' must be first element of a list").into())
        }
        TokenKind::Var => {
            return Err(RaspError::parse(token.location.clone(), "'var' must be first element of a list").into())
        }
        TokenKind::Set => {
            return Err(RaspError::parse(token.location.clone(), "'set' must be first element of a list").into())
        }
        TokenKind::Inc => {
            return Err(RaspError::parse(token.location.clone(), "'inc' must be first element of a list").into())
        }
        TokenKind::Type => {
            return Err(RaspError::parse(token.location.clone(), "'type' must be first element of a list").into())
        }
        TokenKind::Defun => {
            return Err(RaspError::parse(token.location.clone(), "'defun' must be first element of a list").into())
        }
    }
    Ok(())
}

fn compile_identifier_like(
    token: &Token,
    declarations: &Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let identifier = Identifier::new(token.text.clone());
    let classification = declarations.classify(&identifier);
    let opcode = ref_opcode(classification, identifier.clone()).ok_or_else(|| {
        RaspError::parse(
            token.location.clone(),
            format!("Identifier '{}' not defined", identifier.name()),
        )
    })?;
    out.push(Instruction::new(opcode, token.location.clone()));
    for member in &token.children {
        out.push(Instruction::new(
            Opcode::MemberAccess(Identifier::new(member.text.clone())),
            member.location.clone(),
        ));
    }
    Ok(())
}

fn compile_list(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.is_empty() {
        return Err(RaspError::parse(token.location.clone(), "Empty list is not allowed").into());
    }

    match children[0].kind {
        TokenKind::While => compile_while(token, declarations, out),
        TokenKind::If => compile_if(token, declarations, out),
        TokenKind::Var => compile_var(token, declarations, out),
        TokenKind::Set => compile_set(token, declarations, out),
        TokenKind::Inc => compile_inc(token, declarations, out),
        TokenKind::Type => compile_type(token, declarations, out),
        TokenKind::Defun => compile_defun(token, declarations, out),
        _ => {
            for arg in children[1..].iter().rev() {
                compile_token(arg, declarations, out)?;
            }
            compile_token(&children[0], declarations, out)?;
            out.push(Instruction::new(
                Opcode::Call((children.len() - 1) as u32),
                token.location.clone(),
            ));
            Ok(())
        }
    }
}

fn compile_while(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() == 1 {
        return Err(RaspError::parse(token.location.clone(), "'while' expression is missing condition").into());
    }
    if children.len() == 2 {
        return Err(RaspError::parse(token.location.clone(), "'while' expression is missing code to execute").into());
    }

    let mut cond = Vec::new();
    compile_token(&children[1], declarations, &mut cond)?;
    let c = cond.len();

    let mut body = Vec::new();
    for form in &children[2..] {
        compile_token(form, declarations, &mut body)?;
    }
    let b = body.len();

    out.extend(cond);
    out.push(Instruction::new(Opcode::CondJump((b + 1) as u32), token.location.clone()));
    out.extend(body);
    out.push(Instruction::new(Opcode::Loop((b + 1 + c + 1) as i32), token.location.clone()));
    Ok(())
}

fn compile_if(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() == 1 {
        return Err(RaspError::parse(token.location.clone(), "Conditional expression is missing condition").into());
    }
    if children.len() == 2 {
        return Err(
            RaspError::parse(token.location.clone(), "Conditional expression is missing code to execute").into(),
        );
    }

    let rest = &children[2..];
    let else_pos = rest.iter().position(|c| c.kind == TokenKind::Else);

    let (then_forms, else_forms): (&[Token], &[Token]) = match else_pos {
        None => (rest, &[]),
        Some(0) => {
            return Err(RaspError::parse(token.location.clone(), "'else' cannot appear before any 'then' forms").into())
        }
        Some(p) => {
            let then_forms = &rest[..p];
            let after = &rest[p + 1..];
            if after.is_empty() {
                return Err(RaspError::parse(token.location.clone(), "'else' is missing code to execute").into());
            }
            if after.iter().any(|c| c.kind == TokenKind::Else) {
                return Err(RaspError::parse(token.location.clone(), "duplicate 'else' in conditional expression").into());
            }
            (then_forms, after)
        }
    };

    let mut cond = Vec::new();
    compile_token(&children[1], declarations, &mut cond)?;

    let mut then_instrs = Vec::new();
    for form in then_forms {
        compile_token(form, declarations, &mut then_instrs)?;
    }
    let t = then_instrs.len();

    let mut else_instrs = Vec::new();
    for form in else_forms {
        compile_token(form, declarations, &mut else_instrs)?;
    }
    let e = else_instrs.len();

    out.extend(cond);
    out.push(Instruction::new(
        Opcode::CondJump((t + if e > 0 { 1 } else { 0 }) as u32),
        token.location.clone(),
    ));
    out.extend(then_instrs);
    if e > 0 {
        out.push(Instruction::new(Opcode::Jump(e as u32), token.location.clone()));
        out.extend(else_instrs);
    }
    Ok(())
}

/// Extracts `(name, Option<type-name>)` from an Identifier or Declaration
/// token used in a `var`/`type`-member/parameter position.
fn declared_name(token: &Token) -> Result<(String, Option<(String, SourceLocation)>), Traced> {
    match token.kind {
        TokenKind::Identifier if token.children.is_empty() => Ok((token.text.clone(), None)),
        TokenKind::Declaration => {
            let name = token.children[0].text.clone();
            let type_name = token.children[1].text.clone();
            let type_loc = token.children[1].location.clone();
            Ok((name, Some((type_name, type_loc))))
        }
        _ => Err(RaspError::parse(token.location.clone(), "Expected a name or name:type declaration").into()),
    }
}

fn compile_var(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() < 2 {
        return Err(RaspError::parse(token.location.clone(), "Variable declaration requires a name").into());
    }
    if children.len() < 3 {
        return Err(
            RaspError::parse(token.location.clone(), "Variable declaration requires an initialisation value").into(),
        );
    }
    if children.len() > 3 {
        return Err(RaspError::parse(token.location.clone(), "Variable declaration has too many forms").into());
    }

    let (name, type_info) = declared_name(&children[1])?;
    if let Some((type_name, type_loc)) = &type_info {
        check_primitive_type(type_name, type_loc)?;
    }

    let identifier = Identifier::new(name);
    if declarations.is_defined(&identifier) {
        return Err(RaspError::parse(
            token.location.clone(),
            format!("Identifier {} already defined", identifier.name()),
        )
        .into());
    }

    compile_token(&children[2], declarations, out)?;

    declarations.declare(identifier.clone());
    let classification = declarations.classify(&identifier);
    let opcode = init_opcode(classification, identifier).ok_or_else(|| {
        RaspError::internal("a freshly declared identifier classified as Closure or Undefined")
    })?;
    out.push(Instruction::new(opcode, token.location.clone()));
    Ok(())
}

fn compile_set(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() == 2 {
        return Err(RaspError::parse(token.location.clone(), "Variable assignment requires a name").into());
    }
    if children.len() != 3 {
        return Err(RaspError::parse(token.location.clone(), "Missing assignment value").into());
    }
    let name_token = &children[1];
    if name_token.kind != TokenKind::Identifier || !name_token.children.is_empty() {
        return Err(RaspError::parse(token.location.clone(), "'set' requires a plain identifier target").into());
    }
    let identifier = Identifier::new(name_token.text.clone());
    let classification = declarations.classify(&identifier);
    if classification == Classification::Undefined {
        return Err(RaspError::parse(
            token.location.clone(),
            format!("Identifier '{}' not defined", identifier.name()),
        )
        .into());
    }

    compile_token(&children[2], declarations, out)?;

    let opcode = assign_opcode(classification, identifier).expect("classification already checked non-Undefined");
    out.push(Instruction::new(opcode, token.location.clone()));
    Ok(())
}

fn compile_inc(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() != 2 {
        return Err(RaspError::parse(token.location.clone(), "'inc' requires exactly one variable").into());
    }
    let name_token = &children[1];
    if name_token.kind != TokenKind::Identifier || !name_token.children.is_empty() {
        return Err(RaspError::parse(token.location.clone(), "'inc' requires a plain identifier target").into());
    }
    let identifier = Identifier::new(name_token.text.clone());
    let classification = declarations.classify(&identifier);
    if classification == Classification::Undefined {
        return Err(RaspError::parse(
            token.location.clone(),
            format!("Identifier '{}' not defined", identifier.name()),
        )
        .into());
    }

    let loc = token.location.clone();
    out.push(Instruction::new(Opcode::Push(Value::Number(1)), loc.clone()));
    let ref_op = ref_opcode(classification, identifier.clone()).expect("non-Undefined classification has a Ref opcode");
    out.push(Instruction::new(ref_op, loc.clone()));
    out.push(Instruction::new(Opcode::RefGlobal(Identifier::new("+")), loc.clone()));
    out.push(Instruction::new(Opcode::Call(2), loc.clone()));
    let assign_op = assign_opcode(classification, identifier).expect("non-Undefined classification has an Assign opcode");
    out.push(Instruction::new(assign_op, loc));
    Ok(())
}

fn compile_type(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() < 2 {
        return Err(RaspError::parse(token.location.clone(), "Type declaration requires a name").into());
    }
    let (name, _) = declared_name(&children[1])
        .map_err(|_| RaspError::parse(token.location.clone(), "Type declaration requires a name"))?;

    let identifier = Identifier::new(name.clone());
    if declarations.is_defined(&identifier) {
        return Err(RaspError::parse(
            token.location.clone(),
            format!("Identifier {} already defined", identifier.name()),
        )
        .into());
    }

    let mut members = Vec::new();
    for member_token in &children[2..] {
        let (member_name, type_info) = declared_name(member_token)?;
        if let Some((type_name, type_loc)) = &type_info {
            check_primitive_type(type_name, type_loc)?;
        }
        members.push(member_name);
    }

    let type_def = Value::TypeDefinition(std::rc::Rc::new(TypeDefinition { name, members }));
    out.push(Instruction::new(Opcode::Push(type_def), token.location.clone()));

    declarations.declare(identifier.clone());
    let classification = declarations.classify(&identifier);
    let opcode = init_opcode(classification, identifier)
        .ok_or_else(|| RaspError::internal("a freshly declared type name classified as Closure or Undefined"))?;
    out.push(Instruction::new(opcode, token.location.clone()));
    Ok(())
}

fn compile_defun(
    token: &Token,
    declarations: &mut Declarations,
    out: &mut Vec<Instruction>,
) -> Result<(), Traced> {
    let children = &token.children;
    if children.len() < 2 {
        return Err(RaspError::parse(token.location.clone(), "Function declaration requires a name").into());
    }
    if children.len() < 3 {
        return Err(RaspError::parse(token.location.clone(), "Function declaration requires a parameter list").into());
    }
    if children[2].kind != TokenKind::List {
        return Err(RaspError::parse(token.location.clone(), "Function parameter list must be a list").into());
    }
    if children.len() < 4 {
        return Err(RaspError::parse(token.location.clone(), "Function lacks a body").into());
    }

    let (name, _) = declared_name(&children[1])
        .map_err(|_| RaspError::parse(token.location.clone(), "Function declaration requires a name"))?;
    let identifier = Identifier::new(name.clone());
    if declarations.is_defined(&identifier) {
        return Err(RaspError::parse(
            token.location.clone(),
            format!("Identifier {} already defined", identifier.name()),
        )
        .into());
    }
    // Declared in the enclosing scope before the body is compiled, so the
    // function may call itself recursively.
    declarations.declare(identifier.clone());

    let mut parameters = Vec::new();
    declarations.push_scope();
    for param_token in &children[2].children {
        let (param_name, _) = declared_name(param_token)?;
        let param_id = Identifier::new(param_name);
        declarations.declare(param_id.clone());
        parameters.push(param_id);
    }

    let mut body = Vec::new();
    for form in &children[3..] {
        compile_token(form, declarations, &mut body)?;
    }
    declarations.pop_scope();

    let captured = captured_identifiers(&body);

    let function = Value::Function(crate::value::Function::Internal(std::rc::Rc::new(InternalFunction {
        name: name.clone(),
        location: token.location.clone(),
        parameters,
        instructions: body,
    })));

    if captured.is_empty() {
        out.push(Instruction::new(Opcode::Push(function), token.location.clone()));
    } else {
        for capture_name in &captured {
            out.push(Instruction::new(
                Opcode::InitClosure(capture_name.clone()),
                token.location.clone(),
            ));
        }
        out.push(Instruction::new(Opcode::Push(function), token.location.clone()));
        out.push(Instruction::new(
            Opcode::Capture(captured.len() as u32),
            token.location.clone(),
        ));
    }

    let classification = declarations.classify(&identifier);
    let opcode = init_opcode(classification, identifier)
        .ok_or_else(|| RaspError::internal("a freshly declared function name classified as Closure or Undefined"))?;
    out.push(Instruction::new(opcode, token.location.clone()));
    Ok(())
}

/// Scans a compiled function body for `RefClosure`/`AssignClosure` targets,
/// returning the de-duplicated names in first-occurrence order — these are
/// the identifiers the enclosing scope must hand the closure at creation
/// time (spec §4.2 `defun`).
fn captured_identifiers(body: &[Instruction]) -> Vec<Identifier> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for instr in body {
        let identifier = match &instr.opcode {
            Opcode::RefClosure(name) | Opcode::AssignClosure(name) => name,
            _ => continue,
        };
        if seen.insert(identifier.clone()) {
            result.push(identifier.clone());
        }
    }
    result
}
