//! The stack-based VM that executes a flat `Vec<Instruction>` (spec §4.3,
//! §4.4). Grounded on
//! `examples/original_source/Rasp/src/interpreter.h`/`.cpp`'s `exec()`
//! switch loop over a program counter, `handleFunction`/`handleCapture` for
//! calls and closure construction, and `buildStackTrace` for the per-`Call`
//! trace augmentation carried in [`crate::error::Traced`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::bindings::{Bindings, GlobalMap, RefKind};
use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::instruction::{Instruction, Opcode};
use crate::location::SourceLocation;
use crate::value::{CallContext, Closure, Function, InternalFunction, Value};

/// An entry on the VM's runtime stack. Most instructions only ever push or
/// pop `Value`s, but `InitClosure` stages a capture *reference* — an
/// identifier plus the live binding cell it currently resolves to — for the
/// following `Capture` instruction to collect. This can't be represented as
/// a `Value` without inventing a user-visible "reference" type the language
/// doesn't have, so the stack slot type is its own small enum instead.
enum StackSlot {
    Value(Value),
    Capture(Identifier, crate::value::BindingCell),
}

pub struct Interpreter {
    globals: GlobalMap,
    /// Call-depth guard against runaway recursion (no TCO, spec Non-goals).
    call_depth: usize,
    max_call_depth: usize,
    /// Mirrors the CLI's `--trace` flag: logs each executed instruction via
    /// `tracing` instead of the original interpreter's raw debug prints.
    trace: bool,
}

const DEFAULT_MAX_CALL_DEPTH: usize = 2048;

impl Interpreter {
    pub fn new(globals: GlobalMap) -> Self {
        Interpreter {
            globals,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace: false,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn globals(&self) -> &GlobalMap {
        &self.globals
    }

    /// Executes `instructions` against `bindings` on a fresh runtime stack,
    /// returning whatever value ends up on top (or `Nil` if the stack is
    /// empty) — matching a REPL's "print the value of the last form"
    /// behaviour. Each call gets its own stack (grounded on
    /// `interpreter.cpp`'s `exec()` declaring a local `Stack stack`), so a
    /// nested call's `var`/`set` instructions — which bind without popping,
    /// per spec §4.3 — can't leak leftover entries into the caller's frame.
    pub fn run(&mut self, instructions: &[Instruction], bindings: &mut Bindings) -> Result<Value, Traced> {
        let mut stack: Vec<StackSlot> = Vec::new();
        self.exec(instructions, bindings, &mut stack)?;
        match stack.pop() {
            Some(StackSlot::Value(v)) => Ok(v),
            Some(StackSlot::Capture(name, _)) => {
                Err(RaspError::internal(format!("program left a pending capture for '{name}' on the stack")).into())
            }
            None => Ok(Value::Nil),
        }
    }

    /// Calls an already-constructed Rasp function value with `arguments`,
    /// for use by native functions that need to invoke back into Rasp code
    /// (e.g. a host-provided `map`/`filter`).
    pub fn call_function(
        &mut self,
        function: &Function,
        arguments: Vec<Value>,
        location: &SourceLocation,
    ) -> Result<Value, Traced> {
        self.invoke(function, arguments, location)
    }

    fn pop_value(stack: &mut Vec<StackSlot>) -> Result<Value, Traced> {
        match stack.pop() {
            Some(StackSlot::Value(v)) => Ok(v),
            Some(StackSlot::Capture(name, _)) => Err(RaspError::internal(format!(
                "expected a value on the stack but found a pending capture for '{name}'"
            ))
            .into()),
            None => Err(RaspError::internal("stack underflow").into()),
        }
    }

    /// Reads the stack top without removing it — `InitLocal`/`InitGlobal`/
    /// `AssignLocal`/`AssignGlobal`/`AssignClosure` all have stack effect
    /// `v → v` (spec §4.3: "does not pop"), so a later statement can still
    /// observe the value, e.g. `((defun foo () ...))`.
    fn peek_value(stack: &[StackSlot]) -> Result<Value, Traced> {
        match stack.last() {
            Some(StackSlot::Value(v)) => Ok(v.clone()),
            Some(StackSlot::Capture(name, _)) => Err(RaspError::internal(format!(
                "expected a value on the stack but found a pending capture for '{name}'"
            ))
            .into()),
            None => Err(RaspError::internal("stack underflow").into()),
        }
    }

    fn push_value(stack: &mut Vec<StackSlot>, value: Value) {
        stack.push(StackSlot::Value(value));
    }

    /// Runs `instructions` to completion (normal fallthrough only — callers
    /// that need the resulting value use [`Interpreter::run`]).
    fn exec(&mut self, instructions: &[Instruction], bindings: &mut Bindings, stack: &mut Vec<StackSlot>) -> Result<(), Traced> {
        let mut pc: usize = 0;
        while pc < instructions.len() {
            let instr = &instructions[pc];
            if self.trace {
                crate::trace::trace_instruction(pc, instr);
            }
            pc = self.exec_one(instr, pc, bindings, stack)?;
        }
        Ok(())
    }

    /// Executes a single instruction and returns the next program counter.
    fn exec_one(
        &mut self,
        instr: &Instruction,
        pc: usize,
        bindings: &mut Bindings,
        stack: &mut Vec<StackSlot>,
    ) -> Result<usize, Traced> {
        let loc = &instr.location;
        match &instr.opcode {
            Opcode::Push(value) => {
                Self::push_value(stack, value.clone());
                Ok(pc + 1)
            }
            Opcode::Call(n) => {
                self.exec_call(*n as usize, loc, stack)?;
                Ok(pc + 1)
            }
            Opcode::Loop(k) => {
                let next = (pc as i64) - (*k as i64) + 1;
                if next < 0 {
                    return Err(RaspError::internal("loop jumped before start of program").into());
                }
                Ok(next as usize)
            }
            Opcode::Jump(k) => Ok(pc + 1 + (*k as usize)),
            Opcode::CondJump(k) => {
                let condition = Self::pop_value(stack)?;
                if condition.is_falsey() {
                    Ok(pc + 1 + (*k as usize))
                } else {
                    Ok(pc + 1)
                }
            }
            Opcode::Capture(n) => {
                self.exec_capture(*n as usize, loc, stack)?;
                Ok(pc + 1)
            }
            Opcode::RefLocal(name) => {
                Self::push_value(stack, bindings.get(RefKind::Local, name.name(), loc)?);
                Ok(pc + 1)
            }
            Opcode::RefGlobal(name) => {
                Self::push_value(stack, bindings.get(RefKind::Global, name.name(), loc)?);
                Ok(pc + 1)
            }
            Opcode::RefClosure(name) => {
                Self::push_value(stack, bindings.get(RefKind::Closure, name.name(), loc)?);
                Ok(pc + 1)
            }
            Opcode::InitLocal(name) => {
                let value = Self::peek_value(stack)?;
                bindings.init(RefKind::Local, name.name(), value)?;
                Ok(pc + 1)
            }
            Opcode::InitGlobal(name) => {
                let value = Self::peek_value(stack)?;
                bindings.init(RefKind::Global, name.name(), value)?;
                Ok(pc + 1)
            }
            Opcode::AssignLocal(name) => {
                let value = Self::peek_value(stack)?;
                bindings.assign(RefKind::Local, name.name(), value)?;
                Ok(pc + 1)
            }
            Opcode::AssignGlobal(name) => {
                let value = Self::peek_value(stack)?;
                bindings.assign(RefKind::Global, name.name(), value)?;
                Ok(pc + 1)
            }
            Opcode::AssignClosure(name) => {
                let value = Self::peek_value(stack)?;
                bindings.assign(RefKind::Closure, name.name(), value)?;
                Ok(pc + 1)
            }
            Opcode::InitClosure(name) => {
                let cell = bindings.get_cell_any(name.name())?;
                stack.push(StackSlot::Capture(name.clone(), cell));
                Ok(pc + 1)
            }
            Opcode::MemberAccess(name) => {
                self.exec_member_access(name, loc, stack)?;
                Ok(pc + 1)
            }
        }
    }

    fn exec_member_access(&mut self, name: &Identifier, location: &SourceLocation, stack: &mut Vec<StackSlot>) -> Result<(), Traced> {
        let value = Self::pop_value(stack)?;
        match value {
            Value::Object(members) => match members.get(name.name()) {
                Some(member) => {
                    Self::push_value(stack, member.clone());
                    Ok(())
                }
                None => Err(RaspError::execution(
                    location.clone(),
                    format!("Object has no member named '{}'", name.name()),
                )
                .into()),
            },
            other => Err(RaspError::execution(
                location.clone(),
                format!("Cannot access member '{}' of a {}", name.name(), other.type_name()),
            )
            .into()),
        }
    }

    /// `Capture(n)`: pops the function followed by `n` pending capture
    /// references (in whatever order the compiler emitted `InitClosure`s)
    /// and builds a `Closure` value. Grounded on
    /// `original_source/Rasp/src/interpreter.cpp`'s `handleCapture` and
    /// `closure.cpp`'s concatenation of captured values with call arguments.
    fn exec_capture(&mut self, n: usize, _location: &SourceLocation, stack: &mut Vec<StackSlot>) -> Result<(), Traced> {
        let function_value = Self::pop_value(stack)?;
        let inner = match function_value {
            Value::Function(f) => f,
            other => {
                return Err(RaspError::internal(format!(
                    "Capture expected a function on the stack, found a {}",
                    other.type_name()
                ))
                .into())
            }
        };

        let mut captured = Vec::with_capacity(n);
        for _ in 0..n {
            match stack.pop() {
                Some(StackSlot::Capture(name, cell)) => captured.push((name, cell)),
                Some(StackSlot::Value(_)) => {
                    return Err(RaspError::internal(
                        "Capture found a plain value where a pending capture reference was expected",
                    )
                    .into())
                }
                None => return Err(RaspError::internal("stack underflow while building a closure").into()),
            }
        }
        captured.reverse();

        Self::push_value(stack, Value::Function(Function::Closure(Rc::new(Closure { inner, captured }))));
        Ok(())
    }

    /// `Call(n)`: pops the callee, then `n` arguments (stack top = first
    /// positional argument, per the compiler's right-to-left argument
    /// evaluation order), and dispatches on the callee's `Function` flavor.
    fn exec_call(&mut self, n: usize, location: &SourceLocation, stack: &mut Vec<StackSlot>) -> Result<(), Traced> {
        let callee = Self::pop_value(stack)?;
        let mut arguments = Vec::with_capacity(n);
        for _ in 0..n {
            arguments.push(Self::pop_value(stack)?);
        }

        let function = match callee {
            Value::Function(f) => f,
            other => {
                return Err(RaspError::execution(
                    location.clone(),
                    format!("Cannot call a value of type {}", other.type_name()),
                )
                .into())
            }
        };

        let result = self.invoke(&function, arguments, location);
        match result {
            Ok(value) => {
                Self::push_value(stack, value);
                Ok(())
            }
            Err(mut traced) => {
                traced.push_frame(function.name(), location);
                Err(traced)
            }
        }
    }

    fn invoke(&mut self, function: &Function, arguments: Vec<Value>, location: &SourceLocation) -> Result<Value, Traced> {
        self.call_depth += 1;
        if self.call_depth > self.max_call_depth {
            self.call_depth -= 1;
            return Err(RaspError::execution(location.clone(), "Maximum call depth exceeded").into());
        }
        let result = self.invoke_inner(function, arguments, location);
        self.call_depth -= 1;
        result
    }

    fn invoke_inner(&mut self, function: &Function, arguments: Vec<Value>, location: &SourceLocation) -> Result<Value, Traced> {
        match function {
            Function::Native(native) => {
                let context = CallContext {
                    arguments: &arguments,
                    interpreter: self,
                };
                (native.func)(context)
            }
            Function::NativePure(native) => (native.func)(&arguments),
            Function::Internal(internal) => self.call_internal(internal, arguments, None, location),
            Function::Closure(closure) => {
                let mut closure_map = HashMap::with_capacity(closure.captured.len());
                for (name, cell) in &closure.captured {
                    closure_map.insert(name.name().to_string(), cell.clone());
                }
                match &closure.inner {
                    Function::Internal(internal) => {
                        self.call_internal(internal, arguments, Some(Rc::new(closure_map)), location)
                    }
                    other => self.invoke_inner(other, arguments, location),
                }
            }
        }
    }

    fn call_internal(
        &mut self,
        function: &Rc<InternalFunction>,
        arguments: Vec<Value>,
        closure_map: Option<Rc<HashMap<String, crate::value::BindingCell>>>,
        location: &SourceLocation,
    ) -> Result<Value, Traced> {
        if arguments.len() != function.parameters.len() {
            return Err(RaspError::execution(
                location.clone(),
                format!(
                    "'{}' expects {} argument(s) but got {}",
                    function.name,
                    function.parameters.len(),
                    arguments.len()
                ),
            )
            .into());
        }

        let mut frame = match closure_map {
            Some(map) => Bindings::with_closure(self.globals.clone(), map),
            None => Bindings::new(self.globals.clone()),
        };
        for (parameter, value) in function.parameters.iter().zip(arguments) {
            frame.init(RefKind::Local, parameter.name(), value)?;
        }

        self.run(&function.instructions, &mut frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::globals_from;
    use crate::compiler::compile;
    use crate::lexer::lex;
    use crate::scope::Declarations;

    fn builtin_names() -> Vec<Identifier> {
        ["+", "-", "*", "/", "%", "<", ">", "<=", ">=", "==", "!="]
            .into_iter()
            .map(Identifier::new)
            .collect()
    }

    fn arithmetic(name: &str) -> crate::value::NativePureFn {
        fn add(args: &[Value]) -> Result<Value, Traced> {
            let (Value::Number(a), Value::Number(b)) = (&args[0], &args[1]) else {
                return Err(RaspError::internal("expected numbers").into());
            };
            Ok(Value::Number(a + b))
        }
        fn mul(args: &[Value]) -> Result<Value, Traced> {
            let (Value::Number(a), Value::Number(b)) = (&args[0], &args[1]) else {
                return Err(RaspError::internal("expected numbers").into());
            };
            Ok(Value::Number(a * b))
        }
        fn lt(args: &[Value]) -> Result<Value, Traced> {
            let (Value::Number(a), Value::Number(b)) = (&args[0], &args[1]) else {
                return Err(RaspError::internal("expected numbers").into());
            };
            Ok(Value::Boolean(a < b))
        }
        match name {
            "+" => add,
            "*" => mul,
            "<" => lt,
            _ => unreachable!(),
        }
    }

    fn run_source(source: &str) -> Result<Value, Traced> {
        let root = lex("t.rasp", source)?;
        let mut declarations = Declarations::with_globals(builtin_names());
        let instructions = compile(&root, &mut declarations)?;

        let globals = globals_from(["+", "*", "<"].into_iter().map(|op| {
            (
                Identifier::new(op),
                Value::Function(Function::NativePure(Rc::new(crate::value::NativePureFunction {
                    name: op.to_string(),
                    location: SourceLocation::unknown(),
                    func: arithmetic(op),
                }))),
            )
        }));

        let mut interpreter = Interpreter::new(globals.clone());
        let mut bindings = Bindings::new(globals);
        interpreter.run(&instructions, &mut bindings)
    }

    #[test]
    fn evaluates_arithmetic_call() {
        let result = run_source("(+ 1 2)").unwrap();
        assert_eq!(result.to_string(), "3");
    }

    #[test]
    fn while_loop_accumulates_result() {
        let result = run_source("(var i 0) (var total 0) (while (< i 3) (set total (+ total i)) (set i (+ i 1))) total").unwrap();
        assert_eq!(result.to_string(), "3");
    }

    #[test]
    fn if_without_else_evaluates_to_nil_on_false_branch() {
        let result = run_source("(if false 1)").unwrap();
        assert_eq!(result.to_string(), "nil");
    }

    #[test]
    fn if_with_else_takes_else_branch() {
        let result = run_source("(if false 1 else 2)").unwrap();
        assert_eq!(result.to_string(), "2");
    }

    #[test]
    fn defun_and_call_a_plain_function() {
        let result = run_source("(defun square (x) (* x x)) (square 5)").unwrap();
        assert_eq!(result.to_string(), "25");
    }

    #[test]
    fn closure_captures_outer_local_by_reference() {
        let result = run_source(
            "(defun make_counter () (var n 0) (defun bump () (set n (+ n 1)) n) bump) (var counter (make_counter)) (counter) (counter)",
        )
        .unwrap();
        assert_eq!(result.to_string(), "2");
    }

    #[test]
    fn calling_a_non_function_is_an_execution_error() {
        let err = run_source("(var x 1) (x)").unwrap_err();
        assert!(matches!(err.error, RaspError::ExecutionError { .. }));
    }

    #[test]
    fn wrong_arity_call_is_an_execution_error() {
        let err = run_source("(defun f (a b) a) (f 1)").unwrap_err();
        assert!(matches!(err.error, RaspError::ExecutionError { .. }));
    }

    #[test]
    fn stack_trace_accumulates_frames_through_nested_calls() {
        let err = run_source("(defun inner () (+ 1 true)) (defun outer () (inner)) (outer)").unwrap_err();
        assert_eq!(err.trace.len(), 2);
    }

    #[test]
    fn inc_increments_a_local_variable() {
        let result = run_source("(var x 5) (inc x) x").unwrap();
        assert_eq!(result.to_string(), "6");
    }
}
