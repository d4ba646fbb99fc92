//! End-to-end coverage of spec §8's seed scenarios through the public
//! `rasp::run_source`/`Session` API, exercised as a black box the way a
//! script file would be. Colocated unit tests already cover each pipeline
//! stage in isolation; this file is the one place that checks lexer,
//! compiler, and interpreter agree all the way through.

use rasp::error::RaspError;
use rasp::{run_source, Session};

#[test]
fn arithmetic_precedence_free_expression() {
    let result = run_source("arithmetic.rasp", "(+ (* 2 42) (/ 133 10) (- 1 6))").unwrap();
    assert_eq!(result.to_string(), "92");
}

#[test]
fn global_variable_mutation() {
    let result = run_source("globals.rasp", "(var g 1) (set g (+ g 1)) g").unwrap();
    assert_eq!(result.to_string(), "2");
}

#[test]
fn nested_defun_reads_an_outer_local_without_returning_it() {
    let result = run_source(
        "nested.rasp",
        "(defun outer () (var c 42) (defun inner () c) (inner)) (outer)",
    )
    .unwrap();
    assert_eq!(result.to_string(), "42");
}

#[test]
fn a_returned_closure_keeps_its_captured_value_alive() {
    let result = run_source(
        "closure.rasp",
        "(defun outer () (var c 13) (defun inner () c) inner) (var cl (outer)) (cl)",
    )
    .unwrap();
    assert_eq!(result.to_string(), "13");
}

#[test]
fn type_new_and_member_access_concatenate_into_a_report_string() {
    let result = run_source(
        "people.rasp",
        r#"(type Person id name) (var a (new Person 13 "Alice")) (var b (new Person 42 "Bob")) (concat "People: " a.name ", " b.name)"#,
    )
    .unwrap();
    assert_eq!(result.display_human(), "People: Alice, Bob");
}

#[test]
fn while_loop_doubles_a_counter_to_128() {
    let result = run_source("doubling.rasp", "(var r 2) (while (< r 100) (set r (* r 2))) r").unwrap();
    assert_eq!(result.to_string(), "128");
}

#[test]
fn recursive_function_sums_one_through_ten() {
    let result = run_source(
        "sum.rasp",
        "(defun recurse (n) (if (<= n 0) 0) (if (> n 0) (+ n (recurse (- n 1))))) (recurse 10)",
    )
    .unwrap();
    assert_eq!(result.to_string(), "55");
}

#[test]
fn dividing_by_zero_is_a_located_execution_error() {
    let err = run_source("divzero.rasp", "(/ 42 0)").unwrap_err();
    assert!(matches!(err.error, RaspError::ExecutionError { .. }));
    assert!(err.error.to_string().contains("divide by zero"));
}

#[test]
fn referencing_an_undefined_identifier_is_a_parse_error() {
    let err = run_source("undefined.rasp", "undefinedVariable").unwrap_err();
    assert!(matches!(err.error, RaspError::ParseError { .. }));
}

#[test]
fn a_second_else_clause_on_the_same_if_is_rejected_at_compile_time() {
    let err = run_source("badif.rasp", "(if true 1 else 2 else 3)").unwrap_err();
    assert!(matches!(err.error, RaspError::ParseError { .. }));
}

#[test]
fn a_session_lets_later_files_see_earlier_top_level_declarations() {
    let mut session = Session::new();
    session.run("first.rasp", "(defun square (x) (* x x)) (var seed 6)").unwrap();
    let result = session.run("second.rasp", "(square seed)").unwrap();
    assert_eq!(result.to_string(), "36");
}

#[test]
fn a_stack_trace_names_every_function_on_the_way_down() {
    let err = run_source(
        "trace.rasp",
        "(defun inner () (+ 1 true)) (defun outer () (inner)) (outer)",
    )
    .unwrap_err();
    assert_eq!(err.trace.len(), 2);
    assert!(err.trace[0].contains("inner"));
    assert!(err.trace[1].contains("outer"));
}
