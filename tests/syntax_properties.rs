//! Property-based tests for the syntax checker
//!
//! - Well-formed nested literals and calls never produce an error
//! - A stray closing delimiter is reported on its own line
//! - An unclosed opener is reported on the line that opened it
//! - `print` used as an operand is Python 3, a bare `print x` is not
//! - A generator sharing a call's parentheses must be parenthesized

use proptest::prelude::*;
use pyreview::syntax::check_syntax;
use pyreview::ErrorCategory;

/// Identifiers with a prefix that keeps them clear of keywords.
fn identifier() -> impl Strategy<Value = String> {
    "v_[a-z0-9]{0,6}"
}

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![
        identifier(),
        (0u32..10_000).prop_map(|n| n.to_string()),
        "[a-z ]{0,8}".prop_map(|s| format!("'{s}'")),
    ]
}

/// Balanced expressions built from tuples, lists, dicts and calls.
fn expression() -> impl Strategy<Value = String> {
    atom().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|items| format!("({},)", items.join(", "))),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| format!("[{}]", items.join(", "))),
            prop::collection::vec((atom(), inner.clone()), 0..3).prop_map(|pairs| {
                let body: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                format!("{{{}}}", body.join(", "))
            }),
            (identifier(), prop::collection::vec(inner, 0..3))
                .prop_map(|(name, args)| format!("{name}({})", args.join(", "))),
        ]
    })
}

fn preamble(lines: usize) -> String {
    (0..lines).map(|i| format!("v_{i} = {i}\n")).collect()
}

proptest! {
    #[test]
    fn prop_balanced_expressions_are_valid(
        name in identifier(),
        expr in expression(),
    ) {
        let source = format!("{name} = {expr}\n");
        prop_assert_eq!(check_syntax(&source), Ok(()), "source: {}", source);
    }

    #[test]
    fn prop_balanced_function_bodies_are_valid(
        name in identifier(),
        expr in expression(),
    ) {
        let source = format!("def {name}(v_arg):\n    return {expr}\n\n{name}(1)\n");
        prop_assert_eq!(check_syntax(&source), Ok(()), "source: {}", source);
    }

    #[test]
    fn prop_stray_closer_reported_on_its_line(
        before in 0usize..6,
        expr in expression(),
    ) {
        let source = format!("{}value = {expr})\n", preamble(before));
        let error = check_syntax(&source).unwrap_err();
        prop_assert_eq!(error.line, before + 1, "source: {}", source);
        prop_assert_eq!(error.message, "unmatched ')'");
    }

    #[test]
    fn prop_unclosed_opener_reported_on_its_line(
        before in 0usize..6,
        expr in expression(),
    ) {
        let source = format!("{}value = [{expr}\n", preamble(before));
        let error = check_syntax(&source).unwrap_err();
        prop_assert_eq!(error.line, before + 1, "source: {}", source);
        prop_assert_eq!(error.category, ErrorCategory::UnexpectedEof);
    }

    #[test]
    fn prop_print_as_operand_is_valid(
        target in identifier(),
        operator in prop_oneof![Just(">>"), Just("-"), Just("+")],
        expr in expression(),
    ) {
        let source = format!("print {operator} {target}, {expr}\n");
        prop_assert_eq!(check_syntax(&source), Ok(()), "source: {}", source);
    }

    #[test]
    fn prop_bare_print_is_rejected(
        before in 0usize..6,
        value in atom(),
    ) {
        let source = format!("{}print {value}\n", preamble(before));
        let error = check_syntax(&source).unwrap_err();
        prop_assert_eq!((error.line, error.column), (before + 1, 1), "source: {}", source);
        prop_assert!(error.message.starts_with("Missing parentheses in call to 'print'"));
    }

    #[test]
    fn prop_generator_with_extra_argument_is_rejected(
        name in identifier(),
        item in identifier(),
        extra in expression(),
    ) {
        let bare = format!("{name}({item} for {item} in v_src, {extra})\n");
        let error = check_syntax(&bare).unwrap_err();
        prop_assert_eq!(error.message, "Generator expression must be parenthesized");
        prop_assert_eq!((error.line, error.column), (1, name.chars().count() + 2));

        let wrapped = format!("{name}(({item} for {item} in v_src), {extra})\n");
        prop_assert_eq!(check_syntax(&wrapped), Ok(()), "source: {}", wrapped);
    }
}
