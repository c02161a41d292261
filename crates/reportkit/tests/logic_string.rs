use reportkit::logic::{
    Connective, LogicError, LogicExpr, MAX_LOGIC_NESTING, build_logic_string, parse_logic,
    validate_logic,
};

#[test]
fn match_all_and_match_any_join_every_index() {
    assert_eq!(build_logic_string(3, Connective::And), "(1 AND 2 AND 3)");
    assert_eq!(build_logic_string(2, Connective::Or), "(1 OR 2)");
    assert_eq!(build_logic_string(1, Connective::And), "(1)");
    assert_eq!(build_logic_string(0, Connective::Or), "");
}

#[test]
fn and_binds_tighter_than_or() {
    let expr = parse_logic("1 OR 2 AND 3", 3).expect("logic should parse");

    assert_eq!(
        expr,
        LogicExpr::Or(vec![
            LogicExpr::Filter(1),
            LogicExpr::And(vec![LogicExpr::Filter(2), LogicExpr::Filter(3)]),
        ])
    );
    assert!(expr.evaluate(&[true, false, false]));
    assert!(expr.evaluate(&[false, true, true]));
    assert!(!expr.evaluate(&[false, true, false]));
}

#[test]
fn parentheses_and_lowercase_keywords_are_accepted() {
    let expr = parse_logic("(1 or 2) and 3", 3).expect("logic should parse");

    assert_eq!(expr.to_string(), "(1 OR 2) AND 3");
    assert_eq!(
        expr.referenced_indices().into_iter().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn synthesized_strings_parse_back() {
    for count in 1..=4 {
        for connective in [Connective::And, Connective::Or] {
            let logic = build_logic_string(count, connective);
            assert_eq!(validate_logic(&logic, count), Ok(()), "{logic}");
        }
    }
}

#[test]
fn drill_down_shaped_strings_parse() {
    assert_eq!(validate_logic("(1) AND 2 AND 3", 3), Ok(()));
    assert_eq!(validate_logic("((1 OR 2)) AND 3", 3), Ok(()));
}

#[test]
fn blank_logic_is_rejected() {
    assert_eq!(parse_logic("   ", 2), Err(LogicError::Empty));
}

#[test]
fn out_of_range_indices_are_rejected() {
    assert_eq!(
        parse_logic("1 AND 3", 2),
        Err(LogicError::IndexOutOfRange {
            index: 3,
            filter_count: 2
        })
    );
    assert_eq!(
        parse_logic("0", 2),
        Err(LogicError::IndexOutOfRange {
            index: 0,
            filter_count: 2
        })
    );
}

#[test]
fn unbalanced_parentheses_are_rejected() {
    match parse_logic("(1 AND 2", 2) {
        Err(LogicError::UnbalancedParentheses { position }) => assert_eq!(position, 0),
        other => panic!("expected unbalanced parenthesis, got {other:?}"),
    }
    match parse_logic("1 AND 2)", 2) {
        Err(LogicError::UnbalancedParentheses { position }) => assert_eq!(position, 7),
        other => panic!("expected unbalanced parenthesis, got {other:?}"),
    }
}

#[test]
fn stray_tokens_and_dangling_connectives_are_rejected() {
    match parse_logic("1 XOR 2", 2) {
        Err(LogicError::UnexpectedToken { token, position }) => {
            assert_eq!(token, "XOR");
            assert_eq!(position, 2);
        }
        other => panic!("expected unexpected token, got {other:?}"),
    }
    assert_eq!(parse_logic("1 AND", 1), Err(LogicError::UnexpectedEnd));
    assert!(matches!(
        parse_logic("1 2", 2),
        Err(LogicError::UnexpectedToken { .. })
    ));
}

#[test]
fn errors_render_readable_messages() {
    let error = LogicError::IndexOutOfRange {
        index: 4,
        filter_count: 2,
    };
    assert_eq!(
        error.to_string(),
        "filter #4 does not exist (there are 2 filters)"
    );
}

#[test]
fn empty_groups_are_unexpected_tokens() {
    match parse_logic("()", 1) {
        Err(LogicError::UnexpectedToken { token, position }) => {
            assert_eq!(token, ")");
            assert_eq!(position, 1);
        }
        other => panic!("expected unexpected token, got {other:?}"),
    }
    assert!(matches!(
        parse_logic("(1 AND )", 1),
        Err(LogicError::UnexpectedToken { .. })
    ));
}

#[test]
fn nesting_is_capped() {
    let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

    assert_eq!(validate_logic(&nested(MAX_LOGIC_NESTING), 1), Ok(()));
    assert_eq!(
        parse_logic(&nested(MAX_LOGIC_NESTING + 1), 1),
        Err(LogicError::TooDeep {
            position: MAX_LOGIC_NESTING,
            limit: MAX_LOGIC_NESTING
        })
    );
    assert!(matches!(
        parse_logic(&nested(100_000), 1),
        Err(LogicError::TooDeep { .. })
    ));
}
