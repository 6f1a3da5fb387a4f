use crate::{
    Action, BuildError, Delegate, Grammar, Next, RuleAction, StackOp, StateTable, TokenType,
};
use pretty_assertions::assert_eq;

fn rule_patterns(table: &StateTable, state: &str) -> Vec<String> {
    let id = table.state_id(state).unwrap();
    table
        .state(id)
        .rules()
        .iter()
        .map(|rule| rule.pattern().as_str().to_owned())
        .collect()
}

// === Errors ===

#[test]
fn missing_root_is_rejected() {
    let grammar = Grammar::new("g").state("other", |s| s.rule("a", TokenType::TEXT));
    assert_eq!(
        StateTable::build(&grammar).unwrap_err(),
        BuildError::MissingRoot {
            grammar: "g".into()
        }
    );
}

#[test]
fn unknown_push_target_is_rejected() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("a", TokenType::TEXT)
            .rule_then("b", TokenType::TEXT, Next::push("nowhere"))
    });
    assert_eq!(
        StateTable::build(&grammar).unwrap_err(),
        BuildError::UnknownState {
            grammar: "g".into(),
            state: "root".into(),
            index: 1,
            target: "nowhere".into(),
        }
    );
}

#[test]
fn unknown_include_is_rejected() {
    let grammar = Grammar::new("g").state("root", |s| s.include("missing"));
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::UnknownState { target, .. }) if target == "missing"
    ));
}

#[test]
fn unknown_delegate_state_is_rejected() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("a", Action::Using(Delegate::this_in("missing")))
    });
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::UnknownState { target, .. }) if target == "missing"
    ));
}

#[test]
fn include_cycle_reports_chain() {
    let grammar = Grammar::new("g")
        .state("root", |s| s.include("a"))
        .state("a", |s| s.rule("x", TokenType::TEXT).include("b"))
        .state("b", |s| s.include("a"));
    assert_eq!(
        StateTable::build(&grammar).unwrap_err(),
        BuildError::IncludeCycle {
            grammar: "g".into(),
            chain: vec!["a".into(), "b".into(), "a".into()],
        }
    );
}

#[test]
fn self_include_is_a_cycle() {
    let grammar = Grammar::new("g").state("root", |s| s.include("root"));
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::IncludeCycle { chain, .. }) if chain == ["root", "root"]
    ));
}

#[test]
fn invalid_pattern_names_its_entry() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("a", TokenType::TEXT).rule("(", TokenType::TEXT)
    });
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::InvalidPattern { state, index: 1, .. }) if state == "root"
    ));
}

#[test]
fn empty_only_rule_without_transition_is_rejected() {
    let grammar = Grammar::new("g").state("root", |s| s.rule("", TokenType::TEXT));
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::ZeroWidthRule { index: 0, .. })
    ));
}

#[test]
fn empty_only_rule_with_transition_is_allowed() {
    let grammar = Grammar::new("g")
        .state("root", |s| s.rule_then(r"\b", TokenType::TEXT, Next::push("word")))
        .state("word", |s| s.rule_then("[a-z]+", TokenType::NAME, Next::pop(1)));
    assert!(StateTable::build(&grammar).is_ok());
}

#[test]
fn zero_pop_is_rejected() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule_then("a", TokenType::TEXT, Next::pop(0))
    });
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::ZeroPop { .. })
    ));
}

#[test]
fn empty_combined_is_rejected() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule_then("a", TokenType::TEXT, Next::Combined(Vec::new()))
    });
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::EmptyCombined { .. })
    ));
}

#[test]
fn context_action_needs_extended_build() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("a", Action::context(|_, _| Vec::new()))
    });
    assert!(matches!(
        StateTable::build(&grammar),
        Err(BuildError::ContextActionInPlainLexer { .. })
    ));
    assert!(StateTable::build_extended(&grammar).is_ok());
}

#[test]
fn error_messages_name_the_grammar() {
    let err = BuildError::MissingRoot {
        grammar: "ini".into(),
    };
    assert_eq!(err.to_string(), "grammar `ini` has no `root` state");
}

// === Flattening ===

#[test]
fn include_splices_rules_in_place() {
    let grammar = Grammar::new("g")
        .state("root", |s| {
            s.rule("a", TokenType::TEXT)
                .include("ws")
                .rule("b", TokenType::TEXT)
        })
        .state("ws", |s| s.rule(r"\s+", TokenType::WHITESPACE).include("nl"))
        .state("nl", |s| s.rule(r"\n", TokenType::TEXT));
    let table = StateTable::build(&grammar).unwrap();
    assert_eq!(rule_patterns(&table, "root"), ["a", r"\s+", r"\n", "b"]);
    assert_eq!(rule_patterns(&table, "ws"), [r"\s+", r"\n"]);
}

#[test]
fn included_rules_keep_their_transitions() {
    let grammar = Grammar::new("g")
        .state("root", |s| s.include("strings"))
        .state("strings", |s| s.rule_then("\"", TokenType::STRING, Next::push("string")))
        .state("string", |s| s.rule_then("\"", TokenType::STRING, Next::pop(1)));
    let table = StateTable::build(&grammar).unwrap();
    let root = table.state(table.root());
    let string = table.state_id("string").unwrap();
    assert_eq!(root.rules()[0].transition().ops(), [StackOp::Push(string)]);
}

#[test]
fn leftover_inherit_marker_is_ignored() {
    let grammar = Grammar::new("g").state("root", |s| s.inherit().rule("a", TokenType::TEXT));
    let table = StateTable::build(&grammar).unwrap();
    assert_eq!(rule_patterns(&table, "root"), ["a"]);
}

#[test]
fn default_entry_compiles_to_silent_rule() {
    let grammar = Grammar::new("g")
        .state("root", |s| s.rule_then("a", TokenType::TEXT, Next::push("after")))
        .state("after", |s| s.rule("b", TokenType::TEXT).default(Next::pop(1)));
    let table = StateTable::build(&grammar).unwrap();
    let after = table.state(table.state_id("after").unwrap());
    let fallback = &after.rules()[1];
    assert!(matches!(fallback.action(), RuleAction::Silent));
    assert!(fallback.pattern().only_matches_empty());
    assert_eq!(fallback.transition().ops(), [StackOp::Pop(1)]);
}

// === Combined states ===

#[test]
fn combined_states_are_interned() {
    let grammar = Grammar::new("g")
        .state("root", |s| {
            s.rule_then("x", TokenType::TEXT, Next::combined(["a", "b"]))
                .rule_then("y", TokenType::TEXT, Next::combined(["a", "b"]))
                .rule_then("z", TokenType::TEXT, Next::combined(["b", "a"]))
        })
        .state("a", |s| s.rule("1", TokenType::NUMBER))
        .state("b", |s| s.rule("2", TokenType::NUMBER));
    let table = StateTable::build(&grammar).unwrap();
    let root = table.state(table.root());
    let first = root.rules()[0].transition().ops()[0];
    let second = root.rules()[1].transition().ops()[0];
    let third = root.rules()[2].transition().ops()[0];
    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(table.len(), 5);

    let ab = table.combined(&["a", "b"]).unwrap();
    assert_eq!(first, StackOp::Push(ab));
    assert_eq!(table.state(ab).name(), "a+b");
    let patterns: Vec<_> = table
        .state(ab)
        .rules()
        .iter()
        .map(|rule| rule.pattern().as_str())
        .collect();
    assert_eq!(patterns, ["1", "2"]);
}

#[test]
fn combined_lookup_misses_unused_combinations() {
    let grammar = Grammar::new("g").state("root", |s| s.rule("x", TokenType::TEXT));
    let table = StateTable::build(&grammar).unwrap();
    assert_eq!(table.combined(&["root"]), None);
    assert_eq!(table.combined(&["missing"]), None);
}

// === Table ===

#[test]
fn ids_follow_definition_order() {
    let grammar = Grammar::new("g")
        .state("first", |s| s.rule("f", TokenType::TEXT))
        .state("root", |s| s.rule("r", TokenType::TEXT));
    let table = StateTable::build(&grammar).unwrap();
    assert_eq!(table.state_id("first").map(|id| id.index()), Some(0));
    assert_eq!(table.root().index(), 1);
    assert_eq!(table.name(), "g");
    let names: Vec<_> = table.states().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["first", "root"]);
}
