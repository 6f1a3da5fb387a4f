use crate::{
    Action, Delegate, Emission, Grammar, GroupAction, Lexer, Next, RegexLexer, TokenType,
    MAX_ZERO_WIDTH_STEPS,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

type Tok = (usize, TokenType, String);

fn tok(offset: usize, kind: TokenType, text: &str) -> Tok {
    (offset, kind, text.to_owned())
}

fn lex(grammar: &Grammar, text: &str) -> Vec<Tok> {
    let lexer = RegexLexer::new(grammar).unwrap();
    lexer
        .tokenize(text)
        .map(|t| (t.offset, t.kind, t.text.to_owned()))
        .collect()
}

fn numbers_and_names() -> Grammar {
    Grammar::new("demo").state("root", |s| {
        s.rule("[0-9]+", TokenType::NUMBER)
            .rule("[a-z]+", TokenType::NAME)
    })
}

fn strings() -> Grammar {
    Grammar::new("strings")
        .state("root", |s| {
            s.rule_then("\"", TokenType::STRING, Next::push("str"))
                .rule(r"\s+", TokenType::WHITESPACE)
        })
        .state("str", |s| {
            s.rule_then("\"", TokenType::STRING, Next::pop(1))
                .rule(".", TokenType::STRING_CHAR)
        })
}

// === Matching ===

#[test]
fn first_match_in_table_order() {
    assert_eq!(
        lex(&numbers_and_names(), "12ab"),
        [tok(0, TokenType::NUMBER, "12"), tok(2, TokenType::NAME, "ab")]
    );
}

#[test]
fn earlier_rule_wins_over_longer_match() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("[a-z]", TokenType::NAME)
            .rule("[a-z]+", TokenType::KEYWORD)
    });
    assert_eq!(
        lex(&grammar, "ab"),
        [tok(0, TokenType::NAME, "a"), tok(1, TokenType::NAME, "b")]
    );
}

#[test]
fn push_and_pop_string_state() {
    assert_eq!(
        lex(&strings(), "\"ab\""),
        [
            tok(0, TokenType::STRING, "\""),
            tok(1, TokenType::STRING_CHAR, "a"),
            tok(2, TokenType::STRING_CHAR, "b"),
            tok(3, TokenType::STRING, "\""),
        ]
    );
}

#[test]
fn tuple_transitions_pop_then_push() {
    let root = TokenType::TEXT.child("Root");
    let rag = TokenType::TEXT.child("Rag");
    let beer = TokenType::TEXT.child("Beer");
    let grammar = Grammar::new("tuple")
        .state("root", |s| {
            s.rule_then("a", root, Next::push("rag")).rule("e", root)
        })
        .state("beer", |s| {
            s.rule_then("d", beer, Next::seq([Next::pop(1), Next::pop(1)]))
        })
        .state("rag", |s| {
            s.rule_then("b", rag, Next::PushSelf)
                .rule_then("c", rag, Next::seq([Next::pop(1), Next::push("beer")]))
        });
    assert_eq!(
        lex(&grammar, "abcde"),
        [
            tok(0, root, "a"),
            tok(1, rag, "b"),
            tok(2, rag, "c"),
            tok(3, beer, "d"),
            tok(4, root, "e"),
        ]
    );
}

#[test]
fn pop_at_bottom_keeps_root() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule_then(r"\)", TokenType::PUNCTUATION, Next::pop(3))
            .rule("[a-z]+", TokenType::NAME)
    });
    let lexer = RegexLexer::new(&grammar).unwrap();
    let mut tokens = lexer.tokenize("))a");
    assert_eq!(tokens.by_ref().count(), 3);
    assert_eq!(tokens.context().state_names(), ["root"]);
}

#[test]
fn unbalanced_stack_at_end_is_tolerated() {
    let lexer = RegexLexer::new(&strings()).unwrap();
    let mut tokens = lexer.tokenize("\"open");
    assert_eq!(tokens.by_ref().count(), 5);
    assert_eq!(tokens.context().state_names(), ["root", "str"]);
}

#[test]
fn tokenize_from_named_stack() {
    let lexer = RegexLexer::new(&strings()).unwrap();
    let tokens: Vec<_> = lexer
        .tokenize_from("a\" ", &["root", "str"])
        .unwrap()
        .map(|t| (t.kind, t.text))
        .collect();
    assert_eq!(
        tokens,
        [
            (TokenType::STRING_CHAR, "a"),
            (TokenType::STRING, "\""),
            (TokenType::WHITESPACE, " "),
        ]
    );
    assert!(lexer.tokenize_from("a", &["nope"]).is_err());
}

// === Fallback ===

#[test]
fn unmatched_character_becomes_error() {
    let grammar = Grammar::new("g").state("root", |s| s.rule("[0-9]+", TokenType::NUMBER));
    assert_eq!(
        lex(&grammar, "1a2"),
        [
            tok(0, TokenType::NUMBER, "1"),
            tok(1, TokenType::ERROR, "a"),
            tok(2, TokenType::NUMBER, "2"),
        ]
    );
}

#[test]
fn error_covers_whole_multibyte_character() {
    let grammar = Grammar::new("g").state("root", |s| s.rule("[0-9]+", TokenType::NUMBER));
    assert_eq!(
        lex(&grammar, "é1"),
        [tok(0, TokenType::ERROR, "é"), tok(2, TokenType::NUMBER, "1")]
    );
}

#[test]
fn error_leaves_stack_unchanged() {
    let lexer = RegexLexer::new(&strings()).unwrap();
    let mut tokens = lexer.tokenize("\"\n");
    let kinds: Vec<_> = tokens.by_ref().map(|t| t.kind).collect();
    assert_eq!(kinds, [TokenType::STRING, TokenType::ERROR]);
    assert_eq!(tokens.context().top_name(), "str");
}

#[test]
fn empty_match_without_transition_falls_back() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("[a-z]*", TokenType::NAME)
            .rule("[0-9]", TokenType::NUMBER)
    });
    assert_eq!(
        lex(&grammar, "1"),
        [tok(0, TokenType::ERROR, "1")],
        "a zero-width match stops the rule scan"
    );
}

#[test]
fn empty_input_yields_nothing() {
    assert!(lex(&numbers_and_names(), "").is_empty());
}

// === Zero-width transitions ===

#[test]
fn default_transitions_without_consuming() {
    let grammar = Grammar::new("g")
        .state("root", |s| s.rule_then("[a-z]+", TokenType::NAME, Next::push("after")))
        .state("after", |s| s.rule("[0-9]+", TokenType::NUMBER).default(Next::pop(1)));
    assert_eq!(
        lex(&grammar, "ab12cd"),
        [
            tok(0, TokenType::NAME, "ab"),
            tok(2, TokenType::NUMBER, "12"),
            tok(4, TokenType::NAME, "cd"),
        ]
    );
}

#[test]
fn default_pop_at_bottom_falls_back() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule("[a-z]+", TokenType::NAME).default(Next::pop(1))
    });
    assert_eq!(
        lex(&grammar, "a1"),
        [tok(0, TokenType::NAME, "a"), tok(1, TokenType::ERROR, "1")]
    );
}

#[test]
fn endless_zero_width_pushes_are_cut_off() {
    let grammar = Grammar::new("g")
        .state("root", |s| s.default(Next::push("deeper")))
        .state("deeper", |s| s.default(Next::push("deeper")));
    let lexer = RegexLexer::new(&grammar).unwrap();
    let mut tokens = lexer.tokenize("xy");
    let texts: Vec<_> = tokens.by_ref().map(|t| (t.kind, t.text)).collect();
    assert_eq!(
        texts,
        [(TokenType::ERROR, "x"), (TokenType::ERROR, "y")]
    );
    assert!(tokens.context().depth() > MAX_ZERO_WIDTH_STEPS);
}

// === Group actions ===

#[test]
fn by_groups_emits_one_token_per_group() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule(
            r"(def)(\s+)([a-z]+)",
            Action::by_groups([
                TokenType::KEYWORD,
                TokenType::WHITESPACE,
                TokenType::NAME_FUNCTION,
            ]),
        )
    });
    assert_eq!(
        lex(&grammar, "def  run"),
        [
            tok(0, TokenType::KEYWORD, "def"),
            tok(3, TokenType::WHITESPACE, "  "),
            tok(5, TokenType::NAME_FUNCTION, "run"),
        ]
    );
}

#[test]
fn by_groups_covers_ungrouped_text_and_skips_missing_groups() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule(
            r"([a-z]+)(\?)?=([0-9]+)",
            Action::by_groups([
                TokenType::NAME_ATTRIBUTE,
                TokenType::OPERATOR,
                TokenType::NUMBER,
            ]),
        )
    });
    assert_eq!(
        lex(&grammar, "x=1"),
        [
            tok(0, TokenType::NAME_ATTRIBUTE, "x"),
            tok(1, TokenType::TEXT, "="),
            tok(2, TokenType::NUMBER, "1"),
        ]
    );
}

#[test]
fn repeated_group_matches_do_not_see_earlier_groups() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule(
            r"(-)?([0-9]+)",
            Action::by_groups([TokenType::OPERATOR, TokenType::NUMBER]),
        )
        .rule(" ", TokenType::WHITESPACE)
    });
    assert_eq!(
        lex(&grammar, "-1 2 -3"),
        [
            tok(0, TokenType::OPERATOR, "-"),
            tok(1, TokenType::NUMBER, "1"),
            tok(2, TokenType::WHITESPACE, " "),
            tok(3, TokenType::NUMBER, "2"),
            tok(4, TokenType::WHITESPACE, " "),
            tok(5, TokenType::OPERATOR, "-"),
            tok(6, TokenType::NUMBER, "3"),
        ]
    );
}

#[test]
fn by_groups_can_delegate_a_group() {
    let grammar = Grammar::new("g")
        .state("root", |s| {
            s.rule(
                r"(\[)([^\]]*)(\])",
                Action::by_groups([
                    GroupAction::Token(TokenType::PUNCTUATION),
                    GroupAction::Using(Delegate::this_in("inner")),
                    GroupAction::Token(TokenType::PUNCTUATION),
                ]),
            )
            .rule(r"\s+", TokenType::WHITESPACE)
        })
        .state("inner", |s| {
            s.rule("[0-9]+", TokenType::NUMBER)
                .rule(",", TokenType::PUNCTUATION)
        });
    assert_eq!(
        lex(&grammar, " [1,22]"),
        [
            tok(0, TokenType::WHITESPACE, " "),
            tok(1, TokenType::PUNCTUATION, "["),
            tok(2, TokenType::NUMBER, "1"),
            tok(3, TokenType::PUNCTUATION, ","),
            tok(4, TokenType::NUMBER, "22"),
            tok(6, TokenType::PUNCTUATION, "]"),
        ]
    );
}

// === Delegation ===

#[test]
fn using_another_lexer_shifts_offsets() {
    let inner: Arc<dyn Lexer> = Arc::new(RegexLexer::new(&numbers_and_names()).unwrap());
    let grammar = Grammar::new("outer").state("root", |s| {
        s.rule(r"\{[^}]*\}", Action::Using(Delegate::lexer(inner.clone())))
            .rule(r"[^{]+", TokenType::OTHER)
    });
    assert_eq!(
        lex(&grammar, "x {1a}"),
        [
            tok(0, TokenType::OTHER, "x "),
            tok(2, TokenType::ERROR, "{"),
            tok(3, TokenType::NUMBER, "1"),
            tok(4, TokenType::NAME, "a"),
            tok(5, TokenType::ERROR, "}"),
        ]
    );
}

#[test]
fn self_delegation_is_depth_limited() {
    let grammar = Grammar::new("g").state("root", |s| s.rule(".+", Action::Using(Delegate::this())));
    assert_eq!(lex(&grammar, "abc"), [tok(0, TokenType::ERROR, "abc")]);
}

// === Callbacks ===

#[test]
fn callback_emissions_fill_gaps_with_text() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule(
            r"([a-z]+)=([a-z]+)",
            Action::callback(|m| {
                [
                    m.emit_group(1, TokenType::NAME_ATTRIBUTE),
                    m.emit_group(2, TokenType::STRING),
                ]
                .into_iter()
                .flatten()
                .collect()
            }),
        )
    });
    assert_eq!(
        lex(&grammar, "k=v"),
        [
            tok(0, TokenType::NAME_ATTRIBUTE, "k"),
            tok(1, TokenType::TEXT, "="),
            tok(2, TokenType::STRING, "v"),
        ]
    );
}

#[test]
fn callback_overlapping_emissions_are_dropped() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule(
            "[a-z]+",
            Action::callback(|m| {
                vec![
                    Emission::new(m.start(), TokenType::NAME, m.as_str().len()),
                    Emission::new(m.start() + 1, TokenType::NUMBER, 1),
                ]
            }),
        )
    });
    assert_eq!(lex(&grammar, "abc"), [tok(0, TokenType::NAME, "abc")]);
}

#[test]
fn callback_sees_whole_input() {
    let grammar = Grammar::new("g").state("root", |s| {
        s.rule(
            "[a-z]",
            Action::callback(|m| {
                let kind = if m.start() > 0 && m.input().as_bytes()[m.start() - 1] == b'@' {
                    TokenType::NAME_DECORATOR
                } else {
                    TokenType::NAME
                };
                vec![Emission::new(m.start(), kind, 1)]
            }),
        )
        .rule("@", TokenType::OPERATOR)
    });
    assert_eq!(
        lex(&grammar, "@a"),
        [
            tok(0, TokenType::OPERATOR, "@"),
            tok(1, TokenType::NAME_DECORATOR, "a"),
        ]
    );
}

// === Stream properties ===

#[test]
fn include_behaves_like_inline_rules() {
    let included = Grammar::new("g")
        .state("root", |s| s.include("numbers").rule("[a-z]+", TokenType::NAME))
        .state("numbers", |s| s.rule("[0-9]+", TokenType::NUMBER));
    let inline = numbers_and_names();
    for input in ["12ab", "a1b2", "??", ""] {
        assert_eq!(lex(&included, input), lex(&inline, input));
    }
}

#[test]
fn tokenizing_twice_is_identical() {
    let lexer = RegexLexer::new(&strings()).unwrap();
    let first: Vec<_> = lexer.tokenize("\"a\" \"b").collect();
    let second: Vec<_> = lexer.tokenize("\"a\" \"b").collect();
    assert_eq!(first, second);
}

#[test]
fn tokens_are_produced_lazily() {
    let lexer = RegexLexer::new(&numbers_and_names()).unwrap();
    let input = "a1".repeat(10_000);
    let mut tokens = lexer.tokenize(&input);
    assert_eq!(tokens.next().map(|t| t.text), Some("a"));
    assert_eq!(tokens.context().pos(), 1);
}

#[test]
fn lexer_trait_yields_the_same_stream() {
    let lexer = RegexLexer::new(&numbers_and_names()).unwrap();
    let direct: Vec<_> = lexer.tokenize("ab12").collect();
    let boxed: Vec<_> = lexer.tokens("ab12").collect();
    assert_eq!(direct, boxed);
    assert_eq!(lexer.name(), "demo");
}
