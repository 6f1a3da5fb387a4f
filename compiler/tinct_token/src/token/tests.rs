use super::*;
use pretty_assertions::assert_eq;

#[test]
fn end_is_offset_plus_byte_length() {
    let token = Token::new(3, TokenType::STRING, "héllo");
    assert_eq!(token.end(), 9);
}

#[test]
fn shifted_moves_offset_only() {
    let token = Token::new(2, TokenType::NAME, "ab").shifted(10);
    assert_eq!(token, Token::new(12, TokenType::NAME, "ab"));
}

#[test]
fn debug_reads_like_a_triple() {
    let token = Token::new(0, TokenType::NUMBER, "12");
    assert_eq!(format!("{token:?}"), "(0, Literal.Number, \"12\")");
}

#[test]
fn owned_token_serializes_as_triple() {
    let token = Token::new(4, TokenType::COMMENT_SINGLE, "# hi\n").to_owned_token();
    let json = serde_json::to_string(&token).unwrap();
    assert_eq!(json, r##"[4,"Comment.Single","# hi\n"]"##);
}

#[test]
fn owned_token_json_is_lossless() {
    let custom = TokenType::intern(&["Name", "Register"]);
    let tokens = vec![
        OwnedToken::from(Token::new(0, custom, "%eax")),
        OwnedToken::from(Token::new(4, TokenType::TEXT, " \u{1F600}\t")),
    ];
    let json = serde_json::to_string(&tokens).unwrap();
    let back: Vec<OwnedToken> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tokens);
}

#[test]
fn as_token_borrows_text() {
    let owned = OwnedToken::from(Token::new(1, TokenType::ERROR, "?"));
    assert_eq!(owned.as_token(), Token::new(1, TokenType::ERROR, "?"));
}
