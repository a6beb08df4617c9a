//! Structural checks on model-written SQL.
//!
//! A small tokenizer splits the statement into words, literals and symbols
//! (comments dropped, quoted text kept opaque) so keyword checks never match
//! inside string literals or quoted identifiers.

use thiserror::Error;

const FORBIDDEN_KEYWORDS: [&str; 11] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "REPLACE", "ATTACH", "DETACH",
    "PRAGMA", "VACUUM",
];

const PATTERN_PREDICATES: [&str; 4] = ["LIKE", "GLOB", "MATCH", "REGEXP"];

/// Clauses that may follow the `JOIN products ...` of a vector statement.
const TAIL_CLAUSES: [&str; 5] = ["WHERE", "GROUP", "HAVING", "ORDER", "LIMIT"];

const VECTOR_FUNCTION: &str = "VECTOR_TOP_K";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("statement is empty")]
    Empty,

    #[error("statement must start with SELECT")]
    NotSelect,

    #[error("only a single statement is allowed")]
    MultipleStatements,

    #[error("forbidden keyword: {0}")]
    ForbiddenKeyword(String),

    #[error("attribute-only statement must not use vector_top_k")]
    UnexpectedVectorSearch,

    #[error("semantic statement must use vector_top_k")]
    MissingVectorSearch,

    #[error("semantic statement must JOIN products")]
    MissingProductsJoin,

    #[error("semantic statement must not use pattern predicate {0}")]
    PatternPredicate(String),

    #[error("semantic statement must not use OR in its JOIN condition")]
    DisjunctiveJoinCondition,

    #[error("unterminated {0}")]
    Unterminated(&'static str),
}

/// Which retrieval shape a statement is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT ... FROM products WHERE ...`
    Plain,
    /// `SELECT * FROM vector_top_k(...) JOIN products ON ...`
    VectorSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Number,
    StringLiteral,
    QuotedIdent,
    Symbol(char),
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    start: usize,
}

impl Token<'_> {
    fn is_word(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol(c)
    }
}

fn tokenize(sql: &str) -> Result<Vec<Token<'_>>, StatementError> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b if b.is_ascii_whitespace() => i += 1,
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = sql[i + 2..]
                    .find("*/")
                    .ok_or(StatementError::Unterminated("comment"))?;
                i += 2 + end + 2;
            }
            b'\'' | b'"' | b'`' | b'[' => {
                let close = if c == b'[' { b']' } else { c };
                let start = i;
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => {
                            return Err(StatementError::Unterminated(if c == b'\'' {
                                "string literal"
                            } else {
                                "quoted identifier"
                            }));
                        }
                        // doubled quote escapes itself
                        Some(&b) if b == close && c != b'[' && bytes.get(i + 1) == Some(&close) => {
                            i += 2
                        }
                        Some(&b) if b == close => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                let kind = if c == b'\'' {
                    TokenKind::StringLiteral
                } else {
                    TokenKind::QuotedIdent
                };
                tokens.push(Token {
                    kind,
                    text: &sql[start..i],
                    start,
                });
            }
            b if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] >= 0x80)
                {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Word,
                    text: &sql[start..i],
                    start,
                });
            }
            b if b.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Number,
                    text: &sql[start..i],
                    start,
                });
            }
            _ => {
                tokens.push(Token {
                    kind: TokenKind::Symbol(c as char),
                    text: &sql[i..i + 1],
                    start: i,
                });
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Tokens of a single statement, without the optional trailing `;`.
fn statement_tokens(sql: &str) -> Result<Vec<Token<'_>>, StatementError> {
    let mut tokens = tokenize(sql)?;
    if tokens.last().is_some_and(|t| t.is_symbol(';')) {
        tokens.pop();
    }
    if tokens.iter().any(|t| t.is_symbol(';')) {
        return Err(StatementError::MultipleStatements);
    }
    Ok(tokens)
}

/// Position of `JOIN products` in the token stream.
fn products_join(tokens: &[Token<'_>]) -> Option<usize> {
    tokens.windows(2).position(|pair| {
        pair[0].is_word("JOIN")
            && matches!(pair[1].kind, TokenKind::Word | TokenKind::QuotedIdent)
            && unquote(pair[1].text).eq_ignore_ascii_case("products")
    })
}

fn unquote(text: &str) -> &str {
    let trimmed = text.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'));
    if trimmed.is_empty() { text } else { trimmed }
}

/// Check that `sql` is a single read-only statement of the expected shape.
pub fn guard(sql: &str, kind: StatementKind) -> Result<(), StatementError> {
    let tokens = statement_tokens(sql)?;

    let first = tokens.first().ok_or(StatementError::Empty)?;
    if !first.is_word("SELECT") {
        return Err(StatementError::NotSelect);
    }

    if let Some(word) = tokens.iter().find(|t| {
        t.kind == TokenKind::Word
            && FORBIDDEN_KEYWORDS
                .iter()
                .any(|k| t.text.eq_ignore_ascii_case(k))
    }) {
        return Err(StatementError::ForbiddenKeyword(word.text.to_ascii_uppercase()));
    }

    let uses_vector = tokens.iter().any(|t| t.is_word(VECTOR_FUNCTION));

    match kind {
        StatementKind::Plain if uses_vector => Err(StatementError::UnexpectedVectorSearch),
        StatementKind::Plain => Ok(()),
        StatementKind::VectorSearch => {
            if !uses_vector {
                return Err(StatementError::MissingVectorSearch);
            }
            if products_join(&tokens).is_none() {
                return Err(StatementError::MissingProductsJoin);
            }
            if let Some(word) = tokens.iter().find(|t| {
                t.kind == TokenKind::Word
                    && PATTERN_PREDICATES
                        .iter()
                        .any(|k| t.text.eq_ignore_ascii_case(k))
            }) {
                return Err(StatementError::PatternPredicate(word.text.to_ascii_uppercase()));
            }
            Ok(())
        }
    }
}

/// The parts of a vector statement kept when it is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTail<'a> {
    /// Alias given to `products` in the join, if any
    pub alias: Option<&'a str>,
    /// `ON` conjuncts other than the `rowid` link, in statement order
    pub conditions: Vec<&'a str>,
    /// `WHERE` / `GROUP BY` / `HAVING` / `ORDER BY` / `LIMIT` suffix, trimmed
    pub filters: &'a str,
}

fn span<'a>(sql: &'a str, tokens: &[Token<'_>]) -> &'a str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => &sql[first.start..last.start + last.text.len()],
        _ => "",
    }
}

/// Index of the `)` closing the `(` at `open`.
fn closing_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::Symbol('(') => depth += 1,
            TokenKind::Symbol(')') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an `ON` condition into top-level conjuncts, dropping the ones that
/// link `products.rowid` to the vector index.
fn join_conditions<'a>(
    sql: &'a str,
    mut tokens: &[Token<'_>],
) -> Result<Vec<&'a str>, StatementError> {
    while tokens.first().is_some_and(|t| t.is_symbol('('))
        && closing_paren(tokens, 0) == Some(tokens.len() - 1)
    {
        tokens = &tokens[1..tokens.len() - 1];
    }

    let mut parts: Vec<&[Token<'_>]> = Vec::new();
    let mut depth = 0usize;
    let mut in_between = false;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Symbol('(') => depth += 1,
            TokenKind::Symbol(')') => depth = depth.saturating_sub(1),
            TokenKind::Word if depth == 0 => {
                if token.is_word("OR") {
                    return Err(StatementError::DisjunctiveJoinCondition);
                }
                if token.is_word("BETWEEN") {
                    in_between = true;
                } else if token.is_word("AND") {
                    if in_between {
                        in_between = false;
                    } else {
                        parts.push(&tokens[start..i]);
                        start = i + 1;
                    }
                }
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);

    Ok(parts
        .into_iter()
        .filter(|part| !part.is_empty() && !links_rowid(part))
        .map(|part| span(sql, part))
        .collect())
}

fn links_rowid(conjunct: &[Token<'_>]) -> bool {
    let mut depth = 0usize;
    conjunct.iter().any(|token| match token.kind {
        TokenKind::Symbol('(') => {
            depth += 1;
            false
        }
        TokenKind::Symbol(')') => {
            depth = depth.saturating_sub(1);
            false
        }
        _ => depth == 0 && token.is_word("rowid"),
    })
}

/// Split a vector statement into the pieces the executor keeps.
///
/// The filter suffix starts at the first top-level tail clause after the join
/// and runs to the end of the statement (a trailing `;` is dropped). Extra
/// `ON` conjuncts are returned separately so they survive the rebuild.
pub fn join_tail(sql: &str) -> Result<JoinTail<'_>, StatementError> {
    let tokens = statement_tokens(sql)?;
    let join = products_join(&tokens).ok_or(StatementError::MissingProductsJoin)?;
    let after_join = &tokens[join + 2..];

    let alias = match after_join {
        [kw, name, ..] if kw.is_word("AS") && name.kind == TokenKind::Word => Some(name.text),
        [name, ..]
            if name.kind == TokenKind::Word
                && !name.is_word("ON")
                && !name.is_word("AS")
                && !TAIL_CLAUSES.iter().any(|k| name.is_word(k)) =>
        {
            Some(name.text)
        }
        _ => None,
    };

    let mut depth = 0usize;
    let mut tail_start = after_join.len();
    for (i, token) in after_join.iter().enumerate() {
        match token.kind {
            TokenKind::Symbol('(') => depth += 1,
            TokenKind::Symbol(')') => depth = depth.saturating_sub(1),
            TokenKind::Word if depth == 0 && TAIL_CLAUSES.iter().any(|k| token.is_word(k)) => {
                tail_start = i;
                break;
            }
            _ => {}
        }
    }

    let head = &after_join[..tail_start];
    let conditions = match head.iter().position(|t| t.is_word("ON")) {
        Some(on) => join_conditions(sql, &head[on + 1..])?,
        None => Vec::new(),
    };
    let filters = span(sql, &after_join[tail_start..]);

    let kept = conditions.iter().copied().chain([filters]);
    for fragment in kept {
        if tokenize(fragment)?.iter().any(|t| t.is_word(VECTOR_FUNCTION)) {
            return Err(StatementError::UnexpectedVectorSearch);
        }
    }

    Ok(JoinTail {
        alias,
        conditions,
        filters,
    })
}

/// Qualify every bare `id` reference in `fragment` with `table`.
///
/// The rebuilt statement exposes both `products.id` and the vector index's
/// `id`, so an unqualified `id` would be ambiguous. References inside
/// subqueries, after a `.`, used as an alias, or called as a function are
/// left alone.
pub fn qualify_bare_ids(fragment: &str, table: &str) -> Result<String, StatementError> {
    let tokens = tokenize(fragment)?;
    let mut out = String::with_capacity(fragment.len());
    let mut copied = 0;
    let mut subqueries: Vec<bool> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &tokens[p]);
        let next = tokens.get(i + 1);
        match token.kind {
            TokenKind::Symbol('(') => subqueries.push(next.is_some_and(|t| t.is_word("SELECT"))),
            TokenKind::Symbol(')') => {
                subqueries.pop();
            }
            TokenKind::Word
                if token.is_word("id")
                    && !subqueries.iter().any(|&inner| inner)
                    && !prev.is_some_and(|t| t.is_symbol('.') || t.is_word("AS"))
                    && !next.is_some_and(|t| t.is_symbol('.') || t.is_symbol('(')) =>
            {
                out.push_str(&fragment[copied..token.start]);
                out.push_str(table);
                out.push_str(".id");
                copied = token.start + token.text.len();
            }
            _ => {}
        }
    }

    out.push_str(&fragment[copied..]);
    Ok(out)
}

/// Whether a statement fragment carries a top-level `LIMIT`.
pub fn has_limit(fragment: &str) -> bool {
    let Ok(tokens) = tokenize(fragment) else {
        return false;
    };
    let mut depth = 0usize;
    tokens.iter().any(|token| match token.kind {
        TokenKind::Symbol('(') => {
            depth += 1;
            false
        }
        TokenKind::Symbol(')') => {
            depth = depth.saturating_sub(1);
            false
        }
        _ => depth == 0 && token.is_word("LIMIT"),
    })
}
