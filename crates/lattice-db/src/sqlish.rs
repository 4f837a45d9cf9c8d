//! The narrow SQL-like search dialect.
//!
//! Supported grammar, nothing more:
//!
//! ```text
//! SELECT * FROM documents WHERE <predicate> [AND <predicate>]*
//!     [ORDER BY <createdutc|lastupdateutc|name> [ASC|DESC]]
//!     [LIMIT n] [OFFSET n]
//! ```
//!
//! Predicates are `<field> <op> <literal>`, `<field> IS [NOT] NULL`, or
//! `<field> LIKE '<pattern>'`. Bare field names resolve to index tables
//! exactly as in the structured planner. Anything outside the grammar is
//! rejected with [`LatticeError::UnsupportedSql`].

use lattice_core::enums::{DocumentOrdering, FilterCondition};
use lattice_core::query::{SearchFilter, SearchQuery, SearchResult};

use crate::error::{LatticeError, Result};
use crate::Lattice;

impl Lattice {
    /// Evaluates a SQL-like expression against one collection.
    pub fn search_by_sql(&self, collection_id: &str, expression: &str) -> Result<SearchResult> {
        let parsed = parse_expression(expression)?;
        let query = SearchQuery {
            collection_id: collection_id.to_owned(),
            filters: parsed.filters,
            labels: Vec::new(),
            tags: Default::default(),
            max_results: parsed.limit,
            skip: parsed.skip,
            ordering: parsed.ordering,
            include_content: false,
        };
        self.search(&query)
    }
}

/// The distilled form of a parsed expression.
#[derive(Debug, PartialEq)]
pub(crate) struct ParsedQuery {
    pub filters: Vec<SearchFilter>,
    pub ordering: Option<DocumentOrdering>,
    pub limit: Option<u32>,
    pub skip: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Bare identifier or keyword (dotted paths allowed).
    Ident(String),
    /// Single-quoted string literal ('' escapes a quote).
    Str(String),
    /// Numeric literal, kept textual.
    Num(String),
    Star,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

fn unsupported(message: impl Into<String>) -> LatticeError {
    LatticeError::UnsupportedSql(message.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(unsupported("expected '=' after '!'"));
                }
                tokens.push(Token::Ne);
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('>') => {
                        chars.next();
                        tokens.push(Token::Ne);
                    }
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Le);
                    }
                    _ => tokens.push(Token::Lt),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => {
                            // '' inside a string is an escaped quote
                            if chars.peek() == Some(&'\'') {
                                chars.next();
                                s.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some(c) => s.push(c),
                        None => return Err(unsupported("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut s = String::new();
                s.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        s.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Num(s));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' || d == '.' {
                        s.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(s));
            }
            other => return Err(unsupported(format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the next token if it is the given keyword (case-insensitive).
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if let Some(Token::Ident(s)) = self.peek() {
            if s.eq_ignore_ascii_case(keyword) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(unsupported(format!("expected {keyword}")))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(s)) => Ok(s),
            other => Err(unsupported(format!("expected identifier, got {other:?}"))),
        }
    }

    fn expect_number(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Num(s)) => Ok(s),
            other => Err(unsupported(format!("expected number, got {other:?}"))),
        }
    }
}

const RESERVED: &[&str] = &[
    "select", "from", "where", "and", "or", "order", "by", "limit", "offset", "is", "not",
    "null", "like", "asc", "desc", "true", "false",
];

fn is_reserved(ident: &str) -> bool {
    RESERVED.iter().any(|k| ident.eq_ignore_ascii_case(k))
}

/// Parses one expression of the supported grammar.
pub(crate) fn parse_expression(expression: &str) -> Result<ParsedQuery> {
    let mut p = Parser {
        tokens: tokenize(expression)?,
        pos: 0,
    };

    p.expect_keyword("SELECT")?;
    if p.next() != Some(Token::Star) {
        return Err(unsupported("only SELECT * is supported"));
    }
    p.expect_keyword("FROM")?;
    let table = p.expect_ident()?;
    if !table.eq_ignore_ascii_case("documents") {
        return Err(unsupported(format!("unknown table '{table}'")));
    }
    p.expect_keyword("WHERE")?;

    let mut filters = vec![parse_predicate(&mut p)?];
    loop {
        if p.eat_keyword("AND") {
            filters.push(parse_predicate(&mut p)?);
        } else if matches!(p.peek(), Some(Token::Ident(s)) if s.eq_ignore_ascii_case("or")) {
            return Err(unsupported("OR is not supported; use AND"));
        } else {
            break;
        }
    }

    let ordering = if p.eat_keyword("ORDER") {
        p.expect_keyword("BY")?;
        let column = p.expect_ident()?;
        let descending = if p.eat_keyword("DESC") {
            true
        } else {
            p.eat_keyword("ASC");
            false
        };
        Some(resolve_ordering(&column, descending)?)
    } else {
        None
    };

    let limit = if p.eat_keyword("LIMIT") {
        let n = p.expect_number()?;
        Some(
            n.parse::<u32>()
                .map_err(|_| unsupported(format!("bad LIMIT '{n}'")))?,
        )
    } else {
        None
    };

    let skip = if p.eat_keyword("OFFSET") {
        let n = p.expect_number()?;
        Some(
            n.parse::<u64>()
                .map_err(|_| unsupported(format!("bad OFFSET '{n}'")))?,
        )
    } else {
        None
    };

    if let Some(extra) = p.peek() {
        return Err(unsupported(format!("unexpected trailing input: {extra:?}")));
    }

    Ok(ParsedQuery {
        filters,
        ordering,
        limit,
        skip,
    })
}

fn parse_predicate(p: &mut Parser) -> Result<SearchFilter> {
    let field = p.expect_ident()?;
    if is_reserved(&field) {
        return Err(unsupported(format!("expected field name, got '{field}'")));
    }

    if p.eat_keyword("IS") {
        let condition = if p.eat_keyword("NOT") {
            FilterCondition::IsNotNull
        } else {
            FilterCondition::IsNull
        };
        p.expect_keyword("NULL")?;
        return Ok(SearchFilter::unary(field, condition));
    }

    if p.eat_keyword("LIKE") {
        return match p.next() {
            Some(Token::Str(pattern)) => {
                Ok(SearchFilter::new(field, FilterCondition::Like, pattern))
            }
            other => Err(unsupported(format!(
                "LIKE requires a string pattern, got {other:?}"
            ))),
        };
    }

    let condition = match p.next() {
        Some(Token::Eq) => FilterCondition::Equals,
        Some(Token::Ne) => FilterCondition::NotEquals,
        Some(Token::Gt) => FilterCondition::GreaterThan,
        Some(Token::Ge) => FilterCondition::GreaterThanOrEqualTo,
        Some(Token::Lt) => FilterCondition::LessThan,
        Some(Token::Le) => FilterCondition::LessThanOrEqualTo,
        other => return Err(unsupported(format!("expected comparison, got {other:?}"))),
    };

    let value = match p.next() {
        Some(Token::Str(s)) => s,
        Some(Token::Num(n)) => n,
        Some(Token::Ident(s)) if s.eq_ignore_ascii_case("true") => "true".to_owned(),
        Some(Token::Ident(s)) if s.eq_ignore_ascii_case("false") => "false".to_owned(),
        Some(Token::Ident(s)) if s.eq_ignore_ascii_case("null") => {
            return Err(unsupported("comparisons with NULL must use IS [NOT] NULL"));
        }
        other => return Err(unsupported(format!("expected literal, got {other:?}"))),
    };

    Ok(SearchFilter::new(field, condition, value))
}

fn resolve_ordering(column: &str, descending: bool) -> Result<DocumentOrdering> {
    let ordering = match column.to_ascii_lowercase().as_str() {
        "createdutc" => {
            if descending {
                DocumentOrdering::CreatedDescending
            } else {
                DocumentOrdering::CreatedAscending
            }
        }
        "lastupdateutc" => {
            if descending {
                DocumentOrdering::UpdatedDescending
            } else {
                DocumentOrdering::UpdatedAscending
            }
        }
        "name" => {
            if descending {
                DocumentOrdering::NameDescending
            } else {
                DocumentOrdering::NameAscending
            }
        }
        other => return Err(unsupported(format!("cannot order by '{other}'"))),
    };
    Ok(ordering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(expr: &str) -> ParsedQuery {
        parse_expression(expr).unwrap()
    }

    fn parse_err(expr: &str) -> String {
        match parse_expression(expr) {
            Err(LatticeError::UnsupportedSql(m)) => m,
            other => panic!("expected UnsupportedSql, got {other:?}"),
        }
    }

    #[test]
    fn simple_equality() {
        let q = parse("SELECT * FROM documents WHERE Name = 'Joel'");
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters[0].field, "Name");
        assert_eq!(q.filters[0].condition, FilterCondition::Equals);
        assert_eq!(q.filters[0].value.as_deref(), Some("Joel"));
        assert_eq!(q.ordering, None);
    }

    #[test]
    fn dotted_fields_and_numbers() {
        let q = parse("select * from documents where Person.Age >= 21 and Person.Age < 65");
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters[0].field, "Person.Age");
        assert_eq!(
            q.filters[0].condition,
            FilterCondition::GreaterThanOrEqualTo
        );
        assert_eq!(q.filters[0].value.as_deref(), Some("21"));
        assert_eq!(q.filters[1].condition, FilterCondition::LessThan);
    }

    #[test]
    fn order_limit_offset() {
        let q = parse(
            "SELECT * FROM documents WHERE Name != 'x' ORDER BY createdutc ASC LIMIT 10 OFFSET 20",
        );
        assert_eq!(q.ordering, Some(DocumentOrdering::CreatedAscending));
        assert_eq!(q.limit, Some(10));
        assert_eq!(q.skip, Some(20));
    }

    #[test]
    fn order_by_name_desc_and_ne_spelling() {
        let q = parse("SELECT * FROM documents WHERE A <> 'x' ORDER BY name DESC");
        assert_eq!(q.filters[0].condition, FilterCondition::NotEquals);
        assert_eq!(q.ordering, Some(DocumentOrdering::NameDescending));
    }

    #[test]
    fn is_null_and_is_not_null() {
        let q = parse("SELECT * FROM documents WHERE A IS NULL AND B IS NOT NULL");
        assert_eq!(q.filters[0].condition, FilterCondition::IsNull);
        assert_eq!(q.filters[0].value, None);
        assert_eq!(q.filters[1].condition, FilterCondition::IsNotNull);
    }

    #[test]
    fn like_pattern() {
        let q = parse("SELECT * FROM documents WHERE Name LIKE 'Jo%'");
        assert_eq!(q.filters[0].condition, FilterCondition::Like);
        assert_eq!(q.filters[0].value.as_deref(), Some("Jo%"));
    }

    #[test]
    fn boolean_literals_encode() {
        let q = parse("SELECT * FROM documents WHERE Active = true");
        assert_eq!(q.filters[0].value.as_deref(), Some("true"));
    }

    #[test]
    fn quoted_string_escapes() {
        let q = parse("SELECT * FROM documents WHERE Name = 'O''Brien'");
        assert_eq!(q.filters[0].value.as_deref(), Some("O'Brien"));
    }

    #[test]
    fn rejects_outside_grammar() {
        parse_err("SELECT id FROM documents WHERE A = 1");
        parse_err("SELECT * FROM users WHERE A = 1");
        parse_err("SELECT * FROM documents");
        parse_err("SELECT * FROM documents WHERE A = 1 OR B = 2");
        parse_err("SELECT * FROM documents WHERE A = NULL");
        parse_err("SELECT * FROM documents WHERE A = 1 ORDER BY contentlength");
        parse_err("SELECT * FROM documents WHERE A = 1; DROP TABLE documents");
        parse_err("DELETE FROM documents");
    }

    #[test]
    fn rejects_unterminated_string() {
        parse_err("SELECT * FROM documents WHERE A = 'oops");
    }
}
