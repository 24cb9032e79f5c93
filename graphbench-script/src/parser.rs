use std::sync::Arc;

use graphbench_value::Value;

use crate::ast::{BinaryOp, Expr, Query, Script, SleepUnit, Statement};
use crate::error::ParseError;
use crate::lexer::{self, Spanned, Token};

/// Parses workload script text into a [`Script`].
///
/// Lines starting with `:` are meta-commands (`:set`, `:sleep`). Everything else is query text,
/// accumulated until an unquoted `;` closes the query. Parsing never evaluates expressions.
pub fn parse(script: &str, text: &str, weight: u32) -> Result<Script, ParseError> {
    let mut statements = Vec::new();
    let mut scanner = QueryScanner::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw_line.trim_start();

        if trimmed.starts_with(':') && !scanner.in_quote() {
            if let Some((start_line, start_column)) = scanner.pending_start() {
                return Err(unterminated(script, start_line, start_column));
            }
            let offset = raw_line.len() - trimmed.len();
            let column = raw_line[..offset].chars().count() + 1;
            statements.push(parse_meta(script, line, column, trimmed)?);
            continue;
        }

        if !scanner.has_pending() && (trimmed.is_empty() || trimmed.starts_with("//")) {
            continue;
        }

        scanner.feed_line(line, raw_line, &mut statements);
    }

    if let Some((line, column)) = scanner.pending_start() {
        return Err(unterminated(script, line, column));
    }

    Ok(Script::new(script, weight, statements))
}

/// Parses a standalone expression, e.g. a `-D` define or a test fixture.
pub fn parse_expression(text: &str) -> Result<Expr, ParseError> {
    let tokens = lexer::tokenize(text, 1).map_err(|(column, message)| ParseError {
        script: "<expression>".to_string(),
        line: 1,
        column,
        message,
    })?;
    let mut parser = ExprParser::new(tokens);
    let expr = parser
        .expression()
        .and_then(|expr| parser.expect_eof().map(|()| expr))
        .map_err(|(column, message)| ParseError {
            script: "<expression>".to_string(),
            line: 1,
            column,
            message,
        })?;
    Ok(expr)
}

fn unterminated(script: &str, line: usize, column: usize) -> ParseError {
    ParseError {
        script: script.to_string(),
        line,
        column,
        message: "unterminated query (expected `;`)".to_string(),
    }
}

fn parse_meta(
    script: &str,
    line: usize,
    column: usize,
    command_line: &str,
) -> Result<Statement, ParseError> {
    let err = |column: usize, message: String| ParseError {
        script: script.to_string(),
        line,
        column,
        message,
    };

    let body = &command_line[1..];
    let name_len = body
        .find(char::is_whitespace)
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_len);
    let rest_column = column + 1 + name.chars().count();

    let tokens = lexer::tokenize(rest, rest_column).map_err(|(c, m)| err(c, m))?;
    let mut parser = ExprParser::new(tokens);

    match name {
        "set" => {
            let var = match parser.advance() {
                Spanned {
                    token: Token::Ident(v) | Token::Param(v),
                    ..
                } => v,
                other => {
                    return Err(err(
                        other.column,
                        format!(
                            "`:set` expects a variable name, found {}",
                            other.token.describe()
                        ),
                    ));
                }
            };
            let expr = parser.expression().map_err(|(c, m)| err(c, m))?;
            parser.expect_eof().map_err(|(c, m)| err(c, m))?;
            Ok(Statement::Set {
                name: Arc::from(var),
                expr,
            })
        }
        "sleep" => {
            let duration = parser.expression().map_err(|(c, m)| err(c, m))?;
            let unit = match parser.advance() {
                Spanned {
                    token: Token::Eof, ..
                } => SleepUnit::Seconds,
                Spanned {
                    token: Token::Ident(u),
                    column,
                } => {
                    let unit: SleepUnit = u.parse().map_err(|_| {
                        err(
                            column,
                            format!("unknown sleep unit `{u}` (expected `ms` or `s`)"),
                        )
                    })?;
                    parser.expect_eof().map_err(|(c, m)| err(c, m))?;
                    unit
                }
                other => {
                    return Err(err(
                        other.column,
                        format!(
                            "expected sleep unit `ms` or `s`, found {}",
                            other.token.describe()
                        ),
                    ));
                }
            };
            Ok(Statement::Sleep { duration, unit })
        }
        "" => Err(err(column, "missing meta-command name after `:`".to_string())),
        other => Err(err(column, format!("unknown meta-command `:{other}`"))),
    }
}

/// Accumulates query text across lines, honoring quotes so that `;` inside a string literal
/// does not close the query. An unquoted `//` ends the line.
#[derive(Debug, Default)]
struct QueryScanner {
    buf: String,
    start: Option<(usize, usize)>,
    quote: Option<char>,
    escaped: bool,
}

impl QueryScanner {
    fn has_pending(&self) -> bool {
        self.start.is_some()
    }

    fn pending_start(&self) -> Option<(usize, usize)> {
        self.start
    }

    fn in_quote(&self) -> bool {
        self.quote.is_some()
    }

    fn feed_line(&mut self, line: usize, raw_line: &str, out: &mut Vec<Statement>) {
        let chars: Vec<char> = raw_line.chars().collect();
        for (idx, &c) in chars.iter().enumerate() {
            if self.quote.is_none() && c == '/' && chars.get(idx + 1) == Some(&'/') {
                break;
            }
            if self.start.is_none() {
                if c.is_whitespace() {
                    continue;
                }
                self.start = Some((line, idx + 1));
            }

            if let Some(q) = self.quote {
                self.buf.push(c);
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == q {
                    self.quote = None;
                }
                continue;
            }

            match c {
                '\'' | '"' | '`' => {
                    self.quote = Some(c);
                    self.buf.push(c);
                }
                ';' => self.finish(out),
                _ => self.buf.push(c),
            }
        }

        if self.start.is_some() {
            self.buf.push('\n');
        }
    }

    fn finish(&mut self, out: &mut Vec<Statement>) {
        let text = self.buf.trim();
        if !text.is_empty() {
            out.push(Statement::Query(Query {
                params: query_params(text),
                text: Arc::from(text),
            }));
        }
        self.buf.clear();
        self.start = None;
    }
}

/// Collects `$name` references outside of quoted sections, in order of first appearance.
pub(crate) fn query_params(text: &str) -> Vec<Arc<str>> {
    let chars: Vec<char> = text.chars().collect();
    let mut out: Vec<Arc<str>> = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '$' if chars.get(i + 1).copied().is_some_and(lexer::is_ident_start) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && lexer::is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                if !out.iter().any(|p| p.as_ref() == name) {
                    out.push(Arc::from(name));
                }
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    out
}

type PResult<T> = Result<T, lexer::LexError>;

/// Recursive-descent parser over a single line's tokens.
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := '-' unary | primary
/// primary := number | string | '$'ident | ident '(' args ')' | ident
///          | '(' expr ')' | '[' list-or-comprehension ']' | '{' map '}'
/// ```
struct ExprParser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl ExprParser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Spanned {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: &Token) -> PResult<()> {
        let got = self.advance();
        if &got.token == want {
            Ok(())
        } else {
            Err((
                got.column,
                format!("expected {}, found {}", want.describe(), got.token.describe()),
            ))
        }
    }

    fn expect_eof(&mut self) -> PResult<()> {
        let tok = self.peek();
        if tok.token == Token::Eof {
            Ok(())
        } else {
            Err((
                tok.column,
                format!("unexpected {} after expression", tok.token.describe()),
            ))
        }
    }

    fn expression(&mut self) -> PResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek().token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.peek().token != Token::Minus {
            return self.primary();
        }
        self.advance();
        match self.unary()? {
            Expr::Literal(Value::Int(v)) if v != i64::MIN => Ok(Expr::Literal(Value::Int(-v))),
            Expr::Literal(Value::Float(v)) => Ok(Expr::Literal(Value::Float(-v))),
            other => Ok(Expr::Negate(Box::new(other))),
        }
    }

    fn primary(&mut self) -> PResult<Expr> {
        let tok = self.advance();
        match tok.token {
            Token::Int(v) => Ok(Expr::Literal(Value::Int(v))),
            Token::Float(v) => Ok(Expr::Literal(Value::Float(v))),
            Token::Str(s) => Ok(Expr::Literal(Value::from(s))),
            Token::Param(name) => Ok(Expr::Variable(Arc::from(name))),
            Token::Ident(name) => {
                if self.peek().token == Token::LParen {
                    self.advance();
                    let args = self.list_items(&Token::RParen)?;
                    Ok(Expr::Call {
                        name: Arc::from(name),
                        args,
                    })
                } else {
                    Ok(Expr::Variable(Arc::from(name)))
                }
            }
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => self.list_or_comprehension(),
            Token::LBrace => self.map(),
            other => Err((
                tok.column,
                format!("expected an expression, found {}", other.describe()),
            )),
        }
    }

    fn list_or_comprehension(&mut self) -> PResult<Expr> {
        let is_comprehension = matches!(self.peek_at(0), Some(Token::Ident(_)))
            && matches!(self.peek_at(1), Some(Token::Ident(kw)) if kw == "in");

        if !is_comprehension {
            return Ok(Expr::List(self.list_items(&Token::RBracket)?));
        }

        let tok = self.advance();
        let Token::Ident(binding) = tok.token else {
            return Err((tok.column, "expected a binding name".to_string()));
        };
        // `in`
        self.advance();
        let source = self.expression()?;
        self.expect(&Token::Pipe)?;
        let projection = self.expression()?;
        self.expect(&Token::RBracket)?;

        Ok(Expr::Comprehension {
            binding: Arc::from(binding),
            source: Box::new(source),
            projection: Box::new(projection),
        })
    }

    fn list_items(&mut self, close: &Token) -> PResult<Vec<Expr>> {
        let mut items = Vec::new();
        if &self.peek().token == close {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            let tok = self.advance();
            if &tok.token == close {
                return Ok(items);
            }
            if tok.token != Token::Comma {
                return Err((
                    tok.column,
                    format!(
                        "expected `,` or {}, found {}",
                        close.describe(),
                        tok.token.describe()
                    ),
                ));
            }
        }
    }

    fn map(&mut self) -> PResult<Expr> {
        let mut entries = Vec::new();
        if self.peek().token == Token::RBrace {
            self.advance();
            return Ok(Expr::Map(entries));
        }
        loop {
            let key_tok = self.advance();
            let key = match key_tok.token {
                Token::Ident(k) | Token::Str(k) => k,
                other => {
                    return Err((
                        key_tok.column,
                        format!("expected a map key, found {}", other.describe()),
                    ));
                }
            };
            self.expect(&Token::Colon)?;
            let value = self.expression()?;
            entries.push((Arc::from(key), value));

            let tok = self.advance();
            match tok.token {
                Token::RBrace => return Ok(Expr::Map(entries)),
                Token::Comma => {}
                other => {
                    return Err((
                        tok.column,
                        format!("expected `,` or `}}`, found {}", other.describe()),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> Script {
        parse("test.script", text, 1).unwrap_or_else(|e| panic!("{e}"))
    }

    fn parse_err(text: &str) -> ParseError {
        match parse("test.script", text, 1) {
            Ok(s) => panic!("expected parse error, got {s:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn parses_meta_commands_and_multiline_queries() {
        let script = parse_ok(
            ":set aid random(1, 100000 * $scale)\n\
             :sleep 10 ms\n\
             MATCH (a:Account {aid: $aid})\n\
             RETURN a.balance;\n",
        );

        assert_eq!(script.statements.len(), 3);
        assert!(matches!(&script.statements[0], Statement::Set { name, .. } if name.as_ref() == "aid"));
        assert!(matches!(
            &script.statements[1],
            Statement::Sleep {
                unit: SleepUnit::Millis,
                ..
            }
        ));
        let Statement::Query(q) = &script.statements[2] else {
            panic!("expected query");
        };
        assert_eq!(q.text.as_ref(), "MATCH (a:Account {aid: $aid})\nRETURN a.balance");
        assert_eq!(q.params, vec![Arc::<str>::from("aid")]);
    }

    #[test]
    fn semicolons_inside_strings_do_not_close_queries() {
        let script = parse_ok("CREATE (:N {s: 'a;b'}); RETURN $x, $x, \"$y\";");
        let queries: Vec<&Query> = script.queries().collect();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].text.as_ref(), "CREATE (:N {s: 'a;b'})");
        assert_eq!(queries[1].params, vec![Arc::<str>::from("x")]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let script = parse_ok("// header\n\n   // indented\nRETURN 1;\n");
        assert_eq!(script.statements.len(), 1);
    }

    #[test]
    fn trailing_comment_after_query_is_ignored() {
        let script = parse_ok("RETURN 1; // done\nRETURN 'http://x'; // link\n");
        let texts: Vec<&str> = script.queries().map(|q| q.text.as_ref()).collect();
        assert_eq!(texts, ["RETURN 1", "RETURN 'http://x'"]);
    }

    #[test]
    fn quotes_inside_comments_do_not_open_strings() {
        let script = parse_ok("MATCH (n)\n// don't\nRETURN n; // it's fine\nRETURN 2;\n");
        let texts: Vec<&str> = script.queries().map(|q| q.text.as_ref()).collect();
        assert_eq!(texts.len(), 2, "{texts:?}");
        assert!(texts[0].starts_with("MATCH (n)") && texts[0].ends_with("RETURN n"), "{texts:?}");
        assert!(!texts[0].contains("don't"));
        assert_eq!(texts[1], "RETURN 2");
    }

    #[test]
    fn missing_semicolon_is_unterminated_query() {
        let err = parse_err(":set x 1\nMATCH (n)\n  RETURN n\n");
        assert_eq!((err.line, err.column), (2, 1));
        assert!(err.message.contains("unterminated query"), "{err}");
    }

    #[test]
    fn meta_command_inside_pending_query_is_unterminated() {
        let err = parse_err("  MATCH (n)\n:set x 1\nRETURN n;");
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn unknown_meta_command_is_rejected() {
        let err = parse_err(":foo 1");
        assert!(err.message.contains("unknown meta-command `:foo`"), "{err}");
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn sleep_unit_must_be_ms_or_s() {
        let err = parse_err(":sleep 10 us");
        assert!(err.message.contains("unknown sleep unit `us`"), "{err}");
        assert_eq!(err.column, 11);

        let script = parse_ok(":sleep 2");
        assert!(matches!(
            script.statements[0],
            Statement::Sleep {
                unit: SleepUnit::Seconds,
                ..
            }
        ));
    }

    #[test]
    fn malformed_expressions_carry_positions() {
        let err = parse_err("RETURN 1;\n:set x (1 + \n");
        assert_eq!(err.line, 2);
        assert!(err.message.contains("expected an expression"), "{err}");

        let err = parse_err(":set x 1 2");
        assert_eq!(err.column, 10);
    }

    #[test]
    fn parses_collections_and_comprehensions() {
        let expr = parse_expression("[i in range(1, 3) | {id: i, 'name': 'n' + i}]")
            .unwrap_or_else(|e| panic!("{e}"));
        let Expr::Comprehension {
            binding,
            projection,
            ..
        } = expr
        else {
            panic!("expected comprehension");
        };
        assert_eq!(binding.as_ref(), "i");
        assert!(matches!(*projection, Expr::Map(ref entries) if entries.len() == 2));

        assert_eq!(
            parse_expression("[]").unwrap_or_else(|e| panic!("{e}")),
            Expr::List(vec![])
        );
    }

    #[test]
    fn precedence_and_unary_minus() {
        let expr = parse_expression("-1 + 2 * 3").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Literal(Value::Int(-1))),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Literal(Value::Int(2))),
                    right: Box::new(Expr::Literal(Value::Int(3))),
                }),
            }
        );
    }
}
