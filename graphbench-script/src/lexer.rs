#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// `$name`
    Param(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Pipe,
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Int(v) => format!("`{v}`"),
            Self::Float(v) => format!("`{v}`"),
            Self::Str(s) => format!("string '{s}'"),
            Self::Ident(s) => format!("`{s}`"),
            Self::Param(s) => format!("`${s}`"),
            Self::Plus => "`+`".to_string(),
            Self::Minus => "`-`".to_string(),
            Self::Star => "`*`".to_string(),
            Self::Slash => "`/`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::LBracket => "`[`".to_string(),
            Self::RBracket => "`]`".to_string(),
            Self::LBrace => "`{`".to_string(),
            Self::RBrace => "`}`".to_string(),
            Self::Comma => "`,`".to_string(),
            Self::Colon => "`:`".to_string(),
            Self::Pipe => "`|`".to_string(),
            Self::Eof => "end of line".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    /// 1-based column in the source line.
    pub column: usize,
}

/// Lexing failure: (1-based column, message).
pub(crate) type LexError = (usize, String);

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenizes `input`, which starts at 1-based column `first_column` of its line.
pub(crate) fn tokenize(input: &str, first_column: usize) -> Result<Vec<Spanned>, LexError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = first_column + i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            '|' => Some(Token::Pipe),
            _ => None,
        };
        if let Some(token) = single {
            out.push(Spanned { token, column });
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit))
        {
            let (token, next) = lex_number(&chars, i, column)?;
            out.push(Spanned { token, column });
            i = next;
            continue;
        }

        if c == '\'' || c == '"' {
            let (s, next) = lex_string(&chars, i, column)?;
            out.push(Spanned {
                token: Token::Str(s),
                column,
            });
            i = next;
            continue;
        }

        if c == '$' {
            let start = i + 1;
            let mut end = start;
            if !chars.get(start).copied().is_some_and(is_ident_start) {
                return Err((column, "expected a variable name after `$`".to_string()));
            }
            while end < chars.len() && is_ident_char(chars[end]) {
                end += 1;
            }
            out.push(Spanned {
                token: Token::Param(chars[start..end].iter().collect()),
                column,
            });
            i = end;
            continue;
        }

        if is_ident_start(c) {
            let mut end = i;
            while end < chars.len() && is_ident_char(chars[end]) {
                end += 1;
            }
            out.push(Spanned {
                token: Token::Ident(chars[i..end].iter().collect()),
                column,
            });
            i = end;
            continue;
        }

        return Err((column, format!("unexpected character `{c}`")));
    }

    out.push(Spanned {
        token: Token::Eof,
        column: first_column + chars.len(),
    });
    Ok(out)
}

fn lex_number(chars: &[char], start: usize, column: usize) -> Result<(Token, usize), LexError> {
    let mut end = start;
    let mut is_float = false;

    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    if end < chars.len() && chars[end] == '.' {
        is_float = true;
        end += 1;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < chars.len() && (chars[end] == 'e' || chars[end] == 'E') {
        let mut exp_end = end + 1;
        if exp_end < chars.len() && (chars[exp_end] == '+' || chars[exp_end] == '-') {
            exp_end += 1;
        }
        if exp_end < chars.len() && chars[exp_end].is_ascii_digit() {
            is_float = true;
            end = exp_end;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
        }
    }

    let text: String = chars[start..end].iter().collect();
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| (column, format!("invalid number `{text}`")))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| (column, format!("integer literal `{text}` is out of range")))?,
        )
    };
    Ok((token, end))
}

fn lex_string(chars: &[char], start: usize, column: usize) -> Result<(String, usize), LexError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Ok((out, i + 1));
        }
        if c == '\\' {
            let Some(&escaped) = chars.get(i + 1) else {
                break;
            };
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }

    Err((column, "unterminated string literal".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        match tokenize(input, 1) {
            Ok(v) => v.into_iter().map(|s| s.token).collect(),
            Err((col, msg)) => panic!("{col}: {msg}"),
        }
    }

    #[test]
    fn lexes_numbers_and_operators() {
        assert_eq!(
            tokens("1 + 2.5*3e2"),
            vec![
                Token::Int(1),
                Token::Plus,
                Token::Float(2.5),
                Token::Star,
                Token::Float(300.0),
                Token::Eof
            ]
        );
    }

    #[test]
    fn lexes_params_and_strings() {
        assert_eq!(
            tokens(r#"$scale 'it\'s' "a,b""#),
            vec![
                Token::Param("scale".to_string()),
                Token::Str("it's".to_string()),
                Token::Str("a,b".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn reports_columns_of_bad_input() {
        assert_eq!(
            tokenize("1 + #", 5).err().map(|(c, _)| c),
            Some(9),
            "column should be offset by the starting column"
        );
        assert!(tokenize("'open", 1).is_err());
        assert!(tokenize("99999999999999999999", 1).is_err());
    }
}
