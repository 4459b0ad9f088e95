//! Tokenizer for DDL scripts.
//!
//! Every token carries its byte span so the parser can slice raw text
//! (type descriptors, default expressions, routine bodies) out of the input.

use super::parser::SqlParseError;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Or,
    Replace,
    Add,
    Table,
    View,
    Procedure,
    Function,
    Primary,
    Key,
    Foreign,
    References,
    Constraint,
    Not,
    Null,
    Unique,
    Default,
    Check,
    With,
    On,
    Delete,
    Update,
    Cascade,
    Restrict,
    If,
    Exists,
    Go,

    // Identifiers and literals
    Ident(String),
    /// Quoted identifier; never a keyword.
    Quoted(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,

    Eof,
}

impl Token {
    /// Identifier text of a bare or quoted identifier.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Token::Ident(s) | Token::Quoted(s) => Some(s),
            _ => None,
        }
    }

    /// Reserved word, e.g. `KEY` or `DEFAULT`.
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Token::Ident(_)
                | Token::Quoted(_)
                | Token::Str(_)
                | Token::Num(_)
                | Token::LParen
                | Token::RParen
                | Token::Comma
                | Token::Semicolon
                | Token::Dot
                | Token::Eof
        )
    }

    /// Bare identifier equal to `word`, ignoring case.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(word))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

/// 1-based line number of a byte offset.
pub fn line_of(input: &str, offset: usize) -> usize {
    input[..offset.min(input.len())].matches('\n').count() + 1
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn current(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn advance(&mut self) {
        self.chars.next();
    }

    /// Character after the current one.
    fn peek_next(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // /
        self.advance(); // *
        while let Some(c) = self.current() {
            self.advance();
            if c == '*' && self.current() == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.current() {
            if !keep(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    /// Read up to `close`; a doubled `close` stands for itself.
    fn read_delimited(&mut self, close: char, what: &'static str) -> Result<String, SqlParseError> {
        let start = self.offset();
        self.advance(); // opening delimiter
        let mut text = String::new();
        loop {
            match self.current() {
                None => {
                    return Err(SqlParseError::Unterminated {
                        what,
                        line: line_of(self.input, start),
                    });
                }
                Some(c) if c == close => {
                    self.advance();
                    if self.current() == Some(close) {
                        text.push(close);
                        self.advance();
                    } else {
                        return Ok(text);
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// `$$` or `$tag$` opening a dollar-quoted body; `$1` is not one.
    fn dollar_delimiter(&mut self) -> Option<&'a str> {
        let input = self.input;
        let start = self.offset();
        let rest = &input[start + 1..];
        let tag_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if rest[..tag_len].starts_with(|c: char| c.is_ascii_digit()) || !rest[tag_len..].starts_with('$') {
            return None;
        }
        Some(&input[start..start + tag_len + 2])
    }

    /// Body between two copies of `delimiter`, kept verbatim.
    fn read_dollar_quoted(&mut self, delimiter: &str) -> Result<String, SqlParseError> {
        let input = self.input;
        let start = self.offset();
        let body_start = start + delimiter.len();
        let Some(len) = input[body_start..].find(delimiter) else {
            return Err(SqlParseError::Unterminated {
                what: "dollar-quoted string",
                line: line_of(input, start),
            });
        };
        let end = body_start + len + delimiter.len();
        while self.current().is_some() && self.offset() < end {
            self.advance();
        }
        Ok(input[body_start..body_start + len].to_string())
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current() == Some('-') {
            num.push('-');
            self.advance();
        }
        num.push_str(&self.read_while(|c| c.is_ascii_digit() || c == '.'));
        num
    }

    fn keyword_or_ident(s: String) -> Token {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Token::Create,
            "ALTER" => Token::Alter,
            "OR" => Token::Or,
            "REPLACE" => Token::Replace,
            "ADD" => Token::Add,
            "TABLE" => Token::Table,
            "VIEW" => Token::View,
            "PROCEDURE" | "PROC" => Token::Procedure,
            "FUNCTION" => Token::Function,
            "PRIMARY" => Token::Primary,
            "KEY" => Token::Key,
            "FOREIGN" => Token::Foreign,
            "REFERENCES" => Token::References,
            "CONSTRAINT" => Token::Constraint,
            "NOT" => Token::Not,
            "NULL" => Token::Null,
            "UNIQUE" => Token::Unique,
            "DEFAULT" => Token::Default,
            "CHECK" => Token::Check,
            "WITH" => Token::With,
            "ON" => Token::On,
            "DELETE" => Token::Delete,
            "UPDATE" => Token::Update,
            "CASCADE" => Token::Cascade,
            "RESTRICT" => Token::Restrict,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "GO" => Token::Go,
            _ => Token::Ident(s),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, SqlParseError> {
        let Some(c) = self.current() else {
            return Ok(None);
        };

        let token = match c {
            '-' if self.peek_next() == Some('-') => {
                self.skip_line_comment();
                return Ok(None);
            }
            '-' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => {
                return Ok(Some(Token::Num(self.read_number())));
            }
            '/' if self.peek_next() == Some('*') => {
                self.skip_block_comment();
                return Ok(None);
            }
            // `#tmp` is a temp table name, `# text` a comment.
            '#' if !self.peek_next().is_some_and(|n| n.is_alphanumeric() || n == '_' || n == '#') => {
                self.skip_line_comment();
                return Ok(None);
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => Token::Dot,
            '"' => return self.read_delimited('"', "quoted identifier").map(|s| Some(Token::Quoted(s))),
            '`' => return self.read_delimited('`', "quoted identifier").map(|s| Some(Token::Quoted(s))),
            '[' => return self.read_delimited(']', "bracketed identifier").map(|s| Some(Token::Quoted(s))),
            '\'' => return self.read_delimited('\'', "string literal").map(|s| Some(Token::Str(s))),
            '$' => {
                return match self.dollar_delimiter() {
                    Some(delimiter) => self.read_dollar_quoted(delimiter).map(|s| Some(Token::Str(s))),
                    None => {
                        self.advance();
                        Ok(None)
                    }
                };
            }
            c if c.is_ascii_digit() => return Ok(Some(Token::Num(self.read_number()))),
            c if c.is_alphabetic() || c == '_' || c == '@' || c == '#' => {
                let word = self.read_while(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$'));
                return Ok(Some(Self::keyword_or_ident(word)));
            }
            _ => {
                // Operators and anything else carry no meaning for DDL extraction.
                self.advance();
                return Ok(None);
            }
        };

        self.advance();
        Ok(Some(token))
    }

    /// All tokens with spans, terminated by `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, SqlParseError> {
        let mut tokens = Vec::new();
        loop {
            while self.current().is_some_and(char::is_whitespace) {
                self.advance();
            }
            let start = self.offset();
            if self.current().is_none() {
                tokens.push(Spanned {
                    token: Token::Eof,
                    start,
                    end: start,
                });
                return Ok(tokens);
            }
            if let Some(token) = self.next_token()? {
                let end = self.offset();
                tokens.push(Spanned { token, start, end });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql)
            .tokenize()
            .map(|t| t.into_iter().map(|s| s.token).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_simple_create_table() {
        assert_eq!(
            tokens("CREATE TABLE users (id INT);"),
            vec![
                Token::Create,
                Token::Table,
                Token::Ident("users".to_string()),
                Token::LParen,
                Token::Ident("id".to_string()),
                Token::Ident("INT".to_string()),
                Token::RParen,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers_are_never_keywords() {
        let toks = tokens(r#"CREATE TABLE [dbo].[Table] ("Key" INT, `my col` INT)"#);

        assert_eq!(toks[2], Token::Quoted("dbo".to_string()));
        assert_eq!(toks[4], Token::Quoted("Table".to_string()));
        assert_eq!(toks[6], Token::Quoted("Key".to_string()));
        assert_eq!(toks[9], Token::Quoted("my col".to_string()));
    }

    #[test]
    fn test_comments_and_batches() {
        let toks = tokens("-- header\nCREATE /* x */ PROC p AS SELECT 1\nGO\n# mysql\n");

        assert_eq!(toks[0], Token::Create);
        assert_eq!(toks[1], Token::Procedure);
        assert!(toks.contains(&Token::Go));
    }

    #[test]
    fn test_spans_slice_source() {
        let sql = "price DECIMAL(18, 2) DEFAULT 'n''a'";
        let spanned = Lexer::new(sql).tokenize().unwrap_or_default();

        let default = &spanned[spanned.len() - 2];
        assert_eq!(default.token, Token::Str("n'a".to_string()));
        assert_eq!(&sql[default.start..default.end], "'n''a'");
        assert_eq!(&sql[spanned[1].start..spanned[6].end], "DECIMAL(18, 2)");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("CREATE TABLE t (\n a INT DEFAULT 'oops)").tokenize();
        assert!(matches!(
            err,
            Err(SqlParseError::Unterminated { what: "string literal", line: 2 })
        ));
    }

    #[test]
    fn test_variables_and_temp_tables() {
        let toks = tokens("EXEC sp_executesql @sql; SELECT * FROM #tmp");
        assert!(toks.contains(&Token::Ident("@sql".to_string())));
        assert!(toks.contains(&Token::Ident("#tmp".to_string())));
    }

    #[test]
    fn test_dollar_quoted_body_is_one_token() {
        let toks = tokens("AS $body$ SELECT 'x'; $$ $body$ LANGUAGE sql; SELECT $1");

        assert_eq!(toks[1], Token::Str(" SELECT 'x'; $$ ".to_string()));
        assert_eq!(toks[2], Token::Ident("LANGUAGE".to_string()));
        assert_eq!(toks[4], Token::Semicolon);
        // positional parameter, not a delimiter
        assert_eq!(toks[6], Token::Num("1".to_string()));
    }

    #[test]
    fn test_unterminated_dollar_quote() {
        let err = Lexer::new("CREATE FUNCTION f() AS $$\nBEGIN").tokenize();
        assert!(matches!(
            err,
            Err(SqlParseError::Unterminated { what: "dollar-quoted string", line: 1 })
        ));
    }

    #[test]
    fn test_keyword_detection() {
        assert!(Token::Key.is_keyword());
        assert!(Token::Go.is_keyword());
        assert!(!Token::Quoted("key".to_string()).is_keyword());
        assert!(!Token::Comma.is_keyword());
    }
}
