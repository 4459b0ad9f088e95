//! DDL extraction: tables, keys and routine definitions out of a SQL script.
//!
//! This is not a SQL parser in the semantic sense. It walks the token stream
//! looking for `CREATE` and `ALTER` statements and skips everything else.

use super::lexer::{Lexer, Spanned, Token, line_of};
use crate::graph::ObjectKind;
use crate::schema::{ColumnInfo, ForeignKey, Schema, TableInfo};
use crate::types;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq)]
pub enum SqlParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
        line: usize,
    },
    #[error("unexpected end of input in {0}")]
    UnexpectedEof(&'static str),
    #[error("line {line}: unterminated {what}")]
    Unterminated { what: &'static str, line: usize },
}

type Result<T> = std::result::Result<T, SqlParseError>;

/// Table-level constraint, either inline in `CREATE TABLE` or added later
/// by `ALTER TABLE`.
#[derive(Debug)]
enum Constraint {
    PrimaryKey(Vec<String>),
    ForeignKey(ForeignKey),
    Default { column: String, expression: String },
}

pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    /// Script separates its batches with `GO`.
    batched: bool,
    tables: BTreeMap<String, TableInfo>,
    routines: BTreeMap<ObjectKind, BTreeMap<String, String>>,
    altered: Vec<(String, Constraint)>,
}

/// Extract a schema from a DDL script.
pub fn parse_ddl(input: &str) -> Result<Schema> {
    Parser::new(input)?.parse()
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(s) | Token::Quoted(s) => format!("`{}`", s),
        Token::Str(_) => "string literal".to_string(),
        Token::Num(n) => n.clone(),
        Token::LParen => "`(`".to_string(),
        Token::RParen => "`)`".to_string(),
        Token::Comma => "`,`".to_string(),
        Token::Semicolon => "`;`".to_string(),
        Token::Dot => "`.`".to_string(),
        Token::Eof => "end of input".to_string(),
        keyword => format!("{:?}", keyword).to_uppercase(),
    }
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        let batched = tokens.iter().any(|t| t.token == Token::Go);
        Ok(Self {
            input,
            tokens,
            pos: 0,
            batched,
            tables: BTreeMap::new(),
            routines: BTreeMap::new(),
            altered: Vec::new(),
        })
    }

    fn spanned(&self) -> &Spanned {
        // `tokenize` always ends the stream with `Eof`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current(&self) -> &Token {
        &self.spanned().token
    }

    fn peek(&self) -> &Token {
        self.token_at(1)
    }

    fn token_at(&self, ahead: usize) -> &Token {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].token
    }

    /// Source text of the current token, as written.
    fn current_text(&self) -> String {
        let spanned = self.spanned();
        self.input[spanned.start..spanned.end].to_string()
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// End offset of the last consumed token.
    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .map_or(0, |prev| self.tokens[prev].end)
    }

    fn unexpected(&self, expected: &'static str) -> SqlParseError {
        match self.current() {
            Token::Eof => SqlParseError::UnexpectedEof(expected),
            token => SqlParseError::Expected {
                expected,
                found: describe(token),
                line: line_of(self.input, self.spanned().start),
            },
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<()> {
        if *self.current() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String> {
        match self.current().ident() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(self.unexpected(expected)),
        }
    }

    /// `a.b.c` resolves to `c`.
    fn parse_qualified_name(&mut self, expected: &'static str) -> Result<String> {
        let mut name = self.expect_ident(expected)?;
        while *self.current() == Token::Dot {
            self.advance();
            name = self.expect_ident(expected)?;
        }
        Ok(name)
    }

    pub fn parse(mut self) -> Result<Schema> {
        loop {
            match self.current() {
                Token::Eof => break,
                Token::Create => self.parse_create()?,
                Token::Alter => self.parse_alter()?,
                _ => self.advance(),
            }
        }
        Ok(self.finish())
    }

    fn parse_create(&mut self) -> Result<()> {
        let start = self.spanned().start;
        self.advance(); // CREATE

        if *self.current() == Token::Or {
            self.advance();
            if matches!(self.current(), Token::Alter | Token::Replace) {
                self.advance();
            }
        }

        match self.current() {
            Token::Table => self.parse_create_table(),
            Token::View => self.parse_routine(ObjectKind::View, start),
            Token::Procedure => self.parse_routine(ObjectKind::Procedure, start),
            Token::Function => self.parse_routine(ObjectKind::Function, start),
            _ => {
                self.skip_statement();
                Ok(())
            }
        }
    }

    fn parse_create_table(&mut self) -> Result<()> {
        self.advance(); // TABLE

        if *self.current() == Token::If {
            self.advance();
            self.expect(Token::Not, "NOT")?;
            self.expect(Token::Exists, "EXISTS")?;
        }

        let name = self.parse_qualified_name("table name")?;
        self.expect(Token::LParen, "`(` after table name")?;

        let mut table = TableInfo::default();
        self.parse_table_body(&mut table)?;
        self.skip_statement();

        debug!(table = %name, columns = table.columns.len(), "parsed table");
        self.tables.insert(name, table);
        Ok(())
    }

    fn parse_table_body(&mut self, table: &mut TableInfo) -> Result<()> {
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    return Ok(());
                }
                Token::Eof => return Err(SqlParseError::UnexpectedEof("table body")),
                Token::Comma => self.advance(),
                _ if self.at_keyword_column() => {
                    let name = self.current_text();
                    self.advance();
                    self.parse_column(table, name)?;
                }
                Token::Constraint => {
                    self.advance();
                    let name = self.current().ident().map(str::to_string);
                    if name.is_some() {
                        self.advance();
                    }
                    let constraint = self.parse_table_constraint(name)?;
                    apply_constraint(table, constraint);
                }
                Token::Primary | Token::Foreign | Token::Unique | Token::Check | Token::Key => {
                    let constraint = self.parse_table_constraint(None)?;
                    apply_constraint(table, constraint);
                }
                token if token.is_word("INDEX") || token.is_word("FULLTEXT") || token.is_word("SPATIAL") => {
                    self.skip_element()?;
                }
                token if token.ident().is_some() => {
                    let name = self.expect_ident("column name")?;
                    self.parse_column(table, name)?;
                }
                _ => self.skip_element()?,
            }
        }
    }

    /// An unquoted keyword used as a column name: `key VARCHAR(50)`,
    /// `default TEXT NOT NULL`. `KEY ix (a)` and `CHECK (..)` stay constraints.
    fn at_keyword_column(&self) -> bool {
        let token = self.current();
        if !token.is_keyword() || *token == Token::Constraint {
            return false;
        }
        let Some(type_name) = self.peek().ident() else {
            return false;
        };
        types::is_known_type(type_name)
            || matches!(
                self.token_at(2),
                Token::Comma | Token::RParen | Token::Not | Token::Null | Token::Default | Token::References
            )
    }

    fn parse_column(&mut self, table: &mut TableInfo, name: String) -> Result<()> {
        let data_type = self.parse_type()?;
        let mut column = ColumnInfo::new(name.clone(), data_type);
        let mut constraint_name = None;

        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Eof => break,
                Token::Not => {
                    self.advance();
                    if *self.current() == Token::Null {
                        column.nullable = false;
                        self.advance();
                    }
                }
                Token::Null => {
                    column.nullable = true;
                    self.advance();
                }
                Token::Primary => {
                    self.advance();
                    if *self.current() == Token::Key {
                        self.advance();
                    }
                    table.primary_keys.push(name.clone());
                }
                Token::Default => {
                    self.advance();
                    column.default = self.parse_default_expression()?;
                }
                Token::Constraint => {
                    self.advance();
                    constraint_name = self.current().ident().map(str::to_string);
                    if constraint_name.is_some() {
                        self.advance();
                    }
                }
                Token::References => {
                    self.advance();
                    let (referred_table, referred_columns) = self.parse_reference()?;
                    table.foreign_keys.push(ForeignKey {
                        constrained_columns: vec![name.clone()],
                        referred_table,
                        referred_columns,
                        name: constraint_name.take(),
                    });
                }
                Token::LParen => self.skip_parenthesized()?,
                _ => self.advance(),
            }
        }

        table.columns.push(column);
        Ok(())
    }

    /// Raw type text: base name, qualifier words and the size group.
    fn parse_type(&mut self) -> Result<String> {
        let Some(base) = self.current().ident() else {
            return Ok(String::new());
        };
        let mut text = base.to_string();
        self.advance();

        while ["PRECISION", "VARYING", "UNSIGNED"]
            .iter()
            .any(|word| self.current().is_word(word))
        {
            if let Some(word) = self.current().ident() {
                text.push(' ');
                text.push_str(word);
            }
            self.advance();
        }

        if *self.current() == Token::LParen {
            let start = self.spanned().start;
            self.skip_parenthesized()?;
            let size: String = self.input[start..self.previous_end()]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            text.push_str(&size);
        }
        Ok(text)
    }

    /// Source text of a `DEFAULT` expression.
    fn parse_default_expression(&mut self) -> Result<Option<String>> {
        let start = self.spanned().start;
        match self.current() {
            Token::Comma | Token::RParen | Token::Eof => return Ok(None),
            Token::LParen => self.skip_parenthesized()?,
            // N'unicode'
            token if token.is_word("N") && matches!(self.peek(), Token::Str(_)) => {
                self.advance();
                self.advance();
            }
            _ => {
                self.advance();
                if *self.current() == Token::LParen {
                    self.skip_parenthesized()?;
                }
            }
        }
        Ok(Some(self.input[start..self.previous_end()].to_string()))
    }

    /// After `REFERENCES`: target table and its optional column list.
    fn parse_reference(&mut self) -> Result<(String, Vec<String>)> {
        let table = self.parse_qualified_name("referenced table")?;
        let columns = if *self.current() == Token::LParen {
            self.parse_column_list()?
        } else {
            vec![]
        };
        self.skip_on_actions();
        Ok((table, columns))
    }

    /// A table-level constraint followed by whatever trails it up to the
    /// next element of the table body.
    fn parse_table_constraint(&mut self, name: Option<String>) -> Result<Option<Constraint>> {
        let constraint = self.parse_constraint(name)?;
        self.skip_element()?;
        Ok(constraint)
    }

    /// `(a, b DESC, c)`; only the leading identifier of each item counts.
    fn parse_column_list(&mut self) -> Result<Vec<String>> {
        self.expect(Token::LParen, "`(`")?;
        let mut columns = Vec::new();
        let mut at_item_start = true;
        let mut depth = 0usize;

        loop {
            match self.current() {
                Token::Eof => return Err(SqlParseError::UnexpectedEof("column list")),
                Token::RParen if depth == 0 => {
                    self.advance();
                    return Ok(columns);
                }
                Token::RParen => depth -= 1,
                Token::LParen => depth += 1,
                Token::Comma if depth == 0 => {
                    self.advance();
                    at_item_start = true;
                    continue;
                }
                token => {
                    if at_item_start && depth == 0 {
                        if let Some(name) = token.ident() {
                            columns.push(name.to_string());
                        } else if token.is_keyword() {
                            columns.push(self.current_text());
                        }
                    }
                }
            }
            at_item_start = false;
            self.advance();
        }
    }

    fn skip_on_actions(&mut self) {
        while *self.current() == Token::On && matches!(self.peek(), Token::Delete | Token::Update) {
            self.advance(); // ON
            self.advance(); // DELETE / UPDATE
            loop {
                match self.current() {
                    Token::Cascade | Token::Restrict | Token::Null | Token::Default => self.advance(),
                    token if token.is_word("SET") || token.is_word("NO") || token.is_word("ACTION") => {
                        self.advance()
                    }
                    _ => break,
                }
            }
        }
    }

    /// Consume a balanced `( ... )` group.
    fn skip_parenthesized(&mut self) -> Result<()> {
        self.expect(Token::LParen, "`(`")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.current() {
                Token::Eof => return Err(SqlParseError::UnexpectedEof("parenthesized group")),
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Skip to the next `,` or closing `)` of the enclosing table body.
    fn skip_element(&mut self) -> Result<()> {
        loop {
            match self.current() {
                Token::Comma | Token::RParen => return Ok(()),
                Token::Eof => return Err(SqlParseError::UnexpectedEof("table body")),
                Token::LParen => self.skip_parenthesized()?,
                _ => self.advance(),
            }
        }
    }

    /// Skip to the end of the current statement. A following `CREATE` or
    /// `ALTER` is left in place so scripts without terminators still parse.
    fn skip_statement(&mut self) {
        loop {
            match self.current() {
                Token::Semicolon | Token::Go => {
                    self.advance();
                    return;
                }
                Token::Eof | Token::Create | Token::Alter => return,
                _ => self.advance(),
            }
        }
    }

    fn parse_alter(&mut self) -> Result<()> {
        let start = self.spanned().start;
        self.advance(); // ALTER

        match self.current() {
            Token::Table => {}
            Token::View => return self.parse_routine(ObjectKind::View, start),
            Token::Procedure => return self.parse_routine(ObjectKind::Procedure, start),
            Token::Function => return self.parse_routine(ObjectKind::Function, start),
            _ => {
                self.skip_statement();
                return Ok(());
            }
        }
        self.advance(); // TABLE

        let table = self.parse_qualified_name("table name")?;

        // WITH CHECK / WITH NOCHECK
        if *self.current() == Token::With {
            self.advance();
            self.advance();
        }

        if *self.current() == Token::Add {
            self.advance();
            let mut name = None;
            if *self.current() == Token::Constraint {
                self.advance();
                name = Some(self.expect_ident("constraint name")?);
            }
            if matches!(self.current(), Token::Primary | Token::Foreign | Token::Default) {
                let constraint = self.parse_constraint(name)?;
                if let Some(constraint) = constraint {
                    self.altered.push((table, constraint));
                }
            }
        }

        self.skip_statement();
        Ok(())
    }

    /// `PRIMARY KEY (..)`, `FOREIGN KEY (..) REFERENCES ..` or
    /// `DEFAULT expr FOR column`; anything else yields `None`.
    fn parse_constraint(&mut self, name: Option<String>) -> Result<Option<Constraint>> {
        match self.current() {
            Token::Primary => {
                self.advance();
                self.expect(Token::Key, "KEY after PRIMARY")?;
                while self.current().ident().is_some() {
                    self.advance();
                }
                Ok(Some(Constraint::PrimaryKey(self.parse_column_list()?)))
            }
            Token::Foreign => {
                self.advance();
                self.expect(Token::Key, "KEY after FOREIGN")?;
                let constrained_columns = self.parse_column_list()?;
                self.expect(Token::References, "REFERENCES")?;
                let (referred_table, referred_columns) = self.parse_reference()?;
                Ok(Some(Constraint::ForeignKey(ForeignKey {
                    constrained_columns,
                    referred_table,
                    referred_columns,
                    name,
                })))
            }
            Token::Default => {
                self.advance();
                let expression = self.parse_default_expression()?;
                if !self.current().is_word("FOR") {
                    return Ok(None);
                }
                self.advance();
                let column = self.expect_ident("column after FOR")?;
                Ok(expression.map(|expression| Constraint::Default { column, expression }))
            }
            _ => Ok(None),
        }
    }

    /// Views, procedures and functions are kept as raw text, from `CREATE`
    /// (or `ALTER`) to the end of their batch. Without `GO` batches a
    /// procedure or function ends at its first `;` outside parentheses and
    /// `BEGIN`/`CASE` blocks; views always end at `;`.
    fn parse_routine(&mut self, kind: ObjectKind, start: usize) -> Result<()> {
        self.advance(); // VIEW / PROCEDURE / FUNCTION
        let name = self.parse_qualified_name("object name")?;

        let ends_at_semicolon = kind == ObjectKind::View || !self.batched;
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Eof | Token::Go => break,
                Token::Semicolon if ends_at_semicolon && depth == 0 => break,
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                token if token.is_word("BEGIN") || token.is_word("CASE") => depth += 1,
                token if token.is_word("END") => {
                    // END IF, END LOOP: closes a block that was never opened here.
                    let next = self.peek();
                    if *next == Token::If || ["LOOP", "WHILE", "REPEAT"].iter().any(|w| next.is_word(w)) {
                        self.advance();
                    } else {
                        depth = depth.saturating_sub(1);
                    }
                }
                _ => {}
            }
            self.advance();
        }

        let definition = self.input[start..self.spanned().start].trim_end().to_string();
        self.routines.entry(kind).or_default().insert(name, definition);
        Ok(())
    }

    fn finish(mut self) -> Schema {
        for (table_name, constraint) in std::mem::take(&mut self.altered) {
            match self.tables.get_mut(&table_name) {
                Some(table) => apply_constraint(table, Some(constraint)),
                None => warn!(table = %table_name, "ALTER TABLE on unknown table, constraint dropped"),
            }
        }

        let primary_keys: BTreeMap<String, Vec<String>> = self
            .tables
            .iter()
            .map(|(name, table)| (name.clone(), table.primary_keys.clone()))
            .collect();

        for (name, table) in self.tables.iter_mut() {
            for column in table.columns.iter_mut() {
                if table.primary_keys.contains(&column.name) {
                    column.nullable = false;
                }
            }

            table.foreign_keys.retain_mut(|fk| match primary_keys.get(&fk.referred_table) {
                Some(target_keys) => {
                    if fk.referred_columns.is_empty() {
                        fk.referred_columns = target_keys.clone();
                    }
                    true
                }
                None => {
                    warn!(
                        table = %name,
                        referred_table = %fk.referred_table,
                        "foreign key references unknown table, dropped"
                    );
                    false
                }
            });
        }

        let mut routines = self.routines;
        let mut schema = Schema::from_tables(self.tables);
        schema.views = routines.remove(&ObjectKind::View).unwrap_or_default();
        schema.stored_procedures = routines.remove(&ObjectKind::Procedure).unwrap_or_default();
        schema.functions = routines.remove(&ObjectKind::Function).unwrap_or_default();

        debug!(
            tables = schema.tables.len(),
            views = schema.views.len(),
            procedures = schema.stored_procedures.len(),
            functions = schema.functions.len(),
            relationships = schema.relationships.len(),
            "extracted schema from DDL"
        );
        schema
    }
}

fn apply_constraint(table: &mut TableInfo, constraint: Option<Constraint>) {
    match constraint {
        Some(Constraint::PrimaryKey(columns)) => table.primary_keys = columns,
        Some(Constraint::ForeignKey(fk)) => table.foreign_keys.push(fk),
        Some(Constraint::Default { column, expression }) => {
            if let Some(col) = table.columns.iter_mut().find(|c| c.name == column) {
                col.default = Some(expression);
            }
        }
        None => {}
    }
}
