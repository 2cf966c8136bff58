//! Recursive-descent parser for `CREATE TABLE ... LIKE` statements.
//!
//! The grammar covers the parts of a table definition that a LIKE clause
//! can inherit:
//!
//! ```text
//! CREATE TABLE [IF NOT EXISTS] name
//!   [ ( element [, element]* ) ]
//!   [ DISTRIBUTED BY [HASH | RANGE] (cols) [INTO n BUCKETS] | DISTRIBUTED INTO n BUCKETS ]
//!   [ PARTITIONED BY (cols) ]
//!   [ WITH ('key' = 'value' [, ...]) ]
//!   [ LIKE source [ ( {INCLUDING | EXCLUDING | OVERWRITING} feature ... ) ] ]
//! ```
//!
//! Data types and expressions are kept verbatim as written in the source
//! text. Keywords are case-insensitive.

use std::collections::BTreeMap;

use table_like_core::{
    ColumnDefinition, ConstraintKind, DistributionKind, DistributionSpec, Feature,
    GeneratedColumn, LikeClause, LikeOption, MergeStrategy, ObjectIdentifier, TableConstraint,
    TableSchema, WatermarkSpec,
};
use tracing::debug;

use crate::ast::{CreateTableStatement, TableBody};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Words that must be back-quoted to be used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "ALL",
    "AS",
    "BY",
    "CONSTRAINT",
    "CREATE",
    "DISTRIBUTED",
    "EXCLUDING",
    "INCLUDING",
    "LIKE",
    "NOT",
    "NULL",
    "OVERWRITING",
    "PARTITIONED",
    "PRIMARY",
    "TABLE",
    "UNIQUE",
    "WATERMARK",
    "WITH",
];

const IDENTIFIER_EXPECTED: &[&str] = &["<BACK_QUOTED_IDENTIFIER>", "<IDENTIFIER>"];

const STRATEGY_EXPECTED: &[&str] = &["\"EXCLUDING\"", "\"INCLUDING\"", "\"OVERWRITING\""];

const FEATURE_EXPECTED: &[&str] = &[
    "\"ALL\"",
    "\"CONSTRAINTS\"",
    "\"DISTRIBUTION\"",
    "\"GENERATED\"",
    "\"OPTIONS\"",
    "\"PARTITIONS\"",
    "\"WATERMARKS\"",
];

/// Clauses that may follow the table body, in the order they must appear.
const TRAILING_CLAUSES: [&str; 4] = ["DISTRIBUTED", "PARTITIONED", "WITH", "LIKE"];

/// Returns `true` if `word` is reserved, ignoring ASCII case.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|r| r.eq_ignore_ascii_case(word))
}

/// Parses exactly one `CREATE TABLE` statement, optionally followed by `;`.
///
/// # Examples
///
/// ```
/// use table_like_parser::parse_statement;
///
/// let statement = parse_statement("CREATE TABLE t (a STRING) LIKE b").unwrap();
/// let clause = statement.like_clause().unwrap();
/// assert_eq!(clause.source_table().names(), ["b"]);
/// assert!(clause.options().is_empty());
/// ```
pub fn parse_statement(sql: &str) -> Result<CreateTableStatement, ParseError> {
    let mut parser = DdlParser::new(sql)?;
    let statement = parser.parse_create_table()?;
    parser.eat_symbol(';');
    if !parser.peek().is_eof() {
        return Err(parser.unexpected(&["<EOF>"]));
    }
    Ok(statement)
}

/// Parses a `;`-separated script of `CREATE TABLE` statements.
///
/// # Examples
///
/// ```
/// use table_like_parser::parse_script;
///
/// let statements = parse_script(
///     "CREATE TABLE a (x INT);\nCREATE TABLE b (y INT) LIKE a (EXCLUDING ALL);",
/// )
/// .unwrap();
/// assert_eq!(statements.len(), 2);
/// assert!(statements[1].like_clause().is_some());
/// ```
pub fn parse_script(sql: &str) -> Result<Vec<CreateTableStatement>, ParseError> {
    let mut parser = DdlParser::new(sql)?;
    let mut statements = Vec::new();

    loop {
        while parser.eat_symbol(';') {}
        if parser.peek().is_eof() {
            break;
        }
        statements.push(parser.parse_create_table()?);
        if !parser.eat_symbol(';') && !parser.peek().is_eof() {
            return Err(parser.unexpected(&["\";\""]));
        }
    }

    Ok(statements)
}

/// Token-stream parser over one source text.
pub struct DdlParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> DdlParser<'a> {
    /// Tokenizes `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Lexical`] for unterminated literals or comments.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    /// Parses one `CREATE TABLE` statement up to, not including, its
    /// terminator.
    pub fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let if_not_exists = if self.eat_keyword("IF") {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };
        let name = self.parse_object_name()?;

        let mut schema = TableSchema::new();
        let has_body = self.peek().is_symbol('(');
        if has_body {
            self.parse_table_elements(&mut schema)?;
        }

        let mut next_clause = 0;
        if self.peek().is_keyword("DISTRIBUTED") {
            schema.distribution = Some(self.parse_distribution()?);
            next_clause = 1;
        }
        if self.eat_keyword("PARTITIONED") {
            self.expect_keyword("BY")?;
            schema.partition_keys = self.parse_column_list()?;
            next_clause = 2;
        }
        if self.peek().is_keyword("WITH") {
            schema.options = self.parse_with_options()?;
            next_clause = 3;
        }
        let body = if self.peek().is_keyword("LIKE") {
            next_clause = 4;
            TableBody::Like(self.parse_like(schema)?)
        } else {
            TableBody::Plain(schema)
        };

        if !self.peek().is_symbol(';') && !self.peek().is_eof() {
            let mut expected: Vec<String> = Vec::new();
            if !has_body && next_clause == 0 {
                expected.push("\"(\"".to_string());
            }
            expected.extend(TRAILING_CLAUSES[next_clause..].iter().map(|c| format!("\"{c}\"")));
            expected.push("\";\"".to_string());
            expected.push("<EOF>".to_string());
            let token = self.peek();
            return Err(ParseError::Unexpected {
                found: token.image(),
                line: token.line,
                column: token.column,
                expected,
            });
        }

        let statement = CreateTableStatement {
            name,
            if_not_exists,
            body,
        };
        debug!(
            table = %statement.name,
            like = statement.like_clause().is_some(),
            "Parsed CREATE TABLE statement"
        );
        Ok(statement)
    }

    fn parse_table_elements(&mut self, schema: &mut TableSchema) -> Result<(), ParseError> {
        self.expect_symbol('(')?;
        loop {
            self.parse_table_element(schema)?;
            if self.eat_symbol(',') {
                continue;
            }
            if self.eat_symbol(')') {
                return Ok(());
            }
            return Err(self.unexpected(&["\",\"", "\")\""]));
        }
    }

    fn parse_table_element(&mut self, schema: &mut TableSchema) -> Result<(), ParseError> {
        let start = self.peek().clone();

        if start.is_keyword("WATERMARK") {
            self.advance();
            self.expect_keyword("FOR")?;
            let column = self.parse_identifier()?;
            self.expect_keyword("AS")?;
            let expression = self.capture(&[], false, "<EXPRESSION>")?;
            if schema.watermarks.iter().any(|w| w.rowtime_column == column) {
                return Err(invalid(
                    &start,
                    format!("Multiple watermark definitions for column '{column}'"),
                ));
            }
            schema.watermarks.push(WatermarkSpec::new(column, expression));
            return Ok(());
        }

        if start.is_keyword("CONSTRAINT") || start.is_keyword("PRIMARY") || start.is_keyword("UNIQUE")
        {
            let constraint = self.parse_table_constraint()?;
            return add_constraint(schema, constraint, &start);
        }

        let name = match self.parse_identifier() {
            Ok(name) => name,
            Err(_) => {
                return Err(self.unexpected(&[
                    "\"CONSTRAINT\"",
                    "\"PRIMARY\"",
                    "\"UNIQUE\"",
                    "\"WATERMARK\"",
                    "<BACK_QUOTED_IDENTIFIER>",
                    "<IDENTIFIER>",
                ]));
            }
        };
        if schema.find_column(&name).is_some() || schema.find_generated(&name).is_some() {
            return Err(invalid(&start, format!("Duplicate column name '{name}'")));
        }

        if self.eat_keyword("AS") {
            let expression = self.capture(&["COMMENT"], false, "<EXPRESSION>")?;
            let mut column = GeneratedColumn::new(name, expression);
            column.comment = self.parse_comment()?;
            schema.generated.push(column);
            return Ok(());
        }

        let data_type = self.capture(&["NOT", "NULL", "PRIMARY", "COMMENT"], true, "<DATA_TYPE>")?;
        let mut column = ColumnDefinition::new(name.clone(), data_type);
        loop {
            if self.eat_keyword("NOT") {
                self.expect_keyword("NULL")?;
                column.nullable = false;
            } else if self.eat_keyword("NULL") {
                column.nullable = true;
            } else if self.peek().is_keyword("PRIMARY") {
                let at = self.advance();
                self.expect_keyword("KEY")?;
                let enforced = self.parse_enforcement()?;
                let constraint = TableConstraint {
                    enforced,
                    ..TableConstraint::primary_key([name.clone()])
                };
                add_constraint(schema, constraint, &at)?;
                column.nullable = false;
            } else if self.peek().is_keyword("COMMENT") {
                column.comment = self.parse_comment()?;
            } else {
                break;
            }
        }
        schema.columns.push(column);
        Ok(())
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        let name = if self.eat_keyword("CONSTRAINT") {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let kind = if self.eat_keyword("PRIMARY") {
            self.expect_keyword("KEY")?;
            ConstraintKind::PrimaryKey
        } else if self.eat_keyword("UNIQUE") {
            ConstraintKind::Unique
        } else {
            return Err(self.unexpected(&["\"PRIMARY\"", "\"UNIQUE\""]));
        };
        let columns = self.parse_column_list()?;
        let enforced = self.parse_enforcement()?;
        Ok(TableConstraint {
            name,
            kind,
            columns,
            enforced,
        })
    }

    /// `NOT ENFORCED` or `ENFORCED`; absent means not enforced.
    fn parse_enforcement(&mut self) -> Result<bool, ParseError> {
        if self.eat_keyword("NOT") {
            self.expect_keyword("ENFORCED")?;
            Ok(false)
        } else {
            Ok(self.eat_keyword("ENFORCED"))
        }
    }

    fn parse_distribution(&mut self) -> Result<DistributionSpec, ParseError> {
        self.expect_keyword("DISTRIBUTED")?;
        let mut spec = DistributionSpec {
            kind: DistributionKind::Unspecified,
            keys: Vec::new(),
            buckets: None,
        };

        if self.eat_keyword("BY") {
            if self.eat_keyword("HASH") {
                spec.kind = DistributionKind::Hash;
            } else if self.eat_keyword("RANGE") {
                spec.kind = DistributionKind::Range;
            }
            spec.keys = self.parse_column_list()?;
            if self.eat_keyword("INTO") {
                spec.buckets = Some(self.parse_bucket_count()?);
            }
        } else if self.eat_keyword("INTO") {
            spec.buckets = Some(self.parse_bucket_count()?);
        } else {
            return Err(self.unexpected(&["\"BY\"", "\"INTO\""]));
        }

        Ok(spec)
    }

    fn parse_bucket_count(&mut self) -> Result<u32, ParseError> {
        let token = self.peek().clone();
        let TokenKind::Number(raw) = &token.kind else {
            return Err(self.unexpected(&["<UNSIGNED_INTEGER_LITERAL>"]));
        };
        let buckets = raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| invalid(&token, format!("Invalid bucket count '{raw}'")))?;
        self.advance();
        self.expect_keyword("BUCKETS")?;
        Ok(buckets)
    }

    fn parse_with_options(&mut self) -> Result<BTreeMap<String, String>, ParseError> {
        self.expect_keyword("WITH")?;
        self.expect_symbol('(')?;
        let mut options = BTreeMap::new();
        if self.eat_symbol(')') {
            return Ok(options);
        }

        loop {
            let key_token = self.peek().clone();
            let key = self.parse_string_literal()?;
            self.expect_symbol('=')?;
            let value = self.parse_string_literal()?;
            if options.insert(key.clone(), value).is_some() {
                return Err(invalid(&key_token, format!("Duplicate option key '{key}'")));
            }
            if self.eat_symbol(',') {
                continue;
            }
            if self.eat_symbol(')') {
                return Ok(options);
            }
            return Err(self.unexpected(&["\",\"", "\")\""]));
        }
    }

    fn parse_like(&mut self, local: TableSchema) -> Result<LikeClause, ParseError> {
        let like = self.expect_keyword("LIKE")?;
        let source = self.parse_object_name()?;

        let mut options = Vec::new();
        if self.eat_symbol('(') {
            options.push(self.parse_like_option(STRATEGY_EXPECTED)?);
            while !self.eat_symbol(')') {
                let mut expected = vec!["\")\""];
                expected.extend_from_slice(STRATEGY_EXPECTED);
                options.push(self.parse_like_option(&expected)?);
            }
        }

        LikeClause::new(source, options, local).map_err(|err| invalid(&like, err.to_string()))
    }

    fn parse_like_option(&mut self, expected: &[&str]) -> Result<LikeOption, ParseError> {
        let strategy = match &self.peek().kind {
            TokenKind::Word(word) => word.parse::<MergeStrategy>().ok(),
            _ => None,
        };
        let Some(strategy) = strategy else {
            return Err(self.unexpected(expected));
        };
        self.advance();

        let feature = match &self.peek().kind {
            TokenKind::Word(word) => word.parse::<Feature>().ok(),
            _ => None,
        };
        let Some(feature) = feature else {
            return Err(self.unexpected(FEATURE_EXPECTED));
        };
        self.advance();

        Ok(LikeOption::new(strategy, feature))
    }

    fn parse_comment(&mut self) -> Result<Option<String>, ParseError> {
        if self.eat_keyword("COMMENT") {
            Ok(Some(self.parse_string_literal()?))
        } else {
            Ok(None)
        }
    }

    fn parse_object_name(&mut self) -> Result<ObjectIdentifier, ParseError> {
        let mut names = vec![self.parse_identifier()?];
        while self.eat_symbol('.') {
            names.push(self.parse_identifier()?);
        }
        Ok(ObjectIdentifier::new(names))
    }

    fn parse_column_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_symbol('(')?;
        let mut columns = vec![self.parse_identifier()?];
        loop {
            if self.eat_symbol(',') {
                columns.push(self.parse_identifier()?);
            } else if self.eat_symbol(')') {
                return Ok(columns);
            } else {
                return Err(self.unexpected(&["\",\"", "\")\""]));
            }
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let name = match &self.peek().kind {
            TokenKind::QuotedIdent(name) => name.clone(),
            TokenKind::Word(word) if !is_reserved_word(word) => word.clone(),
            _ => return Err(self.unexpected(IDENTIFIER_EXPECTED)),
        };
        self.advance();
        Ok(name)
    }

    fn parse_string_literal(&mut self) -> Result<String, ParseError> {
        let value = match &self.peek().kind {
            TokenKind::String(value) => value.clone(),
            _ => return Err(self.unexpected(&["<STRING_LITERAL>"])),
        };
        self.advance();
        Ok(value)
    }

    /// Captures source text up to a depth-0 `,` or `)`, a `;`, the end of
    /// input, or one of `stop_keywords` at depth 0. Angle brackets count
    /// towards depth only when `track_angles` is set (data types such as
    /// `ROW<a INT, b STRING>`).
    fn capture(
        &mut self,
        stop_keywords: &[&str],
        track_angles: bool,
        what: &str,
    ) -> Result<String, ParseError> {
        let start = self.peek().start;
        let mut depth = 0usize;
        let mut angles = 0usize;
        let mut end = None;

        loop {
            let token = self.peek();
            if token.is_eof() || token.is_symbol(';') {
                break;
            }
            if depth == 0 && angles == 0 {
                let at_stop = token.is_symbol(',')
                    || token.is_symbol(')')
                    || stop_keywords.iter().any(|kw| token.is_keyword(kw));
                if at_stop {
                    break;
                }
            }
            match token.kind {
                TokenKind::Symbol('(' | '[') => depth += 1,
                TokenKind::Symbol(')' | ']') => depth = depth.saturating_sub(1),
                TokenKind::Symbol('<') if track_angles => angles += 1,
                TokenKind::Symbol('>') if track_angles => angles = angles.saturating_sub(1),
                _ => {}
            }
            end = Some(token.end);
            self.advance();
        }

        match end {
            Some(end) => Ok(self.source[start..end].trim().to_string()),
            None => Err(self.unexpected(&[what])),
        }
    }

    fn peek(&self) -> &Token {
        // the token stream always ends with Eof and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<Token, ParseError> {
        if self.peek().is_keyword(keyword) {
            Ok(self.advance())
        } else {
            let expected = format!("\"{keyword}\"");
            Err(self.unexpected(&[expected.as_str()]))
        }
    }

    fn eat_symbol(&mut self, symbol: char) -> bool {
        if self.peek().is_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<Token, ParseError> {
        if self.peek().is_symbol(symbol) {
            Ok(self.advance())
        } else {
            let expected = format!("\"{symbol}\"");
            Err(self.unexpected(&[expected.as_str()]))
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParseError {
        let token = self.peek();
        ParseError::Unexpected {
            found: token.image(),
            line: token.line,
            column: token.column,
            expected: expected.iter().map(|e| e.to_string()).collect(),
        }
    }
}

fn invalid(at: &Token, message: String) -> ParseError {
    ParseError::Invalid {
        message,
        line: at.line,
        column: at.column,
    }
}

fn add_constraint(
    schema: &mut TableSchema,
    constraint: TableConstraint,
    at: &Token,
) -> Result<(), ParseError> {
    if constraint.kind == ConstraintKind::PrimaryKey && schema.primary_key().is_some() {
        return Err(invalid(at, "Duplicate primary key definition".to_string()));
    }
    schema.constraints.push(constraint);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keeps_nested_type_text() {
        let statement =
            parse_statement("CREATE TABLE t (r ROW<a INT, b DECIMAL(10, 2)> NOT NULL, c STRING)")
                .unwrap();
        let schema = statement.local_schema();
        assert_eq!(schema.columns[0].data_type, "ROW<a INT, b DECIMAL(10, 2)>");
        assert!(!schema.columns[0].nullable);
        assert_eq!(schema.columns[1].data_type, "STRING");
    }

    #[test]
    fn test_expression_capture_stops_at_comment() {
        let statement =
            parse_statement("CREATE TABLE t (a INT, b AS a * (2 + 1) COMMENT 'doubled')").unwrap();
        let generated = &statement.local_schema().generated[0];
        assert_eq!(generated.expression, "a * (2 + 1)");
        assert_eq!(generated.comment.as_deref(), Some("doubled"));
    }

    #[test]
    fn test_reserved_words_need_quotes() {
        assert!(parse_statement("CREATE TABLE t (`like` INT)").is_ok());
        assert!(parse_statement("CREATE TABLE t (like INT)").is_err());
        assert!(is_reserved_word("watermark"));
        assert!(!is_reserved_word("options"));
    }

    #[test]
    fn test_missing_type_is_reported() {
        let err = parse_statement("CREATE TABLE t (a)").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unexpected {
                found: ")".to_string(),
                line: 1,
                column: 18,
                expected: vec!["<DATA_TYPE>".to_string()],
            }
        );
    }
}
