//! Java source parsing, limited to declaration shapes.
//!
//! Two strict grammar levels follow the language revisions the platform
//! sources were written for. Newer sources occasionally still use `sealed` or
//! `permits` as plain names, so a file rejected by its primary level is
//! retried once under [`LanguageLevel::Permissive`].

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::version::ApiLevel;
use ast::CompilationUnit;
use thiserror::Error;

/// First API level whose sources are written against the Java 17 grammar.
const JAVA_17_API_LEVEL: ApiLevel = ApiLevel::new(34);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageLevel {
    /// No records, `sealed` and `permits` are ordinary identifiers.
    Java11,
    /// Records and sealed hierarchies; `sealed` and `permits` may not name members.
    Java17,
    /// Records and sealed modifiers recognized from context, every word usable as a name.
    Permissive,
}

impl LanguageLevel {
    pub fn for_api_level(level: ApiLevel) -> Self {
        if level >= JAVA_17_API_LEVEL {
            LanguageLevel::Java17
        } else {
            LanguageLevel::Java11
        }
    }

    pub(crate) fn allows_records(self) -> bool {
        !matches!(self, LanguageLevel::Java11)
    }

    pub(crate) fn allows_sealed(self) -> bool {
        !matches!(self, LanguageLevel::Java11)
    }

    pub(crate) fn restricts_identifiers(self) -> bool {
        matches!(self, LanguageLevel::Java17)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn at(src: &str, offset: usize, message: impl Into<String>) -> Self {
        let before = &src[..offset.min(src.len())];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
            message: message.into(),
        }
    }
}

/// Parse `src` under a single grammar level.
pub fn parse(src: &str, level: LanguageLevel) -> Result<CompilationUnit, ParseError> {
    let tokens = lexer::tokenize(src)?;
    parser::Parser::new(src, tokens, level).compilation_unit()
}

/// Parse under `primary`, retrying once with the permissive level on failure.
pub fn parse_with_fallback(src: &str, primary: LanguageLevel) -> Result<CompilationUnit, ParseError> {
    match parse(src, primary) {
        Ok(unit) => Ok(unit),
        Err(err) if primary != LanguageLevel::Permissive => {
            tracing::warn!(level = ?primary, error = %err, "parse failed, retrying with permissive grammar");
            parse(src, LanguageLevel::Permissive)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::Member;

    #[test]
    fn primary_level_follows_api_level() {
        assert_eq!(LanguageLevel::for_api_level(ApiLevel::new(33)), LanguageLevel::Java11);
        assert_eq!(LanguageLevel::for_api_level(ApiLevel::new(34)), LanguageLevel::Java17);
        assert_eq!(LanguageLevel::for_api_level(ApiLevel::new(40)), LanguageLevel::Java17);
    }

    #[test]
    fn error_position_is_one_based() {
        let err = ParseError::at("ab\ncd", 4, "boom");
        assert_eq!((err.line, err.column), (2, 2));
        assert_eq!(err.to_string(), "2:2: boom");
    }

    #[test]
    fn restricted_name_falls_back_to_permissive() {
        let src = "class Parcel { void seal(boolean sealed) {} }";
        assert!(parse(src, LanguageLevel::Java17).is_err());

        let unit = parse_with_fallback(src, LanguageLevel::Java17).unwrap();
        assert!(matches!(&unit.types[0].members[0], Member::Method(m) if m.name == "seal"));
    }

    #[test]
    fn sealed_interface_needs_newer_grammar() {
        let src = "sealed interface Shape permits Circle {}";
        assert!(parse(src, LanguageLevel::Java11).is_err());
        let unit = parse_with_fallback(src, LanguageLevel::Java11).unwrap();
        assert_eq!(unit.types[0].name, "Shape");
    }

    #[test]
    fn both_levels_failing_is_an_error() {
        assert!(parse_with_fallback("class {", LanguageLevel::Java17).is_err());
    }
}
