//! Parser for the textual type annotations used in schema description files.
//!
//! Grammar (whitespace-insensitive):
//!
//! ```text
//! union := term ('|' term)*
//! term  := IDENT ('[' union (',' union)* ']')?
//! ```
//!
//! Names that are not built in are resolved through the caller's lookup, so
//! `RiskLevel` becomes an `EnumRef` or a `RecordRef` depending on what the
//! surrounding document declares.
use once_cell::sync::Lazy;
use regex::Regex;

use super::{NameKind, PrimitiveKind, TypeExpr};
use crate::error::SchemaError;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:([A-Za-z_][A-Za-z0-9_]*)|([\[\],|]))").expect("token pattern is valid")
});

/// Words the parser always reads as built-in types.
const BUILTIN_NAMES: &[&str] = &[
    "Any", "any", "None", "null", "NoneType", "bool", "int", "float", "str", "string", "list", "List",
    "Sequence", "dict", "Dict", "Mapping", "Optional", "Union",
];

/// True when `name` would be read as a built-in type, shadowing any schema
/// declared under it.
pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Open,
    Close,
    Comma,
    Pipe,
}

/// Parses `src` into a [`TypeExpr`], resolving user names with `resolve`.
pub fn parse_type_expr<F>(src: &str, resolve: F) -> Result<TypeExpr, SchemaError>
where
    F: Fn(&str) -> Option<NameKind>,
{
    let tokens = tokenize(src)?;
    let mut parser = Parser { src, tokens, pos: 0, resolve };
    let ty = parser.union()?;
    match parser.peek() {
        None => Ok(ty),
        Some(token) => Err(parser.fail(format!("unexpected {} after a complete type", describe(token)))),
    }
}

fn tokenize(src: &str) -> Result<Vec<Token<'_>>, SchemaError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    while !src[offset..].trim().is_empty() {
        let Some(caps) = TOKEN.captures(&src[offset..]) else {
            return Err(SchemaError::InvalidTypeExpr {
                input: src.to_string(),
                reason: format!("unexpected character at offset {}", offset + leading_space(&src[offset..])),
            });
        };
        let token = match (caps.get(1), caps.get(2).map(|m| m.as_str())) {
            (Some(ident), _) => Token::Ident(ident.as_str()),
            (None, Some("[")) => Token::Open,
            (None, Some("]")) => Token::Close,
            (None, Some(",")) => Token::Comma,
            _ => Token::Pipe,
        };
        tokens.push(token);
        offset += caps.get(0).map_or(0, |m| m.end());
    }
    Ok(tokens)
}

fn leading_space(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn describe(token: Token<'_>) -> String {
    match token {
        Token::Ident(name) => format!("`{name}`"),
        Token::Open => "`[`".to_string(),
        Token::Close => "`]`".to_string(),
        Token::Comma => "`,`".to_string(),
        Token::Pipe => "`|`".to_string(),
    }
}

struct Parser<'a, F> {
    src: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    resolve: F,
}

impl<'a, F> Parser<'a, F>
where
    F: Fn(&str) -> Option<NameKind>,
{
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn fail(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidTypeExpr { input: self.src.to_string(), reason: reason.into() }
    }

    fn union(&mut self) -> Result<TypeExpr, SchemaError> {
        let mut alternatives = vec![self.term()?];
        while self.peek() == Some(Token::Pipe) {
            self.bump();
            alternatives.push(self.term()?);
        }
        Ok(match alternatives.len() {
            1 => alternatives.remove(0),
            _ => TypeExpr::Union(alternatives),
        })
    }

    fn term(&mut self) -> Result<TypeExpr, SchemaError> {
        let name = match self.bump() {
            Some(Token::Ident(name)) => name,
            Some(token) => return Err(self.fail(format!("expected a type name, found {}", describe(token)))),
            None => return Err(self.fail("expected a type name, found end of input")),
        };
        let params = if self.peek() == Some(Token::Open) {
            self.bump();
            self.params()?
        } else {
            Vec::new()
        };
        self.build(name, params)
    }

    fn params(&mut self) -> Result<Vec<TypeExpr>, SchemaError> {
        let mut params = vec![self.union()?];
        loop {
            match self.bump() {
                Some(Token::Comma) => params.push(self.union()?),
                Some(Token::Close) => return Ok(params),
                Some(token) => return Err(self.fail(format!("expected `,` or `]`, found {}", describe(token)))),
                None => return Err(self.fail("unclosed `[`")),
            }
        }
    }

    fn build(&self, name: &str, mut params: Vec<TypeExpr>) -> Result<TypeExpr, SchemaError> {
        let count = params.len();
        let arity = |expected: &str| self.fail(format!("`{name}` takes {expected}, got {count}"));
        let scalar = |ty: TypeExpr| if count == 0 { Ok(ty) } else { Err(arity("no parameters")) };
        match name {
            "Any" | "any" => scalar(TypeExpr::Any),
            "None" | "null" | "NoneType" => scalar(TypeExpr::Null),
            "bool" => scalar(TypeExpr::Primitive(PrimitiveKind::Bool)),
            "int" => scalar(TypeExpr::Primitive(PrimitiveKind::Int)),
            "float" => scalar(TypeExpr::Primitive(PrimitiveKind::Float)),
            "str" | "string" => scalar(TypeExpr::Primitive(PrimitiveKind::String)),
            "list" | "List" | "Sequence" => match count {
                0 => Ok(TypeExpr::Sequence(None)),
                1 => Ok(TypeExpr::list_of(params.remove(0))),
                _ => Err(arity("at most one parameter")),
            },
            // a mapping with fewer than two known parameters is left unvalidated
            "dict" | "Dict" | "Mapping" => match count {
                0 | 1 => Ok(TypeExpr::Mapping(None)),
                2 => {
                    let value = params.remove(1);
                    Ok(TypeExpr::dict_of(params.remove(0), value))
                }
                _ => Err(arity("at most two parameters")),
            },
            "Optional" => match count {
                1 => Ok(TypeExpr::optional(params.remove(0))),
                _ => Err(arity("exactly one parameter")),
            },
            "Union" => match count {
                0 => Err(arity("at least one parameter")),
                _ => Ok(TypeExpr::Union(params)),
            },
            other => match (self.resolve)(other) {
                Some(_) if count > 0 => Err(arity("no parameters")),
                Some(NameKind::Enum) => Ok(TypeExpr::enum_ref(other)),
                Some(NameKind::Record) => Ok(TypeExpr::record(other)),
                None => Err(self.fail(format!("unknown type name `{other}`"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<NameKind> {
        match name {
            "RiskLevel" => Some(NameKind::Enum),
            "Policy" => Some(NameKind::Record),
            _ => None,
        }
    }

    fn parse(src: &str) -> TypeExpr {
        parse_type_expr(src, lookup).unwrap()
    }

    #[test]
    fn builtins_and_user_names() {
        assert_eq!(parse("int"), TypeExpr::int());
        assert_eq!(parse(" str "), TypeExpr::string());
        assert_eq!(parse("Any"), TypeExpr::Any);
        assert_eq!(parse("RiskLevel"), TypeExpr::enum_ref("RiskLevel"));
        assert_eq!(parse("Policy"), TypeExpr::record("Policy"));
    }

    #[test]
    fn containers_nest() {
        assert_eq!(
            parse("dict[str, list[Optional[RiskLevel]]]"),
            TypeExpr::dict_of(
                TypeExpr::string(),
                TypeExpr::list_of(TypeExpr::optional(TypeExpr::enum_ref("RiskLevel"))),
            )
        );
        assert_eq!(parse("list"), TypeExpr::Sequence(None));
        assert_eq!(parse("dict"), TypeExpr::Mapping(None));
        assert_eq!(parse("Dict[str]"), TypeExpr::Mapping(None));
    }

    #[test]
    fn pipe_and_union_syntax_agree() {
        let expected = TypeExpr::union([
            TypeExpr::dict_of(TypeExpr::string(), TypeExpr::Any),
            TypeExpr::Sequence(Some(Box::new(TypeExpr::Any))),
            TypeExpr::string(),
            TypeExpr::Null,
        ]);
        assert_eq!(parse("dict[str, Any] | list[Any] | str | None"), expected);
        assert_eq!(parse("Union[dict[str, Any], list[Any], str, None]"), expected);
    }

    #[test]
    fn display_output_parses_back() {
        let ty = parse("Union[dict[str, Policy], list, Optional[RiskLevel], None]");
        assert_eq!(parse(&ty.to_string()), ty);
    }

    #[test]
    fn every_builtin_word_is_reserved() {
        for name in BUILTIN_NAMES {
            // `Optional` and `Union` need parameters, so they fail instead
            let parsed = parse_type_expr(name, |_| Some(NameKind::Enum)).ok();
            assert_ne!(parsed, Some(TypeExpr::enum_ref(*name)), "{name}");
        }
        assert!(is_builtin_name("Optional"));
        assert!(!is_builtin_name("RiskLevel"));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for src in ["", "list[", "int[str]", "Optional[int, str]", "dict[str, int", "Weather", "int |", "int $", "RiskLevel[int]"] {
            let err = parse_type_expr(src, lookup).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidTypeExpr { .. }), "{src}: {err}");
        }
    }
}
