//! 字段签名解析
//! Field signature parsing
//!
//! A field is written `<name> [: <type>] [| <description>]`. Types follow a
//! closed grammar:
//!
//! ```text
//! type := str | int | float | bool | any | <Name>
//!       | list[type] | dict[type, type] | Optional[type] | Literal['a', 'b', ...]
//! ```
//!
//! The parsed [`FieldSpec`]s are metadata for the [`Evaluator`](crate::agent::Evaluator);
//! nothing here is ever executed.

use super::split_top_level;
use crate::agent::error::AgentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 签名解析错误
/// Signature parsing error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Empty field name in '{0}'")]
    EmptyName(String),

    #[error("Malformed type expression '{0}'")]
    MalformedType(String),

    #[error("Type '{name}' expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
}

impl From<SignatureError> for AgentError {
    fn from(err: SignatureError) -> Self {
        AgentError::InvalidInput(err.to_string())
    }
}

/// 字段类型提示
/// Field type hint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum TypeHint {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Any,
    List(Box<TypeHint>),
    Dict(Box<TypeHint>, Box<TypeHint>),
    Optional(Box<TypeHint>),
    Literal(Vec<String>),
    /// 自定义类型名，原样保留
    /// Custom type name, kept verbatim
    Named(String),
}

impl TypeHint {
    /// 解析类型表达式
    /// Parse a type expression
    pub fn parse(expr: &str) -> Result<Self, SignatureError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(SignatureError::MalformedType(expr.to_string()));
        }

        let Some(open) = expr.find('[') else {
            if expr.contains(']') {
                return Err(SignatureError::MalformedType(expr.to_string()));
            }
            return Ok(Self::simple(expr));
        };

        if !expr.ends_with(']') {
            return Err(SignatureError::MalformedType(expr.to_string()));
        }

        let head = expr[..open].trim();
        let inner = &expr[open + 1..expr.len() - 1];
        let args = split_top_level(inner);

        match head.to_ascii_lowercase().as_str() {
            "list" => {
                let [item] = Self::exact::<1>(head, &args)?;
                Ok(TypeHint::List(Box::new(Self::parse(item)?)))
            }
            "dict" => {
                let [key, value] = Self::exact::<2>(head, &args)?;
                Ok(TypeHint::Dict(
                    Box::new(Self::parse(key)?),
                    Box::new(Self::parse(value)?),
                ))
            }
            "optional" => {
                let [item] = Self::exact::<1>(head, &args)?;
                Ok(TypeHint::Optional(Box::new(Self::parse(item)?)))
            }
            "literal" => {
                if args.is_empty() {
                    return Err(SignatureError::Arity {
                        name: head.to_string(),
                        expected: 1,
                        actual: 0,
                    });
                }
                Ok(TypeHint::Literal(
                    args.iter().map(|a| unquote(a).to_string()).collect(),
                ))
            }
            _ => Err(SignatureError::MalformedType(expr.to_string())),
        }
    }

    fn simple(name: &str) -> Self {
        match name {
            "str" | "string" => TypeHint::Str,
            "int" => TypeHint::Int,
            "float" => TypeHint::Float,
            "bool" => TypeHint::Bool,
            "any" | "Any" => TypeHint::Any,
            other => TypeHint::Named(other.to_string()),
        }
    }

    fn exact<'a, const N: usize>(
        head: &str,
        args: &'a [String],
    ) -> Result<[&'a str; N], SignatureError> {
        if args.len() != N {
            return Err(SignatureError::Arity {
                name: head.to_string(),
                expected: N,
                actual: args.len(),
            });
        }
        Ok(std::array::from_fn(|i| args[i].as_str()))
    }

    /// 检查 JSON 值是否符合类型
    /// Whether a JSON value conforms to this hint
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (TypeHint::Any | TypeHint::Named(_), _) => true,
            (TypeHint::Optional(_), Value::Null) => true,
            (TypeHint::Optional(inner), v) => inner.accepts(v),
            (TypeHint::Str, Value::String(_)) => true,
            (TypeHint::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (TypeHint::Float, Value::Number(_)) => true,
            (TypeHint::Bool, Value::Bool(_)) => true,
            (TypeHint::List(item), Value::Array(items)) => items.iter().all(|v| item.accepts(v)),
            (TypeHint::Dict(_, value_hint), Value::Object(map)) => {
                map.values().all(|v| value_hint.accepts(v))
            }
            (TypeHint::Literal(choices), Value::String(s)) => choices.iter().any(|c| c == s),
            _ => false,
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Str => f.write_str("str"),
            TypeHint::Int => f.write_str("int"),
            TypeHint::Float => f.write_str("float"),
            TypeHint::Bool => f.write_str("bool"),
            TypeHint::Any => f.write_str("Any"),
            TypeHint::List(item) => write!(f, "list[{item}]"),
            TypeHint::Dict(k, v) => write!(f, "dict[{k}, {v}]"),
            TypeHint::Optional(item) => write!(f, "Optional[{item}]"),
            TypeHint::Literal(choices) => {
                let quoted: Vec<String> = choices.iter().map(|c| format!("'{c}'")).collect();
                write!(f, "Literal[{}]", quoted.join(", "))
            }
            TypeHint::Named(name) => f.write_str(name),
        }
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// 单个字段定义
/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub type_hint: TypeHint,
    pub description: Option<String>,
}

impl FieldSpec {
    /// 解析 `<name> [: <type>] [| <description>]`
    pub fn parse(token: &str) -> Result<Self, SignatureError> {
        let (main, description) = match token.split_once('|') {
            Some((main, desc)) => (main.trim(), Some(desc.trim().to_string())),
            None => (token.trim(), None),
        };

        let (name, type_hint) = match main.split_once(':') {
            Some((name, ty)) => (name.trim(), TypeHint::parse(ty)?),
            None => (main, TypeHint::Str),
        };

        if name.is_empty() {
            return Err(SignatureError::EmptyName(token.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            type_hint,
            description: description.filter(|d| !d.is_empty()),
        })
    }
}

/// 解析逗号分隔的字段列表
/// Parse a comma-separated field list
pub fn parse_fields(spec: &str) -> Result<Vec<FieldSpec>, SignatureError> {
    split_top_level(spec)
        .iter()
        .filter(|token| !token.is_empty())
        .map(|token| FieldSpec::parse(token))
        .collect()
}

/// 去掉字段描述，只保留名称和类型
/// Strip descriptions, keeping names and types
pub fn clean_signature(spec: &str) -> String {
    split_top_level(spec)
        .iter()
        .map(|token| token.split('|').next().unwrap_or(token).trim().to_string())
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
