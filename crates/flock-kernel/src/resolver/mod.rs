//! 输入解析
//! Input resolution
//!
//! Maps an agent's declared input spec (`"topic, notes: list[str] | Notes"`)
//! to concrete values pulled from the context. Resolution never fails: a key
//! that cannot be found resolves to `null`.
//!
//! Lookup order for each key:
//!
//! 1. `context` (any case): the whole context in its wire format
//! 2. `context.<attr>`, `def.<agent>`, or `<entity>.<property>` from state
//! 3. the name of an agent that has run: that agent's first recorded output
//! 4. the newest recorded output carrying the key
//! 5. the top-level input `flock.<key>`

pub mod signature;

use crate::agent::types::AgentInputs;
use crate::context::{FlockContext, input_key};
use serde_json::Value;
use tracing::{trace, warn};

pub use signature::{FieldSpec, SignatureError, TypeHint, clean_signature, parse_fields};

// ============================================================================
// 分词
// ============================================================================

/// 按顶层逗号切分
/// Split on commas that are not nested in brackets or quotes
///
/// ```rust
/// use flock_kernel::resolver::split_top_level;
///
/// let parts = split_top_level("a, b: dict[str, int], c: Literal['x,y']");
/// assert_eq!(parts, vec!["a", "b: dict[str, int]", "c: Literal['x,y']"]);
/// ```
pub fn split_top_level(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in s.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// 提取裸键名：先去掉 `| 描述`，再去掉 `: 类型`
/// Bare key of a token: drop a `| description` suffix, then a `: type` suffix
pub fn parse_key(token: &str) -> &str {
    let token = token.split('|').next().unwrap_or(token).trim();
    token.split(':').next().unwrap_or(token).trim()
}

/// 将输入规范转换为键列表
/// Convert an input spec into its list of bare keys
pub fn top_level_to_keys(spec: &str) -> Vec<String> {
    split_top_level(spec)
        .iter()
        .map(|token| parse_key(token).to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

// ============================================================================
// 解析
// ============================================================================

/// 根据输入规范从上下文解析输入
/// Resolve the inputs named by `input_spec` from `context`
pub fn resolve_inputs(
    input_spec: &str,
    context: &FlockContext,
    previous_agent: Option<&str>,
) -> AgentInputs {
    trace!(input_spec, previous_agent, "Resolving inputs");

    top_level_to_keys(input_spec)
        .into_iter()
        .map(|key| {
            let value = resolve_key(&key, context);
            (key, value)
        })
        .collect()
}

fn resolve_key(key: &str, context: &FlockContext) -> Value {
    match key.split_once('.') {
        Some((entity, property)) => resolve_compound(key, entity, property, context),
        None => resolve_single(key, context),
    }
}

fn resolve_compound(key: &str, entity: &str, property: &str, context: &FlockContext) -> Value {
    if entity.eq_ignore_ascii_case("context") {
        return context.attribute(property).unwrap_or(Value::Null);
    }

    if entity.eq_ignore_ascii_case("def") {
        return context
            .get_agent_definition(property)
            .and_then(|def| serde_json::to_value(def).ok())
            .unwrap_or(Value::Null);
    }

    context.get_variable(key).cloned().unwrap_or(Value::Null)
}

fn resolve_single(key: &str, context: &FlockContext) -> Value {
    if key.eq_ignore_ascii_case("context") {
        return match context.to_dict() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to serialize context for input resolution");
                Value::Null
            }
        };
    }

    // Pinned to the agent's first record, not its latest.
    if let Some(record) = context.get_agent_history(key).first() {
        return Value::Object(record.data.clone().into_iter().collect());
    }

    if let Some(value) = context.get_most_recent_value(key) {
        if !value.is_null() {
            return value.clone();
        }
    }

    context
        .get_variable(&input_key(key))
        .cloned()
        .unwrap_or(Value::Null)
}
