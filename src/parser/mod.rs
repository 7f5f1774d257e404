//! Tool Source Parser (C2).
//!
//! Recovers everything the registry needs from a tool's raw source text
//! without evaluating any of it: the declared dependency list, the stripped
//! function body (decorator removed, `def` kept), the entry symbol, and the
//! descriptor fields the decorator carries. A syntactic miss anywhere in
//! this chain is a [`AppError::parse`], never a panic.

use crate::errors::{AppError, AppResult};
use crate::mcp::schema::{JsonSchema, PropertySchema};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::registry::ToolDescriptor;

fn requirements_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<requirements>(.*?)</requirements>").unwrap())
}

fn decorator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)@mcp\.tool\(.*?\)\s*\n?\s*def").unwrap())
}

fn def_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

fn description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"description\s*=\s*'([^']*)'|description\s*=\s*"([^"]*)""#).unwrap())
}

fn annotations_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)annotations\s*=\s*\{(.*?)\}\s*\)\s*\ndef").unwrap())
}

fn parameter_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"["']([A-Za-z_][A-Za-z0-9_]*)["']\s*:\s*\{\s*["']description["']\s*:\s*["']([^"']*)["']"#)
            .unwrap()
    })
}

fn param_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)def\s+[A-Za-z_][A-Za-z0-9_]*\s*\((.*?)\)\s*:").unwrap())
}

/// Undoes the escape-doubling a raw HTTP body picks up on the wire and
/// dedents the result, matching the normalization the control plane applies
/// before handing source text to this parser.
pub fn normalize_posted_source(raw: &str) -> String {
    let unescaped = raw
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\\"", "\"");
    dedent(&unescaped)
}

fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if l.len() >= min_indent { &l[min_indent..] } else { *l })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dependencies declared in a `<requirements>...</requirements>` docstring
/// block, one per non-blank line, in order.
pub fn parse_requirements(source: &str) -> Vec<String> {
    requirements_re()
        .captures(source)
        .map(|caps| {
            caps[1]
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Strips the `@mcp.tool(...)` decorator while keeping the `def` line,
/// matching the original sandbox's preparation step exactly.
pub fn strip_decorator(source: &str) -> AppResult<String> {
    if !decorator_re().is_match(source) {
        return Err(AppError::parse("no @mcp.tool(...) decorator found"));
    }
    let stripped = decorator_re().replace(source, "def");
    Ok(dedent(&stripped))
}

/// Recovers the function name from the first `def` in `source`.
pub fn entry_symbol(source: &str) -> AppResult<String> {
    def_name_re()
        .captures(source)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| AppError::parse("could not find a function definition"))
}

/// A formal parameter's name and whether it carries a `=default` in the
/// signature; defaulted parameters are optional, not required (§4.1).
fn parameter_names(source: &str) -> Vec<(String, bool)> {
    let Some(caps) = param_list_re().captures(source) else {
        return Vec::new();
    };
    caps[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|param| {
            let has_default = param.contains('=');
            let name = param
                .split([':', '='])
                .next()
                .unwrap_or(param)
                .trim()
                .to_string();
            (name, has_default)
        })
        .collect()
}

fn parse_description(source: &str) -> Option<String> {
    description_re().captures(source).map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    })
}

fn parse_parameter_annotations(source: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(caps) = annotations_block_re().captures(source) {
        for entry in parameter_entry_re().captures_iter(&caps[1]) {
            out.insert(entry[1].to_string(), entry[2].to_string());
        }
    }
    out
}

/// Recovers the descriptor fields (description, parameter annotations) a
/// caller needs before the sandbox ever derives a signature-based schema.
/// `input_schema` here only carries parameter names as untyped `string`
/// properties; the registry stores whichever schema it was given at
/// `add_mcp_tool` time.
pub fn parse_descriptor(source: &str) -> AppResult<ToolDescriptor> {
    let description = parse_description(source).unwrap_or_default();
    let parameter_annotations = parse_parameter_annotations(source);

    let mut properties = HashMap::new();
    let mut required = Vec::new();
    for (name, has_default) in parameter_names(source) {
        if !has_default {
            required.push(name.clone());
        }
        properties.insert(
            name,
            PropertySchema {
                property_type: "string".to_string(),
                description: None,
            },
        );
    }
    let mut input_schema = JsonSchema::object(properties, required);
    input_schema.merge_descriptions(&parameter_annotations);

    Ok(ToolDescriptor {
        description,
        input_schema,
        parameter_annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST_FAULT: &str = r#"
"""
<requirements>
uvicorn>=0.34.3
</requirements>
"""
from typing import Annotated, Optional
from pydantic import Field
@mcp.tool(
    description='host fault resolution'
)
def getHostFaultCause(
    faultCode: str,
    severity: int=2
    ):
    pass
"#;

    const MIDDLEWARE_FAULT: &str = r#"
@mcp.tool(
    description='middleware fault resolution',
    annotations={
        "parameters": {
            "faultCode": {"description": "fault code"},
            "severity": {"description": "severity level 1-5"}
        }
    }
)
def getMiddleFaultCause(
    faultCode: str,
    severity: int=1
    ):
    pass
"#;

    #[test]
    fn extracts_requirements_block() {
        let reqs = parse_requirements(HOST_FAULT);
        assert_eq!(reqs, vec!["uvicorn>=0.34.3".to_string()]);
    }

    #[test]
    fn no_requirements_block_yields_empty() {
        assert!(parse_requirements(MIDDLEWARE_FAULT).is_empty());
    }

    #[test]
    fn strips_decorator_keeps_def() {
        let stripped = strip_decorator(MIDDLEWARE_FAULT).unwrap();
        assert!(stripped.trim_start().starts_with("def getMiddleFaultCause"));
        assert!(!stripped.contains("@mcp.tool"));
    }

    #[test]
    fn recovers_entry_symbol() {
        assert_eq!(entry_symbol(HOST_FAULT).unwrap(), "getHostFaultCause");
        assert_eq!(entry_symbol(MIDDLEWARE_FAULT).unwrap(), "getMiddleFaultCause");
    }

    #[test]
    fn missing_decorator_is_parse_error() {
        let err = strip_decorator("def bare(): pass").unwrap_err();
        assert!(matches!(err.code, crate::errors::ErrorCode::ParseError));
    }

    #[test]
    fn defaulted_parameter_is_not_required() {
        let descriptor = parse_descriptor(MIDDLEWARE_FAULT).unwrap();
        let required = descriptor.input_schema.required.unwrap_or_default();
        assert!(required.contains(&"faultCode".to_string()));
        assert!(!required.contains(&"severity".to_string()));
        assert!(descriptor.input_schema.properties.unwrap().contains_key("severity"));
    }

    #[test]
    fn recovers_descriptor_with_inline_annotations() {
        let descriptor = parse_descriptor(MIDDLEWARE_FAULT).unwrap();
        assert_eq!(descriptor.description, "middleware fault resolution");
        assert_eq!(
            descriptor.parameter_annotations.get("faultCode").unwrap(),
            "fault code"
        );
        let properties = descriptor.input_schema.properties.unwrap();
        assert_eq!(
            properties.get("faultCode").unwrap().description.as_deref(),
            Some("fault code")
        );
    }

    #[test]
    fn annotation_without_matching_parameter_is_dropped() {
        let source = r#"
@mcp.tool(
    description='x',
    annotations={
        "parameters": {
            "ghost": {"description": "not a real param"}
        }
    }
)
def realFn(onlyParam: str):
    pass
"#;
        let descriptor = parse_descriptor(source).unwrap();
        let properties = descriptor.input_schema.properties.unwrap();
        assert!(properties.get("onlyParam").unwrap().description.is_none());
        assert!(!properties.contains_key("ghost"));
    }
}
