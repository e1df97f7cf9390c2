//! Rule trees as produced by the rule-builder widget.

pub mod translate;

pub use translate::{negate, parse_filter, parse_rule, translate};

use crate::errors::TranslateError;
use crate::query::Op;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub condition: Conjunction,
    pub rules: Vec<RuleNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Group(RuleGroup),
    Condition(Condition),
}

/// A single leaf rule. `operator` stays a raw name until translation so an
/// unknown operator is reported rather than failing the whole tree's parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            id: None,
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn op(self) -> Op {
        match self {
            Conjunction::And => Op::And,
            Conjunction::Or => Op::Or,
        }
    }
}

impl TryFrom<String> for Conjunction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "and" => Ok(Conjunction::And),
            "or" => Ok(Conjunction::Or),
            _ => Err(format!("unknown group condition '{}'", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorName {
    Equal,
    NotEqual,
    In,
    NotIn,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Between,
    NotBetween,
    BeginsWith,
    NotBeginsWith,
    Contains,
    NotContains,
    EndsWith,
    NotEndsWith,
    IsEmpty,
    IsNotEmpty,
    IsNull,
    IsNotNull,
}

impl OperatorName {
    pub const ALL: [OperatorName; 20] = [
        OperatorName::Equal,
        OperatorName::NotEqual,
        OperatorName::In,
        OperatorName::NotIn,
        OperatorName::Less,
        OperatorName::LessOrEqual,
        OperatorName::Greater,
        OperatorName::GreaterOrEqual,
        OperatorName::Between,
        OperatorName::NotBetween,
        OperatorName::BeginsWith,
        OperatorName::NotBeginsWith,
        OperatorName::Contains,
        OperatorName::NotContains,
        OperatorName::EndsWith,
        OperatorName::NotEndsWith,
        OperatorName::IsEmpty,
        OperatorName::IsNotEmpty,
        OperatorName::IsNull,
        OperatorName::IsNotNull,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperatorName::Equal => "equal",
            OperatorName::NotEqual => "not_equal",
            OperatorName::In => "in",
            OperatorName::NotIn => "not_in",
            OperatorName::Less => "less",
            OperatorName::LessOrEqual => "less_or_equal",
            OperatorName::Greater => "greater",
            OperatorName::GreaterOrEqual => "greater_or_equal",
            OperatorName::Between => "between",
            OperatorName::NotBetween => "not_between",
            OperatorName::BeginsWith => "begins_with",
            OperatorName::NotBeginsWith => "not_begins_with",
            OperatorName::Contains => "contains",
            OperatorName::NotContains => "not_contains",
            OperatorName::EndsWith => "ends_with",
            OperatorName::NotEndsWith => "not_ends_with",
            OperatorName::IsEmpty => "is_empty",
            OperatorName::IsNotEmpty => "is_not_empty",
            OperatorName::IsNull => "is_null",
            OperatorName::IsNotNull => "is_not_null",
        }
    }
}

impl std::str::FromStr for OperatorName {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorName::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| TranslateError::unsupported_operator(s))
    }
}

impl std::fmt::Display for OperatorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_names_parse() {
        for op in OperatorName::ALL {
            assert_eq!(op.as_str().parse::<OperatorName>(), Ok(op));
        }
        assert!("like".parse::<OperatorName>().is_err());
    }

    #[test]
    fn test_builder_output_deserializes() {
        let tree: RuleGroup = serde_json::from_value(json!({
            "condition": "AND",
            "rules": [
                {"id": "age", "field": "age", "type": "integer", "input": "number",
                 "operator": "between", "value": [18, 65]},
                {"condition": "or", "rules": [
                    {"id": "name", "field": "name", "operator": "is_null", "value": null}
                ]}
            ],
            "valid": true
        }))
        .unwrap();

        assert_eq!(tree.condition, Conjunction::And);
        assert_eq!(tree.valid, Some(true));
        match &tree.rules[0] {
            RuleNode::Condition(c) => {
                assert_eq!(c.field, "age");
                assert_eq!(c.value, json!([18, 65]));
            }
            other => panic!("expected condition, got {:?}", other),
        }
        match &tree.rules[1] {
            RuleNode::Group(g) => assert_eq!(g.condition, Conjunction::Or),
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_conjunction_rejected() {
        let result: Result<RuleGroup, _> =
            serde_json::from_value(json!({"condition": "XOR", "rules": []}));
        assert!(result.is_err());
    }
}
