//! Query-expression tree understood by the backend's advanced search
//! endpoint, plus the envelope that carries it.
//!
//! Nodes serialize as objects tagged by `"type"`; everything else in an
//! operand position is a bare JSON literal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Node(Node),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Table {
        schema: String,
        table: String,
    },
    Column {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ordering: Option<Direction>,
    },
    Operator {
        operator: Op,
        operands: Vec<Expr>,
    },
    Function {
        function: String,
        operands: Vec<Expr>,
    },
}

/// Operators emitted by this crate. The wire spelling is the serde rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
    #[serde(rename = "not")]
    Not,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "IS")]
    Is,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Node(Node::Column {
            column: name.into(),
            ordering: None,
        })
    }

    pub fn op(operator: Op, operands: Vec<Expr>) -> Self {
        Expr::Node(Node::Operator { operator, operands })
    }

    pub fn function(function: impl Into<String>, operands: Vec<Expr>) -> Self {
        Expr::Node(Node::Function {
            function: function.into(),
            operands,
        })
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    /// `count(*)`
    pub fn count_all() -> Self {
        Expr::function("count", vec![Expr::literal("*")])
    }

    /// Wrap in a single-operand `not`.
    pub fn not(self) -> Self {
        Expr::op(Op::Not, vec![self])
    }
}

impl From<Node> for Expr {
    fn from(node: Node) -> Self {
        Expr::Node(node)
    }
}

/// Body of the `query` form field sent to the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub from: Node,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Expr>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl SearchQuery {
    pub fn table(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            from: Node::Table {
                schema: schema.into(),
                table: table.into(),
            },
            fields: Vec::new(),
            filter: None,
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    /// Select `count(*)` instead of the table's columns.
    pub fn count(mut self) -> Self {
        self.fields = vec![Expr::count_all()];
        self
    }

    pub fn filtered(mut self, filter: Option<Expr>) -> Self {
        self.filter = filter;
        self
    }

    pub fn ordered(mut self, order_by: Vec<Node>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn page(mut self, offset: u64, limit: Option<u64>) -> Self {
        self.offset = Some(offset);
        self.limit = limit;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_query_shape() {
        let query = SearchQuery::table("model_draft", "wind").count();
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "from": {"type": "table", "schema": "model_draft", "table": "wind"},
                "fields": [{"type": "function", "function": "count", "operands": ["*"]}]
            })
        );
    }

    #[test]
    fn test_select_query_shape() {
        let query = SearchQuery::table("s", "t")
            .filtered(Some(Expr::op(
                Op::Equal,
                vec![Expr::column("id"), Expr::literal(3)],
            )))
            .ordered(vec![Node::Column {
                column: "id".to_string(),
                ordering: Some(Direction::Desc),
            }])
            .page(20, Some(10));
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "from": {"type": "table", "schema": "s", "table": "t"},
                "where": {"type": "operator", "operator": "=", "operands": [
                    {"type": "column", "column": "id"}, 3
                ]},
                "order_by": [{"type": "column", "column": "id", "ordering": "desc"}],
                "offset": 20,
                "limit": 10
            })
        );
    }

    #[test]
    fn test_null_literal_and_is_operator() {
        let expr = Expr::op(Op::Is, vec![Expr::column("x"), Expr::null()]).not();
        assert_eq!(
            serde_json::to_value(&expr).unwrap(),
            json!({"type": "operator", "operator": "not", "operands": [
                {"type": "operator", "operator": "IS", "operands": [
                    {"type": "column", "column": "x"}, null
                ]}
            ]})
        );
    }

    #[test]
    fn test_expression_parses_back() {
        let text = r#"{"type":"operator","operator":"in","operands":[{"type":"column","column":"c"},["a","b"]]}"#;
        let expr: Expr = serde_json::from_str(text).unwrap();
        assert_eq!(
            expr,
            Expr::op(
                Op::In,
                vec![Expr::column("c"), Expr::literal(json!(["a", "b"]))]
            )
        );
    }
}
