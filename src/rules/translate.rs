use super::{Condition, OperatorName, RuleGroup, RuleNode};
use crate::errors::TranslateError;
use crate::query::{Expr, Op};

/// Translate any rule-tree node into a query expression.
pub fn translate(node: &RuleNode) -> Result<Expr, TranslateError> {
    match node {
        RuleNode::Group(group) => parse_filter(group),
        RuleNode::Condition(rule) => parse_rule(rule),
    }
}

/// A group becomes an `and`/`or` operator over its translated children,
/// in input order.
pub fn parse_filter(group: &RuleGroup) -> Result<Expr, TranslateError> {
    let operands = group
        .rules
        .iter()
        .map(translate)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::op(group.condition.op(), operands))
}

pub fn negate(expr: Expr) -> Expr {
    expr.not()
}

pub fn parse_rule(rule: &Condition) -> Result<Expr, TranslateError> {
    let operator: OperatorName = rule.operator.parse()?;
    let compare = |op: Op| {
        Expr::op(
            op,
            vec![Expr::column(&rule.field), Expr::literal(rule.value.clone())],
        )
    };
    let is_empty = || Expr::op(Op::Equal, vec![Expr::column(&rule.field), Expr::literal("")]);
    let is_null = || Expr::op(Op::Is, vec![Expr::column(&rule.field), Expr::null()]);

    let expr = match operator {
        OperatorName::Equal => compare(Op::Equal),
        OperatorName::NotEqual => negate(compare(Op::Equal)),
        // `contains` is membership, not a substring test
        OperatorName::In | OperatorName::Contains => compare(Op::In),
        OperatorName::NotIn | OperatorName::NotContains => negate(compare(Op::In)),
        OperatorName::Less => compare(Op::LessThan),
        OperatorName::LessOrEqual => compare(Op::LessThanOrEqual),
        OperatorName::Greater => compare(Op::GreaterThan),
        OperatorName::GreaterOrEqual => compare(Op::GreaterThanOrEqual),
        OperatorName::Between => open_range(rule)?,
        OperatorName::NotBetween => negate(open_range(rule)?),
        // Affix operators are sent as plain equality, and the `not_` forms
        // carry no negation.
        OperatorName::BeginsWith
        | OperatorName::NotBeginsWith
        | OperatorName::EndsWith
        | OperatorName::NotEndsWith => compare(Op::Equal),
        OperatorName::IsEmpty => is_empty(),
        OperatorName::IsNotEmpty => negate(is_empty()),
        OperatorName::IsNull => is_null(),
        OperatorName::IsNotNull => negate(is_null()),
    };
    Ok(expr)
}

/// `low < field and field < high`, both bounds exclusive.
fn open_range(rule: &Condition) -> Result<Expr, TranslateError> {
    let (low, high) = match rule.value.as_array().map(Vec::as_slice) {
        Some([low, high]) => (low.clone(), high.clone()),
        _ => {
            return Err(TranslateError::InvalidRange {
                field: rule.field.clone(),
            })
        }
    };
    Ok(Expr::op(
        Op::And,
        vec![
            Expr::op(
                Op::LessThan,
                vec![Expr::literal(low), Expr::column(&rule.field)],
            ),
            Expr::op(
                Op::LessThan,
                vec![Expr::column(&rule.field), Expr::literal(high)],
            ),
        ],
    ))
}
