//! Server-side pagination: turns a table widget request into a count query
//! and a select query, and reshapes both results into the widget's response.

use crate::client::Backend;
use crate::errors::{report, Error};
use crate::query::{Direction, Node, SearchQuery};
use crate::session::{Session, SharedSession};
use crate::widgets::{BusyIndicator, DataSource};
use async_trait::async_trait;
use futures_util::future::try_join;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub column: usize,
    pub dir: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRequest {
    #[serde(default)]
    pub order: Vec<OrderRequest>,
    pub start: u64,
    /// Page size; negative means "all rows".
    pub length: i64,
    #[serde(deserialize_with = "number_or_string")]
    pub draw: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub data: Vec<Vec<Value>>,
    pub draw: u64,
    pub records_filtered: u64,
    pub records_total: u64,
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Shows the indicator on creation and hides it when dropped.
pub struct BusyGuard {
    indicator: Arc<dyn BusyIndicator>,
}

impl BusyGuard {
    pub fn show(indicator: Arc<dyn BusyIndicator>) -> Self {
        indicator.show();
        Self { indicator }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}

/// Count and select queries for one page request.
pub fn page_queries(session: &Session, request: &TableRequest) -> (SearchQuery, SearchQuery) {
    let count = session
        .base_query()
        .count()
        .filtered(session.filter.clone());

    let columns = &session.table_info.columns;
    let order_by = request
        .order
        .iter()
        .filter_map(|order| match columns.get(order.column) {
            Some(column) => Some(Node::Column {
                column: column.clone(),
                ordering: Some(order.dir),
            }),
            None => {
                tracing::warn!(index = order.column, "ignoring sort on unknown column");
                None
            }
        })
        .collect();
    let limit = u64::try_from(request.length).ok();
    let select = session
        .base_query()
        .filtered(session.filter.clone())
        .ordered(order_by)
        .page(request.start, limit);

    (count, select)
}

pub struct PagedSource {
    backend: Arc<dyn Backend>,
    session: SharedSession,
    busy: Arc<dyn BusyIndicator>,
}

impl PagedSource {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: SharedSession,
        busy: Arc<dyn BusyIndicator>,
    ) -> Self {
        Self {
            backend,
            session,
            busy,
        }
    }

    async fn fetch_page(&self, request: TableRequest) -> Result<TableResponse, Error> {
        let (count_query, select_query, total) = {
            let session = self.session.read().await;
            let total = session.table_info.rows.ok_or(Error::NotLoaded)?;
            let (count, select) = page_queries(&session, &request);
            (count, select, total)
        };

        let _busy = BusyGuard::show(self.busy.clone());
        let (count, select) = try_join(
            self.backend.search(&count_query),
            self.backend.search(&select_query),
        )
        .await?;

        Ok(TableResponse {
            data: select.data,
            draw: request.draw,
            records_filtered: count.count()?,
            records_total: total,
        })
    }
}

#[async_trait]
impl DataSource for PagedSource {
    async fn fetch(&self, request: TableRequest) -> Result<TableResponse, Error> {
        let draw = request.draw;
        let result = self.fetch_page(request).await;
        match &result {
            Ok(page) => tracing::debug!(draw, rows = page.data.len(), "page loaded"),
            Err(err) => {
                report(err);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Expr, Op};
    use serde_json::json;

    fn loaded_session() -> Session {
        let mut session = Session::new("s", "t");
        session.table_info.columns = vec!["id".to_string(), "name".to_string()];
        session.table_info.rows = Some(100);
        session
    }

    fn request(length: i64) -> TableRequest {
        TableRequest {
            order: vec![OrderRequest {
                column: 1,
                dir: Direction::Desc,
            }],
            start: 10,
            length,
            draw: 3,
        }
    }

    #[test]
    fn test_unfiltered_queries_have_no_where() {
        let (count, select) = page_queries(&loaded_session(), &request(10));
        let count = serde_json::to_value(&count).unwrap();
        let select = serde_json::to_value(&select).unwrap();
        assert!(count.get("where").is_none());
        assert!(select.get("where").is_none());
        assert_eq!(
            select,
            json!({
                "from": {"type": "table", "schema": "s", "table": "t"},
                "order_by": [{"type": "column", "column": "name", "ordering": "desc"}],
                "offset": 10,
                "limit": 10
            })
        );
        assert_eq!(
            count,
            json!({
                "from": {"type": "table", "schema": "s", "table": "t"},
                "fields": [{"type": "function", "function": "count", "operands": ["*"]}]
            })
        );
    }

    #[test]
    fn test_filter_applies_to_both_queries() {
        let mut session = loaded_session();
        let filter = Expr::op(Op::Equal, vec![Expr::column("id"), Expr::literal(1)]);
        session.filter = Some(filter.clone());

        let (count, select) = page_queries(&session, &request(10));
        assert_eq!(count.filter, Some(filter.clone()));
        assert_eq!(select.filter, Some(filter));
        assert!(count.order_by.is_empty());
        assert_eq!(count.offset, None);
    }

    #[test]
    fn test_show_all_and_unknown_sort_column() {
        let mut req = request(-1);
        req.order.push(OrderRequest {
            column: 9,
            dir: Direction::Asc,
        });
        let (_, select) = page_queries(&loaded_session(), &req);
        assert_eq!(select.limit, None);
        assert_eq!(select.offset, Some(10));
        assert_eq!(select.order_by.len(), 1);
    }

    #[test]
    fn test_request_draw_accepts_strings() {
        let req: TableRequest = serde_json::from_value(json!({
            "order": [{"column": 0, "dir": "asc"}],
            "start": 0,
            "length": 25,
            "draw": "7"
        }))
        .unwrap();
        assert_eq!(req.draw, 7);
        assert_eq!(req.order[0].dir, Direction::Asc);
    }

    #[test]
    fn test_response_wire_shape() {
        let response = TableResponse {
            data: vec![vec![json!(1), json!("a")]],
            draw: 2,
            records_filtered: 1,
            records_total: 5,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"data": [[1, "a"]], "draw": 2, "recordsFiltered": 1, "recordsTotal": 5})
        );
    }
}
