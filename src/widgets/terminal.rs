//! Console renditions of the table, rule builder and busy indicator, used by
//! the `dataview` binary.

use super::{BusyIndicator, DataSource, RuleBuilder, TableWidget};
use crate::catalog::FilterDefinition;
use crate::datasource::{OrderRequest, TableRequest, TableResponse};
use crate::errors::Error;
use crate::rules::RuleGroup;
use async_trait::async_trait;
use colored::Colorize;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct ShownPage {
    start: u64,
    response: TableResponse,
}

pub struct TerminalTable {
    headers: Vec<String>,
    source: Option<Arc<dyn DataSource>>,
    page_length: i64,
    order: Vec<OrderRequest>,
    draw: u64,
    shown: Option<ShownPage>,
    error: Option<String>,
}

impl TerminalTable {
    pub fn new(page_length: i64, order: Vec<OrderRequest>) -> Self {
        Self {
            headers: Vec::new(),
            source: None,
            page_length,
            order,
            draw: 0,
            shown: None,
            error: None,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn last_page(&self) -> Option<&TableResponse> {
        self.shown.as_ref().map(|shown| &shown.response)
    }

    /// Request the page starting at `start`. A response whose draw is not
    /// the latest one issued is discarded.
    pub async fn page(&mut self, start: u64) -> Result<(), Error> {
        let source = self.source.clone().ok_or(Error::NotLoaded)?;
        self.draw += 1;
        let request = TableRequest {
            order: self.order.clone(),
            start,
            length: self.page_length,
            draw: self.draw,
        };
        match source.fetch(request).await {
            Ok(response) if response.draw == self.draw => {
                self.error = None;
                self.shown = Some(ShownPage { start, response });
                Ok(())
            }
            Ok(stale) => {
                tracing::debug!(draw = stale.draw, "discarding stale page");
                Ok(())
            }
            Err(err) => {
                self.show_error(&err.to_string());
                Err(err)
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.headers.join(" | ").bold());
        if let Some(message) = &self.error {
            out.push_str(&format!("{}\n", message.red()));
        }
        let Some(ShownPage { start, response }) = &self.shown else {
            return out;
        };
        for row in &response.data {
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
        let first = if response.data.is_empty() { 0 } else { start + 1 };
        let last = start + response.data.len() as u64;
        let mut footer = format!(
            "Showing {} to {} of {} entries",
            first, last, response.records_filtered
        );
        if response.records_filtered != response.records_total {
            footer.push_str(&format!(" (filtered from {} total)", response.records_total));
        }
        out.push_str(&format!("{}\n", footer.dimmed()));
        out
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TableWidget for TerminalTable {
    fn clear_headers(&mut self) {
        self.headers.clear();
    }

    fn append_header(&mut self, column: &str) {
        self.headers.push(column.to_string());
    }

    fn bind(&mut self, source: Arc<dyn DataSource>) {
        self.source = Some(source);
    }

    async fn reload(&mut self) -> Result<(), Error> {
        self.page(0).await
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

/// Rule builder whose rules are fixed up front, e.g. read from a file.
#[derive(Default)]
pub struct StaticRuleBuilder {
    filters: Vec<FilterDefinition>,
    rules: Option<RuleGroup>,
}

impl StaticRuleBuilder {
    pub fn new(rules: Option<RuleGroup>) -> Self {
        Self {
            filters: Vec::new(),
            rules,
        }
    }

    pub fn filters(&self) -> &[FilterDefinition] {
        &self.filters
    }

    pub fn set_rules(&mut self, rules: Option<RuleGroup>) {
        self.rules = rules;
    }
}

impl RuleBuilder for StaticRuleBuilder {
    fn set_filters(&mut self, filters: &[FilterDefinition]) {
        self.filters = filters.to_vec();
    }

    fn get_rules(&self) -> Option<RuleGroup> {
        self.rules.clone()
    }
}

/// Prints a loading line on stderr while any request is in flight.
/// Overlapping requests are counted; the line stays up until the last ends.
#[derive(Default)]
pub struct LoadingLine {
    in_flight: AtomicUsize,
}

impl LoadingLine {
    pub fn is_visible(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

impl BusyIndicator for LoadingLine {
    fn show(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            eprintln!("{}", "loading...".dimmed());
        }
    }

    fn hide(&self) {
        // unmatched hides leave the count at zero
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSource {
        draw_offset: u64,
    }

    #[async_trait]
    impl DataSource for FixedSource {
        async fn fetch(&self, request: TableRequest) -> Result<TableResponse, Error> {
            Ok(TableResponse {
                data: vec![vec![json!(1), json!("a"), Value::Null]],
                draw: request.draw + self.draw_offset,
                records_filtered: 1,
                records_total: 4,
            })
        }
    }

    #[tokio::test]
    async fn test_reload_renders_first_page() {
        colored::control::set_override(false);
        let mut table = TerminalTable::new(10, vec![]);
        table.append_header("id");
        table.append_header("name");
        table.append_header("note");
        table.bind(Arc::new(FixedSource { draw_offset: 0 }));

        table.reload().await.unwrap();

        assert_eq!(
            table.render(),
            "id | name | note\n1 | a | \nShowing 1 to 1 of 1 entries (filtered from 4 total)\n"
        );
    }

    #[tokio::test]
    async fn test_stale_draw_is_discarded() {
        let mut table = TerminalTable::new(10, vec![]);
        table.bind(Arc::new(FixedSource { draw_offset: 1 }));
        table.reload().await.unwrap();
        assert!(table.last_page().is_none());
    }

    #[tokio::test]
    async fn test_unbound_table_is_not_loaded() {
        let mut table = TerminalTable::new(10, vec![]);
        assert_eq!(table.reload().await, Err(Error::NotLoaded));
    }

    #[test]
    fn test_loading_line_toggles() {
        let line = LoadingLine::default();
        line.show();
        assert!(line.is_visible());
        line.hide();
        assert!(!line.is_visible());
    }

    #[test]
    fn test_loading_line_counts_overlapping_requests() {
        let line = LoadingLine::default();
        line.show();
        line.show();
        line.hide();
        assert!(line.is_visible());
        line.hide();
        assert!(!line.is_visible());

        line.hide();
        line.show();
        assert!(line.is_visible());
    }
}
