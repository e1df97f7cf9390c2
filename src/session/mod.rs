use crate::catalog::{ColumnDescriptor, FilterDefinition};
use crate::query::{Expr, SearchQuery};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub columns: Vec<String>,
    /// Unfiltered row count, known once the table is loaded.
    pub rows: Option<u64>,
}

/// Page-lifetime state shared by the controller and the data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub table_info: TableInfo,
    pub filters: Vec<FilterDefinition>,
    /// Currently applied filter expression; `None` until rules are applied.
    pub filter: Option<Expr>,
}

pub type SharedSession = Arc<RwLock<Session>>;

impl Session {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            table_info: TableInfo {
                schema: schema.into(),
                name: table.into(),
                ..TableInfo::default()
            },
            ..Session::default()
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn is_loaded(&self) -> bool {
        self.table_info.rows.is_some()
    }

    /// Record the loaded columns and total row count in one step.
    pub fn install(&mut self, columns: &[ColumnDescriptor], rows: u64) {
        self.table_info.columns = columns.iter().map(|c| c.name.clone()).collect();
        self.filters = columns.iter().map(FilterDefinition::from).collect();
        self.table_info.rows = Some(rows);
    }

    /// Base query against the configured table.
    pub fn base_query(&self) -> SearchQuery {
        SearchQuery::table(&self.table_info.schema, &self.table_info.name)
    }
}
