//! Page controller: loads table metadata once, wires the widgets, and
//! applies rule-builder filters.

use crate::client::Backend;
use crate::datasource::{BusyGuard, PagedSource};
use crate::errors::{report, Error};
use crate::rules::parse_filter;
use crate::session::{Session, SharedSession};
use crate::widgets::{BusyIndicator, RuleBuilder, TableWidget};
use futures_util::future::try_join;
use std::sync::Arc;

pub struct PageController<T: TableWidget, R: RuleBuilder> {
    backend: Arc<dyn Backend>,
    busy: Arc<dyn BusyIndicator>,
    session: SharedSession,
    pub table: T,
    pub builder: R,
    wired: bool,
}

impl<T: TableWidget, R: RuleBuilder> PageController<T, R> {
    pub fn new(backend: Arc<dyn Backend>, busy: Arc<dyn BusyIndicator>, table: T, builder: R) -> Self {
        Self {
            backend,
            busy,
            session: Session::default().shared(),
            table,
            builder,
            wired: false,
        }
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn is_wired(&self) -> bool {
        self.wired
    }

    /// Fetch column metadata and the unfiltered row count together, then
    /// wire both widgets. Nothing is committed unless both requests succeed.
    pub async fn load_table(&mut self, schema: &str, table: &str) -> Result<(), Error> {
        let result = self.load(schema, table).await;
        if let Err(err) = &result {
            let message = report(err);
            self.table.show_error(&message);
        }
        result
    }

    async fn load(&mut self, schema: &str, table: &str) -> Result<(), Error> {
        let mut session = Session::new(schema, table);
        let count_query = session.base_query().count();

        let (columns, count) = {
            let _busy = BusyGuard::show(self.busy.clone());
            try_join(
                self.backend.columns(schema, table),
                self.backend.search(&count_query),
            )
            .await?
        };
        let rows = count.count()?;
        session.install(&columns, rows);

        self.table.clear_headers();
        for column in &session.table_info.columns {
            self.table.append_header(column);
        }
        self.builder.set_filters(&session.filters);
        *self.session.write().await = session;

        let source = PagedSource::new(self.backend.clone(), self.session.clone(), self.busy.clone());
        self.table.bind(Arc::new(source));
        self.wired = true;

        tracing::info!(schema, table, columns = columns.len(), rows, "table loaded");
        Ok(())
    }

    /// Translate the builder's current rules into the session filter and
    /// reload the table. Returns `false` when the builder has no rules.
    pub async fn apply_filters(&mut self) -> Result<bool, Error> {
        if !self.wired {
            return Err(Error::NotLoaded);
        }
        let Some(rules) = self.builder.get_rules() else {
            return Ok(false);
        };
        let filter = match parse_filter(&rules) {
            Ok(filter) => filter,
            Err(err) => {
                let err = Error::from(err);
                let message = report(&err);
                self.table.show_error(&message);
                return Err(err);
            }
        };
        self.session.write().await.filter = Some(filter);
        self.table.reload().await?;
        Ok(true)
    }

    /// Drop the applied filter and reload.
    pub async fn clear_filters(&mut self) -> Result<(), Error> {
        if !self.wired {
            return Err(Error::NotLoaded);
        }
        self.session.write().await.filter = None;
        self.table.reload().await
    }
}
