//! Capability contracts for the UI collaborators. Any concrete table or
//! rule-builder implementation plugs in behind these traits.

pub mod terminal;

use crate::catalog::FilterDefinition;
use crate::datasource::{TableRequest, TableResponse};
use crate::errors::Error;
use crate::rules::RuleGroup;
use async_trait::async_trait;
use std::sync::Arc;

pub type ResponseCallback = Box<dyn FnOnce(Result<TableResponse, Error>) + Send>;

/// Server-side data provider for a paginated table.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, request: TableRequest) -> Result<TableResponse, Error>;

    /// Callback form of [`DataSource::fetch`]. The callback is invoked
    /// exactly once, with either the page or the error.
    async fn request_data(&self, request: TableRequest, callback: ResponseCallback) {
        callback(self.fetch(request).await)
    }
}

/// Paginated table with server-side paging and sorting.
#[async_trait]
pub trait TableWidget: Send {
    fn clear_headers(&mut self);

    fn append_header(&mut self, column: &str);

    fn bind(&mut self, source: Arc<dyn DataSource>);

    /// Re-request data from the first page.
    async fn reload(&mut self) -> Result<(), Error>;

    fn show_error(&mut self, message: &str);
}

pub trait RuleBuilder: Send {
    fn set_filters(&mut self, filters: &[FilterDefinition]);

    fn get_rules(&self) -> Option<RuleGroup>;
}

pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Indicator that displays nothing.
pub struct NoIndicator;

impl BusyIndicator for NoIndicator {
    fn show(&self) {}
    fn hide(&self) {}
}
