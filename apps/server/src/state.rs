//! Shared handler state.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState (cloned into every request)                                   │
//! │                                                                         │
//! │  db        Database        pool + writer lock, cheap to clone           │
//! │  notifier  Arc<dyn ...>    SMTP or disabled, chosen at startup          │
//! │  store     StoreInfo       shop details for invoices (read-only)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use potu_db::Database;

use crate::config::StoreInfo;
use crate::notification::Notifier;
use crate::services::{CatalogService, CustomerService, OrderEngine, ReportService};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: Arc<dyn Notifier>,
    pub store: StoreInfo,
}

impl AppState {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, store: StoreInfo) -> Self {
        AppState { db, notifier, store }
    }

    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&self.db)
    }

    pub fn customers(&self) -> CustomerService<'_> {
        CustomerService::new(&self.db)
    }

    pub fn orders(&self) -> OrderEngine<'_> {
        OrderEngine::new(&self.db, self.notifier.as_ref())
    }

    pub fn reports(&self) -> ReportService<'_> {
        ReportService::new(&self.db)
    }
}
