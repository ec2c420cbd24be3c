//! # Services
//!
//! Business operations over the record store. Handlers stay thin: parse,
//! call one service method, shape the response.
//!
//! ```text
//! routes/*  ──►  CatalogService    (products, categories)
//!           ──►  CustomerService   (directory, find-or-create)
//!           ──►  OrderEngine       (orders, pre-orders, conversion, stock)
//!           ──►  ReportService     (read-only aggregation)
//! ```
//!
//! Multi-step writes open one [`StoreTx`](potu_db::StoreTx) and do every
//! read and write of the operation through it. The store has a single
//! writer, so touching the `Database` handle while a transaction is open
//! would wait on itself.

pub mod catalog;
pub mod customers;
pub mod orders;
pub mod reports;

use potu_core::{CoreError, ValidationError};
use potu_db::DbError;
use thiserror::Error;

pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use orders::{ConvertedOrder, CreatedOrder, CreatedPreorder, OrderEngine};
pub use reports::ReportService;

/// Errors raised by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(CoreError::Validation(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
