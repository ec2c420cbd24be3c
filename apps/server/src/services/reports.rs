//! Read-only reports.
//!
//! Loads the collections a report needs and hands them to the pure
//! aggregation functions in `potu_core::reports`.

use potu_core::reports::{
    self, CategorySales, CustomerSpend, DashboardStats, DateRange, InventoryLine, SalesReport,
};
use potu_db::{Database, RecordAccess};

use super::ServiceResult;

pub struct ReportService<'a> {
    db: &'a Database,
}

impl<'a> ReportService<'a> {
    pub fn new(db: &'a Database) -> Self {
        ReportService { db }
    }

    pub async fn dashboard(&self) -> ServiceResult<DashboardStats> {
        let products = self.db.products().list().await?;
        let orders = self.db.orders().list().await?;
        let customers = self.db.customers().list().await?;
        let items = self.db.orders().all_items().await?;
        Ok(reports::dashboard(&products, &orders, &customers, &items))
    }

    pub async fn inventory(&self) -> ServiceResult<Vec<InventoryLine>> {
        let products = self.db.products().list().await?;
        Ok(reports::inventory(&products))
    }

    /// Orders created within `[start, end]`, or all orders when either
    /// bound is missing.
    pub async fn sales(&self, start: Option<&str>, end: Option<&str>) -> ServiceResult<SalesReport> {
        let range = DateRange::parse(start, end)?;
        let orders = self.db.orders().list().await?;
        let customers = self.db.customers().list().await?;
        Ok(reports::sales(&orders, &customers, range))
    }

    pub async fn customers(&self) -> ServiceResult<Vec<CustomerSpend>> {
        let customers = self.db.customers().list().await?;
        let orders = self.db.orders().list().await?;
        Ok(reports::customer_spend(&customers, &orders))
    }

    pub async fn category_sales(&self) -> ServiceResult<Vec<CategorySales>> {
        let products = self.db.products().list().await?;
        let items = self.db.orders().all_items().await?;
        Ok(reports::category_sales(&products, &items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use potu_db::DbConfig;

    #[tokio::test]
    async fn test_empty_sales_report_is_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let report = ReportService::new(&db)
            .sales(Some("2020-01-01"), Some("2020-01-31"))
            .await
            .unwrap();

        assert!(report.orders.is_empty());
        assert_eq!(report.summary.total_orders, 0);
        assert!(report.summary.total_sales.is_zero());
        assert!(report.summary.average_order_value.is_zero());
    }

    #[tokio::test]
    async fn test_bad_date_is_validation_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = ReportService::new(&db)
            .sales(Some("yesterday"), Some("2020-01-31"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::services::ServiceError::Domain(potu_core::CoreError::Validation(_))
        ));
    }
}
