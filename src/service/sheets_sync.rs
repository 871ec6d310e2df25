//! Google Sheets reporting sync.
//!
//! Every run is a full overwrite of two fixed ranges: the company
//! balance report (totals plus monthly breakdown) and the user report.
//! There is no diffing and no retry; a failed run surfaces its error and
//! the next trigger starts from scratch.

use std::sync::Arc;
use std::time::Duration;

use crate::clients::SheetsClient;
use crate::config::SheetsConfig;
use crate::error::GatewayError;
use crate::persistence::models::{CompanyBalanceRow, MonthlyBalanceRow, UserReportRow};
use crate::persistence::PgStore;

/// Row counts written by a completed sync.
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    /// Rows written to the balance range.
    pub balance_rows: usize,
    /// Rows written to the users range.
    pub user_rows: usize,
}

/// Orchestrates the spreadsheet sync.
#[derive(Debug)]
pub struct SheetsSyncService {
    store: Arc<PgStore>,
    sheets: Arc<SheetsClient>,
    config: SheetsConfig,
}

impl SheetsSyncService {
    /// Creates a new `SheetsSyncService`.
    #[must_use]
    pub fn new(store: Arc<PgStore>, sheets: Arc<SheetsClient>, config: SheetsConfig) -> Self {
        Self {
            store,
            sheets,
            config,
        }
    }

    /// Runs one full sync: pull the aggregates, clear both ranges, write
    /// fresh rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] or [`GatewayError::SheetsApi`]
    /// from whichever step failed; nothing written before the failure is
    /// rolled back (the next run overwrites everything anyway).
    pub async fn run_sync(&self) -> Result<SyncReport, GatewayError> {
        let company = self.store.company_balance().await?;
        let monthly = self.store.company_balance_monthly().await?;
        let users = match self.store.user_report_joined().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "joined user report failed, stitching per-table queries");
                self.store.user_report_stitched().await?
            }
        };

        let balance_rows = balance_sheet_rows(&company, &monthly);
        let user_rows = user_sheet_rows(&users);

        self.sheets.clear_range(&self.config.balance_range).await?;
        self.sheets
            .update_range(&self.config.balance_range, &balance_rows)
            .await?;

        self.sheets.clear_range(&self.config.users_range).await?;
        self.sheets
            .update_range(&self.config.users_range, &user_rows)
            .await?;

        let report = SyncReport {
            balance_rows: balance_rows.len(),
            user_rows: user_rows.len(),
        };
        tracing::info!(
            balance_rows = report.balance_rows,
            user_rows = report.user_rows,
            "sheets sync completed"
        );
        Ok(report)
    }

    /// Runs the sync on a fixed interval until the process exits. Spawned
    /// from `main` when an interval is configured; failures are logged
    /// and the loop keeps going.
    pub async fn run_forever(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_sync().await {
                tracing::warn!(error = %e, "scheduled sheets sync failed");
            }
        }
    }
}

/// Builds the balance report: totals header and row, a separator, then
/// the monthly breakdown.
fn balance_sheet_rows(
    company: &CompanyBalanceRow,
    monthly: &[MonthlyBalanceRow],
) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec![
            "Total deposits".to_string(),
            "Total withdrawals".to_string(),
            "Total fees".to_string(),
            "Net balance".to_string(),
        ],
        vec![
            company.total_deposits.to_string(),
            company.total_withdrawals.to_string(),
            company.total_fees.to_string(),
            company.net_balance.to_string(),
        ],
        vec![String::new()],
        vec![
            "Month".to_string(),
            "Deposits".to_string(),
            "Withdrawals".to_string(),
            "Fees".to_string(),
        ],
    ];
    for m in monthly {
        rows.push(vec![
            m.month.format("%Y-%m").to_string(),
            m.deposits.to_string(),
            m.withdrawals.to_string(),
            m.fees.to_string(),
        ]);
    }
    rows
}

/// Builds the user report rows with a header line.
fn user_sheet_rows(users: &[UserReportRow]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "User ID".to_string(),
        "Slug".to_string(),
        "Name".to_string(),
        "Balance".to_string(),
        "Bots".to_string(),
    ]];
    for u in users {
        rows.push(vec![
            u.user_id.to_string(),
            u.slug.clone().unwrap_or_default(),
            u.display_name.clone().unwrap_or_default(),
            u.balance.to_string(),
            u.bot_count.to_string(),
        ]);
    }
    rows
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn balance_rows_include_totals_and_months() {
        let company = CompanyBalanceRow {
            total_deposits: dec!(1000),
            total_withdrawals: dec!(400),
            total_fees: dec!(12),
            net_balance: dec!(600),
        };
        let Some(month) = chrono::Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).single() else {
            panic!("valid timestamp");
        };
        let monthly = vec![MonthlyBalanceRow {
            month,
            deposits: dec!(1000),
            withdrawals: dec!(400),
            fees: dec!(12),
        }];

        let rows = balance_sheet_rows(&company, &monthly);
        assert_eq!(rows.len(), 5);
        let Some(totals) = rows.get(1) else {
            panic!("missing totals row");
        };
        assert_eq!(totals.first().map(String::as_str), Some("1000"));
        let Some(month_row) = rows.get(4) else {
            panic!("missing month row");
        };
        assert_eq!(month_row.first().map(String::as_str), Some("2026-07"));
    }

    #[test]
    fn user_rows_blank_out_missing_profiles() {
        let users = vec![UserReportRow {
            user_id: Uuid::new_v4(),
            slug: None,
            display_name: None,
            balance: dec!(25),
            bot_count: 2,
        }];
        let rows = user_sheet_rows(&users);
        assert_eq!(rows.len(), 2);
        let Some(row) = rows.get(1) else {
            panic!("missing user row");
        };
        assert_eq!(row.get(1).map(String::as_str), Some(""));
        assert_eq!(row.get(4).map(String::as_str), Some("2"));
    }
}
