//! Use cases. Each public operation runs in one transaction.

pub mod cash_desk;
pub mod checkout;
pub mod report;

pub use cash_desk::{CashDeskService, SessionHistory, SessionOverview};
pub use checkout::{CheckoutReceipt, CheckoutRequest, CheckoutService, PaymentSummaryLine};
pub use report::ReportService;
