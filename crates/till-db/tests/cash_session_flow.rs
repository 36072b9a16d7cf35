//! End-to-end flows through the cash desk, checkout and report services.
//!
//! Sequential flows run on an in-memory database. Concurrency runs on a
//! file-backed pool so several connections really compete for the lock.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use till_core::{
    Actor, CashSession, Company, ErrorKind, ManualMovementInput, Money, MovementType,
    PaymentCatalog, PaymentMethodCode, SaleAmounts, SessionStatus,
};
use till_db::{
    CashDeskService, CheckoutRequest, CheckoutService, Database, DbConfig, ReportService,
    SalePaymentRecorder, SessionRepository,
};
use uuid::Uuid;

struct Till {
    db: Database,
    desk: CashDeskService,
    checkout: CheckoutService,
    reports: ReportService,
}

async fn till() -> Till {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let catalog = PaymentCatalog::default();
    Till {
        desk: CashDeskService::new(db.clone(), catalog.clone()),
        checkout: CheckoutService::new(db.clone(), catalog.clone()),
        reports: ReportService::new(db.clone(), catalog),
        db,
    }
}

fn company() -> Company {
    Company::new("company-1", "Corner Bakery")
}

fn cashier() -> Actor {
    Actor::new("user-1", "Ana")
}

fn money(raw: &str) -> Money {
    Money::parse(raw).unwrap()
}

fn sale(due: &str, methods: &[&str], amounts: &[&str]) -> CheckoutRequest {
    CheckoutRequest {
        company_id: "company-1".to_string(),
        amounts: SaleAmounts {
            sub_total: money(due),
            ..Default::default()
        },
        payment_methods: methods.iter().map(|m| m.to_string()).collect(),
        payment_amounts: amounts.iter().map(|a| a.to_string()).collect(),
        ..Default::default()
    }
}

async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

/// Temporary SQLite file, removed with its WAL files on drop.
struct TempDb(PathBuf);

impl TempDb {
    fn new() -> Self {
        TempDb(std::env::temp_dir().join(format!("till-{}.db", Uuid::new_v4())))
    }

    async fn open(&self) -> Database {
        Database::new(DbConfig::new(&self.0).max_connections(8))
            .await
            .unwrap()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

#[tokio::test]
async fn test_cash_sale_with_change_moves_the_drawer() {
    let till = till().await;
    let session = till
        .desk
        .open_session(&company(), &cashier(), money("200"), None)
        .await
        .unwrap();

    let receipt = till
        .checkout
        .checkout(sale("150", &["CASH"], &["200"]), &cashier())
        .await
        .unwrap();

    assert_eq!(receipt.change_total, money("50"));
    assert_eq!(receipt.primary_method.as_str(), "CASH");
    assert_eq!(receipt.session_id.as_deref(), Some(session.id.as_str()));
    // payment entry plus change exit
    assert_eq!(receipt.movements_posted, 2);

    let report = till
        .reports
        .session_report("company-1", &session.id)
        .await
        .unwrap();
    assert_eq!(report.total_entries, money("200"));
    assert_eq!(report.total_exits, money("50"));
    assert_eq!(report.expected_balance, money("350"));
    assert_eq!(report.sale_count, 1);
}

#[tokio::test]
async fn test_split_payment_is_multi() {
    let till = till().await;
    let session = till
        .desk
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();

    let receipt = till
        .checkout
        .checkout(sale("80", &["PIX", "CASH"], &["30", "60"]), &cashier())
        .await
        .unwrap();

    assert!(receipt.primary_method.is_multi());
    assert_eq!(receipt.allocations[0].applied, money("30"));
    assert_eq!(receipt.allocations[1].applied, money("50"));
    assert_eq!(receipt.allocations[1].change, money("10"));

    let report = till
        .reports
        .session_report("company-1", &session.id)
        .await
        .unwrap();
    let pix = report
        .payment_totals
        .iter()
        .find(|t| t.method == PaymentMethodCode::new("PIX"))
        .unwrap();
    assert_eq!(pix.total_applied, money("30"));
    assert_eq!(report.expected_balance, money("80"));
}

#[tokio::test]
async fn test_close_reconciliation_reports_shortfall() {
    let till = till().await;
    let session = till
        .desk
        .open_session(&company(), &cashier(), money("100"), None)
        .await
        .unwrap();
    till.checkout
        .checkout(sale("25", &["CASH"], &["25"]), &cashier())
        .await
        .unwrap();
    till.desk
        .post_manual_movement(
            &session.id,
            ManualMovementInput {
                movement_type: MovementType::Entry,
                amount: money("10"),
                payment_method: Some(PaymentMethodCode::new("CASH")),
                description: "Float top-up".to_string(),
                note: None,
            },
            &cashier(),
        )
        .await
        .unwrap();

    let facts = till
        .desk
        .close_session(&session.id, &cashier(), money("130"), None)
        .await
        .unwrap();
    assert_eq!(facts.expected_balance, money("135"));
    assert_eq!(facts.difference, money("-5.00"));

    let report = till
        .reports
        .session_report("company-1", &session.id)
        .await
        .unwrap();
    assert_eq!(report.status, SessionStatus::Closed);
    assert_eq!(report.closing_amount, Some(money("130")));
    assert_eq!(report.difference, Some(money("-5")));
    assert_eq!(report.manual_movements.len(), 1);
}

#[tokio::test]
async fn test_one_open_session_per_company_holds_in_storage() {
    let till = till().await;
    till.desk
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();

    let err = till
        .desk
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyOpen);

    // Bypass the service check: the partial unique index still refuses.
    let racer = CashSession::open(&company(), &cashier(), money("0"), None, Utc::now()).unwrap();
    let mut tx = till.db.begin().await.unwrap();
    let err = SessionRepository::insert(&mut tx, racer.record())
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on("cash_sessions"));
}

#[tokio::test]
async fn test_failed_recording_leaves_no_rows() {
    let till = till().await;
    till.desk
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();

    // Build a sale that was never persisted: its payments violate the
    // foreign key and the whole posting must roll back.
    let receipt = till
        .checkout
        .checkout(sale("10", &["CASH"], &["20"]), &cashier())
        .await
        .unwrap();
    let mut ghost = receipt.sale.clone();
    ghost.id = "ghost-sale".to_string();

    let payments_before = count(&till.db, "sale_payments").await;
    let movements_before = count(&till.db, "cash_movements").await;

    let recorder = SalePaymentRecorder::new(till.db.clone(), PaymentCatalog::default());
    assert!(recorder
        .record_sale_payments(&ghost, &receipt.allocations, &cashier())
        .await
        .is_err());

    assert_eq!(count(&till.db, "sale_payments").await, payments_before);
    assert_eq!(count(&till.db, "cash_movements").await, movements_before);
}

#[tokio::test]
async fn test_sale_without_session_records_payments_only() {
    let till = till().await;

    let receipt = till
        .checkout
        .checkout(sale("40", &["CASH"], &["50"]), &cashier())
        .await
        .unwrap();

    assert_eq!(receipt.session_id, None);
    assert_eq!(count(&till.db, "sale_payments").await, 1);
    assert_eq!(count(&till.db, "cash_movements").await, 0);
}

#[tokio::test]
async fn test_required_session_blocks_checkout() {
    let till = till().await;
    let strict = till.checkout.clone().require_open_session(true);

    let err = strict
        .checkout(sale("10", &["CASH"], &["10"]), &cashier())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotOpen);
    assert_eq!(count(&till.db, "sales").await, 0);
}

#[tokio::test]
async fn test_open_table_order_blocks_close() {
    let till = till().await;
    let session = till
        .desk
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();
    till.desk
        .open_table_order("company-1", "Table 7")
        .await
        .unwrap();

    let err = till
        .desk
        .close_session(&session.id, &cashier(), money("0"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OpenOrdersExist);

    let still_open = till.desk.find_open_session("company-1").await.unwrap();
    assert!(still_open.is_some());
}

#[tokio::test]
async fn test_report_of_foreign_session_is_not_found() {
    let till = till().await;
    let session = till
        .desk
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();

    let err = till
        .reports
        .session_report("company-2", &session.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_all_succeed() {
    const SALES: usize = 8;

    let file = TempDb::new();
    let db = file.open().await;
    let catalog = PaymentCatalog::default();
    let session = CashDeskService::new(db.clone(), catalog.clone())
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();

    let tasks: Vec<_> = (0..SALES)
        .map(|_| {
            let checkout = CheckoutService::new(db.clone(), catalog.clone());
            tokio::spawn(async move {
                checkout
                    .checkout(sale("10", &["CASH"], &["20"]), &cashier())
                    .await
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for task in tasks {
        let receipt = task.await.unwrap().unwrap();
        assert_eq!(receipt.session_id.as_deref(), Some(session.id.as_str()));
        assert_eq!(receipt.movements_posted, 2);
        codes.insert(receipt.sale.code);
    }
    assert_eq!(codes.len(), SALES);

    let movements = db.movements().list_for_session(&session.id).await.unwrap();
    assert_eq!(movements.len(), 2 * SALES);

    let report = ReportService::new(db.clone(), catalog)
        .session_report("company-1", &session.id)
        .await
        .unwrap();
    assert_eq!(report.sale_count, SALES);
    assert_eq!(report.expected_balance, Money::from_cents(10_00 * SALES as i64));

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_leave_one_session() {
    const OPENERS: usize = 6;

    let file = TempDb::new();
    let db = file.open().await;
    let catalog = PaymentCatalog::default();

    let tasks: Vec<_> = (0..OPENERS)
        .map(|_| {
            let desk = CashDeskService::new(db.clone(), catalog.clone());
            tokio::spawn(async move {
                desk.open_session(&company(), &cashier(), money("100"), None)
                    .await
            })
        })
        .collect();

    let mut opened = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => opened += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::AlreadyOpen),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(count(&db, "cash_sessions").await, 1);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reports_during_checkouts_are_consistent() {
    const SALES: usize = 6;

    let file = TempDb::new();
    let db = file.open().await;
    let catalog = PaymentCatalog::default();
    let session = CashDeskService::new(db.clone(), catalog.clone())
        .open_session(&company(), &cashier(), money("0"), None)
        .await
        .unwrap();

    let mut sales = Vec::new();
    let mut reports = Vec::new();
    for _ in 0..SALES {
        let checkout = CheckoutService::new(db.clone(), catalog.clone());
        sales.push(tokio::spawn(async move {
            checkout
                .checkout(sale("10", &["CASH"], &["20"]), &cashier())
                .await
        }));

        let service = ReportService::new(db.clone(), catalog.clone());
        let session_id = session.id.clone();
        reports.push(tokio::spawn(async move {
            service.session_report("company-1", &session_id).await
        }));
    }

    for task in sales {
        task.await.unwrap().unwrap();
    }

    // Movements, sales and payments of one report come from one snapshot.
    for task in reports {
        let report = task.await.unwrap().unwrap();
        let sold = report.sale_count as i64;
        let applied: Money = report.payment_totals.iter().map(|t| t.total_applied).sum();

        assert_eq!(report.total_entries, Money::from_cents(20_00 * sold));
        assert_eq!(report.total_exits, Money::from_cents(10_00 * sold));
        assert_eq!(applied, Money::from_cents(10_00 * sold));
    }

    db.close().await;
}
