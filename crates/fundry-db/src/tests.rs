use crate::Database;
use crate::queries::{CompletionOutcome, MarkReadOutcome};

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

fn seed_user(db: &Database, id: &str, email: &str, user_type: &str) {
    db.create_user(id, email, "$argon2$hash", "Test User", user_type, None)
        .unwrap();
}

fn seed_campaign(db: &Database, id: &str, founder_id: &str) {
    db.create_campaign(
        id,
        founder_id,
        None,
        "Solar Micro-Grid",
        "Pay-as-you-go solar for rural communities.",
        5_000_000, // $50,000 goal
        2_500,     // $25 minimum
        None,
        2000,          // 20% discount
        100_000_000,   // $1M valuation cap
        &format!("link-{}", id),
        None,
        None,
    )
    .unwrap();
}

fn seed_investment(db: &Database, id: &str, campaign_id: &str, investor_id: &str, amount: i64) {
    let fee = amount * 2 / 100;
    db.create_investment(id, campaign_id, investor_id, amount, fee, amount + fee)
        .unwrap();
}

#[test]
fn investment_total_must_equal_amount_plus_fee() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "investor@example.com", "investor");
    seed_campaign(&db, "c1", "f1");

    // Mismatched total is rejected before it reaches SQLite
    let err = db.create_investment("inv1", "c1", "i1", 10_000, 200, 10_300);
    assert!(err.is_err());

    db.create_investment("inv1", "c1", "i1", 10_000, 200, 10_200)
        .unwrap();
    let inv = db.get_investment("inv1").unwrap().unwrap();
    assert_eq!(inv.total_cents, inv.amount_cents + inv.platform_fee_cents);
}

#[test]
fn stats_count_only_completed_payments() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_user(&db, "i2", "b@example.com", "investor");
    seed_campaign(&db, "c1", "f1");

    seed_investment(&db, "inv1", "c1", "i1", 10_000);
    seed_investment(&db, "inv2", "c1", "i2", 20_000);
    seed_investment(&db, "inv3", "c1", "i1", 5_000); // stays pending

    for (inv, txn) in [("inv1", "tx1"), ("inv2", "tx2")] {
        db.sign_investment(inv, &format!("agr-{}", inv), "A Name", "{}", "2026-01-01", None)
            .unwrap();
        db.begin_payment(inv, "stripe", txn).unwrap();
        let (outcome, _) = db.apply_payment_callback(txn, true).unwrap();
        assert_eq!(outcome, CompletionOutcome::Completed);
    }

    let stats = db.campaign_stats("c1").unwrap();
    assert_eq!(stats.total_raised_cents, 30_000);
    assert_eq!(stats.investor_count, 2);
}

#[test]
fn completed_investments_are_always_signed() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_campaign(&db, "c1", "f1");
    seed_investment(&db, "inv1", "c1", "i1", 10_000);

    db.sign_investment("inv1", "agr1", "Ada Lovelace", "{}", "2026-01-01", Some("10.0.0.1"))
        .unwrap();
    db.begin_payment("inv1", "stripe", "tx1").unwrap();
    db.apply_payment_callback("tx1", true).unwrap();

    let inv = db.get_investment("inv1").unwrap().unwrap();
    assert_eq!(inv.status, "completed");
    assert!(inv.agreement_signed);
    assert_eq!(inv.signed_at.as_deref(), Some("2026-01-01"));
}

#[test]
fn payment_callback_is_idempotent() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_campaign(&db, "c1", "f1");
    seed_investment(&db, "inv1", "c1", "i1", 10_000);

    db.sign_investment("inv1", "agr1", "Ada Lovelace", "{}", "2026-01-01", None)
        .unwrap();
    db.begin_payment("inv1", "stripe", "tx1").unwrap();

    let (first, _) = db.apply_payment_callback("tx1", true).unwrap();
    assert_eq!(first, CompletionOutcome::Completed);

    // Replay: short-circuits, no state change, no second side effects
    let (second, row) = db.apply_payment_callback("tx1", true).unwrap();
    assert_eq!(second, CompletionOutcome::AlreadyCompleted);
    assert_eq!(row.unwrap().payment_status, "completed");

    // A late "failed" callback can't revert a completed payment
    let (late, row) = db.apply_payment_callback("tx1", false).unwrap();
    assert_eq!(late, CompletionOutcome::AlreadyCompleted);
    assert_eq!(row.unwrap().payment_status, "completed");

    let stats = db.campaign_stats("c1").unwrap();
    assert_eq!(stats.total_raised_cents, 10_000);
}

#[test]
fn failed_payment_stays_resumable() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_campaign(&db, "c1", "f1");
    seed_investment(&db, "inv1", "c1", "i1", 10_000);

    db.sign_investment("inv1", "agr1", "Ada Lovelace", "{}", "2026-01-01", None)
        .unwrap();
    db.begin_payment("inv1", "stripe", "tx1").unwrap();
    let (outcome, _) = db.apply_payment_callback("tx1", false).unwrap();
    assert_eq!(outcome, CompletionOutcome::Failed);

    let inv = db.get_investment("inv1").unwrap().unwrap();
    assert_eq!(inv.payment_status, "failed");
    assert_eq!(inv.status, "committed");

    // Retry with a fresh transaction id succeeds
    db.begin_payment("inv1", "budpay", "tx2").unwrap();
    let (outcome, _) = db.apply_payment_callback("tx2", true).unwrap();
    assert_eq!(outcome, CompletionOutcome::Completed);
}

#[test]
fn unknown_transaction_is_reported() {
    let db = db();
    let (outcome, row) = db.apply_payment_callback("no-such-tx", true).unwrap();
    assert_eq!(outcome, CompletionOutcome::UnknownTransaction);
    assert!(row.is_none());
}

#[test]
fn terms_snapshot_survives_campaign_edits() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_campaign(&db, "c1", "f1");
    seed_investment(&db, "inv1", "c1", "i1", 10_000);

    let terms = r#"{"discount_rate_bps":2000,"valuation_cap_cents":100000000}"#;
    db.sign_investment("inv1", "agr1", "Ada Lovelace", terms, "2026-01-01", None)
        .unwrap();

    // Founder doubles the valuation cap after signing
    db.update_campaign_fields("c1", None, None, None, None, Some(200_000_000), None, None)
        .unwrap();

    let agreement = db.get_agreement_by_investment("inv1").unwrap().unwrap();
    assert_eq!(agreement.terms, terms);
    assert_eq!(agreement.status, "signed");

    let campaign = db.get_campaign("c1").unwrap().unwrap();
    assert_eq!(campaign.valuation_cap_cents, 200_000_000);
}

#[test]
fn expire_stale_pending_skips_signed_investments() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_campaign(&db, "c1", "f1");

    // Backdate two investments past the expiry window
    seed_investment(&db, "old-pending", "c1", "i1", 10_000);
    seed_investment(&db, "old-committed", "c1", "i1", 10_000);
    db.with_conn_mut(|conn| {
        conn.execute(
            "UPDATE investments SET created_at = datetime('now', '-30 days')",
            [],
        )?;
        Ok(())
    })
    .unwrap();
    db.sign_investment("old-committed", "agr1", "Ada Lovelace", "{}", "2026-01-01", None)
        .unwrap();

    // And one fresh pledge that must be untouched
    seed_investment(&db, "fresh", "c1", "i1", 5_000);

    let expired = db.expire_stale_pending(14).unwrap();
    assert_eq!(expired, 1);

    assert_eq!(
        db.get_investment("old-pending").unwrap().unwrap().status,
        "cancelled"
    );
    assert_eq!(
        db.get_investment("old-committed").unwrap().unwrap().status,
        "committed"
    );
    assert_eq!(db.get_investment("fresh").unwrap().unwrap().status, "pending");
}

#[test]
fn founder_counter_signature_is_recorded() {
    let db = db();
    seed_user(&db, "f1", "founder@example.com", "founder");
    seed_user(&db, "i1", "a@example.com", "investor");
    seed_campaign(&db, "c1", "f1");
    seed_investment(&db, "inv1", "c1", "i1", 10_000);

    db.sign_investment("inv1", "agr1", "Ada Lovelace", "{}", "2026-01-01", None)
        .unwrap();
    db.counter_sign_agreement("agr1", "Grace Hopper").unwrap();

    let agreement = db.get_agreement_by_investment("inv1").unwrap().unwrap();
    assert_eq!(agreement.investor_signature.as_deref(), Some("Ada Lovelace"));
    assert_eq!(agreement.founder_signature.as_deref(), Some("Grace Hopper"));
}

#[test]
fn file_upload_metadata_roundtrip() {
    let db = db();
    seed_user(&db, "u1", "a@example.com", "founder");

    db.record_file_upload(
        "file1",
        "u1",
        "deck.pdf",
        "application/pdf",
        1_048_576,
        "https://storage.example.com/deck.pdf",
        "pitch_deck",
    )
    .unwrap();

    let files = db.list_file_uploads("u1").unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].kind, "pitch_deck");

    // Kind outside the CHECK constraint is rejected
    assert!(
        db.record_file_upload("file2", "u1", "x", "text/plain", 1, "https://x", "malware")
            .is_err()
    );
}

#[test]
fn mark_all_read_clears_unread_count() {
    let db = db();
    seed_user(&db, "u1", "a@example.com", "investor");
    seed_user(&db, "u2", "b@example.com", "investor");

    db.insert_notification("n1", "u1", "investment_confirmed", "Confirmed", "msg", None)
        .unwrap();
    db.insert_notification("n2", "u1", "campaign_update", "Update", "msg", None)
        .unwrap();
    db.insert_notification("n3", "u2", "campaign_update", "Update", "msg", None)
        .unwrap();

    assert_eq!(db.unread_notification_count("u1").unwrap(), 2);

    db.mark_all_notifications_read("u1").unwrap();
    assert_eq!(db.unread_notification_count("u1").unwrap(), 0);
    for n in db.list_notifications("u1").unwrap() {
        assert!(n.is_read);
    }

    // Other users' notifications untouched
    assert_eq!(db.unread_notification_count("u2").unwrap(), 1);

    // Idempotent
    assert_eq!(db.mark_all_notifications_read("u1").unwrap(), 0);
}

#[test]
fn mark_read_enforces_ownership() {
    let db = db();
    seed_user(&db, "u1", "a@example.com", "investor");
    seed_user(&db, "u2", "b@example.com", "investor");
    db.insert_notification("n1", "u1", "campaign_update", "Update", "msg", None)
        .unwrap();

    assert_eq!(
        db.mark_notification_read("n1", "u2").unwrap(),
        MarkReadOutcome::NotOwner
    );
    assert_eq!(
        db.mark_notification_read("missing", "u1").unwrap(),
        MarkReadOutcome::Missing
    );
    assert_eq!(
        db.mark_notification_read("n1", "u1").unwrap(),
        MarkReadOutcome::Updated
    );
    // Second call is a no-op success
    assert_eq!(
        db.mark_notification_read("n1", "u1").unwrap(),
        MarkReadOutcome::Updated
    );
}
