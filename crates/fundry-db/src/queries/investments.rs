use crate::Database;
use crate::models::{InvestmentListRow, InvestmentRow, SafeAgreementRow};
use anyhow::{Result, bail};
use rusqlite::Connection;

use super::OptionalExt;

const INVESTMENT_COLUMNS: &str = "id, campaign_id, investor_id, amount_cents,
    platform_fee_cents, total_cents, status, payment_status, terms_accepted,
    agreement_signed, signed_at, ip_address, processor, transaction_id, created_at";

/// Result of applying a payment callback.
#[derive(Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// First successful callback for this transaction — side effects
    /// (notifications) should fire.
    Completed,
    /// Transaction already completed earlier; nothing changed.
    AlreadyCompleted,
    /// Processor reported failure; investment stays resumable.
    Failed,
    /// No investment carries this transaction id.
    UnknownTransaction,
}

impl Database {
    // -- Investments --

    pub fn create_investment(
        &self,
        id: &str,
        campaign_id: &str,
        investor_id: &str,
        amount_cents: i64,
        platform_fee_cents: i64,
        total_cents: i64,
    ) -> Result<()> {
        if total_cents != amount_cents + platform_fee_cents {
            bail!(
                "total {} != amount {} + fee {}",
                total_cents,
                amount_cents,
                platform_fee_cents
            );
        }
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO investments
                     (id, campaign_id, investor_id, amount_cents, platform_fee_cents, total_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id,
                    campaign_id,
                    investor_id,
                    amount_cents,
                    platform_fee_cents,
                    total_cents
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_investment(&self, id: &str) -> Result<Option<InvestmentRow>> {
        self.with_conn(|conn| query_investment(conn, id))
    }

    pub fn list_investments_by_investor(&self, investor_id: &str) -> Result<Vec<InvestmentListRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.campaign_id, i.investor_id, i.amount_cents,
                        i.platform_fee_cents, i.total_cents, i.status, i.payment_status,
                        i.terms_accepted, i.agreement_signed, i.signed_at, i.ip_address,
                        i.processor, i.transaction_id, i.created_at, c.title
                 FROM investments i
                 JOIN campaigns c ON i.campaign_id = c.id
                 WHERE i.investor_id = ?1
                 ORDER BY i.created_at DESC",
            )?;

            let rows = stmt
                .query_map([investor_id], |row| {
                    Ok(InvestmentListRow {
                        investment: map_investment(row)?,
                        campaign_title: row.get(15)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn accept_terms(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE investments SET terms_accepted = 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    /// Signature step: commits the investment and creates the agreement row
    /// with a terms snapshot, in one transaction so a crash can't leave a
    /// committed investment without its agreement.
    pub fn sign_investment(
        &self,
        investment_id: &str,
        agreement_id: &str,
        investor_signature: &str,
        terms_json: &str,
        signed_at: &str,
        ip_address: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE investments
                 SET status = 'committed', agreement_signed = 1, signed_at = ?2, ip_address = ?3
                 WHERE id = ?1",
                rusqlite::params![investment_id, signed_at, ip_address],
            )?;
            tx.execute(
                "INSERT INTO safe_agreements
                     (id, investment_id, investor_signature, terms, status)
                 VALUES (?1, ?2, ?3, ?4, 'signed')",
                rusqlite::params![agreement_id, investment_id, investor_signature, terms_json],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Payment step: record the processor and its transaction id, move
    /// payment_status to processing. Allowed from pending (first attempt)
    /// or failed (retry).
    pub fn begin_payment(&self, id: &str, processor: &str, transaction_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE investments
                 SET processor = ?2, transaction_id = ?3, payment_status = 'processing'
                 WHERE id = ?1 AND payment_status IN ('pending', 'failed')",
                rusqlite::params![id, processor, transaction_id],
            )?;
            if changed == 0 {
                bail!("investment {} is not payable in its current state", id);
            }
            Ok(())
        })
    }

    /// Idempotent completion handler keyed by the processor's transaction id.
    /// At-most-once semantics: a completed payment short-circuits, so double
    /// callbacks can't double-count totals or duplicate notifications.
    pub fn apply_payment_callback(
        &self,
        transaction_id: &str,
        success: bool,
    ) -> Result<(CompletionOutcome, Option<InvestmentRow>)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let sql = format!(
                "SELECT {} FROM investments WHERE transaction_id = ?1",
                INVESTMENT_COLUMNS
            );
            let existing = tx
                .query_row(&sql, [transaction_id], map_investment)
                .optional()?;

            let Some(inv) = existing else {
                return Ok((CompletionOutcome::UnknownTransaction, None));
            };

            if inv.payment_status == "completed" {
                tx.commit()?;
                return Ok((CompletionOutcome::AlreadyCompleted, Some(inv)));
            }

            let outcome = if success {
                tx.execute(
                    "UPDATE investments
                     SET payment_status = 'completed', status = 'completed'
                     WHERE transaction_id = ?1",
                    [transaction_id],
                )?;
                tx.execute(
                    "UPDATE safe_agreements SET status = 'completed'
                     WHERE investment_id = ?1",
                    [&inv.id],
                )?;
                CompletionOutcome::Completed
            } else {
                tx.execute(
                    "UPDATE investments SET payment_status = 'failed'
                     WHERE transaction_id = ?1",
                    [transaction_id],
                )?;
                CompletionOutcome::Failed
            };

            let updated = tx.query_row(&sql, [transaction_id], map_investment)?;
            tx.commit()?;
            Ok((outcome, Some(updated)))
        })
    }

    /// Cancel pledges that were never signed and have sat pending longer than
    /// `max_age_days`. Committed (signed) investments are kept for resume.
    pub fn expire_stale_pending(&self, max_age_days: u32) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE investments
                 SET status = 'cancelled'
                 WHERE status = 'pending'
                   AND agreement_signed = 0
                   AND created_at < datetime('now', ?1)",
                [format!("-{} days", max_age_days)],
            )?;
            Ok(changed)
        })
    }

    // -- SAFE agreements --

    pub fn get_agreement_by_investment(
        &self,
        investment_id: &str,
    ) -> Result<Option<SafeAgreementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, investment_id, investor_signature, founder_signature,
                        terms, status, created_at
                 FROM safe_agreements WHERE investment_id = ?1",
            )?;

            let row = stmt
                .query_row([investment_id], |row| {
                    Ok(SafeAgreementRow {
                        id: row.get(0)?,
                        investment_id: row.get(1)?,
                        investor_signature: row.get(2)?,
                        founder_signature: row.get(3)?,
                        terms: row.get(4)?,
                        status: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Founder counter-signature, the only mutation a signed agreement admits.
    pub fn counter_sign_agreement(&self, agreement_id: &str, signature: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE safe_agreements SET founder_signature = ?2 WHERE id = ?1",
                rusqlite::params![agreement_id, signature],
            )?;
            Ok(())
        })
    }
}

fn query_investment(conn: &Connection, id: &str) -> Result<Option<InvestmentRow>> {
    let sql = format!(
        "SELECT {} FROM investments WHERE id = ?1",
        INVESTMENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], map_investment).optional()?;
    Ok(row)
}

fn map_investment(row: &rusqlite::Row<'_>) -> std::result::Result<InvestmentRow, rusqlite::Error> {
    Ok(InvestmentRow {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        investor_id: row.get(2)?,
        amount_cents: row.get(3)?,
        platform_fee_cents: row.get(4)?,
        total_cents: row.get(5)?,
        status: row.get(6)?,
        payment_status: row.get(7)?,
        terms_accepted: row.get(8)?,
        agreement_signed: row.get(9)?,
        signed_at: row.get(10)?,
        ip_address: row.get(11)?,
        processor: row.get(12)?,
        transaction_id: row.get(13)?,
        created_at: row.get(14)?,
    })
}
