use crate::Database;
use crate::models::{CampaignRow, CampaignStatsRow, CampaignUpdateRow};
use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;

const CAMPAIGN_COLUMNS: &str = "id, founder_id, business_profile_id, title, pitch,
    funding_goal_cents, minimum_investment_cents, deadline, status,
    discount_rate_bps, valuation_cap_cents, private_link, team, use_of_funds,
    created_at, updated_at";

impl Database {
    // -- Campaigns --

    #[allow(clippy::too_many_arguments)]
    pub fn create_campaign(
        &self,
        id: &str,
        founder_id: &str,
        business_profile_id: Option<&str>,
        title: &str,
        pitch: &str,
        funding_goal_cents: i64,
        minimum_investment_cents: i64,
        deadline: Option<&str>,
        discount_rate_bps: i64,
        valuation_cap_cents: i64,
        private_link: &str,
        team: Option<&str>,
        use_of_funds: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO campaigns
                     (id, founder_id, business_profile_id, title, pitch, funding_goal_cents,
                      minimum_investment_cents, deadline, discount_rate_bps, valuation_cap_cents,
                      private_link, team, use_of_funds)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    id,
                    founder_id,
                    business_profile_id,
                    title,
                    pitch,
                    funding_goal_cents,
                    minimum_investment_cents,
                    deadline,
                    discount_rate_bps,
                    valuation_cap_cents,
                    private_link,
                    team,
                    use_of_funds
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_campaign(&self, id: &str) -> Result<Option<CampaignRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM campaigns WHERE id = ?1", CAMPAIGN_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_campaign).optional()?;
            Ok(row)
        })
    }

    pub fn get_campaign_by_private_link(&self, token: &str) -> Result<Option<CampaignRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM campaigns WHERE private_link = ?1",
                CAMPAIGN_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([token], map_campaign).optional()?;
            Ok(row)
        })
    }

    pub fn list_campaigns(&self, status: Option<&str>) -> Result<Vec<CampaignRow>> {
        self.with_conn(|conn| {
            let rows = match status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {} FROM campaigns WHERE status = ?1 ORDER BY created_at DESC",
                        CAMPAIGN_COLUMNS
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([status], map_campaign)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!(
                        "SELECT {} FROM campaigns ORDER BY created_at DESC",
                        CAMPAIGN_COLUMNS
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([], map_campaign)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    pub fn update_campaign_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE campaigns SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
                rusqlite::params![id, status],
            )?;
            Ok(())
        })
    }

    /// Partial update of editable campaign fields. Signed agreements are not
    /// affected: their terms live in the safe_agreements snapshot.
    #[allow(clippy::too_many_arguments)]
    pub fn update_campaign_fields(
        &self,
        id: &str,
        title: Option<&str>,
        pitch: Option<&str>,
        deadline: Option<&str>,
        discount_rate_bps: Option<i64>,
        valuation_cap_cents: Option<i64>,
        team: Option<&str>,
        use_of_funds: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE campaigns SET
                     title = COALESCE(?2, title),
                     pitch = COALESCE(?3, pitch),
                     deadline = COALESCE(?4, deadline),
                     discount_rate_bps = COALESCE(?5, discount_rate_bps),
                     valuation_cap_cents = COALESCE(?6, valuation_cap_cents),
                     team = COALESCE(?7, team),
                     use_of_funds = COALESCE(?8, use_of_funds),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    title,
                    pitch,
                    deadline,
                    discount_rate_bps,
                    valuation_cap_cents,
                    team,
                    use_of_funds
                ],
            )?;
            Ok(())
        })
    }

    /// Raised total and distinct investor count, over completed payments only.
    /// Pending, processing, and failed investments never contribute.
    pub fn campaign_stats(&self, campaign_id: &str) -> Result<CampaignStatsRow> {
        self.with_conn(|conn| query_stats(conn, campaign_id))
    }

    /// Distinct investors with a completed payment on this campaign, used to
    /// fan out campaign-update notifications.
    pub fn campaign_investor_ids(&self, campaign_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT investor_id FROM investments
                 WHERE campaign_id = ?1 AND payment_status = 'completed'",
            )?;
            let ids = stmt
                .query_map([campaign_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    // -- Campaign updates --

    pub fn insert_campaign_update(
        &self,
        id: &str,
        campaign_id: &str,
        title: &str,
        body: &str,
        is_public: bool,
        scheduled_for: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO campaign_updates (id, campaign_id, title, body, is_public, scheduled_for)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, campaign_id, title, body, is_public, scheduled_for],
            )?;
            Ok(())
        })
    }

    pub fn list_campaign_updates(
        &self,
        campaign_id: &str,
        include_private: bool,
    ) -> Result<Vec<CampaignUpdateRow>> {
        self.with_conn(|conn| {
            let sql = if include_private {
                "SELECT id, campaign_id, title, body, is_public, scheduled_for, created_at
                 FROM campaign_updates WHERE campaign_id = ?1 ORDER BY created_at DESC"
            } else {
                "SELECT id, campaign_id, title, body, is_public, scheduled_for, created_at
                 FROM campaign_updates WHERE campaign_id = ?1 AND is_public = 1
                 ORDER BY created_at DESC"
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([campaign_id], |row| {
                    Ok(CampaignUpdateRow {
                        id: row.get(0)?,
                        campaign_id: row.get(1)?,
                        title: row.get(2)?,
                        body: row.get(3)?,
                        is_public: row.get(4)?,
                        scheduled_for: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_campaign(row: &rusqlite::Row<'_>) -> std::result::Result<CampaignRow, rusqlite::Error> {
    Ok(CampaignRow {
        id: row.get(0)?,
        founder_id: row.get(1)?,
        business_profile_id: row.get(2)?,
        title: row.get(3)?,
        pitch: row.get(4)?,
        funding_goal_cents: row.get(5)?,
        minimum_investment_cents: row.get(6)?,
        deadline: row.get(7)?,
        status: row.get(8)?,
        discount_rate_bps: row.get(9)?,
        valuation_cap_cents: row.get(10)?,
        private_link: row.get(11)?,
        team: row.get(12)?,
        use_of_funds: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn query_stats(conn: &Connection, campaign_id: &str) -> Result<CampaignStatsRow> {
    let stats = conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0), COUNT(DISTINCT investor_id)
         FROM investments
         WHERE campaign_id = ?1 AND payment_status = 'completed'",
        [campaign_id],
        |row| {
            Ok(CampaignStatsRow {
                total_raised_cents: row.get(0)?,
                investor_count: row.get(1)?,
            })
        },
    )?;
    Ok(stats)
}
