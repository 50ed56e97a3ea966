use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                    TEXT PRIMARY KEY,
            email                 TEXT NOT NULL UNIQUE,
            password              TEXT NOT NULL,
            full_name             TEXT NOT NULL,
            user_type             TEXT NOT NULL CHECK (user_type IN ('founder', 'investor')),
            country               TEXT,
            is_email_verified     INTEGER NOT NULL DEFAULT 0,
            onboarding_completed  INTEGER NOT NULL DEFAULT 0,
            created_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS business_profiles (
            id                     TEXT PRIMARY KEY,
            user_id                TEXT NOT NULL UNIQUE REFERENCES users(id),
            company_name           TEXT NOT NULL,
            sector                 TEXT NOT NULL,
            incorporation_country  TEXT NOT NULL,
            incorporation_year     INTEGER NOT NULL,
            address                TEXT,
            created_at             TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS campaigns (
            id                        TEXT PRIMARY KEY,
            founder_id                TEXT NOT NULL REFERENCES users(id),
            business_profile_id       TEXT REFERENCES business_profiles(id),
            title                     TEXT NOT NULL,
            pitch                     TEXT NOT NULL,
            funding_goal_cents        INTEGER NOT NULL,
            minimum_investment_cents  INTEGER NOT NULL DEFAULT 2500,
            deadline                  TEXT,
            status                    TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'active', 'paused', 'closed', 'funded', 'cancelled')),
            discount_rate_bps         INTEGER NOT NULL,
            valuation_cap_cents       INTEGER NOT NULL,
            private_link              TEXT NOT NULL UNIQUE,
            team                      TEXT,
            use_of_funds              TEXT,
            created_at                TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at                TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_campaigns_founder
            ON campaigns(founder_id);
        CREATE INDEX IF NOT EXISTS idx_campaigns_status
            ON campaigns(status);

        CREATE TABLE IF NOT EXISTS investments (
            id                  TEXT PRIMARY KEY,
            campaign_id         TEXT NOT NULL REFERENCES campaigns(id),
            investor_id         TEXT NOT NULL REFERENCES users(id),
            amount_cents        INTEGER NOT NULL,
            platform_fee_cents  INTEGER NOT NULL,
            total_cents         INTEGER NOT NULL
                CHECK (total_cents = amount_cents + platform_fee_cents),
            status              TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'committed', 'paid', 'completed', 'cancelled')),
            payment_status      TEXT NOT NULL DEFAULT 'pending'
                CHECK (payment_status IN ('pending', 'processing', 'completed', 'failed')),
            terms_accepted      INTEGER NOT NULL DEFAULT 0,
            agreement_signed    INTEGER NOT NULL DEFAULT 0,
            signed_at           TEXT,
            ip_address          TEXT,
            processor           TEXT,
            transaction_id      TEXT UNIQUE,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_investments_campaign
            ON investments(campaign_id, payment_status);
        CREATE INDEX IF NOT EXISTS idx_investments_investor
            ON investments(investor_id, created_at);

        CREATE TABLE IF NOT EXISTS safe_agreements (
            id                  TEXT PRIMARY KEY,
            investment_id       TEXT NOT NULL UNIQUE REFERENCES investments(id),
            investor_signature  TEXT,
            founder_signature   TEXT,
            terms               TEXT NOT NULL,
            status              TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'signed', 'completed')),
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS campaign_updates (
            id             TEXT PRIMARY KEY,
            campaign_id    TEXT NOT NULL REFERENCES campaigns(id),
            title          TEXT NOT NULL,
            body           TEXT NOT NULL,
            is_public      INTEGER NOT NULL DEFAULT 0,
            scheduled_for  TEXT,
            created_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_updates_campaign
            ON campaign_updates(campaign_id, created_at);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL,
            title       TEXT NOT NULL,
            message     TEXT NOT NULL,
            metadata    TEXT,
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);

        CREATE TABLE IF NOT EXISTS file_uploads (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            filename    TEXT NOT NULL,
            mime_type   TEXT NOT NULL,
            size_bytes  INTEGER NOT NULL,
            url         TEXT NOT NULL,
            kind        TEXT NOT NULL
                CHECK (kind IN ('pitch_deck', 'logo', 'profile_photo', 'safe_agreement')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
