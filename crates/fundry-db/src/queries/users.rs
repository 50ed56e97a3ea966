use crate::Database;
use crate::models::{BusinessProfileRow, FileUploadRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
        user_type: &str,
        country: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, full_name, user_type, country)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, email, password_hash, full_name, user_type, country],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn set_onboarding_completed(&self, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET onboarding_completed = 1 WHERE id = ?1",
                [user_id],
            )?;
            Ok(())
        })
    }

    // -- Business profiles --

    #[allow(clippy::too_many_arguments)]
    pub fn upsert_business_profile(
        &self,
        id: &str,
        user_id: &str,
        company_name: &str,
        sector: &str,
        incorporation_country: &str,
        incorporation_year: i32,
        address: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO business_profiles
                     (id, user_id, company_name, sector, incorporation_country, incorporation_year, address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                     company_name = excluded.company_name,
                     sector = excluded.sector,
                     incorporation_country = excluded.incorporation_country,
                     incorporation_year = excluded.incorporation_year,
                     address = excluded.address",
                rusqlite::params![
                    id,
                    user_id,
                    company_name,
                    sector,
                    incorporation_country,
                    incorporation_year,
                    address
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_business_profile(&self, user_id: &str) -> Result<Option<BusinessProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, company_name, sector, incorporation_country,
                        incorporation_year, address, created_at
                 FROM business_profiles WHERE user_id = ?1",
            )?;

            let row = stmt
                .query_row([user_id], |row| {
                    Ok(BusinessProfileRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        company_name: row.get(2)?,
                        sector: row.get(3)?,
                        incorporation_country: row.get(4)?,
                        incorporation_year: row.get(5)?,
                        address: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    // -- File uploads --

    #[allow(clippy::too_many_arguments)]
    pub fn record_file_upload(
        &self,
        id: &str,
        user_id: &str,
        filename: &str,
        mime_type: &str,
        size_bytes: i64,
        url: &str,
        kind: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO file_uploads (id, user_id, filename, mime_type, size_bytes, url, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, user_id, filename, mime_type, size_bytes, url, kind],
            )?;
            Ok(())
        })
    }

    pub fn list_file_uploads(&self, user_id: &str) -> Result<Vec<FileUploadRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, filename, mime_type, size_bytes, url, kind, created_at
                 FROM file_uploads WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(FileUploadRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        filename: row.get(2)?,
                        mime_type: row.get(3)?,
                        size_bytes: row.get(4)?,
                        url: row.get(5)?,
                        kind: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is a compile-time constant from the callers above, never user input.
    let sql = format!(
        "SELECT id, email, password, full_name, user_type, country,
                is_email_verified, onboarding_completed, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                full_name: row.get(3)?,
                user_type: row.get(4)?,
                country: row.get(5)?,
                is_email_verified: row.get(6)?,
                onboarding_completed: row.get(7)?,
                created_at: row.get(8)?,
            })
        })
        .optional()?;

    Ok(row)
}
