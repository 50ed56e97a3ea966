use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgreementError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),
}

/// Inputs for one filled agreement. All money in cents, rates in basis points.
#[derive(Debug, Clone)]
pub struct AgreementParams {
    pub company_name: String,
    pub investor_name: String,
    pub amount_cents: i64,
    pub discount_rate_bps: i64,
    pub valuation_cap_cents: i64,
    pub governing_law: String,
    pub agreement_date: DateTime<Utc>,
}

/// Fixed SAFE text. Pure field substitution, no per-jurisdiction logic:
/// only the governing-law line varies with its input.
const TEMPLATE: &str = "\
SIMPLE AGREEMENT FOR FUTURE EQUITY

THIS CERTIFIES THAT in exchange for the payment by {investor_name} (the
\"Investor\") of {amount} (the \"Purchase Amount\") on or about
{date}, {company_name} (the \"Company\"), hereby issues to
the Investor the right to certain shares of the Company's capital stock,
subject to the terms set forth below.

1. TERMS. The \"Valuation Cap\" is {valuation_cap}. The \"Discount
   Rate\" is {discount_rate}.

2. EQUITY FINANCING. If there is an Equity Financing before the
   termination of this Safe, on the initial closing of such Equity
   Financing, this Safe will automatically convert into the number of
   shares of Safe Preferred Stock equal to the Purchase Amount divided
   by the Conversion Price.

3. DISSOLUTION EVENT. If there is a Dissolution Event before the
   termination of this Safe, the Investor will automatically be entitled
   to receive a portion of Proceeds equal to the Purchase Amount, due
   and payable to the Investor immediately prior to the consummation of
   the Dissolution Event.

4. GOVERNING LAW. This Safe and all rights and obligations hereunder
   are governed by the laws of {governing_law}, without regard to
   conflicts of law principles.

IN WITNESS WHEREOF, the undersigned have caused this Safe to be duly
executed and delivered.

COMPANY: {company_name}
INVESTOR: {investor_name}
DATE: {date}
";

/// Deterministically fill the SAFE template. Fails only on missing or
/// nonsensical required fields.
pub fn generate_agreement(params: &AgreementParams) -> Result<String, AgreementError> {
    if params.company_name.trim().is_empty() {
        return Err(AgreementError::MissingField("company_name"));
    }
    if params.investor_name.trim().is_empty() {
        return Err(AgreementError::MissingField("investor_name"));
    }
    if params.governing_law.trim().is_empty() {
        return Err(AgreementError::MissingField("governing_law"));
    }
    if params.amount_cents <= 0 {
        return Err(AgreementError::NonPositiveAmount(params.amount_cents));
    }

    let doc = TEMPLATE
        .replace("{company_name}", params.company_name.trim())
        .replace("{investor_name}", params.investor_name.trim())
        .replace("{amount}", &format_usd(params.amount_cents))
        .replace("{valuation_cap}", &format_usd(params.valuation_cap_cents))
        .replace("{discount_rate}", &format_bps(params.discount_rate_bps))
        .replace("{governing_law}", params.governing_law.trim())
        .replace("{date}", &params.agreement_date.format("%B %-d, %Y").to_string());

    Ok(doc)
}

/// $1,234.56 from 123456 cents.
pub fn format_usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = cents / 100;
    let rem = cents % 100;

    let mut grouped = String::new();
    let digits = dollars.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}${}.{:02}", sign, grouped, rem)
}

/// "20%" from 2000 basis points; keeps fractional percents exact.
pub fn format_bps(bps: i64) -> String {
    if bps % 100 == 0 {
        format!("{}%", bps / 100)
    } else {
        format!("{}.{:02}%", bps / 100, (bps % 100).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> AgreementParams {
        AgreementParams {
            company_name: "Acme Robotics Inc.".into(),
            investor_name: "Ada Lovelace".into(),
            amount_cents: 10_000,
            discount_rate_bps: 2000,
            valuation_cap_cents: 100_000_000,
            governing_law: "the State of Delaware".into(),
            agreement_date: chrono::Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn fills_every_placeholder() {
        let doc = generate_agreement(&params()).unwrap();
        assert!(doc.contains("Acme Robotics Inc."));
        assert!(doc.contains("Ada Lovelace"));
        assert!(doc.contains("$100.00"));
        assert!(doc.contains("$1,000,000.00"));
        assert!(doc.contains("20%"));
        assert!(doc.contains("the State of Delaware"));
        assert!(doc.contains("March 15, 2026"));
        assert!(!doc.contains('{'), "unfilled placeholder left in document");
    }

    #[test]
    fn generation_is_deterministic() {
        let p = params();
        assert_eq!(generate_agreement(&p).unwrap(), generate_agreement(&p).unwrap());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut p = params();
        p.investor_name = "   ".into();
        assert!(matches!(
            generate_agreement(&p),
            Err(AgreementError::MissingField("investor_name"))
        ));

        let mut p = params();
        p.company_name.clear();
        assert!(matches!(
            generate_agreement(&p),
            Err(AgreementError::MissingField("company_name"))
        ));

        let mut p = params();
        p.amount_cents = 0;
        assert!(matches!(
            generate_agreement(&p),
            Err(AgreementError::NonPositiveAmount(0))
        ));
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(2_500), "$25.00");
        assert_eq!(format_usd(123_456), "$1,234.56");
        assert_eq!(format_usd(10_000_000_000), "$100,000,000.00");
        assert_eq!(format_bps(2000), "20%");
        assert_eq!(format_bps(1250), "12.50%");
    }
}
