use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Founder,
    Investor,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Investor => "investor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "founder" => Some(Self::Founder),
            "investor" => Some(Self::Investor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Closed,
    Funded,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Closed => "closed",
            Self::Funded => "funded",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "closed" => Some(Self::Closed),
            "funded" => Some(Self::Funded),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal states never transition again without an admin override.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Funded | Self::Cancelled)
    }

    /// A campaign is viewable through its private link once it has left draft
    /// and hasn't been cancelled.
    pub fn is_viewable(&self) -> bool {
        matches!(self, Self::Active | Self::Paused | Self::Funded | Self::Closed)
    }

    /// Founder-driven status machine:
    /// draft → active → {paused ⇄ active} → {closed, funded, cancelled}.
    /// `admin` unlocks terminal states.
    pub fn can_transition(&self, to: CampaignStatus, admin: bool) -> bool {
        if admin {
            return *self != to;
        }
        match (self, to) {
            (Self::Draft, Self::Active) => true,
            (Self::Draft, Self::Cancelled) => true,
            (Self::Active, Self::Paused) => true,
            (Self::Paused, Self::Active) => true,
            (Self::Active | Self::Paused, Self::Closed) => true,
            (Self::Active | Self::Paused, Self::Funded) => true,
            (Self::Active | Self::Paused, Self::Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Pending,
    Committed,
    Paid,
    Completed,
    Cancelled,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "committed" => Some(Self::Committed),
            "paid" => Some(Self::Paid),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment status moves strictly forward:
/// pending → processing → {completed, failed}. A failed payment may be
/// retried (back to processing), but completed never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn can_advance(&self, to: PaymentStatus) -> bool {
        match (self, to) {
            (Self::Pending, Self::Processing) => true,
            (Self::Processing, Self::Completed) => true,
            (Self::Processing, Self::Failed) => true,
            (Self::Failed, Self::Processing) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Draft,
    Signed,
    Completed,
}

impl AgreementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Signed => "signed",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "signed" => Some(Self::Signed),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Payment processor handling a given investment's checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processor {
    Stripe,
    Budpay,
}

impl Processor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Budpay => "budpay",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stripe" => Some(Self::Stripe),
            "budpay" => Some(Self::Budpay),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_happy_path_transitions() {
        assert!(CampaignStatus::Draft.can_transition(CampaignStatus::Active, false));
        assert!(CampaignStatus::Active.can_transition(CampaignStatus::Paused, false));
        assert!(CampaignStatus::Paused.can_transition(CampaignStatus::Active, false));
        assert!(CampaignStatus::Active.can_transition(CampaignStatus::Funded, false));
        assert!(CampaignStatus::Paused.can_transition(CampaignStatus::Closed, false));
    }

    #[test]
    fn campaign_illegal_transitions() {
        assert!(!CampaignStatus::Draft.can_transition(CampaignStatus::Funded, false));
        assert!(!CampaignStatus::Draft.can_transition(CampaignStatus::Paused, false));
        assert!(!CampaignStatus::Closed.can_transition(CampaignStatus::Active, false));
        assert!(!CampaignStatus::Funded.can_transition(CampaignStatus::Active, false));
        assert!(!CampaignStatus::Cancelled.can_transition(CampaignStatus::Active, false));
    }

    #[test]
    fn admin_override_unlocks_terminal_states() {
        assert!(CampaignStatus::Closed.can_transition(CampaignStatus::Active, true));
        assert!(CampaignStatus::Funded.can_transition(CampaignStatus::Closed, true));
        // No-op transition is still rejected
        assert!(!CampaignStatus::Closed.can_transition(CampaignStatus::Closed, true));
    }

    #[test]
    fn payment_status_is_monotonic() {
        assert!(PaymentStatus::Pending.can_advance(PaymentStatus::Processing));
        assert!(PaymentStatus::Processing.can_advance(PaymentStatus::Completed));
        assert!(PaymentStatus::Processing.can_advance(PaymentStatus::Failed));
        // Retry after failure is allowed
        assert!(PaymentStatus::Failed.can_advance(PaymentStatus::Processing));
        // Completed never reverts
        assert!(!PaymentStatus::Completed.can_advance(PaymentStatus::Processing));
        assert!(!PaymentStatus::Completed.can_advance(PaymentStatus::Failed));
        assert!(!PaymentStatus::Completed.can_advance(PaymentStatus::Pending));
        // No skipping straight to completed
        assert!(!PaymentStatus::Pending.can_advance(PaymentStatus::Completed));
    }

    #[test]
    fn status_strings_roundtrip() {
        for s in [
            CampaignStatus::Draft,
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Closed,
            CampaignStatus::Funded,
            CampaignStatus::Cancelled,
        ] {
            assert_eq!(CampaignStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(CampaignStatus::parse("bogus"), None);
    }
}
