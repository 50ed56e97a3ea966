pub mod template;
pub mod terms;

pub use template::{AgreementError, AgreementParams, format_bps, format_usd, generate_agreement};
pub use terms::TermsSnapshot;
