//! Escalation identifiers.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate an escalation id `ESC-YYYYMMDD-<32 hex>`.
///
/// The suffix is a v4 UUID (122 random bits), so ids stay collision
/// resistant without any shared counter.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use verdict::safety::generate_escalation_id;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
/// let id = generate_escalation_id(at);
/// assert!(id.starts_with("ESC-20240309-"));
/// assert_eq!(id.len(), "ESC-20240309-".len() + 32);
/// ```
pub fn generate_escalation_id(at: DateTime<Utc>) -> String {
    format!("ESC-{}-{}", at.format("%Y%m%d"), Uuid::new_v4().simple())
}
