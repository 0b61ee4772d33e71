//! Outbound caller-ID selection
//!
//! Providers reject or penalize a caller ID equal to the dialed
//! destination or to an unverified number, so the eligible pool excludes
//! the inbound caller's own number and every dial candidate before any
//! preference is applied.

/// Country-code prefix of an E.164 number. Only the prefixes the business
/// actually routes to are distinguished; everything else compares on the
/// first three characters.
fn country_prefix(number: &str) -> &str {
    if !number.starts_with('+') {
        return "";
    }
    if number.starts_with("+91") {
        return "+91";
    }
    if number.starts_with("+1") {
        return "+1";
    }
    number.get(..3).unwrap_or(number)
}

/// Pick the best outbound caller ID, or `None` to let the provider use its
/// default.
///
/// Preference order within the surviving pool: the explicitly configured
/// caller ID, then a verified number whose country prefix matches the
/// first candidate, then any remaining verified number.
pub fn select_caller_id(
    verified: &[String],
    candidates: &[String],
    incoming: Option<&str>,
    preferred: Option<&str>,
) -> Option<String> {
    let pool: Vec<&String> = verified
        .iter()
        .filter(|v| Some(v.as_str()) != incoming)
        .filter(|v| !candidates.contains(v))
        .collect();

    if let Some(preferred) = preferred {
        if pool.iter().any(|v| v.as_str() == preferred) {
            return Some(preferred.to_string());
        }
    }

    if !pool.is_empty() && !candidates.is_empty() {
        let wanted = country_prefix(&candidates[0]);
        if let Some(matched) = pool.iter().find(|v| country_prefix(v) == wanted) {
            return Some((*matched).clone());
        }
        return Some(pool[0].clone());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_preferred_caller_id_survives() {
        let verified = nums(&["+14155550100", "+14155550200"]);
        let candidates = nums(&["+919812345678"]);
        assert_eq!(
            select_caller_id(&verified, &candidates, None, Some("+14155550200")),
            Some("+14155550200".to_string())
        );
    }

    #[test]
    fn test_preferred_excluded_when_it_is_a_candidate() {
        let verified = nums(&["+14155550100", "+14155550200"]);
        let candidates = nums(&["+14155550200"]);
        assert_eq!(
            select_caller_id(&verified, &candidates, None, Some("+14155550200")),
            Some("+14155550100".to_string())
        );
    }

    #[test]
    fn test_prefix_match_preferred() {
        let verified = nums(&["+14155550100", "+919900112233"]);
        let candidates = nums(&["+919812345678"]);
        assert_eq!(
            select_caller_id(&verified, &candidates, None, None),
            Some("+919900112233".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_any_verified() {
        let verified = nums(&["+14155550100"]);
        let candidates = nums(&["+919812345678"]);
        assert_eq!(
            select_caller_id(&verified, &candidates, None, None),
            Some("+14155550100".to_string())
        );
    }

    #[test]
    fn test_caller_own_number_never_reused() {
        // The inbound caller owns the only verified number: provider default.
        let verified = nums(&["+14155550100"]);
        let candidates = nums(&["+919812345678"]);
        assert_eq!(
            select_caller_id(&verified, &candidates, Some("+14155550100"), None),
            None
        );
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let verified = nums(&["+14155550100"]);
        assert_eq!(select_caller_id(&verified, &[], None, None), None);
    }
}
