//! Search id allocation.
//!
//! Ids read as `{domain}_{key params}_{YYYYmmddTHHMMSSZ}_{digest}`. The digest
//! is a truncated SHA-256 over the domain, the canonical params, the full
//! timestamp, and a random nonce, so identical concurrent requests still get
//! distinct ids.

use crate::schema::DomainSchema;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use waypoint_rs_protocol::{Domain, RequestParams, SearchId};

const DIGEST_HEX_LEN: usize = 12;

/// Mint a fresh id for a search.
pub fn allocate(domain: Domain, params: &RequestParams, now: DateTime<Utc>) -> SearchId {
    allocate_with_nonce(domain, params, now, Uuid::new_v4())
}

/// Deterministic form of [`allocate`] with an explicit nonce.
pub fn allocate_with_nonce(
    domain: Domain,
    params: &RequestParams,
    now: DateTime<Utc>,
    nonce: Uuid,
) -> SearchId {
    let mut hasher = Sha256::new();
    hasher.update(domain.tag().as_bytes());
    hasher.update([0u8]);
    hasher.update(params.to_value().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(now.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true).as_bytes());
    hasher.update([0u8]);
    hasher.update(nonce.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let key = DomainSchema::for_domain(domain).label_values(params).join("_");
    let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    SearchId::from_parts([
        domain.tag(),
        key.as_str(),
        stamp.as_str(),
        &digest[..DIGEST_HEX_LEN],
    ])
}

#[cfg(test)]
mod tests {
    use super::{allocate, allocate_with_nonce};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use uuid::Uuid;
    use waypoint_rs_protocol::{Domain, RequestParams};

    fn banff() -> RequestParams {
        RequestParams::new()
            .with("query", "hiking events")
            .with("location", "Banff")
    }

    #[test]
    fn id_embeds_domain_params_and_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap();
        let id = allocate(Domain::Event, &banff(), now);
        let text = id.as_str();
        assert!(
            text.starts_with("event_hiking_events_Banff_20250101T093000Z_"),
            "{text}"
        );
        assert_eq!(text.rsplit('_').next().map(str::len), Some(12));
    }

    #[test]
    fn different_params_or_times_never_collide() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap();
        let nonce = Uuid::nil();
        let other = banff().with("location", "Jasper");
        let a = allocate_with_nonce(Domain::Event, &banff(), now, nonce);
        let b = allocate_with_nonce(Domain::Event, &other, now, nonce);
        let c = allocate_with_nonce(
            Domain::Event,
            &banff(),
            now + Duration::nanoseconds(1),
            nonce,
        );
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, allocate_with_nonce(Domain::Event, &banff(), now, nonce));
    }

    #[test]
    fn identical_requests_still_get_distinct_ids() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap();
        let ids: HashSet<_> = (0..64)
            .map(|_| allocate(Domain::Hotel, &RequestParams::new(), now))
            .collect();
        assert_eq!(ids.len(), 64);
    }
}
