use super::{Result, Zone, ZoneError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Holds the set of zones this instance is authoritative for.
///
/// Slave discovery and NOTIFY dispatch both read zones out of here; nothing
/// in this crate resolves ordinary queries against it.
pub struct ZoneStore {
    zones: Arc<RwLock<HashMap<String, Zone>>>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn add_zone(&self, zone: Zone) -> Result<()> {
        let origin = zone.origin.to_lowercase();
        info!("adding zone: {}", origin);

        zone.validate()?;

        let mut zones = self.zones.write();
        zones.insert(origin.clone(), zone);

        debug!("zone {} added successfully", origin);
        Ok(())
    }

    pub fn remove_zone(&self, origin: &str) -> Result<Zone> {
        let origin = origin.to_lowercase();
        info!("removing zone: {}", origin);

        let mut zones = self.zones.write();
        zones.remove(&origin).ok_or(ZoneError::ZoneNotFound(origin))
    }

    pub fn get_zone(&self, origin: &str) -> Option<Zone> {
        let origin = origin.to_lowercase();
        let zones = self.zones.read();
        zones.get(&origin).cloned()
    }

    /// Longest-origin-match lookup, same semantics a resolver would use.
    pub fn find_zone(&self, name: &str) -> Option<Zone> {
        let name_lower = name.to_lowercase();
        let zones = self.zones.read();

        let mut best_match: Option<(&String, &Zone)> = None;
        let mut best_match_len = 0;

        for (origin, zone) in zones.iter() {
            if zone.is_authoritative_for(&name_lower) {
                let origin_len = origin.len();
                if origin_len > best_match_len {
                    best_match = Some((origin, zone));
                    best_match_len = origin_len;
                }
            }
        }

        best_match.map(|(_, zone)| zone.clone())
    }

    pub fn list_zones(&self) -> Vec<String> {
        let zones = self.zones.read();
        zones.keys().cloned().collect()
    }

    pub fn zone_count(&self) -> usize {
        let zones = self.zones.read();
        zones.len()
    }

    pub fn stats(&self) -> StoreStats {
        let zones = self.zones.read();
        let mut stats = StoreStats {
            zone_count: zones.len(),
            ..Default::default()
        };

        for zone in zones.values() {
            let zone_stats = zone.stats();
            stats.total_records += zone_stats.total_records;
            stats.total_a_records += zone_stats.a_records;
            stats.total_aaaa_records += zone_stats.aaaa_records;
            stats.total_ns_records += zone_stats.ns_records;
            stats.total_soa_records += zone_stats.soa_records;
        }

        stats
    }
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics across all zones in a store.
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    pub zone_count: usize,
    pub total_records: usize,
    pub total_a_records: usize,
    pub total_aaaa_records: usize,
    pub total_ns_records: usize,
    pub total_soa_records: usize,
}
