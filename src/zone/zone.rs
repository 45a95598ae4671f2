use super::{Result, ZoneError, ZoneRecord};
use crate::dns::enums::{DNSResourceClass, DNSResourceType};
use crate::dns::resource::DNSResource;
use std::collections::HashMap;
use std::time::SystemTime;

/// A DNS zone and all of its records.
#[derive(Debug, Clone)]
pub struct Zone {
    pub origin: String,
    pub default_ttl: u32,
    pub serial: u32,
    records: HashMap<String, Vec<ZoneRecord>>,
    soa_record: Option<ZoneRecord>,
    pub class: DNSResourceClass,
    pub last_modified: SystemTime,
}

impl Zone {
    pub fn new(origin: String, default_ttl: u32) -> Self {
        Self {
            origin: origin.trim_end_matches('.').to_lowercase(),
            default_ttl,
            serial: Self::generate_serial(),
            records: HashMap::new(),
            soa_record: None,
            class: DNSResourceClass::IN,
            last_modified: SystemTime::now(),
        }
    }

    /// Date-based serial in YYYYMMDDNN format, used only when a zone has no SOA yet.
    fn generate_serial() -> u32 {
        use chrono::{Datelike, Local};

        let now = Local::now();
        now.year() as u32 * 1000000 + now.month() * 10000 + now.day() * 100
    }

    pub fn add_record(&mut self, record: ZoneRecord) -> Result<()> {
        if record.rtype == DNSResourceType::SOA {
            let parts: Vec<&str> = record.rdata.split_whitespace().collect();
            if parts.len() >= 3 {
                if let Ok(serial) = parts[2].parse::<u32>() {
                    self.serial = serial;
                }
            }
            self.soa_record = Some(record.clone());
        }

        let normalized_name = record.normalize_name(&self.origin);
        self.records
            .entry(normalized_name)
            .or_default()
            .push(record);

        self.last_modified = SystemTime::now();
        Ok(())
    }

    pub fn get_records(&self, name: &str, rtype: Option<DNSResourceType>) -> Vec<&ZoneRecord> {
        let normalized = self.normalize_lookup_name(name);

        self.records
            .get(&normalized)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| rtype.is_none() || r.rtype == rtype.unwrap())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_soa(&self) -> Option<&ZoneRecord> {
        self.soa_record.as_ref()
    }

    pub fn is_authoritative_for(&self, name: &str) -> bool {
        let name_lower = name.to_lowercase();
        let origin_lower = self.origin.to_lowercase();
        name_lower == origin_lower || name_lower.ends_with(&format!(".{}", origin_lower))
    }

    pub fn validate(&self) -> Result<()> {
        if self.soa_record.is_none() {
            return Err(ZoneError::MissingSOA);
        }

        let ns_records = self.get_records(&self.origin, Some(DNSResourceType::NS));
        if ns_records.is_empty() {
            return Err(ZoneError::InvalidRecord(
                "zone must have at least one NS record at its apex".to_string(),
            ));
        }

        for (name, records) in &self.records {
            for record in records {
                record
                    .to_dns_resource(&self.origin, self.default_ttl)
                    .map_err(|e| ZoneError::InvalidRecord(format!("{}: {}", name, e)))?;
            }
        }

        Ok(())
    }

    pub fn to_dns_resources(&self, name: &str, rtype: DNSResourceType) -> Result<Vec<DNSResource>> {
        self.get_records(name, Some(rtype))
            .into_iter()
            .map(|record| record.to_dns_resource(&self.origin, self.default_ttl))
            .collect()
    }

    /// NS records at the zone apex — the NOTIFY slave discovery starting point.
    pub fn get_ns_records(&self) -> Vec<&ZoneRecord> {
        self.get_records(&self.origin, Some(DNSResourceType::NS))
    }

    fn normalize_lookup_name(&self, name: &str) -> String {
        let name = name.trim();
        if self.origin.is_empty() {
            return name.to_lowercase();
        }

        let name_lower = name.to_lowercase();
        let origin_lower = self.origin.to_lowercase();

        if name == "@" || name.is_empty() {
            origin_lower
        } else if name.ends_with('.') {
            name.trim_end_matches('.').to_lowercase()
        } else if name_lower == origin_lower || name_lower.ends_with(&format!(".{}", origin_lower)) {
            name_lower
        } else {
            format!("{}.{}", name_lower, origin_lower)
        }
    }

    pub fn stats(&self) -> ZoneStats {
        let mut stats = ZoneStats::default();

        for records in self.records.values() {
            for record in records {
                stats.total_records += 1;
                match record.rtype {
                    DNSResourceType::A => stats.a_records += 1,
                    DNSResourceType::AAAA => stats.aaaa_records += 1,
                    DNSResourceType::NS => stats.ns_records += 1,
                    DNSResourceType::CNAME => stats.cname_records += 1,
                    DNSResourceType::SOA => stats.soa_records += 1,
                    DNSResourceType::Unknown => stats.other_records += 1,
                }
            }
        }

        stats
    }

    pub fn get_all_names(&self) -> Vec<&String> {
        self.records.keys().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &ZoneRecord> {
        self.records.values().flat_map(|records| records.iter())
    }

    pub fn update_serial(&mut self) {
        self.serial = Self::generate_serial();

        if let Some(soa) = &mut self.soa_record {
            let parts: Vec<&str> = soa.rdata.split_whitespace().collect();
            if parts.len() == 7 {
                soa.rdata = format!(
                    "{} {} {} {} {} {} {}",
                    parts[0], parts[1], self.serial, parts[3], parts[4], parts[5], parts[6]
                );
            }
        }

        self.last_modified = SystemTime::now();
    }
}

/// Zone statistics, trimmed to the record types this crate still models.
#[derive(Debug, Default, Clone)]
pub struct ZoneStats {
    pub total_records: usize,
    pub a_records: usize,
    pub aaaa_records: usize,
    pub ns_records: usize,
    pub cname_records: usize,
    pub soa_records: usize,
    pub other_records: usize,
}
