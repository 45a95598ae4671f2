use crate::dns::enums::{DNSResourceClass, DNSResourceType};
use crate::dns::resource::DNSResource;
use crate::zone::errors::{Result, ZoneError};

/// A single resource record belonging to a zone, in text rdata form.
///
/// Trimmed to the types NOTIFY ever needs to reason about: A/AAAA and NS
/// for slave discovery, SOA for the serial carried in a NOTIFY's answer
/// section, and CNAME because zone data can legitimately point through one.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRecord {
    pub name: String,
    pub ttl: Option<u32>,
    pub class: DNSResourceClass,
    pub rtype: DNSResourceType,
    pub rdata: String,
}

impl ZoneRecord {
    pub fn new(
        name: String,
        ttl: Option<u32>,
        class: DNSResourceClass,
        rtype: DNSResourceType,
        rdata: String,
    ) -> Self {
        Self {
            name,
            ttl,
            class,
            rtype,
            rdata,
        }
    }

    /// Convert to a wire-ready resource record against the given zone origin.
    pub fn to_dns_resource(&self, origin: &str, default_ttl: u32) -> Result<DNSResource> {
        let full_name = self.normalize_name(origin);
        let labels: Vec<String> = full_name
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        let ttl = self.ttl.unwrap_or(default_ttl);
        let rdata = self.parse_rdata()?;

        Ok(DNSResource {
            labels,
            rtype: self.rtype,
            rclass: self.class,
            ttl,
            rdlength: rdata.len() as u16,
            rdata,
        })
    }

    /// Normalize this record's name relative to the zone origin.
    pub fn normalize_name(&self, origin: &str) -> String {
        let name = self.name.trim();

        if name == "@" || name.is_empty() {
            origin.trim_end_matches('.').to_lowercase()
        } else if name.ends_with('.') {
            name.trim_end_matches('.').to_lowercase()
        } else {
            format!("{}.{}", name, origin.trim_end_matches('.')).to_lowercase()
        }
    }

    fn parse_rdata(&self) -> Result<Vec<u8>> {
        match self.rtype {
            DNSResourceType::A => self.parse_a_record(),
            DNSResourceType::AAAA => self.parse_aaaa_record(),
            DNSResourceType::NS => self.encode_domain_name(&self.rdata),
            DNSResourceType::CNAME => self.encode_domain_name(&self.rdata),
            DNSResourceType::SOA => self.parse_soa_record(),
            DNSResourceType::Unknown => Err(ZoneError::InvalidRRType(format!(
                "unsupported record type in zone data for {}",
                self.name
            ))),
        }
    }

    fn parse_a_record(&self) -> Result<Vec<u8>> {
        use std::net::Ipv4Addr;

        let addr: Ipv4Addr = self
            .rdata
            .parse()
            .map_err(|_| ZoneError::InvalidRecord(format!("invalid IPv4 address: {}", self.rdata)))?;
        Ok(addr.octets().to_vec())
    }

    fn parse_aaaa_record(&self) -> Result<Vec<u8>> {
        use std::net::Ipv6Addr;

        let addr: Ipv6Addr = self
            .rdata
            .parse()
            .map_err(|_| ZoneError::InvalidRecord(format!("invalid IPv6 address: {}", self.rdata)))?;
        Ok(addr.octets().to_vec())
    }

    fn parse_soa_record(&self) -> Result<Vec<u8>> {
        let parts: Vec<&str> = self.rdata.split_whitespace().collect();
        if parts.len() != 7 {
            return Err(ZoneError::InvalidRecord(format!(
                "SOA record requires 7 fields, got {}",
                parts.len()
            )));
        }

        let mut rdata = Vec::new();
        rdata.extend_from_slice(&self.encode_domain_name(parts[0])?);
        rdata.extend_from_slice(&self.encode_domain_name(parts[1])?);

        for part in parts.iter().take(7).skip(2) {
            let value: u32 = part.parse().map_err(|_| {
                ZoneError::InvalidRecord(format!("invalid SOA numeric value: {}", part))
            })?;
            rdata.extend_from_slice(&value.to_be_bytes());
        }

        Ok(rdata)
    }

    fn encode_domain_name(&self, name: &str) -> Result<Vec<u8>> {
        let mut encoded = Vec::new();
        let normalized = name.trim_end_matches('.');

        for label in normalized.split('.') {
            if label.is_empty() {
                continue;
            }
            if label.len() > 63 {
                return Err(ZoneError::InvalidRecord(format!("label too long: {}", label)));
            }
            encoded.push(label.len() as u8);
            encoded.extend_from_slice(label.as_bytes());
        }

        encoded.push(0);
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_at_sign_and_relative_names() {
        let at = ZoneRecord::new(
            "@".into(),
            None,
            DNSResourceClass::IN,
            DNSResourceType::SOA,
            String::new(),
        );
        assert_eq!(at.normalize_name("example.net."), "example.net");

        let relative = ZoneRecord::new(
            "ns1".into(),
            None,
            DNSResourceClass::IN,
            DNSResourceType::A,
            "3.3.3.3".into(),
        );
        assert_eq!(relative.normalize_name("example.net."), "ns1.example.net");
    }

    #[test]
    fn converts_ns_record_to_wire_resource() {
        let record = ZoneRecord::new(
            "@".into(),
            Some(3600),
            DNSResourceClass::IN,
            DNSResourceType::NS,
            "a.dns.example.net.".into(),
        );

        let resource = record.to_dns_resource("example.net.", 3600).unwrap();
        assert_eq!(resource.labels, vec!["example", "net"]);
        assert_eq!(resource.rtype, DNSResourceType::NS);
        assert_eq!(resource.ttl, 3600);
    }

    #[test]
    fn rejects_unsupported_record_types() {
        let record = ZoneRecord::new(
            "@".into(),
            None,
            DNSResourceClass::IN,
            DNSResourceType::Unknown,
            "whatever".into(),
        );
        assert!(record.to_dns_resource("example.net.", 3600).is_err());
    }
}
