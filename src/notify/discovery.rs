//! Slave discovery: turning a zone's apex NS set into an ordered list of
//! notify targets via in-zone A/AAAA glue.

use crate::dns::enums::DNSResourceType;
use crate::zone::{Zone, ZoneStore};

/// One destination a NOTIFY query gets sent to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NotifyTarget {
    pub address: String,
    pub port: u16,
}

impl NotifyTarget {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: 53,
        }
    }

    /// Parse the textual address into a `SocketAddr`, handling the bare
    /// IPv6 literals glue records carry (no surrounding brackets).
    pub fn socket_addr(&self) -> Option<std::net::SocketAddr> {
        if let Ok(v4) = self.address.parse::<std::net::Ipv4Addr>() {
            return Some(std::net::SocketAddr::new(v4.into(), self.port));
        }
        if let Ok(v6) = self.address.parse::<std::net::Ipv6Addr>() {
            return Some(std::net::SocketAddr::new(v6.into(), self.port));
        }
        None
    }
}

impl std::fmt::Display for NotifyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.address, self.port)
    }
}

/// Walk a zone's apex NS records and collect in-zone glue addresses.
///
/// The NS target matching the zone's own SOA MNAME is skipped: it names
/// the primary itself, not a secondary to notify.
pub fn get_notify_slaves_from_ns(zone: &Zone) -> Vec<NotifyTarget> {
    let primary = primary_mname(zone);
    let mut targets = Vec::new();

    for ns in zone.get_ns_records() {
        let ns_name = ns.rdata.trim_end_matches('.').to_lowercase();

        if primary.as_deref() == Some(ns_name.as_str()) {
            continue;
        }

        for rtype in [DNSResourceType::A, DNSResourceType::AAAA] {
            for glue in zone.get_records(&ns_name, Some(rtype)) {
                targets.push(NotifyTarget::new(glue.rdata.clone()));
            }
        }
    }

    targets
}

/// The zone's SOA MNAME, normalized the same way NS target hostnames
/// are (trailing dot stripped, lowercased), or `None` if the zone has
/// no SOA yet.
fn primary_mname(zone: &Zone) -> Option<String> {
    let soa = zone.get_soa()?;
    let mname = soa.rdata.split_whitespace().next()?;
    Some(mname.trim_end_matches('.').to_lowercase())
}

/// Populate `notify_slaves` for every zone currently in the store.
///
/// Returns (zone_id, targets) pairs in the store's enumeration order;
/// callers fold these into their own `infos` map.
pub fn init_notify_out(store: &ZoneStore) -> Vec<(String, Vec<NotifyTarget>)> {
    store
        .list_zones()
        .into_iter()
        .filter_map(|origin| store.get_zone(&origin).map(|zone| (origin, zone)))
        .map(|(origin, zone)| (origin, get_notify_slaves_from_ns(&zone)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::DNSResourceClass;
    use crate::zone::ZoneRecord;

    fn soa(origin: &str) -> ZoneRecord {
        ZoneRecord::new(
            "@".into(),
            Some(3600),
            DNSResourceClass::IN,
            DNSResourceType::SOA,
            format!("a.dns.{origin}. admin.{origin}. 2024010101 3600 900 604800 86400"),
        )
    }

    fn ns(name: &str) -> ZoneRecord {
        ZoneRecord::new(
            "@".into(),
            Some(3600),
            DNSResourceClass::IN,
            DNSResourceType::NS,
            name.into(),
        )
    }

    fn glue(owner: &str, rtype: DNSResourceType, rdata: &str) -> ZoneRecord {
        ZoneRecord::new(owner.into(), Some(3600), DNSResourceClass::IN, rtype, rdata.into())
    }

    fn example_net() -> Zone {
        let mut zone = Zone::new("example.net".into(), 3600);
        zone.add_record(soa("example.net")).unwrap();
        for target in ["a.dns.example.net.", "b.dns.example.net.", "c.dns.example.net."] {
            zone.add_record(ns(target)).unwrap();
        }

        zone.add_record(glue("a.dns", DNSResourceType::A, "1.1.1.1")).unwrap();
        zone.add_record(glue("a.dns", DNSResourceType::AAAA, "2:2::2:2")).unwrap();

        zone.add_record(glue("b.dns", DNSResourceType::A, "3.3.3.3")).unwrap();
        zone.add_record(glue("b.dns", DNSResourceType::AAAA, "4:4::4:4")).unwrap();
        zone.add_record(glue("b.dns", DNSResourceType::AAAA, "5:5::5:5")).unwrap();

        zone.add_record(glue("c.dns", DNSResourceType::A, "6.6.6.6")).unwrap();
        zone.add_record(glue("c.dns", DNSResourceType::A, "7.7.7.7")).unwrap();
        zone.add_record(glue("c.dns", DNSResourceType::AAAA, "8:8::8:8")).unwrap();

        zone
    }

    #[test]
    fn discovers_slaves_from_ns_glue_skipping_the_primary() {
        let zone = example_net();
        let targets = get_notify_slaves_from_ns(&zone);

        let addrs: Vec<&str> = targets.iter().map(|t| t.address.as_str()).collect();
        assert_eq!(
            addrs,
            vec!["3.3.3.3", "4:4::4:4", "5:5::5:5", "6.6.6.6", "7.7.7.7", "8:8::8:8"]
        );
        assert!(targets.iter().all(|t| t.port == 53));
    }

    #[test]
    fn displays_as_host_hash_port() {
        let target = NotifyTarget::new("3.3.3.3");
        assert_eq!(target.to_string(), "3.3.3.3#53");
    }

    #[test]
    fn resolves_v4_and_v6_literals_to_socket_addrs() {
        assert_eq!(
            NotifyTarget::new("3.3.3.3").socket_addr().unwrap().to_string(),
            "3.3.3.3:53"
        );
        assert!(NotifyTarget::new("4:4::4:4").socket_addr().is_some());
        assert!(NotifyTarget::new("not-an-ip").socket_addr().is_none());
    }

    #[test]
    fn init_notify_out_populates_every_zone_in_the_store() {
        let store = ZoneStore::new();

        let mut com = Zone::new("example.com".into(), 3600);
        com.add_record(soa("example.com")).unwrap();
        for target in ["a.dns.example.com.", "b.dns.example.com."] {
            com.add_record(ns(target)).unwrap();
        }
        com.add_record(glue("a.dns", DNSResourceType::A, "1.1.1.1")).unwrap();
        com.add_record(glue("b.dns", DNSResourceType::A, "3.3.3.3")).unwrap();
        com.add_record(glue("b.dns", DNSResourceType::AAAA, "4:4::4:4")).unwrap();
        com.add_record(glue("b.dns", DNSResourceType::AAAA, "5:5::5:5")).unwrap();

        store.add_zone(com).unwrap();

        let discovered = init_notify_out(&store);
        assert_eq!(discovered.len(), 1);
        let (_, targets) = &discovered[0];
        let addrs: Vec<&str> = targets.iter().map(|t| t.address.as_str()).collect();
        assert_eq!(addrs, vec!["3.3.3.3", "4:4::4:4", "5:5::5:5"]);
    }
}
