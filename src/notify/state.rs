//! Per-zone notify state machine (spec §4.3, §4.4).
//!
//! `ZoneNotifyInfo` is pure data plus the synchronous transition logic;
//! the actual socket I/O is driven by `notify::dispatcher`, which holds
//! the `Arc<dyn NotifySocket>` alongside the info it belongs to.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use super::discovery::NotifyTarget;
use super::socket::NotifySocket;
use crate::dns::enums::{DNSResourceClass, DNSResourceType};
use crate::dns::header::{DNSHeader, OPCODE_NOTIFY};
use crate::dns::question::DNSQuestion;
use crate::dns::DNSPacket;

/// Result of validating a NOTIFY reply against the outstanding query
/// (spec §4.2's classification table). Evaluated in the listed order;
/// the first failing check wins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplyClassification {
    ReplyOk,
    BadReplyPacket,
    BadQueryId,
    BadOpcode,
    BadQr,
    BadQueryName,
}

/// One zone's outstanding NOTIFY round: which target it's on, how many
/// times it's retried, and when the current attempt expires.
///
/// `socket` is present only while the zone is actively notifying — the
/// invariant spec §3 ties to `notifying_zones` membership.
#[derive(Clone)]
pub struct ZoneNotifyInfo {
    /// Fully-qualified, trailing-dot-normalized zone name.
    pub zone_name: String,
    pub class: DNSResourceClass,
    pub notify_slaves: Vec<NotifyTarget>,
    pub current_target: Option<usize>,
    pub socket: Option<Arc<dyn NotifySocket>>,
    pub query_id: Option<u16>,
    pub try_count: u8,
    pub absolute_timeout: Option<Instant>,
}

impl std::fmt::Debug for ZoneNotifyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneNotifyInfo")
            .field("zone_name", &self.zone_name)
            .field("class", &self.class)
            .field("notify_slaves", &self.notify_slaves)
            .field("current_target", &self.current_target)
            .field("has_socket", &self.socket.is_some())
            .field("query_id", &self.query_id)
            .field("try_count", &self.try_count)
            .field("absolute_timeout", &self.absolute_timeout)
            .finish()
    }
}

impl ZoneNotifyInfo {
    pub fn new(zone_name: String, class: DNSResourceClass, notify_slaves: Vec<NotifyTarget>) -> Self {
        Self {
            zone_name,
            class,
            notify_slaves,
            current_target: None,
            socket: None,
            query_id: None,
            try_count: 0,
            absolute_timeout: None,
        }
    }

    pub fn current_target(&self) -> Option<&NotifyTarget> {
        self.current_target.and_then(|i| self.notify_slaves.get(i))
    }

    /// Enter SENDING for the first target of a fresh round.
    ///
    /// No-op (returns `false`) if there are no known slaves.
    pub fn begin_round(&mut self) -> bool {
        if self.notify_slaves.is_empty() {
            return false;
        }
        self.current_target = Some(0);
        self.try_count = 0;
        true
    }

    /// Move to the next target, or signal DONE if the current one was the
    /// last (spec §4.4).
    pub fn advance_target(&mut self) -> bool {
        let next = match self.current_target {
            None => return false,
            Some(i) if i + 1 >= self.notify_slaves.len() => None,
            Some(i) => Some(i + 1),
        };

        match next {
            Some(i) => {
                self.current_target = Some(i);
                self.try_count = 0;
                true
            }
            None => {
                self.current_target = None;
                self.query_id = None;
                self.try_count = 0;
                self.absolute_timeout = None;
                false
            }
        }
    }

    /// Build a fresh NOTIFY query for the current target, assigning a new
    /// random `query_id` and arming the base timeout. Call exactly once
    /// per target, on entering SENDING.
    pub fn build_query(&mut self, now: Instant, base_timeout: Duration) -> DNSPacket {
        let id = rand::rng().random();
        self.query_id = Some(id);
        self.try_count = 0;
        self.absolute_timeout = Some(now + base_timeout);
        self.encode_query(id)
    }

    /// Rebuild the query for a retransmission. Reuses the existing
    /// `query_id` so a late reply to any attempt still matches (spec §9).
    pub fn retry_query(&self) -> Option<DNSPacket> {
        self.query_id.map(|id| self.encode_query(id))
    }

    /// Advance the retry counter and compute the next deadline
    /// (exponential backoff, doubling per retry). Returns `None` if the
    /// retry ceiling has already been reached.
    pub fn begin_retry(
        &mut self,
        now: Instant,
        base_timeout: Duration,
        max_try_num: u8,
    ) -> Option<Instant> {
        if self.try_count >= max_try_num {
            return None;
        }
        self.try_count += 1;
        let backoff = base_timeout * (1u32 << self.try_count.min(31));
        let deadline = now + backoff;
        self.absolute_timeout = Some(deadline);
        Some(deadline)
    }

    pub fn retry_ceiling_reached(&self, max_try_num: u8) -> bool {
        self.try_count >= max_try_num
    }

    fn encode_query(&self, id: u16) -> DNSPacket {
        let labels = self
            .zone_name
            .trim_end_matches('.')
            .split('.')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        DNSPacket {
            header: DNSHeader {
                id,
                qr: false,
                opcode: OPCODE_NOTIFY,
                aa: true,
                tc: false,
                rd: false,
                ra: false,
                z: 0,
                rcode: 0,
                qdcount: 1,
                ancount: 0,
                nscount: 0,
                arcount: 0,
            },
            questions: vec![DNSQuestion {
                labels,
                qtype: DNSResourceType::SOA,
                qclass: self.class,
            }],
            answers: Vec::new(),
            authorities: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Classify a reply datagram against this zone's outstanding query
    /// (spec §4.2). Checks run in the order the table lists them.
    pub fn classify_reply(&self, bytes: &[u8]) -> ReplyClassification {
        let packet = match DNSPacket::parse(bytes) {
            Ok(packet) => packet,
            Err(_) => return ReplyClassification::BadReplyPacket,
        };

        if Some(packet.header.id) != self.query_id {
            return ReplyClassification::BadQueryId;
        }
        if packet.header.opcode != OPCODE_NOTIFY {
            return ReplyClassification::BadOpcode;
        }
        if !packet.header.qr {
            return ReplyClassification::BadQr;
        }

        let matches_name = packet
            .questions
            .first()
            .map(|q| {
                let candidate = if q.labels.is_empty() {
                    ".".to_string()
                } else {
                    format!("{}.", q.labels.join("."))
                };
                candidate.eq_ignore_ascii_case(&self.zone_name)
            })
            .unwrap_or(false);

        if !matches_name {
            return ReplyClassification::BadQueryName;
        }

        ReplyClassification::ReplyOk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{self, Duration as TokioDuration};

    fn info() -> ZoneNotifyInfo {
        let mut info = ZoneNotifyInfo::new(
            "example.com.".into(),
            DNSResourceClass::IN,
            vec![NotifyTarget::new("3.3.3.3")],
        );
        info.begin_round();
        info
    }

    fn reply_bytes(id: u16, opcode: u8, qr: bool, zone: &str) -> Vec<u8> {
        let packet = DNSPacket {
            header: DNSHeader {
                id,
                qr,
                opcode,
                aa: false,
                rd: false,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![DNSQuestion {
                labels: zone.trim_end_matches('.').split('.').map(String::from).collect(),
                qtype: DNSResourceType::SOA,
                qclass: DNSResourceClass::IN,
            }],
            ..Default::default()
        };
        packet.to_bytes()
    }

    #[tokio::test(start_paused = true)]
    async fn builds_query_with_random_id_and_arms_timeout() {
        let mut zone = info();
        let now = Instant::now();
        let packet = zone.build_query(now, Duration::from_secs(3));

        assert_eq!(packet.header.opcode, OPCODE_NOTIFY);
        assert!(!packet.header.qr);
        assert!(packet.header.aa);
        assert_eq!(zone.query_id, Some(packet.header.id));
        assert_eq!(zone.absolute_timeout, Some(now + Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_reuses_the_same_query_id_and_doubles_the_timeout() {
        let mut zone = info();
        let now = Instant::now();
        zone.build_query(now, Duration::from_secs(3));
        let id = zone.query_id.unwrap();

        let retry_packet = zone.retry_query().unwrap();
        assert_eq!(retry_packet.header.id, id);

        let first_deadline = zone.begin_retry(now, Duration::from_secs(3), 5).unwrap();
        time::advance(TokioDuration::from_millis(10)).await;
        let second_deadline = zone
            .begin_retry(Instant::now(), Duration::from_secs(3), 5)
            .unwrap();

        assert!(second_deadline > first_deadline + Duration::from_secs(2));
        assert_eq!(zone.query_id, Some(id));
    }

    #[test]
    fn retry_ceiling_blocks_further_retries() {
        let mut zone = info();
        zone.try_count = 5;
        assert!(zone.retry_ceiling_reached(5));
        assert!(zone.begin_retry(Instant::now(), Duration::from_secs(3), 5).is_none());
    }

    #[test]
    fn advance_target_moves_through_slaves_then_signals_done() {
        let mut zone = ZoneNotifyInfo::new(
            "example.com.".into(),
            DNSResourceClass::IN,
            vec![NotifyTarget::new("3.3.3.3"), NotifyTarget::new("4.4.4.4")],
        );
        zone.begin_round();
        zone.try_count = 5;

        assert!(zone.advance_target());
        assert_eq!(zone.current_target, Some(1));
        assert_eq!(zone.try_count, 0);

        assert!(!zone.advance_target());
        assert_eq!(zone.current_target, None);
    }

    #[test]
    fn classify_reply_checks_run_in_order() {
        let mut zone = info();
        zone.query_id = Some(0x2f18);

        assert_eq!(
            zone.classify_reply(b"short"),
            ReplyClassification::BadReplyPacket
        );
        assert_eq!(
            zone.classify_reply(&reply_bytes(0x2e18, OPCODE_NOTIFY, true, "example.com.")),
            ReplyClassification::BadQueryId
        );
        assert_eq!(
            zone.classify_reply(&reply_bytes(0x2f18, 0, true, "example.com.")),
            ReplyClassification::BadOpcode
        );
        assert_eq!(
            zone.classify_reply(&reply_bytes(0x2f18, OPCODE_NOTIFY, false, "example.com.")),
            ReplyClassification::BadQr
        );
        assert_eq!(
            zone.classify_reply(&reply_bytes(0x2f18, OPCODE_NOTIFY, true, "example.net.")),
            ReplyClassification::BadQueryName
        );
        assert_eq!(
            zone.classify_reply(&reply_bytes(0x2f18, OPCODE_NOTIFY, true, "example.com.")),
            ReplyClassification::ReplyOk
        );
    }

    #[test]
    fn classify_reply_is_case_insensitive_on_the_question_name() {
        let mut zone = info();
        zone.query_id = Some(0x2f18);
        assert_eq!(
            zone.classify_reply(&reply_bytes(0x2f18, OPCODE_NOTIFY, true, "EXAMPLE.COM.")),
            ReplyClassification::ReplyOk
        );
    }

    #[test]
    fn round_trip_with_flipped_qr_reply_okays_against_matching_state() {
        let mut zone = info();
        let built = zone.build_query(Instant::now(), Duration::from_secs(3));

        let mut flipped = built.clone();
        flipped.header.qr = true;

        assert_eq!(
            zone.classify_reply(&flipped.to_bytes()),
            ReplyClassification::ReplyOk
        );
    }
}
