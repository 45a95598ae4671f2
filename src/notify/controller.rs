//! Public controller: `send_notify`, `dispatcher`, `shutdown` (spec §4.5).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::info;

use super::dispatcher;
use super::discovery::get_notify_slaves_from_ns;
use super::state::ZoneNotifyInfo;
use crate::config::NotifyConfig;
use crate::dns::enums::DNSResourceClass;
use crate::zone::ZoneStore;

/// Identifies a tracked zone: (normalized name, class). Two identifiers
/// are equal iff both components are equal after normalization (spec §3).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ZoneId {
    pub name: String,
    pub class: DNSResourceClass,
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.class)
    }
}

/// Sentinel written to the control channel to interrupt the dispatcher's
/// blocking wait (the channel-based equivalent of the original's
/// socketpair wake-up, per SPEC_FULL §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ControlSignal {
    Wake,
    Shutdown,
}

/// Everything `send_notify`/`shutdown` mutate and the dispatcher reads,
/// behind one mutex (spec §5: "mutate... under a single mutex").
pub(super) struct ControllerState {
    pub(super) infos: HashMap<ZoneId, ZoneNotifyInfo>,
    pub(super) notifying_zones: Vec<ZoneId>,
    pub(super) waiting_zones: VecDeque<ZoneId>,
    max_notify_num: usize,
}

impl ControllerState {
    /// Fill open slots from the front of the waiting queue, skipping (but
    /// not discarding) any entry that's still actively notifying — the
    /// re-queue case spec §4.5 allows ("a running zone may be re-queued
    /// for a subsequent round").
    pub(super) fn admit_waiting(&mut self) {
        let mut i = 0;
        while self.notifying_zones.len() < self.max_notify_num && i < self.waiting_zones.len() {
            if self.notifying_zones.contains(&self.waiting_zones[i]) {
                i += 1;
                continue;
            }
            let zone_id = self.waiting_zones.remove(i).expect("index in bounds");
            self.notifying_zones.push(zone_id);
        }
    }
}

/// The public notify-out controller (spec §4.5/§4.6 combined, per
/// SPEC_FULL's note on the heading collision in spec.md).
pub struct NotifyOut {
    state: Arc<Mutex<ControllerState>>,
    config: NotifyConfig,
    control_tx: mpsc::UnboundedSender<ControlSignal>,
    control_rx: Mutex<Option<mpsc::UnboundedReceiver<ControlSignal>>>,
    done: Arc<Notify>,
}

impl NotifyOut {
    pub fn new(config: NotifyConfig) -> Arc<Self> {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            state: Arc::new(Mutex::new(ControllerState {
                infos: HashMap::new(),
                notifying_zones: Vec::with_capacity(config.max_notify_num + 1),
                waiting_zones: VecDeque::new(),
                max_notify_num: config.max_notify_num,
            })),
            config,
            control_tx,
            control_rx: Mutex::new(Some(control_rx)),
            done: Arc::new(Notify::new()),
        })
    }

    /// Populate `infos` for every zone currently in `store` via slave
    /// discovery (spec §4.1's `init_notify_out`).
    pub fn init_notify_out(&self, store: &ZoneStore) {
        let mut guard = self.state.lock();
        for origin in store.list_zones() {
            let Some(zone) = store.get_zone(&origin) else {
                continue;
            };
            let targets = get_notify_slaves_from_ns(&zone);
            let zone_name = normalize_zone_name(&zone.origin);
            let zone_id = ZoneId {
                name: zone_name.clone(),
                class: zone.class,
            };
            info!(
                zone = %zone_id,
                slaves = targets.len(),
                "discovered notify slaves"
            );
            guard
                .infos
                .insert(zone_id, ZoneNotifyInfo::new(zone_name, zone.class, targets));
        }
    }

    /// Register a zone directly, bypassing slave discovery — for callers
    /// that configure notify targets out-of-band.
    pub fn register_zone(&self, zone_name: &str, class: DNSResourceClass, slaves: Vec<super::discovery::NotifyTarget>) {
        let zone_name = normalize_zone_name(zone_name);
        let zone_id = ZoneId {
            name: zone_name.clone(),
            class,
        };
        self.state
            .lock()
            .infos
            .insert(zone_id, ZoneNotifyInfo::new(zone_name, class, slaves));
    }

    /// Queue a NOTIFY round for `zone` (spec §4.5's `send_notify`).
    ///
    /// Unknown zones and zones with no known slaves are silent no-ops —
    /// NOTIFY is best-effort (spec §7).
    pub fn send_notify(&self, zone: &str, class: DNSResourceClass) {
        let zone_id = ZoneId {
            name: normalize_zone_name(zone),
            class,
        };

        let mut guard = self.state.lock();

        match guard.infos.get(&zone_id) {
            Some(info) if !info.notify_slaves.is_empty() => {}
            _ => return,
        }

        let in_notifying = guard.notifying_zones.contains(&zone_id);
        let in_waiting = guard.waiting_zones.contains(&zone_id);

        if in_notifying || in_waiting {
            if in_notifying && !in_waiting {
                guard.waiting_zones.push_back(zone_id.clone());
            }
            // else: no-op per spec (duplicate waiting entry, or already
            // queued and not currently running).
        } else if guard.notifying_zones.len() < guard.max_notify_num {
            if let Some(info) = guard.infos.get_mut(&zone_id) {
                info.current_target = None;
                info.socket = None;
                info.query_id = None;
                info.try_count = 0;
                info.absolute_timeout = None;
            }
            guard.notifying_zones.push(zone_id.clone());
        } else {
            guard.waiting_zones.push_back(zone_id.clone());
        }

        drop(guard);
        let _ = self.control_tx.send(ControlSignal::Wake);
    }

    /// Spawn the worker task hosting the dispatcher event loop.
    pub fn dispatcher(self: &Arc<Self>) -> JoinHandle<()> {
        let control_rx = self
            .control_rx
            .lock()
            .take()
            .expect("dispatcher() already called once");
        let state = self.state.clone();
        let config = self.config.clone();
        let done = self.done.clone();

        tokio::spawn(async move {
            dispatcher::run(state, config, control_rx).await;
            done.notify_one();
        })
    }

    /// Signal the worker to stop and wait for it to exit.
    pub async fn shutdown(&self) {
        let _ = self.control_tx.send(ControlSignal::Shutdown);
        self.done.notified().await;
    }
}

fn normalize_zone_name(zone: &str) -> String {
    let trimmed = zone.trim().trim_end_matches('.').to_lowercase();
    format!("{trimmed}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::discovery::NotifyTarget;

    fn register(controller: &Arc<NotifyOut>, name: &str, class: DNSResourceClass, slaves: &[&str]) {
        controller.register_zone(
            name,
            class,
            slaves.iter().map(|s| NotifyTarget::new(*s)).collect(),
        );
    }

    #[test]
    fn send_notify_admission_matches_the_spec_scenario() {
        let config = NotifyConfig {
            max_notify_num: 2,
            ..Default::default()
        };
        let controller = NotifyOut::new(config);

        register(&controller, "example.net.", DNSResourceClass::IN, &["3.3.3.3"]);
        register(&controller, "example.com.", DNSResourceClass::IN, &["3.3.3.3"]);
        register(&controller, "example.com.", DNSResourceClass::CH, &["3.3.3.3"]);
        // example.org. has no slaves: send_notify on it must no-op.
        controller.register_zone("example.org.", DNSResourceClass::IN, vec![]);

        controller.send_notify("example.net.", DNSResourceClass::IN);
        controller.send_notify("example.com.", DNSResourceClass::IN);
        controller.send_notify("example.com.", DNSResourceClass::CH);
        controller.send_notify("example.org.", DNSResourceClass::IN);
        controller.send_notify("example.net.", DNSResourceClass::IN);

        let guard = controller.state.lock();
        assert_eq!(guard.notifying_zones.len(), 2);
        assert_eq!(
            guard.waiting_zones,
            VecDeque::from([
                ZoneId {
                    name: "example.com.".into(),
                    class: DNSResourceClass::CH,
                },
                ZoneId {
                    name: "example.net.".into(),
                    class: DNSResourceClass::IN,
                },
            ])
        );
        assert!(!guard.notifying_zones.iter().any(|z| z.name == "example.org."));
    }

    #[test]
    fn send_notify_on_unknown_zone_is_a_silent_no_op() {
        let controller = NotifyOut::new(NotifyConfig::default());
        controller.send_notify("never-registered.example.", DNSResourceClass::IN);

        let guard = controller.state.lock();
        assert!(guard.notifying_zones.is_empty());
        assert!(guard.waiting_zones.is_empty());
    }

    #[test]
    fn normalizes_zone_names_with_and_without_trailing_dot() {
        assert_eq!(normalize_zone_name("example.com"), "example.com.");
        assert_eq!(normalize_zone_name("EXAMPLE.com."), "example.com.");
    }
}
