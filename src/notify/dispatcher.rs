//! Event loop multiplexing every in-flight NOTIFY round over a single
//! worker task (spec §4.5 item 2, §5).

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::controller::{ControlSignal, ControllerState, ZoneId};
use super::socket::{NotifySocket, UdpNotifySocket};
use super::state::ReplyClassification;
use crate::config::NotifyConfig;

/// What a single zone's socket race resolved to.
enum ZoneOutcome {
    Read(Vec<u8>),
    Timeout,
    ReadError(std::io::Error),
}

/// Runs until a `ControlSignal::Shutdown` is observed.
///
/// Holds no state beyond what it reads from `ControllerState` each
/// iteration; `NotifyOut` owns the mutex this borrows.
pub(super) async fn run(
    state: Arc<Mutex<ControllerState>>,
    config: NotifyConfig,
    mut control_rx: mpsc::UnboundedReceiver<ControlSignal>,
) {
    debug!("notify dispatcher started");

    loop {
        start_pending_zones(&state, &config).await;

        let (wait_timeout, active) = {
            let guard = state.lock();
            prepare_select_info(&guard, config.idle_sleep_time)
        };

        if active.is_empty() {
            tokio::select! {
                biased;
                signal = control_rx.recv() => {
                    if matches!(signal, Some(ControlSignal::Shutdown)) {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait_timeout) => {}
            }
            continue;
        }

        let mut races: FuturesUnordered<_> = active
            .into_iter()
            .map(|(zone_id, socket, deadline)| wait_for_zone_event(zone_id, socket, deadline))
            .collect();

        tokio::select! {
            biased;
            signal = control_rx.recv() => {
                if matches!(signal, Some(ControlSignal::Shutdown)) {
                    break;
                }
            }
            Some((zone_id, outcome)) = races.next() => {
                match outcome {
                    ZoneOutcome::Read(bytes) => on_read(&state, &config, &zone_id, &bytes).await,
                    ZoneOutcome::Timeout => on_timeout(&state, &config, &zone_id).await,
                    ZoneOutcome::ReadError(err) => {
                        debug!("transient read error for {:?}: {}, awaiting timeout", zone_id, err);
                    }
                }
            }
        }
    }

    close_all_sockets(&state);
    debug!("notify dispatcher stopped");
}

/// Race one zone's socket readiness against its own deadline, collapsing
/// EVENT_READ and EVENT_TIMEOUT into a single future per zone.
async fn wait_for_zone_event(
    zone_id: ZoneId,
    socket: Arc<dyn NotifySocket>,
    deadline: Instant,
) -> (ZoneId, ZoneOutcome) {
    let remaining = deadline.saturating_duration_since(Instant::now());
    let mut buf = vec![0u8; 512];

    let outcome = match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
        Ok(Ok(len)) => {
            buf.truncate(len);
            ZoneOutcome::Read(buf)
        }
        Ok(Err(err)) => ZoneOutcome::ReadError(err),
        Err(_elapsed) => ZoneOutcome::Timeout,
    };

    (zone_id, outcome)
}

/// Snapshot of every zone currently holding a slot with an outstanding
/// query, plus the timeout the caller should block for if none of them
/// becomes ready first (spec §4.5 item 1).
fn prepare_select_info(
    guard: &ControllerState,
    idle_sleep_time: Duration,
) -> (Duration, Vec<(ZoneId, Arc<dyn NotifySocket>, Instant)>) {
    let now = Instant::now();
    let mut active = Vec::with_capacity(guard.notifying_zones.len());

    for zone_id in &guard.notifying_zones {
        if let Some(info) = guard.infos.get(zone_id) {
            if let (Some(socket), Some(deadline)) = (&info.socket, info.absolute_timeout) {
                active.push((zone_id.clone(), socket.clone(), deadline));
            }
        }
    }

    let wait_timeout = active
        .iter()
        .map(|(_, _, deadline)| deadline.saturating_duration_since(now))
        .min()
        .unwrap_or(idle_sleep_time)
        .min(idle_sleep_time);

    (wait_timeout, active)
}

/// Open a socket and fire the first query for every zone that was just
/// admitted (in `notifying_zones` but not yet holding a socket).
async fn start_pending_zones(state: &Arc<Mutex<ControllerState>>, config: &NotifyConfig) {
    let pending: Vec<ZoneId> = {
        let guard = state.lock();
        guard
            .notifying_zones
            .iter()
            .filter(|id| {
                guard
                    .infos
                    .get(*id)
                    .map(|info| info.socket.is_none())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    };

    for zone_id in pending {
        begin_target(state, config, &zone_id).await;
    }
}

/// Build the query for the zone's current target, open a fresh socket
/// connected to it, and send. Used both for a brand-new round and for
/// every subsequent target a zone advances to.
async fn begin_target(state: &Arc<Mutex<ControllerState>>, config: &NotifyConfig, zone_id: &ZoneId) {
    let prepared = {
        let mut guard = state.lock();
        let Some(info) = guard.infos.get_mut(zone_id) else {
            return;
        };

        let has_target = info.current_target.is_some() || info.begin_round();
        if !has_target {
            None
        } else {
            let now = Instant::now();
            let packet = info.build_query(now, config.notify_timeout);
            info.current_target().cloned().map(|target| (packet, target))
        }
    };

    let Some((packet, target)) = prepared else {
        finish_round(state, zone_id);
        return;
    };

    let Some(addr) = target.socket_addr() else {
        warn!("unresolvable notify target {} for zone {:?}", target, zone_id);
        finish_round(state, zone_id);
        return;
    };

    match UdpNotifySocket::connect(addr).await {
        Ok(socket) => {
            let socket: Arc<dyn NotifySocket> = Arc::new(socket);
            if let Err(err) = socket.send(&packet.to_bytes()).await {
                warn!("failed to send NOTIFY to {} for zone {:?}: {}", target, zone_id, err);
            }
            let mut guard = state.lock();
            if let Some(info) = guard.infos.get_mut(zone_id) {
                info.socket = Some(socket);
            }
        }
        Err(err) => {
            warn!("failed to open notify socket for zone {:?}: {}", zone_id, err);
            finish_round(state, zone_id);
        }
    }
}

async fn on_read(
    state: &Arc<Mutex<ControllerState>>,
    config: &NotifyConfig,
    zone_id: &ZoneId,
    bytes: &[u8],
) {
    let classification = {
        let guard = state.lock();
        match guard.infos.get(zone_id) {
            Some(info) => info.classify_reply(bytes),
            None => return,
        }
    };

    match classification {
        ReplyClassification::ReplyOk => advance_or_finish(state, config, zone_id).await,
        bad => debug!("discarding {:?} reply for zone {:?}", bad, zone_id),
    }
}

async fn on_timeout(state: &Arc<Mutex<ControllerState>>, config: &NotifyConfig, zone_id: &ZoneId) {
    let retry_packet = {
        let mut guard = state.lock();
        let Some(info) = guard.infos.get_mut(zone_id) else {
            return;
        };
        let now = Instant::now();
        info.begin_retry(now, config.notify_timeout, config.max_notify_try_num)
            .and_then(|_| info.retry_query())
    };

    match retry_packet {
        Some(packet) => {
            let socket = {
                let guard = state.lock();
                guard.infos.get(zone_id).and_then(|i| i.socket.clone())
            };
            if let Some(socket) = socket {
                if let Err(err) = socket.send(&packet.to_bytes()).await {
                    warn!("failed to resend NOTIFY for zone {:?}: {}", zone_id, err);
                }
            }
        }
        None => {
            warn!("notify retries exhausted for zone {:?}, advancing target", zone_id);
            advance_or_finish(state, config, zone_id).await;
        }
    }
}

/// Advance to the next target and start it, or finish the round if none
/// remain (spec §4.4, and the DONE handling spec §4.5 folds into it).
async fn advance_or_finish(state: &Arc<Mutex<ControllerState>>, config: &NotifyConfig, zone_id: &ZoneId) {
    let advanced = {
        let mut guard = state.lock();
        match guard.infos.get_mut(zone_id) {
            Some(info) => {
                info.socket = None;
                info.advance_target()
            }
            None => return,
        }
    };

    if advanced {
        begin_target(state, config, zone_id).await;
    } else {
        finish_round(state, zone_id);
    }
}

/// Retire the zone: drop its socket, free its slot, and admit the next
/// waiting zone if there is one (spec §4.4's DONE handling).
fn finish_round(state: &Arc<Mutex<ControllerState>>, zone_id: &ZoneId) {
    let mut guard = state.lock();
    if let Some(info) = guard.infos.get_mut(zone_id) {
        info.socket = None;
    }
    guard.notifying_zones.retain(|id| id != zone_id);
    guard.admit_waiting();
}

fn close_all_sockets(state: &Arc<Mutex<ControllerState>>) {
    let mut guard = state.lock();
    for zone_id in guard.notifying_zones.clone() {
        if let Some(info) = guard.infos.get_mut(&zone_id) {
            info.socket = None;
        }
    }
}
