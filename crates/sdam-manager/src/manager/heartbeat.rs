/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Heartbeat timer lifecycle.
//!
//! Each agent that pings the manager owns one slot in a process-wide
//! timer table. A slot is either armed (it holds the cancellation sender
//! of a pending one-shot timer) or expired (the timer fired and marked
//! the agent disconnected). Slots are removed only by unregistration.
//!
//! All slot transitions happen under a single mutex, so concurrent
//! heartbeats for the same agent are mutually exclusive. Every armed
//! timer carries the generation it was armed under and re-checks it
//! before acting, which keeps a stale timer from clobbering a newer one.

use crate::dal::DAL;
use crate::error::Error;
use sdam_models::models::agents::{STATUS_CONNECTED, STATUS_DISCONNECTED};
use sdam_utils::logging::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// One entry of the timer table.
struct TimerSlot {
    /// Incremented every time a new timer is armed for the agent.
    generation: u64,
    /// Cancellation sender of the armed timer; `None` once the timer
    /// has fired ("expired" state).
    cancel: Option<oneshot::Sender<()>>,
}

/// Tracks the heartbeat timers of all known agents.
#[derive(Clone)]
pub struct HeartbeatMonitor {
    dal: DAL,
    /// Slack added to every heartbeat interval to absorb network latency.
    latency_slack: Duration,
    timers: Arc<Mutex<HashMap<Uuid, TimerSlot>>>,
}

impl HeartbeatMonitor {
    pub fn new(dal: DAL, latency_slack_minutes: u64) -> Self {
        HeartbeatMonitor {
            dal,
            latency_slack: Duration::from_secs(latency_slack_minutes * 60),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records a heartbeat and (re)arms the agent's timer.
    ///
    /// The agent is given `interval + slack` to send its next heartbeat:
    /// - a first heartbeat simply arms a new timer;
    /// - a heartbeat while a timer is armed cancels it before re-arming;
    /// - a heartbeat after the timer expired flips the agent back to
    ///   `connected` before re-arming.
    pub fn record(&self, agent_id: Uuid, interval_minutes: u64) -> Result<(), Error> {
        let mut timers = self.timers.lock().unwrap();

        let generation = match timers.get_mut(&agent_id) {
            None => {
                debug!("first heartbeat received from agent {}", agent_id);
                0
            }
            Some(slot) => {
                match slot.cancel.take() {
                    Some(cancel) => {
                        debug!("heartbeat from agent {} received in interval time", agent_id);
                        let _ = cancel.send(());
                    }
                    None => {
                        debug!(
                            "heartbeat from agent {} received after interval time-out",
                            agent_id
                        );
                        self.dal
                            .agents()
                            .update_status(&agent_id.to_string(), STATUS_CONNECTED)?;
                    }
                }
                slot.generation + 1
            }
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        timers.insert(
            agent_id,
            TimerSlot {
                generation,
                cancel: Some(cancel_tx),
            },
        );

        let window = Duration::from_secs(interval_minutes * 60) + self.latency_slack;
        let monitor = self.clone();
        tokio::spawn(async move {
            monitor
                .expire_after(agent_id, generation, window, cancel_rx)
                .await
        });

        Ok(())
    }

    /// Waits for the timer window to elapse, unless cancelled first.
    ///
    /// Exactly one of {fire, cancel} completes the timer. On firing, the
    /// agent is marked disconnected and its slot is cleared to the
    /// expired state; on cancellation nothing is mutated.
    async fn expire_after(
        self,
        agent_id: Uuid,
        generation: u64,
        window: Duration,
        mut cancel: oneshot::Receiver<()>,
    ) {
        tokio::select! {
            biased;
            _ = &mut cancel => {
                return;
            }
            _ = tokio::time::sleep(window) => {}
        }

        let mut timers = self.timers.lock().unwrap();
        match timers.get_mut(&agent_id) {
            Some(slot) if slot.generation == generation => {
                warn!(
                    "heartbeat from agent {} not received in interval time",
                    agent_id
                );
                if let Err(e) = self
                    .dal
                    .agents()
                    .update_status(&agent_id.to_string(), STATUS_DISCONNECTED)
                {
                    error!("failed to mark agent {} disconnected: {}", agent_id, e);
                }
                slot.cancel = None;
            }
            // A newer timer was armed or the agent was unregistered while
            // this timer was firing; leave the table alone.
            _ => {}
        }
    }

    /// Drops the agent's timer entry, cancelling the armed timer if any.
    ///
    /// Used by unregistration; afterwards the table holds no trace of the
    /// agent and no status transition can occur on its behalf.
    pub fn remove(&self, agent_id: Uuid) {
        let mut timers = self.timers.lock().unwrap();
        if let Some(slot) = timers.remove(&agent_id) {
            if let Some(cancel) = slot.cancel {
                let _ = cancel.send(());
            }
        }
    }

    /// Returns true while the agent has a timer table entry (armed or
    /// expired).
    pub fn contains(&self, agent_id: Uuid) -> bool {
        self.timers.lock().unwrap().contains_key(&agent_id)
    }

    /// Returns true while the agent's timer is armed.
    pub fn is_armed(&self, agent_id: Uuid) -> bool {
        self.timers
            .lock()
            .unwrap()
            .get(&agent_id)
            .map(|slot| slot.cancel.is_some())
            .unwrap_or(false)
    }
}
