//! Heartbeat timer state machine tests.
//!
//! These run under a paused Tokio clock, so multi-minute heartbeat
//! windows elapse instantly and deterministically.

use crate::fixtures::{database_available, TestFixture};
use sdam_models::models::agents::{STATUS_CONNECTED, STATUS_DISCONNECTED};
use serial_test::serial;
use std::time::Duration;

/// Lets timer tasks that became runnable after a clock advance run.
async fn drain_timer_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn agent_status(fixture: &TestFixture, id: uuid::Uuid) -> String {
    fixture.dal.agents().get(&id.to_string()).unwrap().status
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_timer_fires_after_interval_plus_slack() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let monitor = fixture.heartbeat_monitor();

    monitor.record(agent.id, 1).unwrap();
    assert!(monitor.is_armed(agent.id));

    // One second short of the 1 + 3 minute window nothing has happened.
    tokio::time::advance(Duration::from_secs(4 * 60 - 1)).await;
    drain_timer_tasks().await;
    assert_eq!(agent_status(&fixture, agent.id), STATUS_CONNECTED);
    assert!(monitor.is_armed(agent.id));

    // Crossing the window flips the agent to disconnected and leaves the
    // slot in the expired state.
    tokio::time::advance(Duration::from_secs(2)).await;
    drain_timer_tasks().await;
    assert_eq!(agent_status(&fixture, agent.id), STATUS_DISCONNECTED);
    assert!(monitor.contains(agent.id));
    assert!(!monitor.is_armed(agent.id));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_heartbeat_after_expiry_reconnects_and_rearms() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let monitor = fixture.heartbeat_monitor();

    monitor.record(agent.id, 1).unwrap();
    tokio::time::advance(Duration::from_secs(5 * 60)).await;
    drain_timer_tasks().await;
    assert_eq!(agent_status(&fixture, agent.id), STATUS_DISCONNECTED);

    // The next heartbeat first restores the status, then re-arms.
    monitor.record(agent.id, 1).unwrap();
    assert_eq!(agent_status(&fixture, agent.id), STATUS_CONNECTED);
    assert!(monitor.is_armed(agent.id));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_heartbeat_in_time_cancels_the_pending_timer() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let monitor = fixture.heartbeat_monitor();

    monitor.record(agent.id, 1).unwrap();

    // A second heartbeat three minutes in restarts the window.
    tokio::time::advance(Duration::from_secs(3 * 60)).await;
    drain_timer_tasks().await;
    monitor.record(agent.id, 1).unwrap();

    // Beyond the first window, but within the second: still connected.
    tokio::time::advance(Duration::from_secs(4 * 60 - 1)).await;
    drain_timer_tasks().await;
    assert_eq!(agent_status(&fixture, agent.id), STATUS_CONNECTED);
    assert!(monitor.is_armed(agent.id));

    tokio::time::advance(Duration::from_secs(2)).await;
    drain_timer_tasks().await;
    assert_eq!(agent_status(&fixture, agent.id), STATUS_DISCONNECTED);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_removed_timer_neither_fires_nor_leaves_an_entry() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let monitor = fixture.heartbeat_monitor();

    monitor.record(agent.id, 1).unwrap();
    monitor.remove(agent.id);
    assert!(!monitor.contains(agent.id));

    // Long after the window would have elapsed no transition happened.
    tokio::time::advance(Duration::from_secs(60 * 60)).await;
    drain_timer_tasks().await;
    assert_eq!(agent_status(&fixture, agent.id), STATUS_CONNECTED);
    assert!(!monitor.contains(agent.id));
}
