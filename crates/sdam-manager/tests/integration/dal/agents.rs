use crate::fixtures::{database_available, TestFixture};
use sdam_manager::error::Error;
use sdam_models::models::agents::{STATUS_CONNECTED, STATUS_DISCONNECTED};
use serial_test::serial;

#[test]
#[serial]
fn test_create_and_get_agent() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();

    let created = fixture.insert_test_agent("10.0.0.5");
    assert_eq!(created.host, "10.0.0.5");
    assert_eq!(created.port, "48098");
    assert_eq!(created.status, STATUS_CONNECTED);
    assert!(created.apps.is_empty());

    let retrieved = fixture
        .dal
        .agents()
        .get(&created.id.to_string())
        .expect("Failed to get agent");
    assert_eq!(retrieved.id, created.id);
    assert_eq!(retrieved.host, created.host);
}

#[test]
#[serial]
fn test_get_agent_by_ip() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();

    let created = fixture.insert_test_agent("10.0.0.7");

    let by_ip = fixture
        .dal
        .agents()
        .get_by_ip("10.0.0.7")
        .expect("Failed to get agent by ip");
    assert_eq!(by_ip.id, created.id);

    let missing = fixture.dal.agents().get_by_ip("10.9.9.9");
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[test]
#[serial]
fn test_add_app_is_idempotent() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let id = agent.id.to_string();

    fixture.dal.agents().add_app(&id, "app-1").unwrap();
    fixture.dal.agents().add_app(&id, "app-1").unwrap();
    fixture.dal.agents().add_app(&id, "app-2").unwrap();

    let agent = fixture.dal.agents().get(&id).unwrap();
    assert_eq!(agent.apps, vec!["app-1".to_string(), "app-2".to_string()]);
}

#[test]
#[serial]
fn test_delete_app_is_idempotent() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let id = agent.id.to_string();

    fixture.dal.agents().add_app(&id, "app-1").unwrap();
    fixture.dal.agents().delete_app(&id, "app-1").unwrap();
    // Removing an app that is no longer present is a no-op.
    fixture.dal.agents().delete_app(&id, "app-1").unwrap();

    let agent = fixture.dal.agents().get(&id).unwrap();
    assert!(agent.apps.is_empty());
}

#[test]
#[serial]
fn test_app_mutations_on_missing_agent() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let ghost = uuid::Uuid::new_v4().to_string();

    assert!(matches!(
        fixture.dal.agents().add_app(&ghost, "app-1"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        fixture.dal.agents().delete_app(&ghost, "app-1"),
        Err(Error::NotFound(_))
    ));
}

#[test]
#[serial]
fn test_get_by_app_id_requires_installed_app() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let id = agent.id.to_string();

    // The coupling does not exist before the app is installed.
    assert!(matches!(
        fixture.dal.agents().get_by_app_id(&id, "app-1"),
        Err(Error::NotFound(_))
    ));

    fixture.dal.agents().add_app(&id, "app-1").unwrap();
    let found = fixture.dal.agents().get_by_app_id(&id, "app-1").unwrap();
    assert_eq!(found.id, agent.id);
}

#[test]
#[serial]
fn test_update_status_and_address() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let id = agent.id.to_string();

    fixture
        .dal
        .agents()
        .update_status(&id, STATUS_DISCONNECTED)
        .unwrap();
    assert_eq!(
        fixture.dal.agents().get(&id).unwrap().status,
        STATUS_DISCONNECTED
    );

    fixture
        .dal
        .agents()
        .update_address(&id, "10.0.0.6", "50000")
        .unwrap();
    let agent = fixture.dal.agents().get(&id).unwrap();
    assert_eq!(agent.host, "10.0.0.6");
    assert_eq!(agent.port, "50000");

    let ghost = uuid::Uuid::new_v4().to_string();
    assert!(matches!(
        fixture.dal.agents().update_status(&ghost, STATUS_CONNECTED),
        Err(Error::NotFound(_))
    ));
}

#[test]
#[serial]
fn test_list_agents() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    fixture.insert_test_agent("10.0.0.1");
    fixture.insert_test_agent("10.0.0.2");

    let agents = fixture.dal.agents().list().expect("Failed to list agents");
    assert_eq!(agents.len(), 2);
}

#[test]
#[serial]
fn test_delete_agent() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let agent = fixture.insert_test_agent("10.0.0.5");
    let id = agent.id.to_string();

    fixture.dal.agents().delete(&id).unwrap();
    assert!(matches!(
        fixture.dal.agents().get(&id),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        fixture.dal.agents().delete(&id),
        Err(Error::NotFound(_))
    ));
}

#[test]
#[serial]
fn test_malformed_id_is_rejected_before_any_query() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();

    for bad in ["", "42", "not-a-uuid"] {
        assert!(matches!(
            fixture.dal.agents().get(bad),
            Err(Error::InvalidId(_))
        ));
        assert!(matches!(
            fixture.dal.agents().add_app(bad, "app-1"),
            Err(Error::InvalidId(_))
        ));
        assert!(matches!(
            fixture.dal.agents().delete(bad),
            Err(Error::InvalidId(_))
        ));
    }
}
