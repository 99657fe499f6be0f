use crate::fixtures::{database_available, MockMessenger, TestFixture};
use sdam_manager::error::Error;
use sdam_models::models::agents::Agent;
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;

/// Creates a group with two member agents and returns the members in the
/// order the orchestrator will address them.
fn group_with_two_members(fixture: &TestFixture) -> (String, Vec<Agent>) {
    let group = fixture.insert_test_group();
    let a1 = fixture.insert_test_agent("10.0.0.1");
    let a2 = fixture.insert_test_agent("10.0.0.2");
    let group_id = group.id.to_string();

    for agent in [&a1, &a2] {
        fixture
            .dal
            .groups()
            .join(&group_id, &agent.id.to_string())
            .unwrap();
    }

    let members = fixture.dal.groups().members(&group_id).unwrap();
    (group_id, members)
}

fn apps_of(fixture: &TestFixture, agent: &Agent) -> Vec<String> {
    fixture
        .dal
        .agents()
        .get(&agent.id.to_string())
        .unwrap()
        .apps
}

#[tokio::test]
#[serial]
async fn test_group_deploy_all_success() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);

    let mock = Arc::new(MockMessenger::new());
    mock.push(
        vec![200, 200],
        vec![r#"{"id":"app-42"}"#, r#"{"id":"app-42"}"#],
    );
    let manager = fixture.group_manager(mock);

    let (code, body) = manager
        .deploy_app(&group_id, r#"{"image":"nginx"}"#)
        .await
        .unwrap();

    assert_eq!(code, 200);
    assert_eq!(body.unwrap(), json!({ "id": "app-42" }));
    for member in &members {
        assert_eq!(apps_of(&fixture, member), vec!["app-42".to_string()]);
    }
}

#[tokio::test]
#[serial]
async fn test_group_deploy_partial_success() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);

    let mock = Arc::new(MockMessenger::new());
    mock.push(
        vec![200, 500],
        vec![r#"{"id":"app-42"}"#, r#"{"message":"oom"}"#],
    );
    let manager = fixture.group_manager(mock);

    let (code, body) = manager
        .deploy_app(&group_id, r#"{"image":"nginx"}"#)
        .await
        .unwrap();
    let body = body.unwrap();

    assert_eq!(code, 207);
    assert_eq!(body["id"], "app-42");
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(
        responses[0],
        json!({ "id": members[0].id, "code": 200 })
    );
    assert_eq!(
        responses[1],
        json!({ "id": members[1].id, "code": 500, "message": "oom" })
    );

    // Only the successful member records the installation.
    assert_eq!(apps_of(&fixture, &members[0]), vec!["app-42".to_string()]);
    assert!(apps_of(&fixture, &members[1]).is_empty());
}

#[tokio::test]
#[serial]
async fn test_group_deploy_total_failure() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);

    let mock = Arc::new(MockMessenger::new());
    mock.push(
        vec![500, 503],
        vec![r#"{"message":"oom"}"#, r#"{"message":"busy"}"#],
    );
    let manager = fixture.group_manager(mock);

    let (code, body) = manager
        .deploy_app(&group_id, r#"{"image":"nginx"}"#)
        .await
        .unwrap();
    let body = body.unwrap();

    assert_eq!(code, 500);
    // No member succeeded, so no installed id is reported.
    assert!(body.get("id").is_none());
    assert_eq!(body["responses"].as_array().unwrap().len(), 2);
    for member in &members {
        assert!(apps_of(&fixture, member).is_empty());
    }
}

#[tokio::test]
#[serial]
async fn test_group_deploy_fails_when_any_body_is_unparseable() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);

    let mock = Arc::new(MockMessenger::new());
    mock.push(vec![200, 200], vec![r#"{"id":"app-42"}"#, "mangled"]);
    let manager = fixture.group_manager(mock);

    let result = manager.deploy_app(&group_id, r#"{"image":"nginx"}"#).await;
    assert!(matches!(result, Err(Error::InternalServer(_))));

    // The whole operation aborts before any store post-effect.
    for member in &members {
        assert!(apps_of(&fixture, member).is_empty());
    }
}

#[tokio::test]
#[serial]
async fn test_group_delete_app_updates_successful_members_only() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);
    for member in &members {
        fixture
            .dal
            .agents()
            .add_app(&member.id.to_string(), "app-42")
            .unwrap();
    }

    // Address order for app operations comes from the filtered expansion.
    let targets = fixture
        .dal
        .groups()
        .members_by_app_id(&group_id, "app-42")
        .unwrap();

    let mock = Arc::new(MockMessenger::new());
    mock.push(vec![200, 500], vec![r#"{}"#, r#"{"message":"in use"}"#]);
    let manager = fixture.group_manager(mock);

    let (code, body) = manager.delete_app(&group_id, "app-42").await.unwrap();
    assert_eq!(code, 207);
    assert!(body.unwrap()["responses"].is_array());

    assert!(apps_of(&fixture, &targets[0]).is_empty());
    assert_eq!(apps_of(&fixture, &targets[1]), vec!["app-42".to_string()]);
}

#[tokio::test]
#[serial]
async fn test_group_info_app_merges_bodies_on_success() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);
    for member in &members {
        fixture
            .dal
            .agents()
            .add_app(&member.id.to_string(), "app-42")
            .unwrap();
    }
    let targets = fixture
        .dal
        .groups()
        .members_by_app_id(&group_id, "app-42")
        .unwrap();

    let mock = Arc::new(MockMessenger::new());
    mock.push(
        vec![200, 200],
        vec![
            r#"{"state":"running"}"#,
            r#"{"state":"exited"}"#,
        ],
    );
    let manager = fixture.group_manager(mock);

    let (code, body) = manager.info_app(&group_id, "app-42").await.unwrap();
    assert_eq!(code, 200);

    let body = body.unwrap();
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], json!(targets[0].id));
    assert_eq!(responses[0]["state"], "running");
    assert_eq!(responses[1]["id"], json!(targets[1].id));
    assert_eq!(responses[1]["state"], "exited");
}

#[tokio::test]
#[serial]
async fn test_group_stop_app_has_no_body_on_full_success() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);
    for member in &members {
        fixture
            .dal
            .agents()
            .add_app(&member.id.to_string(), "app-42")
            .unwrap();
    }

    let mock = Arc::new(MockMessenger::new());
    mock.push(vec![200, 200], vec![r#"{}"#, r#"{}"#]);
    let manager = fixture.group_manager(mock);

    let (code, body) = manager.stop_app(&group_id, "app-42").await.unwrap();
    assert_eq!(code, 200);
    assert!(body.is_none());
}

#[tokio::test]
#[serial]
async fn test_group_app_operations_target_only_members_with_the_app() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);
    // Only the first member has the app installed.
    fixture
        .dal
        .agents()
        .add_app(&members[0].id.to_string(), "app-42")
        .unwrap();

    let mock = Arc::new(MockMessenger::new());
    mock.push(vec![200], vec![r#"{}"#]);
    let manager = fixture.group_manager(mock.clone());

    let (code, _body) = manager.start_app(&group_id, "app-42").await.unwrap();
    assert_eq!(code, 200);
    assert_eq!(mock.calls.lock().unwrap()[0], "start_app:1");
}

#[test]
#[serial]
fn test_join_and_leave_validate_the_body() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let group = fixture.insert_test_group();
    let group_id = group.id.to_string();
    let manager = fixture.group_manager(Arc::new(MockMessenger::new()));

    assert!(matches!(
        manager.join(&group_id, r#"{"members":[]}"#),
        Err(Error::InvalidJson(_))
    ));
    assert!(matches!(
        manager.leave(&group_id, "not json"),
        Err(Error::InvalidJson(_))
    ));

    let agent = fixture.insert_test_agent("10.0.0.9");
    let body = json!({ "agents": [agent.id] }).to_string();
    manager.join(&group_id, &body).unwrap();
    assert_eq!(
        fixture.dal.groups().get(&group_id).unwrap().members,
        vec![agent.id]
    );

    manager.leave(&group_id, &body).unwrap();
    assert!(fixture.dal.groups().get(&group_id).unwrap().members.is_empty());
}

#[test]
#[serial]
fn test_group_info_apps_aggregates_across_members() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let (group_id, members) = group_with_two_members(&fixture);
    fixture
        .dal
        .agents()
        .add_app(&members[0].id.to_string(), "app-42")
        .unwrap();
    fixture
        .dal
        .agents()
        .add_app(&members[1].id.to_string(), "app-42")
        .unwrap();
    fixture
        .dal
        .agents()
        .add_app(&members[1].id.to_string(), "app-7")
        .unwrap();

    let manager = fixture.group_manager(Arc::new(MockMessenger::new()));
    let apps = manager.info_apps(&group_id).unwrap();
    let entries = apps["apps"].as_array().unwrap();

    assert_eq!(entries.len(), 2);
    let shared = entries
        .iter()
        .find(|entry| entry["id"] == "app-42")
        .unwrap();
    assert_eq!(shared["members"].as_array().unwrap().len(), 2);
    let single = entries.iter().find(|entry| entry["id"] == "app-7").unwrap();
    assert_eq!(single["members"], json!([members[1].id]));
}

#[tokio::test]
#[serial]
async fn test_operations_on_missing_group() {
    if !database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    }
    let fixture = TestFixture::new();
    let manager = fixture.group_manager(Arc::new(MockMessenger::new()));
    let ghost = uuid::Uuid::new_v4().to_string();

    assert!(matches!(manager.get(&ghost), Err(Error::NotFound(_))));
    assert!(matches!(
        manager.deploy_app(&ghost, r#"{}"#).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(manager.delete(&ghost), Err(Error::NotFound(_))));
}
