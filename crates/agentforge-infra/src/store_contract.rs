//! Behavioural suite shared by every storage backend.
//!
//! Each backend's test module calls [`run_all`] against a fresh store, so the
//! SQLite, in-memory and key-value implementations are held to identical
//! observable semantics.

use chrono::Duration;

use agentforge_core::repository::Store;
use agentforge_types::agent::{Agent, AgentPatch, CreateAgentRequest, Tool};
use agentforge_types::conversation::{Conversation, Message, MessageRole};
use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;

pub(crate) fn make_agent(id: &str, name: &str) -> Agent {
    Agent::from_request(
        CreateAgentRequest {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            role: Some("Researcher".to_string()),
            tools: Some(vec![Tool {
                id: "t1".to_string(),
                name: "search".to_string(),
                description: "Search the web".to_string(),
                parameters: None,
            }]),
            ..Default::default()
        },
        agentforge_types::time::now(),
    )
    .unwrap()
}

fn message(id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        role: MessageRole::User,
        content: content.to_string(),
        tool_calls: None,
        tool_call_id: None,
        created_at: agentforge_types::time::now(),
    }
}

pub(crate) async fn run_all<S: Store>(store: &S) {
    agent_crud(store).await;
    agent_ordering(store).await;
    conversations(store).await;
    deployments(store).await;
}

async fn agent_crud<S: Store>(store: &S) {
    let agent = make_agent("crud-1", "Crud");

    let created = store.create_agent(&agent).await.unwrap();
    assert_eq!(created, agent);
    assert_eq!(store.get_agent("crud-1").await.unwrap(), Some(agent.clone()));
    assert_eq!(store.get_agent("crud-missing").await.unwrap(), None);

    let duplicate = store.create_agent(&agent).await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let patch = AgentPatch {
        temperature: Some(1.5),
        system_prompt: Some("Be brief.".to_string()),
        ..Default::default()
    };
    let updated = store.update_agent("crud-1", &patch).await.unwrap().unwrap();
    assert_eq!(updated.temperature, 1.5);
    assert_eq!(updated.system_prompt, "Be brief.");
    assert_eq!(updated.name, agent.name);
    assert_eq!(updated.tools, agent.tools);
    assert_eq!(updated.created_at, agent.created_at);
    assert!(updated.updated_at >= agent.updated_at);
    assert_eq!(store.get_agent("crud-1").await.unwrap(), Some(updated));

    assert_eq!(store.update_agent("crud-missing", &patch).await.unwrap(), None);

    assert!(store.delete_agent("crud-1").await.unwrap());
    assert!(!store.delete_agent("crud-1").await.unwrap());
    assert_eq!(store.get_agent("crud-1").await.unwrap(), None);
}

async fn agent_ordering<S: Store>(store: &S) {
    let base = agentforge_types::time::now();

    let mut oldest = make_agent("order-c", "C");
    oldest.updated_at = base - Duration::seconds(20);
    oldest.created_at = oldest.updated_at;

    let mut tie_b = make_agent("order-b", "B");
    tie_b.updated_at = base - Duration::seconds(10);
    tie_b.created_at = tie_b.updated_at;

    let mut tie_a = make_agent("order-a", "A");
    tie_a.updated_at = tie_b.updated_at;
    tie_a.created_at = tie_a.updated_at;

    for agent in [&oldest, &tie_b, &tie_a] {
        store.create_agent(agent).await.unwrap();
    }

    let ids: Vec<String> = store
        .list_agents()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .filter(|id| id.starts_with("order-"))
        .collect();
    assert_eq!(ids, vec!["order-a", "order-b", "order-c"]);

    // Touching the oldest agent moves it to the front.
    store
        .update_agent("order-c", &AgentPatch::default())
        .await
        .unwrap();
    let first = store.list_agents().await.unwrap().remove(0);
    assert_eq!(first.id, "order-c");
}

async fn conversations<S: Store>(store: &S) {
    let conversation = Conversation {
        id: "conv-1".to_string(),
        agent_id: "conv-agent".to_string(),
        messages: vec![message("m1", "hello")],
        created_at: agentforge_types::time::now(),
    };

    assert_eq!(
        store.get_conversation_by_agent_id("conv-agent").await.unwrap(),
        None
    );

    let saved = store.save_conversation(&conversation).await.unwrap();
    assert_eq!(saved, conversation);

    // An upsert only replaces the messages.
    let mut replacement = conversation.clone();
    replacement.agent_id = "other-agent".to_string();
    replacement.messages.push(message("m2", "again"));
    let saved = store.save_conversation(&replacement).await.unwrap();
    assert_eq!(saved.agent_id, "conv-agent");
    assert_eq!(saved.created_at, conversation.created_at);
    assert_eq!(saved.messages.len(), 2);

    let fetched = store
        .get_conversation_by_agent_id("conv-agent")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, saved);

    assert!(store.delete_conversation("conv-1").await.unwrap());
    assert!(!store.delete_conversation("conv-1").await.unwrap());
    assert_eq!(
        store.get_conversation_by_agent_id("conv-agent").await.unwrap(),
        None
    );
}

async fn deployments<S: Store>(store: &S) {
    let deployment = Deployment::new("dep-agent", "af_key", agentforge_types::time::now());

    assert_eq!(store.get_deployment_by_agent_id("dep-agent").await.unwrap(), None);

    let created = store.create_deployment(&deployment).await.unwrap();
    assert_eq!(created, deployment);
    assert!(matches!(
        store.create_deployment(&deployment).await,
        Err(RepositoryError::Conflict(_))
    ));

    for _ in 0..3 {
        store.increment_request_count(&deployment.id).await.unwrap();
    }
    store.set_deployment_active(&deployment.id, false).await.unwrap();

    let stored = store
        .get_deployment_by_agent_id("dep-agent")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.request_count, 3);
    assert!(!stored.is_active);
    assert_eq!(stored.api_key, "af_key");

    // Unknown ids are ignored.
    store.increment_request_count("dep-missing").await.unwrap();
    store.set_deployment_active("dep-missing", true).await.unwrap();

    assert!(store.delete_deployment(&deployment.id).await.unwrap());
    assert!(!store.delete_deployment(&deployment.id).await.unwrap());
    assert_eq!(store.get_deployment_by_agent_id("dep-agent").await.unwrap(), None);
}
