//! Router behavior: full-replace pushes, index maintenance, tenant
//! lifecycle, and per-tenant serialization.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use botflow::dispatch::{
    CommandSpec, DispatchError, DispatchRouter, InMemoryDeploymentStore, InMemoryProjectStore,
};
use botflow::model::GraphVersion;

mod common;
use common::*;

struct Harness {
    deployments: Arc<InMemoryDeploymentStore>,
    projects: Arc<InMemoryProjectStore>,
    registry: Arc<RecordingRegistry>,
    router: Arc<DispatchRouter>,
}

fn harness() -> Harness {
    let deployments = Arc::new(InMemoryDeploymentStore::new());
    let projects = Arc::new(InMemoryProjectStore::new());
    let registry = Arc::new(RecordingRegistry::new());
    let router = Arc::new(DispatchRouter::new(
        deployments.clone(),
        projects.clone(),
        registry.clone(),
    ));
    Harness {
        deployments,
        projects,
        registry,
        router,
    }
}

fn project_with_commands(h: &Harness, project_id: &str, names: &[&str]) {
    let commands = names
        .iter()
        .map(|n| CommandSpec::new(*n, format!("{n} command")))
        .collect();
    h.projects.set_commands(project_id, commands);
    for name in names {
        h.projects.set_active_graph(
            project_id,
            *name,
            GraphVersion {
                version: 1,
                graph: minimal_graph(),
            },
        );
    }
}

#[tokio::test]
async fn deploy_pushes_full_set_and_returns_own_count() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet", "ping"]);
    project_with_commands(&h, "proj-b", &["roll"]);

    let count = h.router.deploy("proj-a", "tenant-1").await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["greet", "ping"]
    );

    let count = h.router.deploy("proj-b", "tenant-1").await.unwrap();
    assert_eq!(count, 1);
    // The second push is the union, not just proj-b's commands.
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["greet", "ping", "roll"]
    );
}

#[tokio::test]
async fn undeploy_pushes_remaining_union_regardless_of_deploy_history() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    project_with_commands(&h, "proj-b", &["roll"]);

    // Deploying the same project repeatedly must not change what remains
    // after it is removed.
    h.router.deploy("proj-a", "tenant-1").await.unwrap();
    h.router.deploy("proj-b", "tenant-1").await.unwrap();
    h.router.deploy("proj-a", "tenant-1").await.unwrap();
    h.router.deploy("proj-a", "tenant-1").await.unwrap();

    h.router.undeploy("proj-a", "tenant-1").await.unwrap();
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["roll"]
    );

    let record = h
        .deployments
        .all()
        .into_iter()
        .find(|r| r.project_id == "proj-a")
        .unwrap();
    assert!(!record.is_active);
    assert!(matches!(
        h.router.resolve("tenant-1", "greet").await.unwrap_err(),
        DispatchError::NotDeployed { .. }
    ));
}

#[tokio::test]
async fn failed_registration_leaves_records_and_index_untouched() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);

    h.registry.fail_pushes.store(true, Ordering::SeqCst);
    let err = h.router.deploy("proj-a", "tenant-1").await.unwrap_err();
    assert!(matches!(err, DispatchError::Registration(_)));
    assert!(h.deployments.all().is_empty());

    // Resolution still sees nothing deployed.
    h.registry.fail_pushes.store(false, Ordering::SeqCst);
    assert!(matches!(
        h.router.resolve("tenant-1", "greet").await.unwrap_err(),
        DispatchError::NotDeployed { .. }
    ));
}

#[tokio::test]
async fn resolve_fills_index_lazily_from_persisted_records() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    h.router.deploy("proj-a", "tenant-1").await.unwrap();

    // A second router over the same stores starts with an empty index, as
    // after a process restart.
    let fresh = DispatchRouter::new(
        h.deployments.clone(),
        h.projects.clone(),
        h.registry.clone(),
    );
    let (project_id, version) = fresh.resolve("tenant-1", "greet").await.unwrap();
    assert_eq!(project_id, "proj-a");
    assert_eq!(version.version, 1);
    // Lazy fill reads the store; it never pushes to the registry.
    assert_eq!(h.registry.push_count(), 1);
}

#[tokio::test]
async fn resolve_unknown_command_is_not_deployed() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    h.router.deploy("proj-a", "tenant-1").await.unwrap();

    match h.router.resolve("tenant-1", "nope").await.unwrap_err() {
        DispatchError::NotDeployed {
            tenant_id,
            command_name,
        } => {
            assert_eq!(tenant_id, "tenant-1");
            assert_eq!(command_name, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn resolve_without_active_graph_fails() {
    let h = harness();
    h.projects
        .set_commands("proj-a", vec![CommandSpec::new("greet", "greet command")]);
    h.router.deploy("proj-a", "tenant-1").await.unwrap();

    assert!(matches!(
        h.router.resolve("tenant-1", "greet").await.unwrap_err(),
        DispatchError::NoActiveGraph { .. }
    ));
}

#[tokio::test]
async fn name_collision_goes_to_the_later_deployment() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    project_with_commands(&h, "proj-b", &["greet"]);

    h.router.deploy("proj-a", "tenant-1").await.unwrap();
    h.router.deploy("proj-b", "tenant-1").await.unwrap();

    let (project_id, _) = h.router.resolve("tenant-1", "greet").await.unwrap();
    assert_eq!(project_id, "proj-b");
    // One registration per name in the push.
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["greet"]
    );
}

#[tokio::test]
async fn tenant_joined_resyncs_every_active_deployment() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    project_with_commands(&h, "proj-b", &["roll", "flip"]);
    h.router.deploy("proj-a", "tenant-1").await.unwrap();
    h.router.deploy("proj-b", "tenant-1").await.unwrap();

    let count = h.router.tenant_joined("tenant-1").await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["flip", "greet", "roll"]
    );
}

#[tokio::test]
async fn tenant_left_deactivates_without_pushing() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    h.router.deploy("proj-a", "tenant-1").await.unwrap();
    let pushes_before = h.registry.push_count();

    h.router.tenant_left("tenant-1").await.unwrap();
    assert_eq!(h.registry.push_count(), pushes_before);
    assert!(h.deployments.all().iter().all(|r| !r.is_active));
    assert!(matches!(
        h.router.resolve("tenant-1", "greet").await.unwrap_err(),
        DispatchError::NotDeployed { .. }
    ));
}

#[tokio::test]
async fn tenant_can_be_redeployed_after_leaving() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);

    h.router.deploy("proj-a", "tenant-1").await.unwrap();
    h.router.tenant_left("tenant-1").await.unwrap();

    // Deploying again goes through a freshly created tenant lock and sees
    // only the new deployment, not the deactivated one.
    let count = h.router.deploy("proj-a", "tenant-1").await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["greet"]
    );
    let (project_id, _) = h.router.resolve("tenant-1", "greet").await.unwrap();
    assert_eq!(project_id, "proj-a");
}

#[tokio::test]
async fn concurrent_deploys_for_one_tenant_are_serialized() {
    let h = harness();
    project_with_commands(&h, "proj-a", &["greet"]);
    project_with_commands(&h, "proj-b", &["roll"]);
    h.registry.push_delay_ms.store(25, Ordering::SeqCst);

    let ra = h.router.clone();
    let rb = h.router.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { ra.deploy("proj-a", "tenant-1").await }),
        tokio::spawn(async move { rb.deploy("proj-b", "tenant-1").await }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    // Whichever deploy ran second saw the first's record, so its push is
    // the union.
    assert_eq!(h.registry.push_count(), 2);
    assert_eq!(
        h.registry.last_push_names("tenant-1").unwrap(),
        vec!["greet", "roll"]
    );
}
