//! Integration tests for the volume plugin protocol surface.

use efsvol::VolumeDriver;
use efsvol::driver::{CreateOpts, CreateRequest, VolumeRequest, decode_request};
use efsvol_shared::constants::mount;
use efsvol_test_utils::TestRegistry;
use serde_json::json;

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct TestContext {
    driver: VolumeDriver,
    registry: TestRegistry,
}

impl TestContext {
    async fn new() -> Self {
        let registry = TestRegistry::new().await;
        let driver = VolumeDriver::new(registry.registry.clone());
        Self { driver, registry }
    }

    async fn create(&self, name: &str, ip: &str) {
        let response = self
            .driver
            .create(CreateRequest {
                name: name.to_string(),
                opts: CreateOpts {
                    ip: Some(ip.to_string()),
                    ..Default::default()
                },
            })
            .await;
        assert!(response.is_ok(), "create failed: {}", response.err);
    }
}

// ============================================================================
// HANDSHAKE
// ============================================================================

#[tokio::test]
async fn activate_and_capabilities() {
    let ctx = TestContext::new().await;

    assert_eq!(
        serde_json::to_value(ctx.driver.activate()).unwrap(),
        json!({ "Implements": ["VolumeDriver"] })
    );
    assert_eq!(
        serde_json::to_value(ctx.driver.capabilities()).unwrap(),
        json!({ "Capabilities": { "Scope": "local" } })
    );
}

// ============================================================================
// CREATE
// ============================================================================

#[tokio::test]
async fn create_from_wire_request() {
    let ctx = TestContext::new().await;
    let request: CreateRequest =
        decode_request(br#"{"Name":"v1","Opts":{"ip":"10.0.0.1"}}"#).unwrap();

    let response = ctx.driver.create(request).await;
    assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "Err": "" }));
    assert_eq!(ctx.registry.registry.list().await.len(), 1);
}

#[tokio::test]
async fn create_without_ip_is_rejected() {
    let ctx = TestContext::new().await;
    let request: CreateRequest = decode_request(br#"{"Name":"v1","Opts":{}}"#).unwrap();

    let response = ctx.driver.create(request).await;
    assert_eq!(response.err, "Missing mandatory 'ip' field in 'Opts'");
    assert!(ctx.registry.registry.list().await.is_empty());
}

#[tokio::test]
async fn create_without_name_is_rejected() {
    let ctx = TestContext::new().await;
    let request: CreateRequest = decode_request(br#"{"Opts":{"ip":"10.0.0.1"}}"#).unwrap();

    let response = ctx.driver.create(request).await;
    assert_eq!(response.err, "Missing mandatory 'volume_name'");
}

#[tokio::test]
async fn create_with_non_string_ip_is_malformed() {
    let err = decode_request::<CreateRequest>(br#"{"Name":"v1","Opts":{"ip":42}}"#).unwrap_err();
    assert!(err.to_string().starts_with("Malformed request"));
}

#[tokio::test]
async fn create_accepts_az_map() {
    let ctx = TestContext::new().await;
    let request: CreateRequest = decode_request(
        br#"{"Name":"v1","Opts":{"ip":"10.0.0.1","az-map":{"us-east-1a":"10.0.1.1:/"}}}"#,
    )
    .unwrap();

    assert!(ctx.driver.create(request).await.is_ok());
    let record = ctx.registry.registry.get("v1").await.unwrap();
    assert_eq!(record.az_map["us-east-1a"], "10.0.1.1:/");
}

// ============================================================================
// MOUNT / PATH / UNMOUNT
// ============================================================================

#[tokio::test]
async fn mount_returns_mountpoint() {
    let ctx = TestContext::new().await;
    ctx.create("v1", "10.0.0.1").await;

    let response = ctx.driver.mount(VolumeRequest::new("v1")).await;
    let expected = ctx.registry.mount_path("v1").to_string_lossy().into_owned();
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "Mountpoint": expected, "Err": "" })
    );

    let path = ctx.driver.path(VolumeRequest::new("v1")).await;
    assert_eq!(path.mountpoint, expected);
}

#[tokio::test]
async fn mount_unknown_volume_reports_error_only() {
    let ctx = TestContext::new().await;

    let response = ctx.driver.mount(VolumeRequest::new("missing")).await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "Mountpoint": "",
            "Err": "Volume 'missing' must be created before being mounted"
        })
    );
    assert_eq!(ctx.registry.invoker.count(mount::MOUNT_PROGRAM), 0);
}

#[tokio::test]
async fn path_before_mount_reports_error() {
    let ctx = TestContext::new().await;
    ctx.create("v1", "10.0.0.1").await;

    let response = ctx.driver.path(VolumeRequest::new("v1")).await;
    assert_eq!(response.err, "Volume not previously mounted");
    assert!(response.mountpoint.is_empty());
}

#[tokio::test]
async fn unmount_round_trip() {
    let ctx = TestContext::new().await;
    ctx.create("v1", "10.0.0.1").await;
    assert!(ctx.driver.mount(VolumeRequest::new("v1")).await.is_ok());

    assert!(ctx.driver.unmount(VolumeRequest::new("v1")).await.is_ok());
    let again = ctx.driver.unmount(VolumeRequest::new("v1")).await;
    assert_eq!(again.err, "Volume not previously mounted");
}

// ============================================================================
// GET / LIST / REMOVE
// ============================================================================

#[tokio::test]
async fn get_reports_public_fields() {
    let ctx = TestContext::new().await;
    ctx.create("v1", "10.0.0.1").await;
    ctx.driver.mount(VolumeRequest::new("v1")).await;

    let response = ctx.driver.get(VolumeRequest::new("v1")).await;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["Volume"]["Name"], "v1");
    assert_eq!(value["Volume"]["MountCount"], 1);
    assert_eq!(value["Err"], "");
    // Remote address is not part of the public view.
    assert!(value["Volume"].get("Ip").is_none());
}

#[tokio::test]
async fn get_unknown_volume() {
    let ctx = TestContext::new().await;
    let response = ctx.driver.get(VolumeRequest::new("nope")).await;
    assert_eq!(response.err, "Volume 'nope' not found");
    assert!(response.volume.name.is_empty());
}

#[tokio::test]
async fn list_and_remove() {
    let ctx = TestContext::new().await;
    ctx.create("a", "10.0.0.1").await;
    ctx.create("b", "10.0.0.2").await;

    let listed = ctx.driver.list().await;
    assert_eq!(listed.volumes.len(), 2);
    assert!(listed.err.is_empty());

    assert!(ctx.driver.remove(VolumeRequest::new("a")).await.is_ok());
    let listed = ctx.driver.list().await;
    assert_eq!(listed.volumes.len(), 1);
    assert_eq!(listed.volumes[0].name, "b");

    let missing = ctx.driver.remove(VolumeRequest::new("a")).await;
    assert_eq!(missing.err, "Volume 'a' not found");
}
