//! Volume plugin protocol surface.
//!
//! [`VolumeDriver`] is what an adapter (HTTP handler, local RPC, the CLI)
//! calls: requests in, responses with either a payload or an error string
//! out. Validation of the request shape happens here, before the registry
//! is touched.

mod types;

use efsvol_shared::constants::protocol;
use efsvol_shared::errors::EfsvolError;
use tracing::Instrument;

use crate::volumes::VolumeRegistry;

pub use types::{
    ActivateResponse, CapabilitiesResponse, CapabilityInfo, CreateOpts, CreateRequest,
    ErrorResponse, GetRequest, GetResponse, ListResponse, MountRequest, MountResponse,
    OpenPermsOpts, OpenPermsRequest, PathRequest, PathResponse, RemoveRequest, UnmountRequest,
    VolumeRequest, decode_request,
};

#[derive(Clone)]
pub struct VolumeDriver {
    registry: VolumeRegistry,
}

impl VolumeDriver {
    pub fn new(registry: VolumeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &VolumeRegistry {
        &self.registry
    }

    pub fn activate(&self) -> ActivateResponse {
        ActivateResponse {
            implements: vec![protocol::IMPLEMENTS_VOLUME_DRIVER.to_string()],
        }
    }

    pub fn capabilities(&self) -> CapabilitiesResponse {
        CapabilitiesResponse {
            capabilities: CapabilityInfo {
                scope: protocol::SCOPE_LOCAL.to_string(),
            },
        }
    }

    pub async fn create(&self, request: CreateRequest) -> ErrorResponse {
        let span = tracing::info_span!("create", volume = %request.name);
        async {
            tracing::info!("start");

            let result = if request.name.is_empty() {
                Err(EfsvolError::missing_volume_name())
            } else if let Some(ip) = request.opts.ip.as_deref() {
                self.registry
                    .create(&request.name, ip, request.opts.az_map.clone())
                    .await
            } else {
                tracing::info!("mount-config-missing-ip");
                Err(EfsvolError::missing_ip())
            };

            tracing::info!("end");
            ErrorResponse::from_result(result)
        }
        .instrument(span)
        .await
    }

    pub async fn mount(&self, request: MountRequest) -> MountResponse {
        let span = tracing::info_span!("mount", volume = %request.name);
        MountResponse::from_result(self.registry.mount(&request.name).instrument(span).await)
    }

    pub async fn unmount(&self, request: UnmountRequest) -> ErrorResponse {
        let span = tracing::info_span!("unmount", volume = %request.name);
        ErrorResponse::from_result(self.registry.unmount(&request.name).instrument(span).await)
    }

    pub async fn remove(&self, request: RemoveRequest) -> ErrorResponse {
        let span = tracing::info_span!("remove", volume = %request.name);
        async {
            tracing::info!("start");
            let result = self.registry.remove(&request.name).await;
            tracing::info!("end");
            ErrorResponse::from_result(result)
        }
        .instrument(span)
        .await
    }

    pub async fn path(&self, request: PathRequest) -> PathResponse {
        let span = tracing::info_span!("path", volume = %request.name);
        PathResponse::from_result(self.registry.path(&request.name).instrument(span).await)
    }

    pub async fn get(&self, request: GetRequest) -> GetResponse {
        match self.registry.get(&request.name).await {
            Ok(record) => GetResponse {
                volume: record.to_info(),
                err: String::new(),
            },
            Err(e) => GetResponse {
                volume: Default::default(),
                err: e.to_string(),
            },
        }
    }

    pub async fn list(&self) -> ListResponse {
        ListResponse {
            volumes: self.registry.list().await,
            err: String::new(),
        }
    }
}
