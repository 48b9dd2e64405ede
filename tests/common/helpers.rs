//! Flow and pipeline construction over a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use coleta::resolvers::{LocalityResolver, RegionResolver, LOCALITY_STAGE, REGION_STAGE};
use coleta::{RegistrationFlow, SearchFlow};
use coleta_pipeline::DependentPipeline;
use coleta_transport::testing::MockTransport;
use coleta_transport::{DirectoryClient, RegistryApi, StaticProvider};
use coleta_types::{ColetaConfig, Coordinates};

/// Configuration with waits short enough for tests.
pub fn test_config() -> ColetaConfig {
    ColetaConfig {
        geo_wait: Duration::from_millis(100),
        ..ColetaConfig::default()
    }
}

pub fn directory(mock: &Arc<MockTransport>) -> DirectoryClient {
    DirectoryClient::new(mock.clone())
}

pub fn registry(mock: &Arc<MockTransport>) -> RegistryApi {
    RegistryApi::new(mock.clone())
}

pub fn search_flow(mock: &Arc<MockTransport>) -> SearchFlow {
    SearchFlow::new(directory(mock), registry(mock))
}

/// A registration flow whose observer sits at `observer`.
pub fn registration_flow(mock: &Arc<MockTransport>, observer: Coordinates) -> RegistrationFlow {
    RegistrationFlow::new(
        directory(mock),
        registry(mock),
        Arc::new(StaticProvider::new(observer)),
        &test_config(),
    )
}

/// A bare region→locality pipeline over the scripted transport.
pub fn region_locality_pipeline(mock: &Arc<MockTransport>) -> DependentPipeline {
    DependentPipeline::builder()
        .stage(REGION_STAGE, RegionResolver::new(directory(mock)))
        .stage(LOCALITY_STAGE, LocalityResolver::new(directory(mock)))
        .spawn()
}
