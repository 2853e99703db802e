/// Kubernetes cluster access through kubectl
pub mod client;
pub mod error;
pub mod interface;
pub mod resources;

pub use client::KubectlClient;
pub use error::KubectlError;
pub use interface::{KubectlInterface, ManifestAction};
pub use resources::ApiResources;
