//! cdn-core: shared building blocks for cdn-rs.
//!
//! Errors with HTTP-style codes, layered configuration, caller identity and
//! random id generation. Storage crates (`cdn-blob`, `cdn-docs`) and the
//! resource layer (`cdn-resources`) build on these.

pub mod config;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod telemetry;

pub use config::{CdnConfig, ConfigMap, ConfigSnapshot, SpacesConfig};
pub use errors::{CdnError, CdnResult, ErrorKind, Failure};
pub use identity::{bearer_token, IdentityVerifier, JwtIdentityVerifier, OwnerId, StaticTokenVerifier};
pub use ids::{random_id, IdSource, RandomIds};
pub use telemetry::init_tracing;
