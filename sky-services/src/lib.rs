//! Service backends exposed through the skyquery operation registry.
//!
//! Each backend implements [`ServiceTarget`]: it declares its callable
//! members (name, documentation, parameter specs) and dispatches
//! invocations by operation name. The registry discovers operation
//! descriptors from the declared member tables; the executor invokes
//! through the trait.

#![warn(missing_docs, clippy::pedantic)]

pub mod ads;
pub mod heasarc;
mod http_client;
pub mod irsa;
pub mod mast;
pub mod ned;
pub mod params;
pub mod simbad;
pub mod tap;
pub mod traits;
pub mod vizier;

pub use traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};
