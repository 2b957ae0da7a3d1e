//! Remote service implementations.

mod veo;

pub use veo::{RemoteModel, VeoClient, VeoClientBuilder};
