pub mod registry;

pub use registry::{EmitterRegistry, StreamFrame, Subscription};
