pub mod publisher;
pub mod request;
pub mod targets;

pub use publisher::NotificationPublisher;
pub use request::PublishRequest;
pub use targets::{MemberDirectory, TargetFinder};
