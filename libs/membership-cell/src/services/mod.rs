pub mod artifact;
pub mod lifecycle;
pub mod membership;
pub mod store;

pub use artifact::MembershipArtifactStore;
pub use lifecycle::MembershipLifecycleService;
pub use membership::MembershipService;
pub use store::MembershipStore;
