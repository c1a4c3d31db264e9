// Drive lifecycle modules
//
// - discovery.rs: inventory query, identifier filtering, natural ordering
// - mount.rs: live mount-table safety gate (batch all-or-nothing)
// - format.rs: control-path derivation, capability probe, secure format

pub mod discovery;
pub mod format;
pub mod mount;




pub use discovery::DriveDiscovery;
pub use format::SecureFormat;
pub use mount::MountGuard;
