/// Pre-install permission checks
pub mod permissions;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use permissions::PermissionChecker;
pub use utils::PreCheckUtils;
