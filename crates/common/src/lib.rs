//! Shared building blocks for the workspace: logging setup, startup
//! environment checks and small wire types used by several crates.

pub mod env;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok", backend: "collections".into(), degraded: true };
        assert_eq!(h.status, "ok");
        assert!(h.degraded);
    }
}
