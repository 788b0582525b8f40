//! Collision-free names for packaged artefacts.

use uuid::Uuid;

use crate::descriptor::ComponentRole;

/// Generates artefact names that are unique within a run and distinct from
/// any pre-existing artefact.
///
/// Names are a role prefix followed by a random v4 UUID in lowercase simple
/// form, which is valid both as a package name and as an image tag. The
/// namer holds no state; generation cannot fail.
///
/// # Example
///
/// ```
/// use foundry_plugins::{ComponentRole, UniqueNamer};
///
/// let name = UniqueNamer.generate(ComponentRole::Controller);
/// assert!(name.starts_with("foundry-ctl-"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueNamer;

impl UniqueNamer {
    /// Generates a fresh name for a component of the given role.
    #[must_use]
    pub fn generate(self, role: ComponentRole) -> String {
        self.generate_with_prefix(role.name_prefix())
    }

    /// Generates a fresh name with an arbitrary prefix.
    #[must_use]
    pub fn generate_with_prefix(self, prefix: &str) -> String {
        format!("{prefix}{}", Uuid::new_v4().simple())
    }
}
