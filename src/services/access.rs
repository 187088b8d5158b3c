//! Access policy
//!
//! Authorization for post mutations is a collaborator injected into the
//! post service, not hard-wired logic: the service asks the policy before
//! any update or archive, and deployments can swap the policy without
//! touching the mutation path.

use crate::models::{Post, User, UserRole};

/// Decides whether a principal may modify a post
pub trait AccessPolicy: Send + Sync {
    /// Check whether `principal` may update or archive `post`
    fn can_modify(&self, principal: &User, post: &Post) -> bool;
}

/// Role-based default policy: admins may modify any post, doctors only
/// their own.
pub struct RoleAccessPolicy;

impl AccessPolicy for RoleAccessPolicy {
    fn can_modify(&self, principal: &User, post: &Post) -> bool {
        principal.role == UserRole::Admin || post.author_id == principal.id
    }
}
