use crate::error::{Error, Result};
use crate::identity::AuthUser;
use crate::models::UserProfile;

/// The signed-in user and their profile.
///
/// Created by [`CampusHub`](crate::CampusHub) on sign-in and consumed on
/// sign-out. Operations that act on behalf of a user take it by reference.
#[derive(Debug, Clone)]
pub struct Session {
    user: AuthUser,
    profile: UserProfile,
}

impl Session {
    pub(crate) fn new(user: AuthUser, profile: UserProfile) -> Self {
        Self { user, profile }
    }

    pub fn uid(&self) -> &str {
        &self.user.uid
    }

    pub fn display_name(&self) -> &str {
        &self.profile.display_name
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub(crate) fn set_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
    }

    /// Fails unless this session's user is `owner_id`.
    pub(crate) fn require_owner(&self, owner_id: &str, action: &str) -> Result<()> {
        if self.uid() == owner_id {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "Only the owner can {}",
                action
            )))
        }
    }
}
