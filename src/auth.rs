use crate::error::{Error, Result};
use crate::models::{Role, User, UserId};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub role: Role,
}

impl CurrentUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.has_role(Role::Admin) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "user {} is not an administrator",
                self.user_id
            )))
        }
    }
}

impl<'a> From<&'a User> for CurrentUser {
    fn from(user: &'a User) -> CurrentUser {
        CurrentUser {
            user_id: user.user_id,
            role: user.role,
        }
    }
}

/// Session handling lives outside this crate; whatever issues sessions hands
/// the caller in through this seam.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<CurrentUser>;

    fn authenticate(&self) -> Result<CurrentUser> {
        self.current_user().ok_or(Error::Unauthenticated)
    }
}

impl IdentityProvider for Option<CurrentUser> {
    fn current_user(&self) -> Option<CurrentUser> {
        *self
    }
}
