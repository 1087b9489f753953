use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{Repository, Store};

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.find('@') {
        Some(at) if at > 0 && at < email.len() - 1 => Ok(email),
        _ => Err(Error::validation(format!("{} is not an email address", email))),
    }
}

fn require_display_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        Err(Error::validation("display name must not be empty"))
    } else {
        Ok(name.to_owned())
    }
}

pub struct Users<S> {
    store: Arc<S>,
}

impl<S: Store> Users<S> {
    pub fn new(store: Arc<S>) -> Users<S> {
        Users { store }
    }

    /// Signs up a regular user. Emails are stored lower case and unique.
    pub fn register_user(
        &self,
        display_name: &str,
        email: &str,
        country: Option<String>,
        country_flag: Option<String>,
    ) -> Result<User> {
        let user = NewUser {
            display_name: require_display_name(display_name)?,
            email: normalize_email(email)?,
            role: Role::User,
            country,
            country_flag,
        };

        let user = self.store.transaction(|conn| conn.insert_user(&user))?;
        info!("Registered user {} ({})", user.user_id, user.display_name);
        Ok(user)
    }

    pub fn find_user(&self, user_id: UserId) -> Result<User> {
        self.store.transaction(|conn| {
            conn.find_user(user_id)?
                .ok_or_else(|| Error::not_found(format!("user {}", user_id)))
        })
    }

    pub fn update_profile(&self, current: &CurrentUser, changes: &ProfileChanges) -> Result<User> {
        let mut changes = changes.clone();
        if let Some(name) = changes.display_name.take() {
            changes.display_name = Some(require_display_name(&name)?);
        }
        if changes.display_name.is_none() && changes.country.is_none() && changes.country_flag.is_none() {
            return Err(Error::validation("nothing to update"));
        }

        let user = self
            .store
            .transaction(|conn| conn.update_profile(current.user_id, &changes))?;
        info!("User {} updated their profile", user.user_id);
        Ok(user)
    }

    pub fn grant_role(&self, current: &CurrentUser, user_id: UserId, role: Role) -> Result<User> {
        current.require_admin()?;
        let user = self.store.transaction(|conn| conn.update_role(user_id, role))?;
        info!("User {} gave user {} the {:?} role", current.user_id, user_id, role);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_lower_cased() {
        assert_eq!(
            normalize_email(" Keeper@Example.COM ").unwrap(),
            "keeper@example.com"
        );
    }

    #[test]
    fn emails_need_an_at_sign_between_parts() {
        assert!(normalize_email("keeper.example.com").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("keeper@").is_err());
    }
}
