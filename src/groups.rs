//! Prediction groups: creation, the join protocol and membership changes.
//!
//! A join resolves the invite code and then, with the group row locked,
//! checks for an existing membership, checks the head count against the
//! capacity and inserts. All of that happens in one transaction so two
//! racing joins can never both take the last seat.

use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::invites::{issue_code, resolve_code, CodeSource};
use crate::models::*;
use crate::store::{Repository, Store};

pub const MAX_GROUP_MEMBERS: usize = 500;
pub const MAX_GROUP_NAME_LENGTH: usize = 64;

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("group name must not be empty"));
    }
    if name.chars().count() > MAX_GROUP_NAME_LENGTH {
        return Err(Error::validation(format!(
            "group name must be at most {} characters",
            MAX_GROUP_NAME_LENGTH
        )));
    }
    Ok(name)
}

fn find_group<R: Repository>(conn: &R, group_id: GroupId) -> Result<PredictionGroup> {
    conn.find_group(group_id)?
        .ok_or_else(|| Error::not_found(format!("group {}", group_id)))
}

/// Loads the group and checks that `current` administers it.
pub(crate) fn require_group_admin<R: Repository>(
    conn: &R,
    group_id: GroupId,
    current: &CurrentUser,
) -> Result<PredictionGroup> {
    let group = find_group(conn, group_id)?;
    if !group.is_admin(current.user_id) {
        return Err(Error::forbidden(format!(
            "user {} is not the admin of group {}",
            current.user_id, group_id
        )));
    }
    Ok(group)
}

pub(crate) fn admit<R: Repository>(
    conn: &R,
    group_id: GroupId,
    user_id: UserId,
    capacity: usize,
) -> Result<GroupMember> {
    conn.lock_group(group_id)?
        .ok_or_else(|| Error::not_found(format!("group {}", group_id)))?;

    if conn.is_member(group_id, user_id)? {
        return Err(Error::conflict(format!(
            "user {} is already a member of group {}",
            user_id, group_id
        )));
    }
    if conn.count_members(group_id)? >= capacity as i64 {
        return Err(Error::CapacityExceeded(capacity));
    }

    conn.insert_member(&NewGroupMember { group_id, user_id })
}

pub struct Groups<S> {
    store: Arc<S>,
    codes: Arc<dyn CodeSource>,
    capacity: usize,
}

impl<S: Store> Groups<S> {
    pub fn new(store: Arc<S>, codes: Arc<dyn CodeSource>, capacity: usize) -> Groups<S> {
        Groups {
            store,
            codes,
            capacity,
        }
    }

    /// Creates the group with its first invite code and the creator as
    /// admin and first member.
    pub fn create_group(
        &self,
        current: &CurrentUser,
        tournament_id: TournamentId,
        name: &str,
    ) -> Result<(PredictionGroup, GroupInvite)> {
        let name = validate_name(name)?;

        let (group, invite) = self.store.transaction(|conn| {
            conn.find_tournament(tournament_id)?
                .ok_or_else(|| Error::not_found(format!("tournament {}", tournament_id)))?;

            let group = conn.insert_group(&NewPredictionGroup {
                name: name.to_owned(),
                admin_id: current.user_id,
                tournament_id,
            })?;
            admit(conn, group.group_id, current.user_id, self.capacity)?;
            let invite = issue_code(conn, &*self.codes, group.group_id)?;

            Ok((group, invite))
        })?;

        info!(
            "User {} created group {} ({}) for tournament {}",
            current.user_id, group.group_id, group.name, tournament_id
        );
        Ok((group, invite))
    }

    pub fn join(&self, current: &CurrentUser, code: &str) -> Result<GroupMember> {
        let member = self.store.transaction(|conn| {
            let invite = resolve_code(conn, code)?;
            admit(conn, invite.group_id, current.user_id, self.capacity)
        })?;

        info!("User {} joined group {}", member.user_id, member.group_id);
        Ok(member)
    }

    /// Leaves a group. The admin owns the group and has to delete it instead.
    pub fn leave(&self, current: &CurrentUser, group_id: GroupId) -> Result<()> {
        self.store.transaction(|conn| {
            let group = find_group(conn, group_id)?;
            if group.is_admin(current.user_id) {
                return Err(Error::invalid_state(format!(
                    "the admin cannot leave group {}, delete it instead",
                    group_id
                )));
            }
            match conn.delete_member(group_id, current.user_id)? {
                0 => Err(Error::not_found("group membership")),
                _ => Ok(()),
            }
        })?;

        info!("User {} left group {}", current.user_id, group_id);
        Ok(())
    }

    pub fn remove_member(&self, current: &CurrentUser, group_id: GroupId, user_id: UserId) -> Result<()> {
        self.store.transaction(|conn| {
            let group = require_group_admin(conn, group_id, current)?;
            if group.is_admin(user_id) {
                return Err(Error::invalid_state(format!(
                    "the admin of group {} cannot be removed",
                    group_id
                )));
            }
            match conn.delete_member(group_id, user_id)? {
                0 => Err(Error::not_found("group membership")),
                _ => Ok(()),
            }
        })?;

        info!(
            "User {} removed user {} from group {}",
            current.user_id, user_id, group_id
        );
        Ok(())
    }

    /// Deletes the group along with its memberships and invite code.
    pub fn delete_group(&self, current: &CurrentUser, group_id: GroupId) -> Result<()> {
        self.store.transaction(|conn| {
            require_group_admin(conn, group_id, current)?;
            conn.delete_group(group_id).map(|_| ())
        })?;

        info!("User {} deleted group {}", current.user_id, group_id);
        Ok(())
    }

    pub fn rename_group(&self, current: &CurrentUser, group_id: GroupId, name: &str) -> Result<PredictionGroup> {
        let name = validate_name(name)?;
        let group = self.store.transaction(|conn| {
            require_group_admin(conn, group_id, current)?;
            conn.rename_group(group_id, name)
        })?;

        info!("User {} renamed group {} to {}", current.user_id, group_id, group.name);
        Ok(group)
    }

    pub fn groups_for_user(
        &self,
        current: &CurrentUser,
        tournament_id: Option<TournamentId>,
    ) -> Result<Vec<PredictionGroup>> {
        self.store
            .transaction(|conn| conn.list_groups_for_user(current.user_id, tournament_id))
    }

    /// The roster, visible to members only.
    pub fn group_members(&self, current: &CurrentUser, group_id: GroupId) -> Result<Vec<(GroupMember, User)>> {
        self.store.transaction(|conn| {
            find_group(conn, group_id)?;
            if !conn.is_member(group_id, current.user_id)? {
                return Err(Error::forbidden(format!(
                    "user {} is not a member of group {}",
                    current.user_id, group_id
                )));
            }
            conn.list_members(group_id)
        })
    }
}
