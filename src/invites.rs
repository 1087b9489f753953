use rand::{thread_rng, Rng};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::groups::require_group_admin;
use crate::models::*;
use crate::store::{Repository, Store};

pub const CODE_LENGTH: usize = 10;
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fresh codes drawn before giving up on finding one nobody holds.
const MAX_CODE_ATTEMPTS: usize = 5;

pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Ten independent uniform draws from `[A-Z0-9]`.
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&self) -> String {
        let mut rng = thread_rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0, CODE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Codes are handed out in upper case; lookups accept any case and
/// surrounding whitespace. Anything that could never have been issued is
/// reported like an unknown code.
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
        return Err(Error::not_found("invite code"));
    }
    Ok(code)
}

fn with_fresh_code<F>(codes: &dyn CodeSource, mut write: F) -> Result<GroupInvite>
where
    F: FnMut(&str) -> Result<GroupInvite>,
{
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = codes.next_code();
        match write(&code) {
            Err(Error::Conflict(reason)) => {
                warn!("Invite code collision on attempt {}: {}", attempt, reason);
            }
            other => return other,
        }
    }
    Err(Error::conflict("could not allocate a unique invite code"))
}

pub(crate) fn resolve_code<R: Repository>(conn: &R, code: &str) -> Result<GroupInvite> {
    let code = normalize_code(code)?;
    conn.find_invite_by_code(&code)?
        .ok_or_else(|| Error::not_found("invite code"))
}

pub(crate) fn issue_code<R: Repository>(
    conn: &R,
    codes: &dyn CodeSource,
    group_id: GroupId,
) -> Result<GroupInvite> {
    if conn.find_invite_by_group(group_id)?.is_some() {
        return Err(Error::conflict(format!(
            "group {} already has an invite code, rotate it instead",
            group_id
        )));
    }
    with_fresh_code(codes, |code| {
        conn.insert_invite(&GroupInvite {
            group_id,
            code: code.to_owned(),
        })
    })
}

pub(crate) fn replace_code<R: Repository>(
    conn: &R,
    codes: &dyn CodeSource,
    group_id: GroupId,
) -> Result<GroupInvite> {
    if conn.find_invite_by_group(group_id)?.is_none() {
        return Err(Error::not_found(format!("invite code for group {}", group_id)));
    }
    with_fresh_code(codes, |code| conn.update_invite_code(group_id, code))
}

/// What a user sees about a group before accepting its invite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitePreview {
    pub group: PredictionGroup,
    pub tournament: Tournament,
    pub admin: User,
    pub member_count: i64,
}

pub struct InviteCodes<S> {
    store: Arc<S>,
    codes: Arc<dyn CodeSource>,
}

impl<S: Store> InviteCodes<S> {
    pub fn new(store: Arc<S>, codes: Arc<dyn CodeSource>) -> InviteCodes<S> {
        InviteCodes { store, codes }
    }

    pub fn generate(&self, current: &CurrentUser, group_id: GroupId) -> Result<GroupInvite> {
        let invite = self.store.transaction(|conn| {
            require_group_admin(conn, group_id, current)?;
            issue_code(conn, &*self.codes, group_id)
        })?;
        info!("User {} generated an invite code for group {}", current.user_id, group_id);
        Ok(invite)
    }

    /// Replaces the code in place; the old one stops resolving immediately.
    pub fn rotate(&self, current: &CurrentUser, group_id: GroupId) -> Result<GroupInvite> {
        let invite = self.store.transaction(|conn| {
            require_group_admin(conn, group_id, current)?;
            replace_code(conn, &*self.codes, group_id)
        })?;
        info!("User {} rotated the invite code of group {}", current.user_id, group_id);
        Ok(invite)
    }

    pub fn resolve(&self, code: &str) -> Result<GroupId> {
        self.store
            .transaction(|conn| resolve_code(conn, code))
            .map(|invite| invite.group_id)
    }

    pub fn current_invite(&self, current: &CurrentUser, group_id: GroupId) -> Result<Option<GroupInvite>> {
        self.store.transaction(|conn| {
            require_group_admin(conn, group_id, current)?;
            conn.find_invite_by_group(group_id)
        })
    }

    pub fn preview_invite(&self, code: &str) -> Result<InvitePreview> {
        self.store.transaction(|conn| {
            let invite = resolve_code(conn, code)?;
            let group = conn
                .find_group(invite.group_id)?
                .ok_or_else(|| Error::not_found(format!("group {}", invite.group_id)))?;
            let tournament = conn
                .find_tournament(group.tournament_id)?
                .ok_or_else(|| Error::not_found(format!("tournament {}", group.tournament_id)))?;
            let admin = conn
                .find_user(group.admin_id)?
                .ok_or_else(|| Error::not_found(format!("user {}", group.admin_id)))?;
            let member_count = conn.count_members(group.group_id)?;

            Ok(InvitePreview {
                group,
                tournament,
                admin,
                member_count,
            })
        })
    }
}
