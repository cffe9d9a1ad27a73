//! Invite codes - how users find their way into a family.
//!
//! Codes are eight characters drawn from a 31-character alphabet without the
//! easily confused `0`, `O`, `1`, `I` and `L`. Drawing is delegated to an
//! [`InviteCodeGenerator`] so tests can force collisions; uniqueness is checked
//! against the store with a bounded number of retries.

use crate::{
    entities::{Family, family},
    errors::{Error, Result},
};
use rand::Rng;
use sea_orm::{PaginatorTrait, prelude::*};
use tracing::{error, warn};

/// Characters an invite code may contain
pub const INVITE_CODE_ALPHABET: &[u8; 31] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Length of every invite code
pub const INVITE_CODE_LENGTH: usize = 8;

/// Draws made before giving up on finding an unused code
pub const MAX_INVITE_CODE_ATTEMPTS: usize = 10;

/// Source of candidate invite codes.
pub trait InviteCodeGenerator: Send + Sync {
    /// Produces a candidate code; uniqueness is checked by the caller.
    fn generate(&self) -> String;
}

/// Draws codes uniformly from [`INVITE_CODE_ALPHABET`] using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInviteCodes;

impl InviteCodeGenerator for RandomInviteCodes {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..INVITE_CODE_LENGTH)
            .map(|_| char::from(INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())]))
            .collect()
    }
}

/// Trims and upper-cases user input, then checks length and alphabet.
///
/// # Errors
/// [`Error::InvalidInviteCode`] if the input cannot be a code we issued.
pub fn normalize_invite_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    let well_formed = code.len() == INVITE_CODE_LENGTH
        && code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b));
    if well_formed {
        Ok(code)
    } else {
        Err(Error::InvalidInviteCode)
    }
}

/// Whether a family already uses `code`.
pub async fn invite_code_exists<C>(db: &C, code: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Family::find()
        .filter(family::Column::InviteCode.eq(code))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Draws codes until one is unused, at most [`MAX_INVITE_CODE_ATTEMPTS`] times.
///
/// # Errors
/// [`Error::InviteCodeExhausted`] if every draw collided. With 31^8 possible codes
/// this points at a broken generator rather than bad luck.
pub async fn generate_unique_invite_code<C>(
    db: &C,
    generator: &dyn InviteCodeGenerator,
) -> Result<String>
where
    C: ConnectionTrait,
{
    for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
        let candidate = generator.generate();
        if !invite_code_exists(db, &candidate).await? {
            return Ok(candidate);
        }
        warn!(attempt, "Invite code collision, drawing again");
    }

    error!("No unique invite code after {MAX_INVITE_CODE_ATTEMPTS} attempts");
    Err(Error::InviteCodeExhausted {
        attempts: MAX_INVITE_CODE_ATTEMPTS,
    })
}

/// Resolves a user-supplied code to its family.
///
/// # Errors
/// [`Error::InvalidInviteCode`] if the code is malformed or belongs to no family.
pub async fn find_family_by_invite_code<C>(db: &C, raw_code: &str) -> Result<family::Model>
where
    C: ConnectionTrait,
{
    let code = normalize_invite_code(raw_code)?;
    Family::find()
        .filter(family::Column::InviteCode.eq(code))
        .one(db)
        .await?
        .ok_or(Error::InvalidInviteCode)
}
