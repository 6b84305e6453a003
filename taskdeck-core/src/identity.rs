//! Identity types for taskdeck entities

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a `Uuid` newtype so task and user identifiers cannot be swapped.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh, timestamp-sortable identifier (UUIDv7).
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Raw 16-byte form, used for binary key attributes.
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(
    /// Identifier of a task. Generated at creation, immutable afterwards.
    TaskId
);

define_id!(
    /// Identifier of the principal that owns tasks.
    UserId
);

type HmacSha256 = Hmac<Sha256>;

const SALT_SEPARATOR: char = '$';

/// HMAC rounds applied per password hash.
const HASH_ROUNDS: usize = 4096;

/// Hash a password with a fresh random salt.
///
/// The result has the form `<salt>$<hex digest>`, where the digest is
/// HMAC-SHA256 keyed by the salt, iterated [`HASH_ROUNDS`] times.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    // An empty digest never verifies.
    let digest = final_round(&salt, password)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}{}{}", salt, SALT_SEPARATOR, digest)
}

/// Check a candidate password against a value produced by [`hash_password`].
///
/// The digest comparison is constant-time.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let Some((salt, digest)) = stored.split_once(SALT_SEPARATOR) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };
    let Some(mac) = final_round(salt, candidate) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}

/// Run every round but the last and return the last one unfinalized.
fn final_round(salt: &str, password: &str) -> Option<HmacSha256> {
    let keyed = HmacSha256::new_from_slice(salt.as_bytes()).ok()?;
    let mut input = password.as_bytes().to_vec();
    for _ in 1..HASH_ROUNDS {
        let mut round = keyed.clone();
        round.update(&input);
        input = round.finalize().into_bytes().to_vec();
    }
    let mut last = keyed;
    last.update(&input);
    Some(last)
}
