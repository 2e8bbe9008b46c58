use digest::Digest;
use generic_array::GenericArray;
use sha1::Sha1;
use sha2::Sha256;

use crate::capabilities::Capabilities;
use crate::error::{protocol_err, Error};

/// Which challenge/response scramble the server wants for this handshake (or
/// auth-switch round). Structurally both variants are the same
/// XOR-of-double-hash shape over a different digest, per
/// `sqlx-core::mysql::protocol::auth_plugin::AuthPlugin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
}

impl AuthPlugin {
    pub(crate) fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "mysql_native_password" => Ok(AuthPlugin::MySqlNativePassword),
            "caching_sha2_password" => Ok(AuthPlugin::CachingSha2Password),
            other => Err(protocol_err!("unsupported authentication plugin: {}", other)),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => "mysql_native_password",
            AuthPlugin::CachingSha2Password => "caching_sha2_password",
        }
    }

    pub(crate) fn scramble(self, password: &str, seed: &[u8]) -> Vec<u8> {
        match self {
            AuthPlugin::MySqlNativePassword => scramble_sha1(password, seed),
            AuthPlugin::CachingSha2Password => scramble_sha256(password, seed),
        }
    }
}

/// Picks the scramble algorithm from the server's advertised capabilities
/// when no auth plugin name was given (pre-4.1 greetings never name one).
///
/// `caps & SECURE_CONNECTION` selects the 4.1+ SHA1-based scramble against
/// both salts; its absence means the 3.23/4.0 scheme against `salt1` alone.
/// The old scheme is a distinct (and weaker) algorithm, not merely "SHA1
/// truncated", so it is modeled separately from `AuthPlugin` rather than as
/// a third variant of it.
pub(crate) fn secure_connection(caps: Capabilities) -> bool {
    caps.contains(Capabilities::SECURE_CONNECTION)
}

/// `mysql_native_password` / the 4.1+ "secure connection" scramble:
/// `SHA1(password) XOR SHA1(seed || SHA1(SHA1(password)))`.
///
/// https://mariadb.com/kb/en/connection/#mysql_native_password-plugin
fn scramble_sha1(password: &str, seed: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    let pw_hash: GenericArray<u8, _> = hasher.finalize_reset();

    hasher.update(&pw_hash);
    let pw_hash_hash: GenericArray<u8, _> = hasher.finalize_reset();

    hasher.update(seed);
    hasher.update(&pw_hash_hash);
    let seed_hash_hash: GenericArray<u8, _> = hasher.finalize();

    xor(&pw_hash, &seed_hash_hash)
}

/// `caching_sha2_password`: the same XOR-of-double-hash shape as above, over
/// SHA-256 instead of SHA-1.
///
/// https://mariadb.com/kb/en/caching_sha2_password-authentication-plugin/#sha-2-encrypted-password
fn scramble_sha256(password: &str, seed: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let pw_hash: GenericArray<u8, _> = hasher.finalize_reset();

    hasher.update(&pw_hash);
    let pw_hash_hash: GenericArray<u8, _> = hasher.finalize_reset();

    hasher.update(seed);
    hasher.update(&pw_hash_hash);
    let seed_hash_hash: GenericArray<u8, _> = hasher.finalize();

    xor(&pw_hash, &seed_hash_hash)
}

/// The pre-4.1 `mysqlhash`/`scramble323` algorithm: two linear-congruential
/// generators are seeded off two SHA1-less hashes of the password and the
/// salt, then used to XOR-blend an extra "nonce" byte into every scrambled
/// byte. `salt1` is the only nonce in play (no `salt2` in this dialect).
///
/// https://mariadb.com/kb/en/connection/#old-password-authentication
pub(crate) fn scramble_323(password: &str, salt1: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let (hash_seed1, hash_seed2) = hash_password_323(password);
    let (salt_seed1, salt_seed2) = hash_password_323(
        std::str::from_utf8(salt1).expect("salt1 is printable ascii from the greeting"),
    );

    let seed1 = hash_seed1 ^ salt_seed1;
    let seed2 = hash_seed2 ^ salt_seed2;

    let mut rand_state = (seed1, seed2);
    let mut out = Vec::with_capacity(salt1.len());
    for &b in salt1 {
        let r = rand_323(&mut rand_state);
        out.push((r ^ u32::from(b)) as u8);
    }

    // extra scramble byte, per the original `scramble323` C implementation
    let extra = rand_323(&mut rand_state);
    for b in out.iter_mut() {
        *b ^= extra as u8;
    }

    out
}

fn rand_323(state: &mut (u32, u32)) -> u32 {
    const MAX: u32 = 0x3FFFFFFF;
    state.0 = (state.0 * 3 + state.1) % MAX;
    state.1 = (state.0 + state.1 + 33) % MAX;
    state.0 * 31 / MAX
}

fn hash_password_323(s: &str) -> (u32, u32) {
    let (mut nr, mut add) = (1345345333u32, 7u32);
    let mut nr2 = 0x12345671u32;

    for &b in s.as_bytes() {
        if b == b' ' || b == b'\t' {
            continue;
        }

        let tmp = u32::from(b);
        nr ^= (((nr & 63).wrapping_add(add)).wrapping_mul(tmp)).wrapping_add(nr.wrapping_shl(8));
        nr2 = nr2.wrapping_add((nr2.wrapping_shl(8)) ^ nr);
        add = add.wrapping_add(tmp);
    }

    (nr & 0x7FFFFFFF, nr2 & 0x7FFFFFFF)
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}
