/*!
Password hashing and session tokens.

Passwords are stored as argon2id hashes of (password, per-user salt).

Sessions are stateless: after a successful login the client gets a cookie
holding a signed token that names the user. Every gated request verifies
the signature and turns the token back into a `Session`; nothing about
sessions is kept on the server.

A token looks like

```text
<user id>.<base64 user name>.<issued at, unix seconds>.<base64 HMAC-SHA256>
```
*/
use argon2::Argon2;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const HASH_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unable to hash password: {0}")]
    Hash(String),

    #[error("Unusable session secret: {0}")]
    Key(String),
}

/// Hash `password` with `salt`; the result is what goes in the `users` table.
pub fn hash_password(password: &str, salt: &str) -> Result<String, AuthError> {
    let mut out = [0u8; HASH_LENGTH];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(out))
}

pub fn verify_password(
    password: &str,
    salt: &str,
    stored_hash: &str
) -> Result<bool, AuthError> {
    let hash = hash_password(password, salt)?;
    Ok(hash.as_bytes().ct_eq(stored_hash.as_bytes()).into())
}

/// The authenticated user behind a request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Session {
    pub user_id: i64,
    pub name: String,
}

/// Issues and verifies session tokens.
pub struct SessionKeys {
    /// Keyed with the session secret; cloned for each signature.
    mac: HmacSha256,
    cookie_name: String,
    max_age: Option<u64>,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("cookie_name", &self.cookie_name)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(
        secret: &str,
        cookie_name: String,
        max_age: Option<u64>
    ) -> Result<Self, AuthError> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AuthError::Key(e.to_string()))?;
        Ok(Self { mac, cookie_name, max_age })
    }

    pub fn cookie_name(&self) -> &str { &self.cookie_name }

    pub fn max_age(&self) -> Option<u64> { self.max_age }

    fn sign(&self, payload: &str) -> String {
        let mut m = self.mac.clone();
        m.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(m.finalize().into_bytes())
    }

    fn signature_matches(&self, payload: &str, sig: &str) -> bool {
        let sig = match URL_SAFE_NO_PAD.decode(sig) {
            Ok(sig) => sig,
            Err(_) => { return false; },
        };
        let mut m = self.mac.clone();
        m.update(payload.as_bytes());
        m.verify_slice(&sig).is_ok()
    }

    pub fn issue(&self, session: &Session) -> String {
        self.issue_at(session, now())
    }

    pub fn issue_at(&self, session: &Session, issued_at: i64) -> String {
        log::trace!("SessionKeys::issue_at( {:?}, {} ) called.", session, &issued_at);

        let payload = format!(
            "{}.{}.{}",
            &session.user_id,
            URL_SAFE_NO_PAD.encode(session.name.as_bytes()),
            &issued_at
        );
        let sig = self.sign(&payload);
        format!("{}.{}", &payload, &sig)
    }

    pub fn verify(&self, token: &str) -> Option<Session> {
        self.verify_at(token, now())
    }

    /**
    Return the `Session` named by `token` if its signature checks out and
    (when a maximum age is configured) it isn't too old as of `now`.

    Any malformation at all just yields `None`.
    */
    pub fn verify_at(&self, token: &str, now: i64) -> Option<Session> {
        let (payload, sig) = token.rsplit_once('.')?;
        if !self.signature_matches(payload, sig) {
            log::debug!("Session token with bad signature rejected.");
            return None;
        }

        let mut parts = payload.split('.');
        let user_id: i64 = parts.next()?.parse().ok()?;
        let name_bytes = URL_SAFE_NO_PAD.decode(parts.next()?).ok()?;
        let name = String::from_utf8(name_bytes).ok()?;
        let issued_at: i64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        if let Some(max_age) = self.max_age {
            let age = now.saturating_sub(issued_at);
            if age < 0 || age as u64 > max_age {
                log::debug!("Session token for user {} expired.", &user_id);
                return None;
            }
        }

        Some(Session { user_id, name })
    }
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(max_age: Option<u64>) -> SessionKeys {
        SessionKeys::new("frogs", "roster_session".to_owned(), max_age).unwrap()
    }

    fn alice() -> Session {
        Session { user_id: 7, name: "Alice Q. Smith".to_owned() }
    }

    #[test]
    fn password_hashes() {
        let h = hash_password("pw1", "saltsaltsalt").unwrap();
        assert_ne!(h, "pw1");
        assert!(verify_password("pw1", "saltsaltsalt", &h).unwrap());
        assert!(!verify_password("pw2", "saltsaltsalt", &h).unwrap());
        assert!(!verify_password("pw1", "peppersalt", &h).unwrap());
        assert_ne!(h, hash_password("pw1", "peppersalt").unwrap());
    }

    #[test]
    fn short_salt_fails() {
        assert!(hash_password("pw1", "abc").is_err());
    }

    #[test]
    fn token_roundtrip() {
        let k = keys(None);
        let t = k.issue(&alice());
        assert_eq!(k.verify(&t), Some(alice()));
    }

    #[test]
    fn tampered_tokens() {
        let k = keys(None);
        let t = k.issue_at(&alice(), 1000);

        let forged = t.replacen("7.", "8.", 1);
        assert_eq!(k.verify(&forged), None);

        let other = SessionKeys::new("toads", "roster_session".to_owned(), None).unwrap();
        assert_eq!(other.verify(&t), None);

        assert_eq!(k.verify(""), None);
        assert_eq!(k.verify("garbage"), None);
        assert_eq!(k.verify(&format!("{}.extra", &t)), None);

        let (payload, _) = t.rsplit_once('.').unwrap();
        assert_eq!(k.verify(&format!("{}.not*base64", payload)), None);
        assert_eq!(k.verify(&format!("{}.", payload)), None);
    }

    #[test]
    fn token_expiry() {
        let k = keys(Some(60));
        let t = k.issue_at(&alice(), 1000);
        assert_eq!(k.verify_at(&t, 1030), Some(alice()));
        assert_eq!(k.verify_at(&t, 1061), None);
        // Issued in the future.
        assert_eq!(k.verify_at(&t, 900), None);
    }
}
