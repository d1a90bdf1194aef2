//! Session cookie rendering and extraction
//!
//! With a configured secret the cookie value is `<id>.<hex HMAC-SHA256 of id>`,
//! and values whose tag does not verify are dropped before the id is parsed.

use crate::session::SessionId;
use crate::{AuthError, AuthResult, CookieSameSite, CookieSecret, SessionConfig};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_SEPARATOR: char = '.';

/// Keyed MAC over session ids
#[derive(Clone)]
struct CookieSigner {
    mac: HmacSha256,
}

impl CookieSigner {
    fn new(secret: &CookieSecret) -> AuthResult<Self> {
        let mac = HmacSha256::new_from_slice(secret.expose())
            .map_err(|_| AuthError::config_error("Invalid cookie secret"))?;
        Ok(Self { mac })
    }

    fn sign(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify(&self, value: &str, signature: &str) -> bool {
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        // constant-time comparison
        mac.verify_slice(&tag).is_ok()
    }
}

impl fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CookieSigner(<redacted>)")
    }
}

/// Session cookie settings, derived from [`SessionConfig`]
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    domain: Option<String>,
    path: String,
    http_only: bool,
    secure: bool,
    same_site: CookieSameSite,
    max_age: u64,
    signer: Option<CookieSigner>,
}

impl SessionCookie {
    pub fn from_config(config: &SessionConfig) -> AuthResult<Self> {
        let signer = config.cookie_secret.as_ref().map(CookieSigner::new).transpose()?;

        Ok(Self {
            name: config.cookie_name.clone(),
            domain: config.cookie_domain.clone(),
            path: config.cookie_path.clone(),
            http_only: config.cookie_http_only,
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
            max_age: config.ttl,
            signer,
        })
    }

    /// Whether issued cookies carry a signature
    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Set-Cookie` value issuing `session_id` to the client
    pub fn set_cookie(&self, session_id: &SessionId) -> String {
        let id = session_id.expose();
        match &self.signer {
            Some(signer) => {
                let value = format!("{}{}{}", id, SIGNATURE_SEPARATOR, signer.sign(id));
                self.render(&value, self.max_age)
            }
            None => self.render(id, self.max_age),
        }
    }

    /// `Set-Cookie` value telling the client to drop the session cookie
    pub fn clear_cookie(&self) -> String {
        self.render("", 0)
    }

    /// Find a well-formed session id in a `Cookie` request header.
    ///
    /// Malformed or badly signed values are skipped, so a garbage cookie is
    /// treated like no cookie.
    pub fn extract(&self, cookie_header: &str) -> Option<SessionId> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| name.trim() == self.name)
            .find_map(|(_, value)| self.unseal(value.trim().trim_matches('"')))
    }

    fn unseal(&self, value: &str) -> Option<SessionId> {
        let raw = match &self.signer {
            Some(signer) => {
                let Some((id, signature)) = value.rsplit_once(SIGNATURE_SEPARATOR) else {
                    tracing::debug!("Rejected unsigned session cookie");
                    return None;
                };
                if !signer.verify(id, signature) {
                    tracing::debug!("Rejected session cookie with a bad signature");
                    return None;
                }
                id
            }
            None => value,
        };
        SessionId::parse(raw).ok()
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }

        cookie.push_str(&format!("; Path={}", self.path));

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }

        if self.secure {
            cookie.push_str("; Secure");
        }

        cookie.push_str(&format!("; SameSite={}", self.same_site));
        cookie.push_str(&format!("; Max-Age={}", max_age));

        cookie
    }
}
