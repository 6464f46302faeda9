//! HTTP authentication challenges (RFC 7616 Digest, RFC 7617 Basic).
//!
//! Hikvision firmware answers unauthenticated ISAPI requests with a
//! `WWW-Authenticate: Digest ...` challenge. Older firmware may offer Basic.

use md5::{Digest, Md5};
use rand::Rng;

/// Authentication scheme offered by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Digest(DigestChallenge),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub qop: Option<String>,
    pub algorithm: Option<String>,
}

/// Parse a `WWW-Authenticate` header value.
///
/// Returns `None` for unsupported schemes or a Digest challenge without a nonce.
pub fn parse_challenge(header: &str) -> Option<Challenge> {
    let header = header.trim();
    let (scheme, params) = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest),
        None => (header, ""),
    };

    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("digest") {
        return None;
    }

    let mut challenge = DigestChallenge::default();
    let mut has_nonce = false;

    for (key, value) in parse_params(params) {
        match key.to_ascii_lowercase().as_str() {
            "realm" => challenge.realm = value,
            "nonce" => {
                challenge.nonce = value;
                has_nonce = true;
            }
            "opaque" => challenge.opaque = Some(value),
            "qop" => challenge.qop = Some(value),
            "algorithm" => challenge.algorithm = Some(value),
            _ => {}
        }
    }

    has_nonce.then_some(Challenge::Digest(challenge))
}

/// Split `key=value, key="quoted, value"` pairs.
fn parse_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim().trim_start_matches(',').trim().to_string();
        let after = rest[eq + 1..].trim_start();

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            let mut value = String::new();
            let mut escaped = false;
            let mut end = quoted.len();
            for (idx, c) in quoted.char_indices() {
                if escaped {
                    value.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    end = idx + 1;
                    break;
                } else {
                    value.push(c);
                }
            }
            (value, &quoted[end.min(quoted.len())..])
        } else {
            let end = after.find(',').unwrap_or(after.len());
            (after[..end].trim().to_string(), &after[end..])
        };

        pairs.push((key, value));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}

impl DigestChallenge {
    /// Whether the challenge asks for `qop=auth` (possibly among other options).
    fn wants_qop_auth(&self) -> bool {
        self.qop
            .as_deref()
            .is_some_and(|qop| qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")))
    }

    fn is_sess(&self) -> bool {
        self.algorithm
            .as_deref()
            .is_some_and(|alg| alg.eq_ignore_ascii_case("MD5-sess"))
    }

    /// Build the `Authorization` header value answering this challenge.
    pub fn authorization(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        cnonce: &str,
        nonce_count: u32,
    ) -> String {
        let nc = format!("{:08x}", nonce_count);

        let mut ha1 = md5_hex(&format!("{}:{}:{}", username, self.realm, password));
        if self.is_sess() {
            ha1 = md5_hex(&format!("{}:{}:{}", ha1, self.nonce, cnonce));
        }
        let ha2 = md5_hex(&format!("{}:{}", method, uri));

        let response = if self.wants_qop_auth() {
            md5_hex(&format!("{}:{}:{}:{}:auth:{}", ha1, self.nonce, nc, cnonce, ha2))
        } else {
            md5_hex(&format!("{}:{}:{}", ha1, self.nonce, ha2))
        };

        let mut header = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
            username, self.realm, self.nonce, uri, response
        );
        if let Some(algorithm) = &self.algorithm {
            header.push_str(&format!(", algorithm={}", algorithm));
        }
        if self.wants_qop_auth() {
            header.push_str(&format!(r#", qop=auth, nc={}, cnonce="{}""#, nc, cnonce));
        }
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(r#", opaque="{}""#, opaque));
        }
        header
    }
}

/// Random client nonce for one request.
pub fn generate_cnonce() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 8] = rng.r#gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
