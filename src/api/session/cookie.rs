//! 会话 cookie
//!
//! cookie 值格式为 `<会话ID>.<签名>`，签名是会话ID的 HMAC-SHA256（base64url 无填充），
//! 密钥来自配置中的会话密钥。签名不匹配的 cookie 视为匿名请求。

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

/// 会话ID签名器
#[derive(Clone)]
pub struct CookieSigner {
    key: Vec<u8>,
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC 接受任意长度的密钥
        <HmacSha256 as Mac>::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    pub fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(session_id.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", session_id, signature)
    }

    /// Returns the session id if the signature is valid
    pub fn unsign(&self, value: &str) -> Option<String> {
        let (session_id, signature) = value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(session_id.to_string())
    }
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CookieSigner { .. }")
    }
}

/// 会话 cookie 的属性
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age_secs: i64,
    signer: CookieSigner,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secret: &str, secure: bool, max_age_secs: i64) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age_secs,
            signer: CookieSigner::new(secret),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session.cookie_name.clone(),
            &config.session.secret,
            config.secure_cookies(),
            config.session.ttl_secs as i64,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 从 cookie jar 中取出并校验会话ID
    pub fn session_id(&self, jar: &CookieJar) -> Option<String> {
        let cookie = jar.get(&self.name)?;
        self.signer.unsign(cookie.value())
    }

    pub fn build(&self, session_id: &str) -> Cookie<'static> {
        Cookie::build((self.name.clone(), self.signer.sign(session_id)))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age_secs))
            .build()
    }

    /// 写入会话 cookie
    pub fn set(&self, jar: CookieJar, session_id: &str) -> CookieJar {
        jar.add(self.build(session_id))
    }

    /// 清除会话 cookie
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build((self.name.clone(), "")).path("/"))
    }
}
