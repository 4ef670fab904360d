//! Request signing.
//!
//! Shared Key signs a canonical rendering of the request with HMAC-SHA256
//! keyed by the account key. SAS tokens are pre-signed query strings and are
//! simply merged into the request query.

use crate::{
    error::{Result, StorageError},
    request::StorageRequest,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Standard headers covered by the blob/queue/file Shared Key scheme, in order.
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Anonymous,
    Sas(String),
    SharedKey { account: String, key: String },
    SharedKeyTable { account: String, key: String },
}

impl Credential {
    /// Sign `request` in place. Must run after every header is final.
    pub fn sign(&self, request: &mut StorageRequest) -> Result<()> {
        match self {
            Credential::Anonymous => Ok(()),
            Credential::Sas(token) => {
                for (name, value) in url::form_urlencoded::parse(token.as_bytes()) {
                    request
                        .query
                        .entry(name.into_owned())
                        .or_insert_with(|| value.into_owned());
                }
                Ok(())
            }
            Credential::SharedKey { account, key } => {
                let string_to_sign = shared_key_string_to_sign(account, request);
                debug!(%string_to_sign, "shared key string to sign");
                let signature = sign_string(key, &string_to_sign)?;
                request.set_header("authorization", format!("SharedKey {account}:{signature}"));
                Ok(())
            }
            Credential::SharedKeyTable { account, key } => {
                let string_to_sign = table_string_to_sign(account, request);
                debug!(%string_to_sign, "shared key string to sign");
                let signature = sign_string(key, &string_to_sign)?;
                request.set_header("authorization", format!("SharedKey {account}:{signature}"));
                Ok(())
            }
        }
    }
}

pub fn shared_key_string_to_sign(account: &str, request: &StorageRequest) -> String {
    let mut out = format!("{}\n", request.method.as_str());
    for name in SIGNED_HEADERS {
        let value = match request.header(name) {
            Some("0") if name == "content-length" => "",
            Some(v) => v,
            None => "",
        };
        out.push_str(value);
        out.push('\n');
    }

    // headers are already sorted by lower-case name
    for (name, value) in request.headers.iter().filter(|(n, _)| n.starts_with("x-ms-")) {
        out.push_str(&format!("{name}:{value}\n"));
    }

    out.push_str(&format!("/{account}{}", request.path));
    let mut query: Vec<(String, &str)> = request
        .query
        .iter()
        .map(|(n, v)| (n.to_ascii_lowercase(), v.as_str()))
        .collect();
    query.sort();
    for (name, value) in query {
        out.push_str(&format!("\n{name}:{value}"));
    }
    out
}

pub fn table_string_to_sign(account: &str, request: &StorageRequest) -> String {
    let mut out = format!(
        "{}\n{}\n{}\n{}\n/{account}{}",
        request.method.as_str(),
        request.header("content-md5").unwrap_or_default(),
        request.header("content-type").unwrap_or_default(),
        request.header("x-ms-date").unwrap_or_default(),
        request.path,
    );
    if let Some(comp) = request.query.get("comp") {
        out.push_str(&format!("?comp={comp}"));
    }
    out
}

/// base64(HMAC-SHA256(base64-decoded key, value))
pub fn sign_string(key: &str, value: &str) -> Result<String> {
    let key = base64::decode(key)
        .map_err(|e| StorageError::Auth(format!("account key is not valid base64: {e}")))?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| StorageError::Auth(format!("unusable account key: {e}")))?;
    mac.update(value.as_bytes());
    Ok(base64::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn request() -> StorageRequest {
        StorageRequest::new(Method::GET, "/mycontainer")
            .with_query("restype", "container")
            .with_query("comp", "list")
            .with_header("x-ms-version", "2017-11-09")
            .with_header("x-ms-date", "Fri, 26 Jun 2015 23:39:12 GMT")
            .with_header("Content-Length", "0")
    }

    #[test]
    fn canonical_form_for_blob_requests() {
        let expected = "GET\n\n\n\n\n\n\n\n\n\n\n\n\
x-ms-date:Fri, 26 Jun 2015 23:39:12 GMT\n\
x-ms-version:2017-11-09\n\
/acct/mycontainer\ncomp:list\nrestype:container";
        assert_eq!(shared_key_string_to_sign("acct", &request()), expected);
    }

    #[test]
    fn canonical_form_for_table_requests() {
        let req = request().with_header("content-type", "application/json");
        assert_eq!(
            table_string_to_sign("acct", &req),
            "GET\n\napplication/json\nFri, 26 Jun 2015 23:39:12 GMT\n/acct/mycontainer?comp=list"
        );
    }

    #[test]
    fn shared_key_sets_authorization() {
        let mut req = request();
        let cred = Credential::SharedKey {
            account: "acct".into(),
            key: base64::encode(b"secret"),
        };
        cred.sign(&mut req).unwrap();
        let auth = req.header("authorization").unwrap();
        assert!(auth.starts_with("SharedKey acct:"));
        // HMAC-SHA256 output is 32 bytes, 44 base64 characters
        assert_eq!(auth.len(), "SharedKey acct:".len() + 44);
    }

    #[test]
    fn known_signature() {
        // RFC 4231 test case 2 ("Jefe" / "what do ya want for nothing?")
        let sig = sign_string(&base64::encode(b"Jefe"), "what do ya want for nothing?").unwrap();
        let expected =
            hex::decode("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843").unwrap();
        assert_eq!(sig, base64::encode(expected));
    }

    #[test]
    fn bad_key_is_an_auth_error() {
        assert!(matches!(sign_string("not base64!", "x"), Err(StorageError::Auth(_))));
    }

    #[test]
    fn sas_does_not_overwrite_existing_query() {
        let mut req = request();
        Credential::Sas("sv=2017-11-09&sig=a%2Bb&comp=evil".into())
            .sign(&mut req)
            .unwrap();
        assert_eq!(req.query.get("sig").map(String::as_str), Some("a+b"));
        assert_eq!(req.query.get("comp").map(String::as_str), Some("list"));
        assert!(req.header("authorization").is_none());
    }
}
