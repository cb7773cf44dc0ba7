use md5::{Digest, Md5};

/// Signs a request URL (everything before `&signature=`) with the game's private key.
///
/// The signature is the lowercase hex MD5 of `url + secret`. The private key itself
/// never leaves the process.
pub fn sign(url: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
