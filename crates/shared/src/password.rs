use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

const SALT_LEN: usize = 16;
const SCHEME: &str = "b3";
const CONTEXT: &str = "personal-todo 2024-01-01 password hashing";

/// ソルト付きでパスワードをハッシュ化し `b3$<salt>$<hex>` 形式で返します。
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = digest(&salt, password);
    format!("{SCHEME}${}${}", STANDARD.encode(salt), hash.to_hex())
}

/// 保存済みハッシュとパスワードを照合します。形式が不正な場合は不一致です。
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(SCHEME), Some(salt), Some(hex)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let Ok(salt) = STANDARD.decode(salt) else {
        return false;
    };
    let Ok(expected) = blake3::Hash::from_hex(hex) else {
        return false;
    };

    // blake3::Hash の比較は定数時間
    digest(&salt, password) == expected
}

fn digest(salt: &[u8], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse");
        assert!(stored.starts_with("b3$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        assert_ne!(hash_password("secret"), hash_password("secret"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("secret", ""));
        assert!(!verify_password("secret", "b3$not-base64!$abcd"));
        assert!(!verify_password("secret", "md5$c2FsdA==$abcd"));
    }
}
