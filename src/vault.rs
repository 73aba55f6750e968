use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// One encrypted field value, envelope-encrypted with AES-256-GCM.
/// All members are base64 so the payload can live inside a JSON column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub encrypted_dek: String,
    pub dek_nonce: String,
    pub encrypted_secret: String,
    pub secret_nonce: String,
}

/// Field-level crypto with a process-held master key (KEK).
/// Each value gets its own random DEK; the DEK is wrapped by the KEK.
pub struct VaultCrypto {
    kek: [u8; 32],
}

impl VaultCrypto {
    pub fn new(master_key_hex: &str) -> anyhow::Result<Self> {
        let kek = parse_master_key(master_key_hex)?;
        Ok(Self { kek })
    }

    pub fn encrypt(&self, plaintext: &str) -> anyhow::Result<EncryptedPayload> {
        // 1. Generate a random DEK
        let mut dek = [0u8; 32];
        OsRng.fill_bytes(&mut dek);

        // 2. Encrypt the value with the DEK
        let secret_cipher = Aes256Gcm::new_from_slice(&dek)
            .map_err(|e| anyhow::anyhow!("invalid key length: {:?}", e))?;
        let secret_nonce_bytes = generate_nonce();
        let secret_nonce = Nonce::from_slice(&secret_nonce_bytes);
        let encrypted_secret = secret_cipher
            .encrypt(secret_nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("secret encryption failed: {}", e))?;

        // 3. Encrypt the DEK with the master KEK
        let kek_cipher = Aes256Gcm::new_from_slice(&self.kek)
            .map_err(|e| anyhow::anyhow!("invalid key length: {:?}", e))?;
        let dek_nonce_bytes = generate_nonce();
        let dek_nonce = Nonce::from_slice(&dek_nonce_bytes);
        let encrypted_dek = kek_cipher
            .encrypt(dek_nonce, dek.as_ref())
            .map_err(|e| anyhow::anyhow!("DEK encryption failed: {}", e))?;

        // 4. Zero the plaintext DEK
        dek.fill(0);

        let b64 = base64::engine::general_purpose::STANDARD;
        Ok(EncryptedPayload {
            encrypted_dek: b64.encode(encrypted_dek),
            dek_nonce: b64.encode(dek_nonce_bytes),
            encrypted_secret: b64.encode(encrypted_secret),
            secret_nonce: b64.encode(secret_nonce_bytes),
        })
    }

    pub fn decrypt(&self, payload: &EncryptedPayload) -> anyhow::Result<String> {
        let b64 = base64::engine::general_purpose::STANDARD;
        let encrypted_dek = b64.decode(&payload.encrypted_dek)?;
        let dek_nonce = b64.decode(&payload.dek_nonce)?;
        let encrypted_secret = b64.decode(&payload.encrypted_secret)?;
        let secret_nonce = b64.decode(&payload.secret_nonce)?;

        // 1. Decrypt DEK with master KEK
        let kek_cipher = Aes256Gcm::new_from_slice(&self.kek)
            .map_err(|e| anyhow::anyhow!("invalid key length: {:?}", e))?;
        let d_nonce = Nonce::from_slice(&dek_nonce);
        let dek_bytes = kek_cipher
            .decrypt(d_nonce, encrypted_dek.as_ref())
            .map_err(|e| anyhow::anyhow!("DEK decryption failed: {}", e))?;

        let mut dek = [0u8; 32];
        dek.copy_from_slice(&dek_bytes);

        // 2. Decrypt value with DEK
        let secret_cipher = Aes256Gcm::new_from_slice(&dek)
            .map_err(|e| anyhow::anyhow!("invalid key length: {:?}", e))?;
        let s_nonce = Nonce::from_slice(&secret_nonce);
        let plaintext_bytes = secret_cipher
            .decrypt(s_nonce, encrypted_secret.as_ref())
            .map_err(|e| anyhow::anyhow!("secret decryption failed: {}", e))?;

        // Zero the DEK
        dek.fill(0);

        Ok(String::from_utf8(plaintext_bytes)?)
    }
}

fn generate_nonce() -> [u8; 12] {
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

pub fn parse_master_key(hex_key: &str) -> anyhow::Result<[u8; 32]> {
    if hex_key.len() != 64 {
        anyhow::bail!(
            "PROMODESK_MASTER_KEY must be 64 hex chars (32 bytes), got {} chars",
            hex_key.len()
        );
    }
    let bytes = hex::decode(hex_key)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Mask key material for log or display output.
/// SECURITY: this is the only form a secret may take outside the vault.
pub fn mask(value: &str) -> String {
    // counted in chars, not bytes: byte slicing would panic on multibyte input
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn test_encryption_roundtrip() {
        let crypto = VaultCrypto::new(MASTER_KEY).unwrap();

        let secret = "sk_live_123456789";
        let payload = crypto.encrypt(secret).unwrap();
        assert!(!payload.encrypted_secret.contains(secret));

        let decrypted = crypto.decrypt(&payload).unwrap();
        assert_eq!(decrypted, secret);
    }

    #[test]
    fn test_payload_survives_json_encoding() {
        let crypto = VaultCrypto::new(MASTER_KEY).unwrap();
        let payload = crypto.encrypt("tok_abc").unwrap();

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("tok_abc"));

        let back: EncryptedPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(crypto.decrypt(&back).unwrap(), "tok_abc");
    }

    #[test]
    fn test_master_key_must_be_64_hex_chars() {
        assert!(parse_master_key("deadbeef").is_err());
        assert!(parse_master_key(&"zz".repeat(32)).is_err());
        assert!(parse_master_key(MASTER_KEY).is_ok());
    }

    #[test]
    fn test_mask_never_reveals_short_values() {
        assert_eq!(mask("abc"), "****");
        let masked = mask("sk_live_123456789");
        assert!(!masked.contains("live"));
        assert!(masked.starts_with("sk_l"));
    }

    #[test]
    fn test_mask_handles_multibyte_input() {
        // must not panic on non-ASCII char boundaries
        assert_eq!(mask("ключ"), "****");
        let masked = mask("секретный-токен-абв");
        assert!(masked.starts_with("секр"));
        assert!(masked.ends_with("-абв"));
        assert!(!masked.contains("токен"));
    }
}
