use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

#[derive(Clone)]
pub struct PasswordPolicy {
    pub memory_kb: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordPolicy {
    pub fn argon2(&self) -> Result<Argon2<'static>, String> {
        use argon2::{Algorithm, Params, Version};
        let params = Params::new(self.memory_kb, self.iterations, self.parallelism, None)
            .map_err(|e| e.to_string())?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            memory_kb: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

pub fn hash_password(policy: &PasswordPolicy, password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = policy.argon2()?;
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(hash)
}

pub fn verify_password(
    policy: &PasswordPolicy,
    password: &str,
    stored_hash: &str,
) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| e.to_string())?;
    let argon2 = policy.argon2()?;
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> PasswordPolicy {
        // Low-cost parameters to keep the test quick.
        PasswordPolicy {
            memory_kb: 8192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn hash_then_verify() {
        let policy = fast_policy();
        let hash = hash_password(&policy, "correct horse").unwrap();

        assert!(verify_password(&policy, "correct horse", &hash).unwrap());
        assert!(!verify_password(&policy, "wrong horse", &hash).unwrap());
    }

    #[test]
    fn invalid_stored_hash_is_an_error() {
        let policy = fast_policy();
        assert!(verify_password(&policy, "anything", "not-a-phc-string").is_err());
    }
}
