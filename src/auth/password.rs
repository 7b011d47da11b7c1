//! Password hashing, delegated to bcrypt with the default work factor.

pub fn hash(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify(password: &str, stored_hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, stored_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        // Low cost keeps the test fast; production path uses DEFAULT_COST.
        let hashed = bcrypt::hash("secret1", 4).unwrap();
        assert!(verify("secret1", &hashed).unwrap());
        assert!(!verify("secret2", &hashed).unwrap());
    }
}
