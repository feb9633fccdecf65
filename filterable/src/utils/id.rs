//! Identifier generation

use uuid::Uuid;

/// Generate a random (version 4) UUID in hyphenated lowercase form
pub fn uuid_v4() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_v4_format() {
        let id = uuid_v4();
        assert_eq!(id.len(), 36);
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn test_uuid_v4_unique() {
        assert_ne!(uuid_v4(), uuid_v4());
    }
}
