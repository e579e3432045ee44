use uuid::Uuid;

/// A fresh identifier for a post, tag or association row.
///
/// UUIDv7 leads with a millisecond timestamp, so the hyphenated form sorts
/// lexicographically in creation order.
pub fn generate() -> String {
    Uuid::now_v7().to_string()
}
