/// One persisted client-side setting (token, cached profile, player preferences).
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}
