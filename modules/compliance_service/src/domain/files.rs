//! File storage seam for uploaded document bytes

use async_trait::async_trait;
use bytes::Bytes;

/// Blob storage keyed by relative paths such as `documents/<id>/<file>`
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn save(&self, key: &str, bytes: Bytes) -> anyhow::Result<()>;

    async fn load(&self, key: &str) -> anyhow::Result<Bytes>;

    /// Deleting a missing key is not an error
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Storage key for a document's bytes; the file name is reduced to a safe charset
pub fn document_key(document_id: uuid::Uuid, file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_start_matches('.');
    let safe = if safe.is_empty() { "upload" } else { safe };
    format!("documents/{}/{}", document_id, safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_document_key_sanitizes_name() {
        let id = Uuid::nil();
        assert_eq!(
            document_key(id, "../../etc/Daftar DTTOT 2024.csv"),
            format!("documents/{}/Daftar_DTTOT_2024.csv", id)
        );
        assert_eq!(document_key(id, "..."), format!("documents/{}/upload", id));
    }
}
