use crate::stored_object;

stored_object!(UploadRecord, "upload_record", {
    filename: String,
    bytes: u64,
    mime: String,
    sha256: String,
    storage_path: String,
    source_tag: Option<String>,
    declared_tags: Vec<String>,
    lang_hint: Option<String>
});

impl UploadRecord {
    pub fn upload_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::SurrealDbClient;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn stores_and_fetches_upload_record() {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .unwrap();

        let record = UploadRecord {
            id: "up_1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            filename: "fiber_manual.pdf".to_string(),
            bytes: 1024,
            mime: "application/pdf".to_string(),
            sha256: "deadbeef".to_string(),
            storage_path: "/staging/up_1".to_string(),
            source_tag: None,
            declared_tags: vec![],
            lang_hint: None,
        };

        db.store_item(record.clone()).await.unwrap();
        let fetched = db.get_item::<UploadRecord>("up_1").await.unwrap();
        assert_eq!(fetched.unwrap().upload_id(), "up_1");
    }
}
