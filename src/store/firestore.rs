use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::Stream;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value, json};

use super::{Session, StoreError};
use crate::config::AppConfig;
use crate::core::form::{
    FIELD_DATE_ENTERED, FIELD_DESCRIPTION, FIELD_PASSPORT_NUMBER, FIELD_STATUS, FIELD_TITLE,
    RecordDraft,
};
use crate::core::record::Record;

/// How often the watch stream refreshes the snapshot.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;
const FIELD_CREATED_BY: &str = "createdBy";
const FIELD_TIMESTAMP: &str = "timestamp";

/// Client for the shared service collection.
///
/// Constructed by the shell once a session exists and dropped with it; all
/// requests carry the session's bearer token. The server assigns document
/// ids and creation times; this client never writes either.
#[derive(Clone)]
pub struct StoreClient {
    collection_url: String,
    id_token: String,
    http: Client,
}

impl StoreClient {
    pub fn new(config: &AppConfig, session: &Session) -> Result<Self, StoreError> {
        let http = Client::builder().build()?;
        Ok(Self {
            collection_url: format!(
                "{}/projects/{}/databases/(default)/documents/{}",
                FIRESTORE_BASE,
                config.project_id,
                config.collection_path()
            ),
            id_token: session.id_token.clone(),
            http,
        })
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    /// Fetch the complete current record list, newest first.
    ///
    /// Snapshot ordering is applied here rather than server-side: the sort
    /// key is the server-assigned creation time, so the order is stable
    /// regardless of which client wrote the document.
    pub async fn list_services(&self) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&self.collection_url)
                .bearer_auth(&self.id_token)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = page_token.take() {
                request = request.query(&[("pageToken", token)]);
            }

            let body = read_json(request.send().await?).await?;
            if let Some(documents) = body.get("documents").and_then(Value::as_array) {
                for doc in documents {
                    match record_from_document(doc) {
                        Some(record) => records.push(record),
                        None => log::warn!("Skipping malformed document: {}", doc),
                    }
                }
            }

            match body.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    /// Create a new record. The store assigns id and creation time;
    /// `created_by` is stamped once here and never patched.
    pub async fn insert(&self, draft: &RecordDraft, created_by: &str) -> Result<(), StoreError> {
        let body = json!({ "fields": draft_fields(draft, Some(created_by)) });
        let resp = self
            .http
            .post(&self.collection_url)
            .bearer_auth(&self.id_token)
            .json(&body)
            .send()
            .await?;
        read_json(resp).await.map(|_| ())
    }

    /// Partial update: only the named fields are written, everything else
    /// on the document is untouched.
    pub async fn patch(
        &self,
        id: &str,
        field_names: &[&'static str],
        draft: &RecordDraft,
    ) -> Result<(), StoreError> {
        let mut fields = draft_fields(draft, None);
        fields.retain(|name, _| field_names.iter().any(|f| *f == name.as_str()));
        let body = json!({ "fields": fields });

        let resp = self
            .http
            .patch(self.document_url(id))
            .bearer_auth(&self.id_token)
            .query(&update_mask(field_names))
            .json(&body)
            .send()
            .await?;
        read_json(resp).await.map(|_| ())
    }

    /// Permanent delete. A record already gone counts as deleted.
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let resp = self
            .http
            .delete(self.document_url(id))
            .bearer_auth(&self.id_token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(StoreError::Status {
                status,
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// A live view of the collection: yields full-replace snapshots until the
/// subscription holding it is dropped. The first snapshot is fetched
/// immediately, later ones every `interval`.
pub fn watch(
    client: StoreClient,
    interval: Duration,
) -> impl Stream<Item = Result<Vec<Record>, StoreError>> {
    futures::stream::unfold((client, true), move |(client, first)| async move {
        if !first {
            tokio::time::sleep(interval).await;
        }
        let snapshot = client.list_services().await;
        Some((snapshot, (client, false)))
    })
}

async fn read_json(resp: reqwest::Response) -> Result<Value, StoreError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status { status, body: text });
    }
    serde_json::from_str(&text).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn update_mask(field_names: &[&'static str]) -> Vec<(&'static str, &'static str)> {
    field_names
        .iter()
        .map(|name| ("updateMask.fieldPaths", *name))
        .collect()
}

fn string_field(fields: &Value, name: &str) -> Option<String> {
    fields
        .get(name)?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

/// Map a Firestore document to a `Record`. Returns `None` only when the
/// document has no usable name; missing fields degrade to empty values so
/// foreign documents still display.
fn record_from_document(doc: &Value) -> Option<Record> {
    let name = doc.get("name")?.as_str()?;
    let id = name.rsplit('/').next()?.to_string();
    let empty = json!({});
    let fields = doc.get("fields").unwrap_or(&empty);

    // Documents written by other clients may carry an explicit timestamp
    // field; otherwise the server-assigned create time stands in for it.
    let timestamp = fields
        .get(FIELD_TIMESTAMP)
        .and_then(|v| v.get("timestampValue"))
        .and_then(Value::as_str)
        .or_else(|| doc.get("createTime").and_then(Value::as_str))
        .and_then(parse_timestamp);

    // Legacy values sometimes carry a time suffix; only the calendar date
    // is meaningful.
    let date_entered = string_field(fields, FIELD_DATE_ENTERED)
        .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(&s), "%Y-%m-%d").ok());

    Some(Record {
        id,
        title: string_field(fields, FIELD_TITLE).unwrap_or_default(),
        passport_number: string_field(fields, FIELD_PASSPORT_NUMBER).filter(|s| !s.is_empty()),
        description: string_field(fields, FIELD_DESCRIPTION).unwrap_or_default(),
        date_entered,
        status: string_field(fields, FIELD_STATUS).unwrap_or_default(),
        timestamp,
        created_by: string_field(fields, FIELD_CREATED_BY).unwrap_or_default(),
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Encode a draft as Firestore field values. `created_by` is only present
/// on insert; patches must never touch it.
fn draft_fields(draft: &RecordDraft, created_by: Option<&str>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        FIELD_TITLE.to_string(),
        json!({ "stringValue": draft.title.as_keyword() }),
    );
    let passport = match &draft.passport_number {
        Some(number) => json!({ "stringValue": number }),
        None => json!({ "nullValue": null }),
    };
    fields.insert(FIELD_PASSPORT_NUMBER.to_string(), passport);
    fields.insert(
        FIELD_DESCRIPTION.to_string(),
        json!({ "stringValue": draft.description }),
    );
    fields.insert(
        FIELD_DATE_ENTERED.to_string(),
        json!({ "stringValue": draft.date_entered.format("%Y-%m-%d").to_string() }),
    );
    fields.insert(
        FIELD_STATUS.to_string(),
        json!({ "stringValue": draft.status.as_keyword() }),
    );
    if let Some(uid) = created_by {
        fields.insert(FIELD_CREATED_BY.to_string(), json!({ "stringValue": uid }));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{ServiceCategory, ServiceStatus};
    use chrono::TimeZone;

    fn sample_draft() -> RecordDraft {
        RecordDraft {
            title: ServiceCategory::VisaOnArrival,
            passport_number: Some("A1234567".to_string()),
            description: "Renewal".to_string(),
            date_entered: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            status: ServiceStatus::Intake,
        }
    }

    fn sample_document() -> Value {
        json!({
            "name": "projects/p/databases/(default)/documents/artifacts/app/public/data/services/doc-42",
            "createTime": "2025-01-10T08:30:00Z",
            "updateTime": "2025-01-11T09:00:00Z",
            "fields": {
                "title": { "stringValue": "VOA" },
                "passportNumber": { "stringValue": "A1234567" },
                "description": { "stringValue": "Renewal" },
                "dateEntered": { "stringValue": "2025-01-10" },
                "status": { "stringValue": "pending" },
                "createdBy": { "stringValue": "user-1" }
            }
        })
    }

    #[test]
    fn document_maps_to_record() {
        let record = record_from_document(&sample_document()).unwrap();
        assert_eq!(record.id, "doc-42");
        assert_eq!(record.title, "VOA");
        assert_eq!(record.passport_number.as_deref(), Some("A1234567"));
        assert_eq!(record.description, "Renewal");
        assert_eq!(record.date_entered, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(record.status, "pending");
        assert_eq!(record.created_by, "user-1");
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2025, 1, 10, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn explicit_timestamp_field_wins_over_create_time() {
        let mut doc = sample_document();
        doc["fields"]["timestamp"] = json!({ "timestampValue": "2024-12-01T00:00:00Z" });
        let record = record_from_document(&doc).unwrap();
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn date_with_time_suffix_is_truncated() {
        let mut doc = sample_document();
        doc["fields"]["dateEntered"] = json!({ "stringValue": "2025-01-10T14:30:00.000Z" });
        let record = record_from_document(&doc).unwrap();
        assert_eq!(record.date_entered, NaiveDate::from_ymd_opt(2025, 1, 10));
    }

    #[test]
    fn sparse_document_still_maps() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/x/doc-7",
            "createTime": "2025-02-01T00:00:00Z"
        });
        let record = record_from_document(&doc).unwrap();
        assert_eq!(record.id, "doc-7");
        assert!(record.title.is_empty());
        assert_eq!(record.status(), None);
        assert_eq!(record.passport_number, None);
    }

    #[test]
    fn insert_fields_carry_creator_but_never_id_or_timestamp() {
        let fields = draft_fields(&sample_draft(), Some("user-1"));
        assert_eq!(fields["createdBy"], json!({ "stringValue": "user-1" }));
        assert!(!fields.contains_key("id"));
        assert!(!fields.contains_key("timestamp"));
    }

    #[test]
    fn patch_fields_never_carry_creator() {
        let fields = draft_fields(&sample_draft(), None);
        assert!(!fields.contains_key("createdBy"));
        assert_eq!(fields["status"], json!({ "stringValue": "intake" }));
    }

    #[test]
    fn cleared_passport_is_encoded_as_null() {
        let mut draft = sample_draft();
        draft.passport_number = None;
        let fields = draft_fields(&draft, None);
        assert_eq!(fields["passportNumber"], json!({ "nullValue": null }));
    }

    #[test]
    fn update_mask_names_each_field() {
        let mask = update_mask(&["status", "description"]);
        assert_eq!(
            mask,
            vec![
                ("updateMask.fieldPaths", "status"),
                ("updateMask.fieldPaths", "description"),
            ]
        );
    }

    #[test]
    fn snapshot_sorts_newest_first() {
        let mut records: Vec<Record> = ["2025-01-01T00:00:00Z", "2025-03-01T00:00:00Z", "2025-02-01T00:00:00Z"]
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                let mut doc = sample_document();
                doc["name"] = json!(format!("c/doc-{}", i));
                doc["createTime"] = json!(ts);
                record_from_document(&doc).unwrap()
            })
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        assert_eq!(records[0].id, "doc-1");
        assert_eq!(records[1].id, "doc-2");
        assert_eq!(records[2].id, "doc-0");
    }
}
