//! Storage notifications in the event-grid schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Event type the storage service emits when a blob is created.
pub const BLOB_CREATED: &str = "Microsoft.Storage.BlobCreated";
/// Event type the producer publishes in custom-event mode.
pub const CUSTOM_BLOB_CREATED: &str = "Custom.Storage.BlobCreated";
/// Event type of the subscription handshake on the native channel.
pub const SUBSCRIPTION_VALIDATION: &str = "Microsoft.EventGrid.SubscriptionValidationEvent";

/// A single event-grid schema event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub subject: String,
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
    pub data_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,
}

/// Payload of a blob-created event.
///
/// The native notification carries no trace data in these fields. The
/// custom-published variant reuses `client_request_id` for the trace id and
/// `request_id` for the span id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobCreatedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_type: Option<String>,
    pub url: Url,
}

impl BlobCreatedData {
    /// Blob data as the storage service would describe a block upload.
    pub fn block_upload(url: Url) -> Self {
        Self {
            api: Some("PutBlockList".to_string()),
            client_request_id: None,
            request_id: None,
            content_type: Some("application/octet-stream".to_string()),
            content_length: None,
            blob_type: Some("BlockBlob".to_string()),
            url,
        }
    }
}

/// Payload of the native-channel subscription handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionValidationData {
    pub validation_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_url: Option<String>,
}

impl StorageEvent {
    /// A new event stamped with a fresh id and the current time.
    pub fn new(
        subject: impl Into<String>,
        event_type: impl Into<String>,
        data_version: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: None,
            subject: subject.into(),
            event_type: event_type.into(),
            event_time: Utc::now(),
            data,
            data_version: data_version.into(),
            metadata_version: None,
        }
    }

    pub fn is_subscription_validation(&self) -> bool {
        self.event_type == SUBSCRIPTION_VALIDATION
    }

    /// Decode `data` as a blob-created payload.
    pub fn blob_created_data(&self) -> Result<BlobCreatedData, serde_json::Error> {
        BlobCreatedData::deserialize(&self.data)
    }

    /// Decode `data` as a subscription-validation payload.
    pub fn validation_data(&self) -> Result<SubscriptionValidationData, serde_json::Error> {
        SubscriptionValidationData::deserialize(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB_CREATED_JSON: &str = r#"[{
        "topic": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/acct",
        "subject": "/blobServices/default/containers/uploads/blobs/abc.png",
        "eventType": "Microsoft.Storage.BlobCreated",
        "id": "831e1650-001e-001b-66ab-eeb76e069631",
        "data": {
            "api": "PutBlockList",
            "clientRequestId": "6d79dbfb-0e37-4fc4-981f-442c9ca65760",
            "requestId": "831e1650-001e-001b-66ab-eeb76e000000",
            "eTag": "0x8D4BCC2E4835CD0",
            "contentType": "image/png",
            "contentLength": 524288,
            "blobType": "BlockBlob",
            "url": "https://acct.blob.core.windows.net/uploads/abc.png",
            "sequencer": "00000000000004420000000000028963"
        },
        "dataVersion": "",
        "metadataVersion": "1",
        "eventTime": "2017-06-26T18:41:00.9584103Z"
    }]"#;

    #[test]
    fn test_parse_native_blob_created() {
        let events: Vec<StorageEvent> = serde_json::from_str(BLOB_CREATED_JSON).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type, BLOB_CREATED);
        assert!(!event.is_subscription_validation());

        let data = event.blob_created_data().unwrap();
        assert_eq!(
            data.url.as_str(),
            "https://acct.blob.core.windows.net/uploads/abc.png"
        );
        assert_eq!(data.content_length, Some(524288));
    }

    #[test]
    fn test_parse_validation_event() {
        let json = r#"[{
            "id": "2d1781af-3a4c-4d7c-bd0c-e34b19da4e66",
            "topic": "/subscriptions/x",
            "subject": "",
            "data": { "validationCode": "512d38b6-c7b8-40c8-89fe-f46f9e9622b6" },
            "eventType": "Microsoft.EventGrid.SubscriptionValidationEvent",
            "eventTime": "2018-01-25T22:12:19.4556811Z",
            "metadataVersion": "1",
            "dataVersion": "1"
        }]"#;
        let events: Vec<StorageEvent> = serde_json::from_str(json).unwrap();
        assert!(events[0].is_subscription_validation());
        assert_eq!(
            events[0].validation_data().unwrap().validation_code,
            "512d38b6-c7b8-40c8-89fe-f46f9e9622b6"
        );
    }

    #[test]
    fn test_custom_event_shape() {
        let url: Url = "http://localhost/objects/uploads/a.png".parse().unwrap();
        let mut data = BlobCreatedData::block_upload(url);
        data.client_request_id = Some("4bf92f3577b34da6a3ce929d0e0e4736".into());
        let event = StorageEvent::new(
            "fileUploader",
            CUSTOM_BLOB_CREATED,
            "1.0",
            serde_json::to_value(&data).unwrap(),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], CUSTOM_BLOB_CREATED);
        assert_eq!(json["dataVersion"], "1.0");
        assert_eq!(json["data"]["clientRequestId"], "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(json["data"]["blobType"], "BlockBlob");
        assert!(json["data"].get("requestId").is_none());
        assert_eq!(event.blob_created_data().unwrap(), data);
    }
}
