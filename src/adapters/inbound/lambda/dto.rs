use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::{
    errors::ValidationError,
    models::AggregateRequest,
    value_objects::{BucketName, ObjectKey},
};

/// DTO for the invocation payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvocationPayloadDto {
    #[serde(default)]
    pub bucket: String,
    #[serde(default, alias = "prefixs")]
    pub prefixes: Vec<String>,
    #[serde(default, alias = "file_upload_path")]
    pub destination_key: String,
}

impl InvocationPayloadDto {
    /// Decode a raw event. Direct invocations carry the payload as the event
    /// itself; API Gateway proxies wrap it in `body`, possibly as a string.
    pub fn from_event(event: Value) -> Result<Self, ValidationError> {
        let payload = unwrap_body(event)?;
        serde_json::from_value(payload)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))
    }
}

fn unwrap_body(event: Value) -> Result<Value, ValidationError> {
    let Some(object) = event.as_object() else {
        return Err(ValidationError::MalformedPayload(
            "payload must be a JSON object".to_string(),
        ));
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => serde_json::from_str(text)
            .map_err(|e| ValidationError::MalformedPayload(format!("body is not JSON: {}", e))),
        _ => Err(ValidationError::MalformedPayload(
            "body must be a JSON object".to_string(),
        )),
    }
}

impl TryFrom<InvocationPayloadDto> for AggregateRequest {
    type Error = ValidationError;

    fn try_from(dto: InvocationPayloadDto) -> Result<Self, Self::Error> {
        if dto.bucket.is_empty() {
            return Err(ValidationError::MissingField("bucket"));
        }
        if dto.destination_key.is_empty() {
            return Err(ValidationError::MissingField("destination_key"));
        }

        Ok(AggregateRequest {
            bucket: BucketName::new(dto.bucket)?,
            prefixes: dto.prefixes,
            destination_key: ObjectKey::new(dto.destination_key)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_direct_payload_and_ignores_unknown_fields() {
        let dto = InvocationPayloadDto::from_event(json!({
            "bucket": "infra-configs",
            "prefixes": ["modules/", "envs/prod/"],
            "destination_key": "combined/prod.tf",
            "requested_by": "scheduler"
        }))
        .unwrap();

        assert_eq!(dto.bucket, "infra-configs");
        assert_eq!(dto.prefixes, vec!["modules/", "envs/prod/"]);
        assert_eq!(dto.destination_key, "combined/prod.tf");
    }

    #[test]
    fn accepts_legacy_field_names() {
        let dto = InvocationPayloadDto::from_event(json!({
            "bucket": "infra-configs",
            "prefixs": ["modules/"],
            "file_upload_path": "combined.tf"
        }))
        .unwrap();

        assert_eq!(dto.prefixes, vec!["modules/"]);
        assert_eq!(dto.destination_key, "combined.tf");
    }

    #[test]
    fn missing_prefixes_default_to_empty() {
        let dto = InvocationPayloadDto::from_event(json!({
            "bucket": "infra-configs",
            "destination_key": "combined.tf"
        }))
        .unwrap();

        assert!(dto.prefixes.is_empty());
    }

    #[test]
    fn unwraps_api_gateway_body() {
        let as_string = InvocationPayloadDto::from_event(json!({
            "body": "{\"bucket\":\"infra-configs\",\"destination_key\":\"out.txt\"}"
        }))
        .unwrap();
        let as_object = InvocationPayloadDto::from_event(json!({
            "body": {"bucket": "infra-configs", "destination_key": "out.txt"}
        }))
        .unwrap();

        assert_eq!(as_string, as_object);
        assert_eq!(as_string.bucket, "infra-configs");
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(InvocationPayloadDto::from_event(json!(["infra-configs"])).is_err());
        assert!(InvocationPayloadDto::from_event(json!({"body": 7})).is_err());
        assert!(InvocationPayloadDto::from_event(json!({"body": "not json"})).is_err());
        assert!(InvocationPayloadDto::from_event(json!({"prefixes": "modules/"})).is_err());
    }

    #[test]
    fn request_requires_bucket_and_destination() {
        let missing_bucket = InvocationPayloadDto {
            destination_key: "out.txt".to_string(),
            ..Default::default()
        };
        assert_eq!(
            AggregateRequest::try_from(missing_bucket),
            Err(ValidationError::MissingField("bucket"))
        );

        let missing_destination = InvocationPayloadDto {
            bucket: "infra-configs".to_string(),
            ..Default::default()
        };
        assert_eq!(
            AggregateRequest::try_from(missing_destination),
            Err(ValidationError::MissingField("destination_key"))
        );

        let invalid_bucket = InvocationPayloadDto {
            bucket: "infra\tconfigs".to_string(),
            destination_key: "out.txt".to_string(),
            ..Default::default()
        };
        assert_eq!(
            AggregateRequest::try_from(invalid_bucket),
            Err(ValidationError::BucketNameInvalidCharacter('\t'))
        );
    }

    #[test]
    fn legacy_bucket_names_pass_through() {
        let request = AggregateRequest::try_from(InvocationPayloadDto {
            bucket: "Legacy_Bucket".to_string(),
            prefixes: vec![],
            destination_key: "out.txt".to_string(),
        })
        .unwrap();

        assert_eq!(request.bucket.as_str(), "Legacy_Bucket");
    }

    #[test]
    fn request_keeps_prefix_order() {
        let request = AggregateRequest::try_from(InvocationPayloadDto {
            bucket: "infra-configs".to_string(),
            prefixes: vec!["b/".to_string(), "a/".to_string()],
            destination_key: "out.txt".to_string(),
        })
        .unwrap();

        assert_eq!(request.prefixes, vec!["b/", "a/"]);
        assert_eq!(request.destination_key.as_str(), "out.txt");
    }
}
