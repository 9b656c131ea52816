//! SQS JSON protocol queue client.
//!
//! Speaks the `AmazonSQS.*` JSON target protocol over plain HTTP, which
//! SQS-compatible endpoints accept. Request signing, if the deployment
//! needs it, belongs to a fronting proxy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::QueueConfig;

use super::error::QueueError;
use super::traits::QueueClient;
use super::types::{parse_notification_body, AckToken, InboundMessage};

const TARGET_RECEIVE: &str = "AmazonSQS.ReceiveMessage";
const TARGET_DELETE_BATCH: &str = "AmazonSQS.DeleteMessageBatch";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Queue client for SQS-compatible endpoints.
pub struct SqsQueueClient {
    client: reqwest::Client,
    config: QueueConfig,
}

#[derive(Serialize)]
struct ReceiveRequest<'a> {
    #[serde(rename = "QueueUrl")]
    queue_url: &'a str,
    #[serde(rename = "MaxNumberOfMessages")]
    max_messages: u32,
    #[serde(rename = "WaitTimeSeconds")]
    wait_time_secs: u64,
}

#[derive(Deserialize)]
struct ReceiveResponse {
    #[serde(rename = "Messages", default)]
    messages: Vec<SqsMessage>,
}

#[derive(Deserialize)]
struct SqsMessage {
    #[serde(rename = "MessageId", default)]
    message_id: Option<String>,
    #[serde(rename = "ReceiptHandle")]
    receipt_handle: String,
    #[serde(rename = "Body")]
    body: String,
}

#[derive(Serialize)]
struct DeleteBatchRequest<'a> {
    #[serde(rename = "QueueUrl")]
    queue_url: &'a str,
    #[serde(rename = "Entries")]
    entries: Vec<DeleteEntry<'a>>,
}

#[derive(Serialize)]
struct DeleteEntry<'a> {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "ReceiptHandle")]
    receipt_handle: &'a str,
}

#[derive(Deserialize)]
struct DeleteBatchResponse {
    #[serde(rename = "Failed", default)]
    failed: Vec<BatchResultError>,
}

#[derive(Deserialize)]
struct BatchResultError {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

impl SqsQueueClient {
    /// Creates a new queue client.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        // The HTTP timeout must outlast the long-poll window.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.wait_time_secs + 10))
            .build()?;

        Ok(Self { client, config })
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        target: &str,
        request: &Req,
    ) -> Result<Resp, QueueError> {
        let response = self
            .client
            .post(self.config.endpoint.trim_end_matches('/'))
            .header("X-Amz-Target", target)
            .header("Content-Type", CONTENT_TYPE)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::receive_failed(format!(
                "{} returned HTTP {}: {}",
                target, status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Converts a delete-batch response into per-token statuses.
    fn batch_statuses(count: usize, response: &DeleteBatchResponse) -> Vec<bool> {
        let mut statuses = vec![true; count];
        for failure in &response.failed {
            if let Ok(ix) = failure.id.parse::<usize>() {
                if ix < count {
                    statuses[ix] = false;
                }
            }
        }
        statuses
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    fn name(&self) -> &str {
        "sqs"
    }

    async fn receive(&self) -> Result<Vec<InboundMessage>, QueueError> {
        let request = ReceiveRequest {
            queue_url: &self.config.queue_url,
            max_messages: self.config.max_messages,
            wait_time_secs: self.config.wait_time_secs,
        };
        let response: ReceiveResponse = self.post(TARGET_RECEIVE, &request).await?;

        let mut inbound = Vec::new();
        let mut unprocessable = Vec::new();
        for message in response.messages {
            let token = AckToken::new(message.receipt_handle);
            match parse_notification_body(&message.body) {
                Ok(notifications) => {
                    if notifications.len() > 1 {
                        debug!(
                            message_id = message.message_id.as_deref().unwrap_or("-"),
                            "message fanned out to {} notifications",
                            notifications.len()
                        );
                    }
                    inbound.extend(notifications.into_iter().map(|notification| {
                        InboundMessage {
                            notification,
                            ack_token: token.clone(),
                        }
                    }));
                }
                Err(e) => {
                    warn!(
                        message_id = message.message_id.as_deref().unwrap_or("-"),
                        "discarding unprocessable message: {}", e
                    );
                    unprocessable.push(token);
                }
            }
        }

        // Garbage bodies would otherwise redeliver forever; acknowledge them
        // away and leave the log entry as the audit trail.
        if !unprocessable.is_empty() {
            if let Err(e) = self.acknowledge_batch(&unprocessable).await {
                warn!("failed to discard unprocessable messages: {}", e);
            }
        }

        Ok(inbound)
    }

    async fn acknowledge_batch(&self, tokens: &[AckToken]) -> Result<Vec<bool>, QueueError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let request = DeleteBatchRequest {
            queue_url: &self.config.queue_url,
            entries: tokens
                .iter()
                .enumerate()
                .map(|(ix, token)| DeleteEntry {
                    id: ix.to_string(),
                    receipt_handle: token.as_str(),
                })
                .collect(),
        };

        let response: DeleteBatchResponse = self
            .post(TARGET_DELETE_BATCH, &request)
            .await
            .map_err(|e| QueueError::acknowledge_failed(e.to_string()))?;

        for failure in &response.failed {
            warn!(
                "message {} failed to delete: {}",
                failure.id,
                failure.message.as_deref().unwrap_or("unknown reason")
            );
        }

        Ok(Self::batch_statuses(tokens.len(), &response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_statuses_maps_failed_ids() {
        let response = DeleteBatchResponse {
            failed: vec![BatchResultError {
                id: "1".to_string(),
                message: Some("internal error".to_string()),
            }],
        };
        assert_eq!(
            SqsQueueClient::batch_statuses(3, &response),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_batch_statuses_ignores_out_of_range_ids() {
        let response = DeleteBatchResponse {
            failed: vec![BatchResultError {
                id: "7".to_string(),
                message: None,
            }],
        };
        assert_eq!(SqsQueueClient::batch_statuses(2, &response), vec![true, true]);
    }

    #[test]
    fn test_receive_request_serializes_protocol_fields() {
        let request = ReceiveRequest {
            queue_url: "http://localhost:9324/queue/ingest",
            max_messages: 10,
            wait_time_secs: 20,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["QueueUrl"], "http://localhost:9324/queue/ingest");
        assert_eq!(json["MaxNumberOfMessages"], 10);
        assert_eq!(json["WaitTimeSeconds"], 20);
    }
}
