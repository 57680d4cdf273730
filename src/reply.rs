use crate::error::DeliveryError;
use crate::schedule::{schedule, TaskHandle};
use crate::transport::{InboundMessage, SentMessage, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverOptions {
    /// Seconds until the delivered message is deleted, `0` keeps it
    pub delete_after: u64,
}

impl DeliverOptions {
    pub fn delete_after(secs: u64) -> Self {
        Self { delete_after: secs }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    /// Rewrite the triggering message in place
    Edit,
    /// Post a new message to the triggering channel
    Send,
}

/// Decides how command output reaches the channel.
#[derive(Clone)]
pub struct ResponsePolicy {
    transport: Arc<dyn Transport>,
    self_mode: bool,
    self_id: u64,
}

impl ResponsePolicy {
    pub fn new(transport: Arc<dyn Transport>, self_mode: bool, self_id: u64) -> Self {
        Self {
            transport,
            self_mode,
            self_id,
        }
    }

    pub fn self_id(&self) -> u64 {
        self.self_id
    }

    pub fn path_for(&self, trigger: &InboundMessage) -> DeliveryPath {
        if self.self_mode && trigger.author.id == self.self_id {
            DeliveryPath::Edit
        } else {
            DeliveryPath::Send
        }
    }

    /// Replies to `trigger`. Returns `None` when the platform rejected the reply.
    pub async fn deliver(
        &self,
        trigger: &InboundMessage,
        text: &str,
        options: DeliverOptions,
    ) -> Option<SentMessage> {
        let result = match self.path_for(trigger) {
            DeliveryPath::Edit => {
                self.transport
                    .edit(trigger.channel_id, trigger.id, text)
                    .await
            }
            DeliveryPath::Send => self.transport.send(trigger.channel_id, text).await,
        };
        self.finish(trigger.channel_id, result, options)
    }

    /// Posts a message that does not answer a particular trigger.
    pub async fn send(
        &self,
        channel_id: u64,
        text: &str,
        options: DeliverOptions,
    ) -> Option<SentMessage> {
        let result = self.transport.send(channel_id, text).await;
        self.finish(channel_id, result, options)
    }

    fn finish(
        &self,
        channel_id: u64,
        result: Result<SentMessage, DeliveryError>,
        options: DeliverOptions,
    ) -> Option<SentMessage> {
        match result {
            Ok(sent) => {
                if options.delete_after > 0 {
                    self.schedule_delete(sent.clone(), options.delete_after);
                }
                Some(sent)
            }
            Err(e) => {
                warn!("Failed delivering message to channel {}: {}", channel_id, e);
                None
            }
        }
    }

    fn schedule_delete(&self, sent: SentMessage, secs: u64) -> TaskHandle {
        let transport = Arc::clone(&self.transport);
        schedule(Duration::from_secs(secs), async move {
            match transport.delete(sent.channel_id, sent.id).await {
                Ok(()) => debug!("Deleted message {} after {}s", sent.id, secs),
                Err(e) => warn!("Failed deleting message {}: {}", sent.id, e),
            }
        })
    }
}
