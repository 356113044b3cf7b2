use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::repositories::{
    ConversationRecord, ConversationRepository, Database, MessageRecord, MessageRepository,
};

#[derive(Clone)]
pub struct ConversationService {
    conversations: ConversationRepository,
    messages: MessageRepository,
}

impl ConversationService {
    pub fn new(db: &Database) -> Self {
        Self {
            conversations: db.conversations(),
            messages: db.messages(),
        }
    }

    pub async fn create(&self, title: &str) -> Result<ConversationRecord, ApiError> {
        let conversation_id = format!("conv_{}", Uuid::new_v4().simple());
        self.conversations.create(&conversation_id, title).await?;

        self.conversations
            .find_by_id(&conversation_id)
            .await?
            .ok_or_else(|| ApiError::Internal("conversation vanished after create".to_string()))
    }

    pub async fn get(&self, conversation_id: &str) -> Result<ConversationRecord, ApiError> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Conversation not found: {}", conversation_id))
            })
    }

    pub async fn list_all(&self) -> Result<Vec<ConversationRecord>, ApiError> {
        self.conversations.find_all().await
    }

    pub async fn add_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
    ) -> Result<i64, ApiError> {
        self.messages.create(conversation_id, role, content).await
    }

    pub async fn list_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, ApiError> {
        self.messages
            .find_by_conversation(conversation_id, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_database;

    #[tokio::test]
    async fn created_conversations_use_the_conv_prefix() {
        let db = test_database().await;
        let service = ConversationService::new(&db);

        let conv = service.create("Winter driving").await.unwrap();
        assert!(conv.conversation_id.starts_with("conv_"));
        assert_eq!(conv.title, "Winter driving");

        let listed = service.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].conversation_id, conv.conversation_id);
    }
}
