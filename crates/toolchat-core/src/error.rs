use thiserror::Error;
use toolchat_client::ClientError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Backend(ClientError),

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Title is empty")]
    EmptyTitle,

    #[error("Unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("Conversation is still loading")]
    Loading,
}

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(id) => CoreError::UnknownConversation(id),
            other => CoreError::Backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
