pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    #[error("Message is not representable as business data: {0}")]
    BusinessData(#[from] serde_json::Error),

    #[error("Business data must be a JSON object")]
    NotAnObject,
}
