pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("channel '{name}' already exists with a different payload type")]
    ChannelType { name: String },

    #[error("scheduler not initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn channel_type<S: Into<String>>(name: S) -> Self {
        Error::ChannelType { name: name.into() }
    }
}
