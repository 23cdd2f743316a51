#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to launch `{program}`: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for the remux process: {source}")]
    ProcessWait {
        #[source]
        source: std::io::Error,
    },

    #[error("remux process exited with code {code}")]
    NonZeroExit { code: i32 },

    #[error("remux process was terminated by a signal")]
    Terminated,

    #[error("download cancelled")]
    Cancelled,

    #[error("job failed: {0}")]
    JobFailed(String),
}

impl DownloadError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
