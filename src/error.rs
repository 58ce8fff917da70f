use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Singular innovation covariance for track {}", track_id)]
    SingularCovariance { track_id: u64 },

    #[error(display = "Non-finite predicted state for track {}", track_id)]
    NonFinitePrediction { track_id: u64 },

    #[error(display = "Assignment Error: {}", _0)]
    Assignment(String),
}

impl From<munkres::Error> for Error {
    fn from(err: munkres::Error) -> Self {
        Self::Assignment(format!("{:?}", err))
    }
}
