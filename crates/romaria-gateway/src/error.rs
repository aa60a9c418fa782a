use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("provider returned {status}: {body}")]
  Provider { status: u16, body: String },
  #[error("send failed after {attempts} attempts")]
  Exhausted { attempts: u32 },
  #[error("unexpected provider payload: {0}")]
  Payload(String),
}
