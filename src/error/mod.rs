mod virtcol;

pub use virtcol::VirtcolError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
