pub mod clock;
pub mod error;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use error::RecorderError;
pub use session::{AudioBlob, AudioRecorder, RecorderState, RecorderStats};
