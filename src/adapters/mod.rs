// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod progress_channel;

// Re-export adapters
pub use exec_ffmpeg::FfmpegExecAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use progress_channel::{ConsoleChannel, JsonLinesChannel, MpscChannel};
