// Abstractions over ffmpeg invocation shared by the splitters, the remuxer
// and the audio extractor. Every operation builds a MediaCommand and runs it
// under a bound; nothing in this module knows about segmentation semantics.

pub mod commands;

pub use commands::*;
