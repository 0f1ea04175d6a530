pub mod pcm;
pub mod segmenter;

pub use segmenter::{AudioSegment, Segmenter, SegmenterConfig};
