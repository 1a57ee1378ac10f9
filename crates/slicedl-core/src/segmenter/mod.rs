//! Range math and segment planning.
//!
//! Splits a resource of known size into consecutive inclusive byte ranges of
//! at most 50 MiB each and builds the per-segment download state.

mod range;

pub use range::{
    plan_ranges, plan_segments, segment_count, segment_size, ByteRange, Segment, MAX_SEGMENT_SIZE,
};
