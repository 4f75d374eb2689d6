pub mod annotations;
pub mod calculator;
pub mod normalize;
pub mod pipeline;
pub mod scope;
pub mod sync;
pub mod synthesize;
