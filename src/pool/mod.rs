pub mod random;
pub mod registry;

pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use registry::ServerPool;
