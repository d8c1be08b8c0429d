pub mod node;
pub mod sink;
pub mod token_ring;
pub mod types;

// Ring configuration
pub const DEFAULT_RING_SIZE: usize = 12;
pub const MIN_RING_SIZE: usize = 2;
pub const DEFAULT_EDGE_CAPACITY: usize = 1;
