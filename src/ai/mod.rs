pub mod search;

pub use search::{SolveStats, Solver};
