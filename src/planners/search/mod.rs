pub mod evaluation;
pub mod expander;
pub mod frontier;
mod graph_search;
mod node;

pub use evaluation::{Evaluation, Strategy, goal_distance_heuristic};
pub use frontier::{Frontier, FrontierBestFirst, FrontierBfs, FrontierDfs};
pub use graph_search::{SearchOutcome, SearchStats, graph_search};
pub use node::SearchNode;
