//! Text readers for opinion-dynamics datasets: weighted graphs, opinion
//! vectors, exact measures and plain edge lists.

mod dataset;
mod errors;
mod parse;

pub use dataset::{
    Dataset, DatasetPaths, load_edge_list, load_graph, load_measures, load_opinions,
};
pub use errors::TextProviderError;
pub use parse::{EdgeList, read_edge_list, read_graph, read_measures, read_opinions};
