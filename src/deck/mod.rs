pub mod annotations;
pub mod arxiv_id;
pub mod atomic;
pub mod config;
pub mod digest;
pub mod excerpt;
pub mod export;
pub mod graph;
pub mod index;
pub mod model;
pub mod package;
pub mod papers;
pub mod paths;
pub mod score;
pub mod search;
pub mod tokenize;
pub mod util;
