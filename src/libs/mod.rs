pub mod aligner;
pub mod block;
pub mod chain;
pub mod concat;
pub mod error;
pub mod expand;
pub mod io;
pub mod pipeline;
pub mod range;
pub mod select;
pub mod seq;
pub mod workspace;
