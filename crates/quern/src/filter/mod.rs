mod ast;

pub use ast::{CompareOp, Cond, Filter, Test};
