//! Pipeline scenarios

mod environment;
mod success_chain;
