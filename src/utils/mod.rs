pub mod context;
pub mod naming;
pub mod retry;
