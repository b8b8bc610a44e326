//! PlanMod 命令行的可复用部分

pub mod pipeline;

pub use pipeline::Pipeline;
