pub mod batch_ctx;
pub mod validation_flow;

pub use batch_ctx::BatchCtx;
pub use validation_flow::ValidationFlow;
