/*!
 * Monitoring
 * Tracing setup and operation spans
 */

mod tracer;

pub use tracer::{init_tracing, OperationSpan, ENV_TRACE_JSON};
