mod backend;
mod cache;
mod error;
#[allow(clippy::module_inception)]
mod invoker;
mod notify;
mod table;
mod value;

pub use backend::{AlloyBackend, ChainBackend, ReceiptSummary};
pub use cache::{Clock, ManualClock, ReadCache, SystemClock};
pub use error::InvokeError;
pub use invoker::{
    apply_gas_buffer, cache_key, Invoker, ReadOptions, ReadResult, WriteOptions,
    GAS_BUFFER_PERCENT,
};
pub use notify::{LogNotifier, Notification, Notifier};
pub use table::{ContractCall, FunctionTable, ResolvedCall};
pub use value::{args_json, coerce_args, render_outputs, to_json};
