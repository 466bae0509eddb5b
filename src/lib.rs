pub mod abi;
pub mod config;
pub mod invoker;
pub mod loaders;
pub mod logging;
pub mod repl;
pub mod session;
