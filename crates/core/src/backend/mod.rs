pub mod http;
pub mod interceptor;
pub mod local;
pub mod paths;
pub mod traits;
