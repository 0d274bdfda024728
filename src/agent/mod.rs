pub mod context;
pub mod dispatcher;
pub mod system_prompt;

pub use dispatcher::MaterialAgent;
