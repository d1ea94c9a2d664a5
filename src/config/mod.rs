pub mod allow_list;
pub mod default;
pub mod settings;

pub use allow_list::AllowList;
pub use settings::{ConfigError, Settings, SizeCssBisect};
