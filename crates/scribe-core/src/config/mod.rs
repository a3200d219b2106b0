mod settings;

pub use settings::{EditorHook, GitConfigMap, SessionSettings};
