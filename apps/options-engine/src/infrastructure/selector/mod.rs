//! Strategy selector adapters.

mod scripted;
mod template;

pub use scripted::ScriptedSelector;
pub use template::TemplateSelector;
