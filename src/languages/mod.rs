pub mod common;
pub mod js;
pub mod py;
pub mod rust;

use crate::configurator::ProjectConfigurator;

pub use js::JsConfigurator;
pub use py::PythonConfigurator;
pub use rust::RustConfigurator;

/// Every configurator shipped with propex, in the order they are tried.
pub fn builtin_configurators() -> Vec<Box<dyn ProjectConfigurator>> {
    vec![
        Box::new(RustConfigurator),
        Box::new(PythonConfigurator),
        Box::new(JsConfigurator),
    ]
}

pub fn configurator_from_name(name: &str) -> Option<Box<dyn ProjectConfigurator>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "rust" | "cargo" => Some(Box::new(RustConfigurator)),
        "python" | "py" => Some(Box::new(PythonConfigurator)),
        "js" | "javascript" | "node" => Some(Box::new(JsConfigurator)),
        _ => None,
    }
}

pub fn builtin_names() -> Vec<&'static str> {
    builtin_configurators()
        .iter()
        .map(|configurator| configurator.name())
        .collect()
}
