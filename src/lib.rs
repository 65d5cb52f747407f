pub mod alert;
pub mod autocomplete;
pub mod device;
pub mod dom;
pub mod flows;
pub mod log_stream;
pub mod logging;
pub mod orientation;
pub mod settings;

pub mod gui;
