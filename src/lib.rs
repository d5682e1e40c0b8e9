pub mod address;
pub mod aggregate;
pub mod commands;
pub mod fixed;
pub mod generate;
pub mod i18n;
pub mod model;
pub mod names;
pub mod output;
pub mod overview;
pub mod pattern;
pub mod template;
