//! Built-in provider adapters.

mod html;
mod motchill;
mod mth_api;
mod nguonc;
mod phimmoichill;

pub use motchill::MotChillAdapter;
pub use mth_api::MthApiAdapter;
pub use nguonc::NguonCAdapter;
pub use phimmoichill::PhimMoiChillAdapter;
