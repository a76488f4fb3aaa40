//! UI building blocks shared by the screens.

pub mod components;
pub mod core;
pub mod styling;

pub use components::button::Button;
pub use components::text::{TextSize, draw_text};
pub use self::core::{Action, HitRect, Region, ScreenId, SettingField, Step, TouchSpace, hit_test};
pub use styling::Palette;
