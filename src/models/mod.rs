pub mod complaint;
pub mod consultation;
pub mod doctor;
pub mod enums;
pub mod measurement;
pub mod notification;
pub mod patient;
pub mod prescription;
pub mod reference;
pub mod user;

pub use complaint::*;
pub use consultation::*;
pub use doctor::*;
pub use enums::*;
pub use measurement::*;
pub use notification::*;
pub use patient::*;
pub use prescription::*;
pub use reference::*;
pub use user::*;
