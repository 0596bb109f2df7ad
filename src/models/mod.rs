pub mod appointment;
pub mod billing;
pub mod doctor;
pub mod enums;
pub mod lab;
pub mod medication;
pub mod patient;
pub mod patient_update;
pub mod summary;

pub use appointment::*;
pub use billing::*;
pub use doctor::*;
pub use lab::*;
pub use medication::*;
pub use patient::*;
pub use patient_update::*;
pub use summary::*;
