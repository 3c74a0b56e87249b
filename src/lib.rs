// Library root - layers shared by the server binary and by hosts that embed the charts
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
