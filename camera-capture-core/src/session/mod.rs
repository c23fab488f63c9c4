pub mod capture;
pub mod view;
