pub mod convert;
pub mod layout;
pub mod sections;
