pub mod io;
pub mod layout;
