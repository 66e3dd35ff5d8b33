pub mod dates;
pub mod jwt;
pub mod logging;
pub mod response;
